//! # chatrelay core
//!
//! Core types, traits and logic for the chatrelay service: the reply
//! classifier, the chat relay that feeds it, and the plugin pipeline around
//! the relay. Connectors and presentation adapters build on these
//! abstractions.

pub mod classifier;
pub mod errors;
pub mod pipeline;
pub mod relay;
pub mod traits;
pub mod types;

// Re-export commonly used types and traits
pub use classifier::{classify, ClassifiedReply, ReplyMetadata};
pub use errors::{CoreError, LlmError, PipelineError, PresentationError};
pub use relay::ChatRelay;
pub use traits::{ChatService, LlmConnector, PipelinePlugin, PluginOutcome, PresentationAdapter, RequestContext};
pub use types::{ChatRequest, ContentType, ConversationMessage, ResponseFormat};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::classifier::{classify, ClassifiedReply, ReplyMetadata};
    pub use crate::errors::*;
    pub use crate::traits::*;
    pub use crate::types::*;
    pub use async_trait::async_trait;
    pub use uuid::Uuid;
}
