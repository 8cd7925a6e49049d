//! Core traits defining the plugin interfaces for chatrelay

use crate::classifier::ClassifiedReply;
use crate::errors::{CoreError, LlmError, PresentationError};
use crate::types::{ChatOptions, ChatReply, ChatRequest, ConversationMessage, ProviderReply};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Trait for Large Language Model connectors
#[async_trait]
pub trait LlmConnector: Send + Sync {
    /// Provider name used in logs (e.g. "groq")
    fn provider(&self) -> &'static str;

    /// Send the full conversation and return the raw generated text
    async fn chat(&self, messages: &[ConversationMessage]) -> Result<ProviderReply, LlmError>;
}

/// Service interface that presentation adapters interact with
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Relay a conversation to the model and classify the answer
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, CoreError>;

    /// Get service health status
    async fn health_check(&self) -> Result<(), CoreError>;
}

/// Trait for presentation adapters (network transport layers)
#[async_trait]
pub trait PresentationAdapter: Send + Sync {
    /// Start the presentation adapter with a reference to the chat service
    async fn start(&self, service: Arc<dyn ChatService>) -> Result<(), PresentationError>;

    /// Stop the presentation adapter gracefully
    async fn stop(&self) -> Result<(), PresentationError>;
}

/// Trait for relay pipeline plugins
#[async_trait]
pub trait PipelinePlugin: Send + Sync {
    /// A unique identifier for the plugin
    fn name(&self) -> &'static str;

    /// Executes the plugin's logic
    async fn call(&self, ctx: &mut RequestContext) -> PluginOutcome;
}

/// Outcome of a plugin's execution
#[derive(Debug)]
pub enum PluginOutcome {
    /// Continue to the next plugin or stage
    Continue,
    /// Skip the remaining plugins of this stage
    Halt,
    /// Halt with an error
    HaltWithError(Box<dyn std::error::Error + Send + Sync>),
}

/// Represents the shared context flowing through the pipeline
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    /// Conversation as it will be sent to the provider
    pub messages: Vec<ConversationMessage>,
    pub options: ChatOptions,
    /// Set before the post-operation stage runs
    pub reply: Option<ClassifiedReply>,
    pub attributes: HashMap<String, serde_json::Value>,
    pub start_time: std::time::Instant,
    pub error: Option<String>,
}

impl RequestContext {
    pub fn new(messages: Vec<ConversationMessage>, options: ChatOptions) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            messages,
            options,
            reply: None,
            attributes: HashMap::new(),
            start_time: std::time::Instant::now(),
            error: None,
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.attributes.insert(key.into(), value);
    }

    pub fn get_attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }
}
