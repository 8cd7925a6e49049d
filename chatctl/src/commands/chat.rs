//! Chat command implementation

use crate::cli::ChatArgs;
use crate::client::ChatRelayClient;
use crate::config::ChatctlConfig;
use crate::output;
use chatrelay_core::errors::CoreError;
use chatrelay_core::types::{ChatRequest, ConversationMessage};
use chatrelay_core::ChatRelay;
use std::path::Path;
use tracing::info;

/// Handle chat command
pub async fn handle_chat_command(args: ChatArgs, config: &ChatctlConfig) -> Result<(), CoreError> {
    let client = ChatRelayClient::new(config.clone())?;
    let request = build_request(&args).await?;

    info!(
        "Sending {} messages to {}",
        request.messages.len(),
        config.endpoint
    );
    let response = client.chat(&request).await?;
    output::display_reply(&response, &config.default_format)
}

/// Assemble the request from history, the new message and the options.
///
/// The conversation is checked locally so obviously invalid input never
/// reaches the server.
async fn build_request(args: &ChatArgs) -> Result<ChatRequest, CoreError> {
    let mut messages = match args.history {
        Some(ref path) => load_history(path).await?,
        None => Vec::new(),
    };
    messages.push(ConversationMessage::user(args.message.as_str()));

    let mut request = ChatRequest::new(ChatRelay::validate_messages(&messages)?);
    if let Some(format) = args.format_hint {
        request = request.with_response_format(format);
    }
    if let Some(ref system) = args.system {
        request = request.with_system_prompt(system.as_str());
    }
    Ok(request)
}

/// Load earlier messages from a JSON array file
async fn load_history(path: &Path) -> Result<Vec<ConversationMessage>, CoreError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CoreError::Configuration(format!("Failed to read history {}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&content)?)
}
