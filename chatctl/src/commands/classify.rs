//! Local classification command

use crate::config::ChatctlConfig;
use crate::output;
use chatrelay_core::errors::CoreError;
use chatrelay_core::types::ChatReply;
use chatrelay_core::classify;
use chatrelay_http::ChatResponse;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Handle classify command
pub async fn handle_classify_command(file: Option<PathBuf>, config: &ChatctlConfig) -> Result<(), CoreError> {
    let text = read_input(file.as_deref()).await?;
    debug!("Classifying {} bytes", text.len());

    let response = ChatResponse::from(ChatReply {
        reply: classify(&text),
        usage: None,
        model: None,
    });
    output::display_reply(&response, &config.default_format)
}

/// Read the text to classify from `file`, or stdin when absent
async fn read_input(file: Option<&Path>) -> Result<String, CoreError> {
    match file {
        Some(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
            CoreError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        }),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| CoreError::Internal(format!("Failed to read stdin: {}", e)))?;
            Ok(buffer)
        }
    }
}
