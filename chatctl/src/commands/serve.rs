//! Relay server command

use crate::config::ServerSettings;
use chatrelay_connector_groq::GroqConnector;
use chatrelay_core::errors::CoreError;
use chatrelay_core::traits::{ChatService, PresentationAdapter};
use chatrelay_core::ChatRelay;
use chatrelay_http::HttpBridge;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Handle serve command: run the relay until Ctrl-C
pub async fn handle_serve_command(
    config_path: &Option<PathBuf>,
    bind: Option<IpAddr>,
    port: Option<u16>,
) -> Result<(), CoreError> {
    let settings = ServerSettings::load(config_path)?.with_overrides(bind, port);
    info!(
        "Starting chatrelay ({:?}) with model {}",
        settings.environment, settings.groq.model
    );

    let connector = GroqConnector::new(settings.groq.clone())?;
    let service: Arc<dyn ChatService> = Arc::new(ChatRelay::new(Arc::new(connector)));
    let bridge = Arc::new(HttpBridge::new(settings.bridge_config()));

    let shutdown_bridge = bridge.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                if let Err(e) = shutdown_bridge.stop().await {
                    warn!("Failed to stop HTTP bridge: {}", e);
                }
            }
            Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
        }
    });

    bridge
        .start(service)
        .await
        .map_err(|e| CoreError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serve_requires_existing_config_file() {
        let result = handle_serve_command(&Some(PathBuf::from("/nonexistent/chatrelay.yaml")), None, None).await;
        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }
}
