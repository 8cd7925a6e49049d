//! Health check command implementation

use crate::client::ChatRelayClient;
use crate::config::ChatctlConfig;
use crate::output;
use chatrelay_core::errors::CoreError;
use colored::*;
use tracing::info;

/// Handle health check command
pub async fn handle_health_command(config: &ChatctlConfig) -> Result<(), CoreError> {
    let client = ChatRelayClient::new(config.clone())?;

    info!("Checking chatrelay health at {}", config.endpoint);

    match client.health().await {
        Ok(health) => output::display_health(&health, &config.default_format),
        Err(e) => {
            println!("{}", "✗ chatrelay health check failed".red().bold());
            println!("Error: {}", e.to_string().red());
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_health_command_against_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "version": "0.1.0",
                "timestamp": "2026-01-01T00:00:00+00:00"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = ChatctlConfig {
            endpoint: server.uri(),
            ..Default::default()
        };
        assert!(handle_health_command(&config).await.is_ok());
    }

    #[tokio::test]
    async fn test_health_command_without_server() {
        let config = ChatctlConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout: 2,
            ..Default::default()
        };
        assert!(handle_health_command(&config).await.is_err());
    }
}
