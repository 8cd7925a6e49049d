//! HTTP client for the chatrelay API

use crate::config::ChatctlConfig;
use chatrelay_core::errors::CoreError;
use chatrelay_core::types::ChatRequest;
use chatrelay_http::{ChatResponse, ErrorBody, HealthStatus};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Failures reported to chatctl users
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication required. Please log in again.")]
    Unauthorized,

    #[error("Access denied. You don't have permission for this action.")]
    Forbidden,

    #[error("Chat service not found. Check the endpoint and try again.")]
    NotFound,

    #[error("Too many requests. Please wait a moment before trying again.")]
    RateLimited,

    #[error("Server error: {0}")]
    Server(String),

    #[error("Request failed with status {0}. Please try again.")]
    Status(u16),

    #[error("Network error. Please check your connection ({0})")]
    Network(String),

    #[error("Request timed out. Please try again.")]
    Timeout,

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Map a non-success status and its body to a user-facing error
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .map(|envelope| envelope.error)
            .unwrap_or_else(|_| body.trim().to_string());

        match status {
            400 => ClientError::InvalidRequest(detail),
            401 => ClientError::Unauthorized,
            403 => ClientError::Forbidden,
            404 => ClientError::NotFound,
            429 => ClientError::RateLimited,
            500..=599 => ClientError::Server(detail),
            other => ClientError::Status(other),
        }
    }

    fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Network(error.to_string())
        }
    }
}

impl From<ClientError> for CoreError {
    fn from(error: ClientError) -> Self {
        CoreError::Internal(error.to_string())
    }
}

/// API client for a running chatrelay server
pub struct ChatRelayClient {
    client: Client,
    config: ChatctlConfig,
}

impl ChatRelayClient {
    /// Create a new API client
    pub fn new(config: ChatctlConfig) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| CoreError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Send a conversation to `POST /chat`
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError> {
        let url = self.config.api_url("/chat");
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(ClientError::from_transport)?;
        self.handle_response(response).await
    }

    /// Query `GET /health`
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let url = self.config.api_url("/health");
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ClientError::from_transport)?;
        self.handle_response(response).await
    }

    /// Handle API response, checking status and parsing JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ClientError::InvalidResponse(e.to_string()));
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!("API error {}: {}", status, error_text);

        Err(ClientError::from_status(status.as_u16(), &error_text))
    }
}
