//! Error types for chatrelay core operations

use thiserror::Error;

/// Main error type for chatrelay core operations
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid conversation: {0}")]
    Validation(String),

    #[error("LLM connector error: {0}")]
    Llm(#[from] LlmError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors related to the relay plugin pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Pipeline halted: {0}")]
    PipelineHalted(String),
}

/// Errors related to LLM connector operations
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error from LLM provider ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Rate limited by LLM provider")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Timeout during LLM call")]
    Timeout,

    #[error("Failed to parse LLM response: {0}")]
    ResponseParseError(String),

    #[error("LLM response contained no content")]
    EmptyResponse,
}

impl LlmError {
    /// Whether the failed call is worth repeating
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::NetworkError(_) | LlmError::Timeout | LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors related to presentation adapters
#[derive(Error, Debug)]
pub enum PresentationError {
    #[error("Server startup failed: {0}")]
    StartupFailed(String),
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
