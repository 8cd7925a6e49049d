//! Configuration for the Groq connector

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for a single retry delay
pub(crate) const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Groq API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroqConfig {
    /// Groq API key
    pub api_key: String,
    /// Model to use (e.g., "llama-3.3-70b-versatile")
    pub model: String,
    /// API base URL (OpenAI-compatible)
    pub api_base: String,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for generation (0.0 to 2.0)
    pub temperature: Option<f32>,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum retries for failed requests
    pub max_retries: u32,
    /// First retry delay in milliseconds, doubled on each attempt
    pub retry_base_delay_ms: u64,
}

impl GroqConfig {
    /// Create a new Groq config with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_base: "https://api.groq.com/openai/v1".to_string(),
            max_tokens: None,
            temperature: None,
            timeout_ms: 30_000,
            max_retries: 3,
            retry_base_delay_ms: 500,
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API base URL (for proxies or other OpenAI-compatible services)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set maximum tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 2.0));
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set maximum retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the first retry delay
    pub fn with_retry_base_delay(mut self, delay_ms: u64) -> Self {
        self.retry_base_delay_ms = delay_ms;
        self
    }

    /// Longest a single `chat` call can take: every attempt timing out
    /// plus the largest delay between each retry.
    pub fn call_budget(&self) -> Duration {
        let attempts = u64::from(self.max_retries) + 1;
        let retry_delays = u64::from(self.max_retries).saturating_mul(MAX_RETRY_DELAY_MS);
        Duration::from_millis(self.timeout_ms.saturating_mul(attempts).saturating_add(retry_delays))
    }

    /// Endpoint for chat completions
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self::new("") // Empty API key - must be set by user
    }
}
