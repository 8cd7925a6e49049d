//! Groq connector for chatrelay
//!
//! Talks to the OpenAI-compatible chat completions endpoint and returns the
//! raw assistant text. Classification happens in the relay, not here.

use async_trait::async_trait;
use chatrelay_core::prelude::*;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

mod config;
mod models;

pub use config::GroqConfig;
use config::MAX_RETRY_DELAY_MS;
use models::*;

/// Groq implementation of LlmConnector
pub struct GroqConnector {
    client: Client,
    config: GroqConfig,
}

impl GroqConnector {
    /// Create a new Groq connector
    pub fn new(config: GroqConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::ConfigError("Groq API key is required".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GroqConfig {
        &self.config
    }

    /// Convert conversation messages to the wire format
    fn build_request<'a>(&'a self, messages: &'a [ConversationMessage]) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|msg| GroqMessage {
                    role: msg.role.as_str(),
                    content: &msg.content,
                })
                .collect(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    /// Delay before retry number `attempt` (0-indexed)
    fn retry_delay(&self, attempt: u32, error: &LlmError) -> Duration {
        if let LlmError::RateLimited {
            retry_after_secs: Some(secs),
        } = error
        {
            return Duration::from_millis(secs.saturating_mul(1000).min(MAX_RETRY_DELAY_MS));
        }

        let factor = 1u64 << attempt.min(16);
        Duration::from_millis(
            self.config
                .retry_base_delay_ms
                .saturating_mul(factor)
                .min(MAX_RETRY_DELAY_MS),
        )
    }

    /// Make a single API call
    async fn send_once(&self, request: &ChatCompletionRequest<'_>) -> Result<ProviderReply, LlmError> {
        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::NetworkError(format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok());
            return Err(LlmError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<GroqError>(&error_text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(error_text);
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseParseError(format!("Failed to parse response: {}", e)))?;

        let choice = completion.choices.into_iter().next().ok_or(LlmError::EmptyResponse)?;
        if let Some(reason) = choice.finish_reason.as_deref() {
            if reason == "length" {
                warn!("Groq reply was cut off at the token limit");
            }
        }
        let text = choice.message.content.ok_or(LlmError::EmptyResponse)?;

        Ok(ProviderReply {
            text,
            model: completion.model,
            usage: completion.usage.map(|u| chatrelay_core::types::Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

#[async_trait]
impl LlmConnector for GroqConnector {
    fn provider(&self) -> &'static str {
        "groq"
    }

    async fn chat(&self, messages: &[ConversationMessage]) -> Result<ProviderReply, LlmError> {
        debug!("Starting Groq chat completion with {} messages", messages.len());
        let start_time = Instant::now();
        let request = self.build_request(messages);

        let mut attempt = 0;
        let reply = loop {
            match self.send_once(&request).await {
                Ok(reply) => break reply,
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.retry_delay(attempt, &e);
                    warn!(
                        "Groq call attempt {} failed ({}), retrying after {:?}",
                        attempt + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        info!(
            "Groq completion finished in {}ms using {} ({} tokens)",
            start_time.elapsed().as_millis(),
            reply.model.as_deref().unwrap_or(&self.config.model),
            reply.usage.map(|u| u.total_tokens).unwrap_or(0)
        );

        Ok(reply)
    }
}
