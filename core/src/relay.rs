//! Chat relay: validates a conversation, forwards it to the LLM connector and
//! classifies the answer.

use crate::classifier::classify;
use crate::pipeline::{PipelineRunner, PipelineStage};
use crate::prelude::*;
use std::sync::Arc;
use tracing::{debug, error};

/// [`ChatService`] backed by a single [`LlmConnector`]
pub struct ChatRelay {
    connector: Arc<dyn LlmConnector>,
    pipeline: Arc<PipelineRunner>,
}

impl ChatRelay {
    /// Create a relay with the built-in pipeline plugins
    pub fn new(connector: Arc<dyn LlmConnector>) -> Self {
        Self {
            connector,
            pipeline: Arc::new(PipelineRunner::with_builtin_plugins()),
        }
    }

    /// Replace the plugin pipeline
    pub fn with_pipeline(mut self, pipeline: PipelineRunner) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    /// Check the conversation and return it with trimmed contents
    pub fn validate_messages(messages: &[ConversationMessage]) -> CoreResult<Vec<ConversationMessage>> {
        if messages.is_empty() {
            return Err(CoreError::Validation("At least one message is required".to_string()));
        }

        messages
            .iter()
            .enumerate()
            .map(|(index, message)| {
                let content = message.content.trim();
                if content.is_empty() {
                    return Err(CoreError::Validation(format!(
                        "Message content cannot be empty at index {}",
                        index
                    )));
                }
                Ok(ConversationMessage::new(message.role, content))
            })
            .collect()
    }

    /// System message synthesized from the caller's prompt and format hint
    pub fn system_message(options: &ChatOptions) -> Option<ConversationMessage> {
        let parts: Vec<&str> = options
            .system_prompt
            .as_deref()
            .map(str::trim)
            .filter(|prompt| !prompt.is_empty())
            .into_iter()
            .chain(options.response_format.map(|format| format.instruction()))
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(ConversationMessage::system(parts.join("\n\n")))
        }
    }

    /// Conversation exactly as it will be sent to the provider
    pub fn prepare_messages(request: &ChatRequest) -> CoreResult<Vec<ConversationMessage>> {
        let history = Self::validate_messages(&request.messages)?;

        Ok(Self::system_message(&request.options)
            .into_iter()
            .chain(history)
            .collect())
    }
}

#[async_trait]
impl ChatService for ChatRelay {
    async fn chat(&self, request: ChatRequest) -> CoreResult<ChatReply> {
        let messages = Self::prepare_messages(&request)?;
        let mut ctx = RequestContext::new(messages, request.options);

        self.pipeline.run_stage(PipelineStage::PreOperation, &mut ctx).await?;

        debug!(
            "Forwarding {} messages to {} for request {}",
            ctx.messages.len(),
            self.connector.provider(),
            ctx.request_id
        );
        let provider_reply = self.connector.chat(&ctx.messages).await.map_err(|e| {
            error!(
                "{} call failed for request {}: {}",
                self.connector.provider(),
                ctx.request_id,
                e
            );
            CoreError::Llm(e)
        })?;

        let reply = classify(&provider_reply.text);
        ctx.reply = Some(reply.clone());

        self.pipeline.run_stage(PipelineStage::PostOperation, &mut ctx).await?;

        Ok(ChatReply {
            reply,
            usage: provider_reply.usage,
            model: provider_reply.model,
        })
    }

    async fn health_check(&self) -> CoreResult<()> {
        Ok(())
    }
}
