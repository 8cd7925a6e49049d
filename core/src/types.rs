//! Core data types for chatrelay

use crate::classifier::ClassifiedReply;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a conversation participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in the conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ConversationMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Output format a caller would like the model to prefer.
///
/// This is only a hint: it shapes the synthesized system message, while the
/// classifier always decides the final [`ContentType`] from the reply text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Text,
    Json,
    Code,
    Markdown,
    Table,
    Mixed,
    Raw,
}

impl ResponseFormat {
    pub const ALL: [ResponseFormat; 7] = [
        ResponseFormat::Text,
        ResponseFormat::Json,
        ResponseFormat::Code,
        ResponseFormat::Markdown,
        ResponseFormat::Table,
        ResponseFormat::Mixed,
        ResponseFormat::Raw,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Text => "text",
            ResponseFormat::Json => "json",
            ResponseFormat::Code => "code",
            ResponseFormat::Markdown => "markdown",
            ResponseFormat::Table => "table",
            ResponseFormat::Mixed => "mixed",
            ResponseFormat::Raw => "raw",
        }
    }

    /// Instruction sentence placed in the synthesized system message
    pub fn instruction(&self) -> &'static str {
        match self {
            ResponseFormat::Text => "Respond in plain text only. Do not use markdown, code blocks or tables.",
            ResponseFormat::Json => "Always respond with valid JSON. No extra text.",
            ResponseFormat::Code => "Respond with code only, inside a single fenced code block tagged with its language. No explanations.",
            ResponseFormat::Markdown => "Format your response as markdown, using headings and lists where they help.",
            ResponseFormat::Table => "Respond with a single markdown table (header row, separator row, data rows). No extra text.",
            ResponseFormat::Mixed => "Explain in prose and put every code sample in a fenced code block tagged with its language.",
            ResponseFormat::Raw => "Respond with the raw content only, without any formatting or commentary.",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ResponseFormat::ALL
            .iter()
            .copied()
            .find(|format| format.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown response format '{}', expected one of: text, json, code, markdown, table, mixed, raw",
                    s
                )
            })
    }
}

/// Category assigned to a reply by the classifier. Exactly one per reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Json,
    Code,
    Markdown,
    Table,
    #[serde(rename = "html-table")]
    HtmlTable,
    Mixed,
    Raw,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Json => "json",
            ContentType::Code => "code",
            ContentType::Markdown => "markdown",
            ContentType::Table => "table",
            ContentType::HtmlTable => "html-table",
            ContentType::Mixed => "mixed",
            ContentType::Raw => "raw",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional per-request knobs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Input to the chat relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ConversationMessage>,
    #[serde(flatten)]
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(messages: Vec<ConversationMessage>) -> Self {
        Self {
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.options.response_format = Some(format);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.options.system_prompt = Some(prompt.into());
        self
    }
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Raw answer returned by an LLM connector
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    /// Generated text, untouched
    pub text: String,
    /// Model name reported by the provider
    pub model: Option<String>,
    /// Token usage, if reported
    pub usage: Option<Usage>,
}

/// Classified reply plus provider bookkeeping, as returned by the relay
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub reply: ClassifiedReply,
    pub usage: Option<Usage>,
    pub model: Option<String>,
}
