//! Wire models for the HTTP bridge

use chatrelay_core::prelude::*;
use serde::{Deserialize, Serialize};

/// Re-export core types for convenience
pub use chatrelay_core::types::*;

/// Successful `POST /chat` body.
///
/// Deserializing rejects metadata whose `is_*` flags disagree with
/// `responseType`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ChatResponseWire")]
pub struct ChatResponse {
    pub reply: String,
    pub response_type: ContentType,
    pub metadata: ReplyMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl From<ChatReply> for ChatResponse {
    fn from(chat: ChatReply) -> Self {
        let (reply, response_type, metadata) = chat.reply.into_parts();
        Self {
            reply,
            response_type,
            metadata,
            usage: chat.usage,
            model: chat.model,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponseWire {
    reply: String,
    response_type: ContentType,
    metadata: ReplyMetadata,
    usage: Option<Usage>,
    model: Option<String>,
}

impl TryFrom<ChatResponseWire> for ChatResponse {
    type Error = String;

    fn try_from(wire: ChatResponseWire) -> Result<Self, Self::Error> {
        if !wire.metadata.is_consistent_with(wire.response_type) {
            return Err(format!("metadata flags do not match response type {}", wire.response_type));
        }
        Ok(Self {
            reply: wire.reply,
            response_type: wire.response_type,
            metadata: wire.metadata,
            usage: wire.usage,
            model: wire.model,
        })
    }
}

/// Error body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            path: None,
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self {
            error: "Not Found".to_string(),
            path: Some(path.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub version: String,
    pub timestamp: String,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            ok: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_response_shape() {
        let reply = ChatReply {
            reply: classify("# Title\n\n- one\n- two"),
            usage: None,
            model: Some("llama-3.3-70b-versatile".to_string()),
        };
        let value = serde_json::to_value(ChatResponse::from(reply)).unwrap();

        assert_eq!(value["responseType"], "markdown");
        assert_eq!(value["metadata"]["isMarkdown"], true);
        assert_eq!(value["model"], "llama-3.3-70b-versatile");
        assert!(value.get("usage").is_none());
    }

    #[test]
    fn test_chat_response_rejects_inconsistent_flags() {
        let consistent = serde_json::json!({
            "reply": "{\"a\": 1}",
            "responseType": "json",
            "metadata": {"isCode": false, "isJson": true, "isMarkdown": false, "isTable": false}
        });
        let parsed: ChatResponse = serde_json::from_value(consistent).unwrap();
        assert!(parsed.metadata.is_json());

        let forged = serde_json::json!({
            "reply": "plain words",
            "responseType": "text",
            "metadata": {"isCode": true}
        });
        let error = serde_json::from_value::<ChatResponse>(forged).unwrap_err();
        assert!(error.to_string().contains("do not match response type text"));
    }

    #[test]
    fn test_error_body_serialization() {
        let value = serde_json::to_value(ErrorBody::new("boom")).unwrap();
        assert_eq!(value, serde_json::json!({"error": "boom"}));

        let value = serde_json::to_value(ErrorBody::not_found("/nope")).unwrap();
        assert_eq!(value, serde_json::json!({"error": "Not Found", "path": "/nope"}));
    }
}
