//! Classified reply and the metadata derived from it

use super::language::detect_language;
use super::rules::first_fence_tag;
use crate::types::ContentType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// A model reply with its content type and derived annotations.
///
/// Built once by [`super::classify`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedReply {
    content: String,
    content_type: ContentType,
    metadata: ReplyMetadata,
}

impl ClassifiedReply {
    pub(crate) fn new(content: String, content_type: ContentType, metadata: ReplyMetadata) -> Self {
        Self {
            content,
            content_type,
            metadata,
        }
    }

    /// Trimmed reply text
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn metadata(&self) -> &ReplyMetadata {
        &self.metadata
    }

    pub fn into_parts(self) -> (String, ContentType, ReplyMetadata) {
        (self.content, self.content_type, self.metadata)
    }
}

/// Annotations attached to a classified reply.
///
/// The `is_*` flags mirror the content type and cannot be set independently.
/// Deserialized values are only trusted once checked with
/// [`ReplyMetadata::is_consistent_with`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(default)]
    is_code: bool,
    #[serde(default)]
    is_json: bool,
    #[serde(default)]
    is_markdown: bool,
    #[serde(default)]
    is_table: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    json_keys: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    json_depth: Option<usize>,
}

impl ReplyMetadata {
    pub(crate) fn for_content_type(content_type: ContentType) -> Self {
        Self {
            language: None,
            is_code: content_type == ContentType::Code,
            is_json: content_type == ContentType::Json,
            is_markdown: content_type == ContentType::Markdown,
            is_table: content_type == ContentType::Table,
            confidence: None,
            json_keys: None,
            json_depth: None,
        }
    }

    pub(crate) fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn is_code(&self) -> bool {
        self.is_code
    }

    pub fn is_json(&self) -> bool {
        self.is_json
    }

    pub fn is_markdown(&self) -> bool {
        self.is_markdown
    }

    pub fn is_table(&self) -> bool {
        self.is_table
    }

    pub fn confidence(&self) -> Option<f32> {
        self.confidence
    }

    pub fn json_keys(&self) -> Option<&BTreeSet<String>> {
        self.json_keys.as_ref()
    }

    pub fn json_depth(&self) -> Option<usize> {
        self.json_depth
    }

    /// Whether the derived flags agree with `content_type`
    pub fn is_consistent_with(&self, content_type: ContentType) -> bool {
        let json_stats_allowed = content_type == ContentType::Json
            || (self.json_keys.is_none() && self.json_depth.is_none());

        self.is_code == (content_type == ContentType::Code)
            && self.is_json == (content_type == ContentType::Json)
            && self.is_markdown == (content_type == ContentType::Markdown)
            && self.is_table == (content_type == ContentType::Table)
            && json_stats_allowed
    }
}

/// Top-level shape of a parsed JSON value
#[derive(Debug, Clone, Copy)]
pub enum JsonShape<'a> {
    Object(&'a Map<String, Value>),
    Array(&'a [Value]),
    Scalar,
}

impl<'a> From<&'a Value> for JsonShape<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => JsonShape::Object(map),
            Value::Array(items) => JsonShape::Array(items),
            _ => JsonShape::Scalar,
        }
    }
}

impl<'a> JsonShape<'a> {
    /// Top-level keys; empty for arrays and scalars
    pub fn keys(&self) -> BTreeSet<String> {
        match self {
            JsonShape::Object(map) => map.keys().cloned().collect(),
            JsonShape::Array(_) | JsonShape::Scalar => BTreeSet::new(),
        }
    }

    /// Nesting depth. Scalars and empty containers are 1, each nested
    /// container level adds 1.
    pub fn depth(&self) -> usize {
        let children: Box<dyn Iterator<Item = &'a Value> + 'a> = match *self {
            JsonShape::Object(map) => Box::new(map.values()),
            JsonShape::Array(items) => Box::new(items.iter()),
            JsonShape::Scalar => return 1,
        };

        1 + children
            .map(JsonShape::from)
            .filter(|shape| !matches!(shape, JsonShape::Scalar))
            .map(|shape| shape.depth())
            .max()
            .unwrap_or(0)
    }
}

/// Maximum nesting depth of a JSON value
pub fn json_depth(value: &Value) -> usize {
    JsonShape::from(value).depth()
}

/// Derive metadata for `content` already classified as `content_type`.
///
/// JSON parse failures only leave the JSON fields unset.
pub fn extract_metadata(content: &str, content_type: ContentType) -> ReplyMetadata {
    let mut metadata = ReplyMetadata::for_content_type(content_type);

    match content_type {
        ContentType::Code => {
            metadata.language = first_fence_tag(content).or_else(|| detect_language(content));
        }
        ContentType::Json => {
            if let Ok(value) = serde_json::from_str::<Value>(content) {
                let shape = JsonShape::from(&value);
                metadata.json_keys = Some(shape.keys());
                metadata.json_depth = Some(shape.depth());
            }
        }
        _ => {}
    }

    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_depth() {
        assert_eq!(json_depth(&json!(1)), 1);
        assert_eq!(json_depth(&json!({})), 1);
        assert_eq!(json_depth(&json!([])), 1);
        assert_eq!(json_depth(&json!({"a": 1})), 1);
        assert_eq!(json_depth(&json!({"a": 1, "b": {"c": 2}})), 2);
        assert_eq!(json_depth(&json!([[1], [[2]]])), 3);
        assert_eq!(json_depth(&json!({"a": [{"b": {}}]})), 4);
    }

    #[test]
    fn test_json_keys() {
        let value = json!({"b": 1, "a": 2});
        let keys: Vec<_> = JsonShape::from(&value).keys().into_iter().collect();
        assert_eq!(keys, vec!["a", "b"]);

        assert!(JsonShape::from(&json!([{"a": 1}])).keys().is_empty());
    }

    #[test]
    fn test_extract_metadata_json() {
        let metadata = extract_metadata(r#"{"name": "John", "age": 30}"#, ContentType::Json);
        assert!(metadata.is_json());
        assert_eq!(metadata.json_depth(), Some(1));
        let keys = metadata.json_keys().unwrap();
        assert!(keys.contains("name") && keys.contains("age"));
    }

    #[test]
    fn test_extract_metadata_json_parse_failure_is_silent() {
        let metadata = extract_metadata("{not json", ContentType::Json);
        assert!(metadata.is_json());
        assert!(metadata.json_keys().is_none());
        assert!(metadata.json_depth().is_none());
    }

    #[test]
    fn test_extract_metadata_code_prefers_fence_tag() {
        let metadata = extract_metadata("```ts\nconst x = 1;\n```", ContentType::Code);
        assert_eq!(metadata.language(), Some("ts"));

        let metadata = extract_metadata("```\ndef run():\n    pass\n```", ContentType::Code);
        assert_eq!(metadata.language(), Some("python"));

        let metadata = extract_metadata("```\n???\n```", ContentType::Code);
        assert_eq!(metadata.language(), None);
    }

    #[test]
    fn test_language_only_for_code() {
        let metadata = extract_metadata("```rust\nfn main() {}\n```", ContentType::Mixed);
        assert_eq!(metadata.language(), None);
        assert!(!metadata.is_code());
    }

    #[test]
    fn test_metadata_serialization() {
        let metadata = extract_metadata(r#"{"a": 1}"#, ContentType::Json).with_confidence(1.0);
        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            value,
            json!({
                "isCode": false,
                "isJson": true,
                "isMarkdown": false,
                "isTable": false,
                "confidence": 1.0,
                "jsonKeys": ["a"],
                "jsonDepth": 1
            })
        );
    }

    #[test]
    fn test_consistency_check() {
        let metadata = ReplyMetadata::for_content_type(ContentType::Table);
        assert!(metadata.is_consistent_with(ContentType::Table));
        assert!(!metadata.is_consistent_with(ContentType::HtmlTable));
    }
}
