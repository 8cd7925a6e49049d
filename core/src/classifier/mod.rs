//! Reply classification.
//!
//! [`classify`] runs an ordered rule cascade over the trimmed reply text and
//! attaches metadata for the winning content type. It is a pure function:
//! no I/O, no shared state, safe to call from any task.

mod language;
mod metadata;
mod rules;

pub use language::detect_language;
pub use metadata::{extract_metadata, json_depth, ClassifiedReply, JsonShape, ReplyMetadata};
pub use rules::{
    detect, fenced_regions, markdown_signals, outside_ratio, Detection, MarkdownSignal, Rule,
    MIN_KEYWORD_COUNT, MIN_KEYWORD_DENSITY, MIN_MARKDOWN_SIGNALS, MIXED_OUTSIDE_RATIO,
};

use tracing::debug;

/// Classify a raw model reply. Never fails.
pub fn classify(raw: &str) -> ClassifiedReply {
    let content = raw.trim();
    let detection = rules::detect(content);
    let mut metadata = extract_metadata(content, detection.content_type);
    if let Some(confidence) = detection.rule.confidence() {
        metadata = metadata.with_confidence(confidence);
    }

    debug!(
        content_type = %detection.content_type,
        rule = ?detection.rule,
        language = metadata.language().unwrap_or("-"),
        length = content.len(),
        "classified reply"
    );

    ClassifiedReply::new(content.to_string(), detection.content_type, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentType;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_empty_reply() {
        let reply = classify("");
        assert_eq!(reply.content_type(), ContentType::Text);
        let metadata = reply.metadata();
        assert!(!metadata.is_code());
        assert!(!metadata.is_json());
        assert!(!metadata.is_markdown());
        assert!(!metadata.is_table());
        assert!(metadata.language().is_none());
        assert!(metadata.json_keys().is_none());
        assert!(metadata.confidence().is_none());

        let wire = serde_json::to_value(metadata).unwrap();
        assert_eq!(
            wire,
            serde_json::json!({"isCode": false, "isJson": false, "isMarkdown": false, "isTable": false})
        );
    }

    #[test]
    fn test_whitespace_only_reply_is_empty() {
        let reply = classify("  \n\t ");
        assert_eq!(reply.content(), "");
        assert_eq!(reply.content_type(), ContentType::Text);
    }

    #[test]
    fn test_json_reply() {
        let reply = classify(r#"{"a":1,"b":{"c":2}}"#);
        assert_eq!(reply.content_type(), ContentType::Json);

        let keys: Vec<_> = reply.metadata().json_keys().unwrap().iter().cloned().collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(reply.metadata().json_depth(), Some(2));
        assert!(reply.metadata().is_json());
    }

    #[test]
    fn test_json_array_has_empty_keys() {
        let reply = classify("[{\"a\": 1}, {\"b\": 2}]");
        assert_eq!(reply.content_type(), ContentType::Json);
        assert!(reply.metadata().json_keys().unwrap().is_empty());
        assert_eq!(reply.metadata().json_depth(), Some(2));
    }

    #[test]
    fn test_broken_json_is_raw() {
        let reply = classify(r#"{"a": }"#);
        assert_eq!(reply.content_type(), ContentType::Raw);
        assert!(!reply.metadata().is_json());
        assert!(reply.metadata().json_keys().is_none());
    }

    #[test]
    fn test_fenced_code_reply() {
        let reply = classify("```javascript\nconsole.log(1)\n```");
        assert_eq!(reply.content_type(), ContentType::Code);
        assert_eq!(reply.metadata().language(), Some("javascript"));
        assert!(reply.metadata().is_code());
    }

    #[test]
    fn test_mixed_reply() {
        let reply = classify(
            "Some explanation text that is reasonably long surrounding:\n```js\nconsole.log(1)\n```\nand more trailing explanation text here.",
        );
        assert_eq!(reply.content_type(), ContentType::Mixed);
        assert!(!reply.metadata().is_code());
    }

    #[test]
    fn test_table_reply() {
        let reply = classify("| A | B |\n| --- | --- |\n| 1 | 2 |");
        assert_eq!(reply.content_type(), ContentType::Table);
        assert!(reply.metadata().is_table());
    }

    #[test]
    fn test_markdown_reply() {
        let reply = classify("# Title\n\n- item one\n- item two");
        assert_eq!(reply.content_type(), ContentType::Markdown);
        assert!(reply.metadata().is_markdown());
    }

    #[test]
    fn test_content_is_trimmed_only() {
        let reply = classify("\n\n  Hello there.  \n");
        assert_eq!(reply.content(), "Hello there.");
        assert_eq!(reply.content_type(), ContentType::Text);
    }

    #[test]
    fn test_keyword_code_gets_language_from_table() {
        let reply = classify(
            "def load(path):\n    import json\n    for line in open(path):\n        if line:\n            try:\n                yield json.loads(line)\n            except ValueError:\n                continue",
        );
        assert_eq!(reply.content_type(), ContentType::Code);
        assert_eq!(reply.metadata().language(), Some("python"));
    }

    #[test]
    fn test_confidence_attached() {
        let confidence = classify("plain words").metadata().confidence().unwrap();
        assert!((0.0..=1.0).contains(&confidence));
    }

    #[test]
    fn test_serialized_reply_shape() {
        let reply = classify("```rust\nfn main() {}\n```");
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["contentType"], "code");
        assert_eq!(value["metadata"]["language"], "rust");
        assert_eq!(value["metadata"]["isCode"], true);
        assert!(value["metadata"].get("jsonKeys").is_none());
    }

    const FRAGMENTS: &[&str] = &[
        "{", "}", "[", "]", "\"a\"", ":", "1", ",", "|", "---", "| --- |", "```", "```js", "\n",
        " ", "# ", "- ", "1. ", "> ", "**", "*", "`", "[x](y)", "CODE", "<table>", "</table>",
        "const", "function", "if", "for", "hello", "world", "$", "%", "é", "null",
    ];

    fn random_reply(rng: &mut StdRng) -> String {
        let len = rng.random_range(0..40);
        (0..len)
            .map(|_| FRAGMENTS[rng.random_range(0..FRAGMENTS.len())])
            .collect()
    }

    #[test]
    fn test_fuzz_metadata_flags_match_content_type() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..2000 {
            let raw = random_reply(&mut rng);
            let reply = classify(&raw);

            assert!(
                reply.metadata().is_consistent_with(reply.content_type()),
                "inconsistent metadata for {:?}: {:?}",
                raw,
                reply
            );
            let flags = [
                reply.metadata().is_code(),
                reply.metadata().is_json(),
                reply.metadata().is_markdown(),
                reply.metadata().is_table(),
            ];
            assert!(flags.iter().filter(|flag| **flag).count() <= 1);
            assert_eq!(reply, classify(&raw), "classification not idempotent for {:?}", raw);
        }
    }
}
