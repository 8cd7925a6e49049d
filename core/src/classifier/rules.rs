//! Ordered detection rules. The first rule that matches decides the content type.

use crate::types::ContentType;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;
use tracing::trace;

/// Share of non-whitespace text allowed outside fenced regions before a
/// fenced reply counts as `mixed` instead of `code`.
pub const MIXED_OUTSIDE_RATIO: f64 = 0.3;

/// Minimum number of programming keywords for the density rule
pub const MIN_KEYWORD_COUNT: usize = 5;

/// Keyword matches must exceed this share of all words
pub const MIN_KEYWORD_DENSITY: f64 = 0.10;

/// Distinct markdown signal categories needed for `markdown`
pub const MIN_MARKDOWN_SIGNALS: usize = 2;

static HTML_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<table\b[^>]*>.*?</table\s*>").expect("valid regex"));

static TABLE_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\|?(?:[ \t]*:?-{3,}:?[ \t]*\|)*[ \t]*:?-{3,}:?[ \t]*\|?$").expect("valid regex")
});

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[ \t]*([\w+#.-]*)[^\n]*?\n(.*?)```").expect("valid regex")
});

static CODE_MARKER_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mR)^[ \t]*CODE[ \t]*\r?\n(?s:.*?)\n[ \t]*CODE[ \t]*$").expect("valid regex")
});

static PROGRAMMING_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:function|const|let|var|if|for|while|switch|try|catch|class|import|export|def|async|await|public|private|protected)\b",
    )
    .expect("valid regex")
});

static PLAIN_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[\w\s.,!?;:'"()\-‘’“”–—…]*$"#).expect("valid regex")
});

/// Kinds of markdown syntax counted by the markdown rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkdownSignal {
    Header,
    UnorderedList,
    OrderedList,
    Link,
    Emphasis,
    InlineCode,
    Blockquote,
    HorizontalRule,
}

static MARKDOWN_SIGNALS: Lazy<Vec<(MarkdownSignal, Regex)>> = Lazy::new(|| {
    [
        (MarkdownSignal::Header, r"(?m)^#{1,6}[ \t]+\S"),
        (MarkdownSignal::UnorderedList, r"(?m)^[ \t]*[-*+][ \t]+\S"),
        (MarkdownSignal::OrderedList, r"(?m)^[ \t]*\d+\.[ \t]+\S"),
        (MarkdownSignal::Link, r"!?\[[^\]\n]*\]\([^)\s]+\)"),
        (
            MarkdownSignal::Emphasis,
            r"\*\*[^*\n]+\*\*|__[^_\n]+__|\*[^*\s][^*\n]*\*|\b_[^_\s][^_\n]*_\b",
        ),
        (MarkdownSignal::InlineCode, r"`[^`\n]+`"),
        (MarkdownSignal::Blockquote, r"(?m)^[ \t]*>[ \t]?\S"),
        (
            MarkdownSignal::HorizontalRule,
            r"(?m)^[ \t]*(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$",
        ),
    ]
    .into_iter()
    .map(|(signal, pattern)| (signal, Regex::new(pattern).expect("valid regex")))
    .collect()
});

/// The rule that produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Empty,
    HtmlTable,
    Json,
    MalformedJson,
    PipeTable,
    FencedCode,
    MixedFences,
    KeywordDensity,
    MarkdownSignals,
    PlainText,
    Unstructured,
}

impl Rule {
    /// Static confidence annotation attached to replies decided by this rule.
    /// Empty replies carry no metadata beyond the derived flags.
    pub fn confidence(&self) -> Option<f32> {
        let confidence = match self {
            Rule::Empty => return None,
            Rule::Json => 1.0,
            Rule::HtmlTable => 0.95,
            Rule::PipeTable | Rule::FencedCode => 0.9,
            Rule::MixedFences | Rule::MarkdownSignals => 0.8,
            Rule::KeywordDensity => 0.7,
            Rule::MalformedJson | Rule::PlainText => 0.6,
            Rule::Unstructured => 0.5,
        };
        Some(confidence)
    }
}

/// Outcome of running the rule cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub content_type: ContentType,
    pub rule: Rule,
}

impl Detection {
    fn new(content_type: ContentType, rule: Rule) -> Self {
        Self { content_type, rule }
    }
}

/// Run the cascade over already trimmed content
pub fn detect(content: &str) -> Detection {
    if content.is_empty() {
        return Detection::new(ContentType::Text, Rule::Empty);
    }

    if HTML_TABLE.is_match(content) {
        return Detection::new(ContentType::HtmlTable, Rule::HtmlTable);
    }

    if let Some(detection) = detect_json(content) {
        return detection;
    }

    if is_pipe_table(content) {
        return Detection::new(ContentType::Table, Rule::PipeTable);
    }

    let regions = fenced_regions(content);
    if !regions.is_empty() {
        let ratio = outside_ratio(content, &regions);
        trace!(ratio, blocks = regions.len(), "fenced regions found");
        return if ratio > MIXED_OUTSIDE_RATIO {
            Detection::new(ContentType::Mixed, Rule::MixedFences)
        } else {
            Detection::new(ContentType::Code, Rule::FencedCode)
        };
    }

    if has_keyword_density(content) {
        return Detection::new(ContentType::Code, Rule::KeywordDensity);
    }

    if markdown_signals(content).len() >= MIN_MARKDOWN_SIGNALS {
        return Detection::new(ContentType::Markdown, Rule::MarkdownSignals);
    }

    if PLAIN_TEXT.is_match(content) {
        Detection::new(ContentType::Text, Rule::PlainText)
    } else {
        Detection::new(ContentType::Raw, Rule::Unstructured)
    }
}

fn detect_json(content: &str) -> Option<Detection> {
    let opens_object = content.starts_with('{');
    let opens_array = content.starts_with('[');
    if !opens_object && !opens_array {
        return None;
    }

    if serde_json::from_str::<serde_json::Value>(content).is_ok() {
        return Some(Detection::new(ContentType::Json, Rule::Json));
    }

    let closes = (opens_object && content.ends_with('}')) || (opens_array && content.ends_with(']'));
    closes.then(|| Detection::new(ContentType::Raw, Rule::MalformedJson))
}

fn is_pipe_table(content: &str) -> bool {
    let mut lines = content.lines().skip_while(|line| line.trim().is_empty());
    let header = match lines.next() {
        Some(line) => line.trim(),
        None => return false,
    };
    if !header.contains('|') {
        return false;
    }
    lines
        .next()
        .map(|line| TABLE_SEPARATOR.is_match(line.trim()))
        .unwrap_or(false)
}

/// Byte ranges covered by triple-backtick fences or paired `CODE` marker
/// lines, sorted and merged.
pub fn fenced_regions(content: &str) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = FENCED_BLOCK
        .find_iter(content)
        .chain(CODE_MARKER_BLOCK.find_iter(content))
        .map(|m| m.range())
        .collect();
    ranges.sort_by_key(|range| range.start);

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

/// Non-whitespace characters outside `regions` over all non-whitespace characters
pub fn outside_ratio(content: &str, regions: &[Range<usize>]) -> f64 {
    let visible = |text: &str| text.chars().filter(|c| !c.is_whitespace()).count();

    let total = visible(content);
    if total == 0 {
        return 0.0;
    }

    let mut outside = 0;
    let mut cursor = 0;
    for region in regions {
        outside += visible(&content[cursor..region.start]);
        cursor = region.end;
    }
    outside += visible(&content[cursor..]);

    outside as f64 / total as f64
}

/// Language tag on the first fenced block, if any
pub fn first_fence_tag(content: &str) -> Option<String> {
    FENCED_BLOCK
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|tag| tag.as_str().trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
}

fn has_keyword_density(content: &str) -> bool {
    let keywords = PROGRAMMING_KEYWORD.find_iter(content).count();
    if keywords < MIN_KEYWORD_COUNT {
        return false;
    }
    let words = content.split_whitespace().count().max(1);
    keywords as f64 / words as f64 > MIN_KEYWORD_DENSITY
}

/// Distinct markdown signal categories present in `content`
pub fn markdown_signals(content: &str) -> Vec<MarkdownSignal> {
    MARKDOWN_SIGNALS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(content))
        .map(|(signal, _)| *signal)
        .collect()
}
