//! Programming language guesses for code replies

use once_cell::sync::Lazy;
use regex::Regex;

/// One distinguishing pattern per language, checked in order
static LANGUAGE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        (
            "javascript",
            r"console\.log\(|\bfunction\s*\w*\s*\(|\b(?:const|let|var)\s+\w+\s*=|=>|\brequire\(|\bdocument\.",
        ),
        (
            "python",
            r"(?m)^\s*(?:def\s+\w+\s*\(.*\)\s*(?:->\s*[\w\[\], .]+)?:|from\s+[\w.]+\s+import\s|import\s+\w+\s*$|elif\s|print\()",
        ),
        (
            "java",
            r"\bpublic\s+(?:static\s+)?(?:final\s+)?(?:class|void|int|String)\b|System\.out\.print",
        ),
        (
            "rust",
            r"\bfn\s+\w+\s*[(<]|\blet\s+mut\s|\bimpl\b|\bprintln!|\buse\s+\w+::",
        ),
        (
            "sql",
            r"(?i)\bSELECT\s+[\w*,\s.]+\s+FROM\b|\bINSERT\s+INTO\b|\bUPDATE\s+\w+\s+SET\b|\bCREATE\s+TABLE\b|\bDELETE\s+FROM\b",
        ),
        (
            "bash",
            r"(?m)^#!/(?:usr/)?bin/(?:env\s+)?(?:ba)?sh|^\s*(?:echo|sudo|apt(?:-get)?|cd|ls|grep|chmod|mkdir)\s",
        ),
    ]
    .into_iter()
    .map(|(language, pattern)| (language, Regex::new(pattern).expect("valid regex")))
    .collect()
});

/// Guess the language of `content` from the pattern table. First match wins.
pub fn detect_language(content: &str) -> Option<String> {
    LANGUAGE_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(content))
        .map(|(language, _)| language.to_string())
}
