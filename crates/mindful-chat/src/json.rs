//! Tolerant extraction of JSON objects from model replies.
//!
//! Models are asked for bare JSON but often wrap it in prose or a fenced
//! code block. Two locators are provided: the span from the first `{` to
//! the last `}`, and a fenced ```` ```json ```` block falling back to the
//! outermost braces.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

use mindful_core::{Error, Result};

static FENCED_OR_OUTERMOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```json\s*([\s\S]*?)\s*```|(\{[\s\S]*\})").unwrap());

/// Result of a tolerant parse.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    /// The reply contained a valid object.
    Parsed(T),
    /// The reply could not be parsed; `value` is the caller's default.
    Fallback { value: T, reason: String },
    /// The reply could not be parsed and there is no default.
    Failed(String),
}

impl<T> ParseOutcome<T> {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseOutcome::Parsed(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ParseOutcome::Parsed(v) | ParseOutcome::Fallback { value: v, .. } => Some(v),
            ParseOutcome::Failed(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T> {
        match self {
            ParseOutcome::Parsed(v) | ParseOutcome::Fallback { value: v, .. } => Ok(v),
            ParseOutcome::Failed(reason) => Err(Error::Parse(reason)),
        }
    }
}

/// Text from the first `{` to the last `}`, inclusive.
pub fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Contents of the first fenced json block, else the outermost braces.
pub fn fenced_or_outermost(raw: &str) -> Option<&str> {
    let caps = FENCED_OR_OUTERMOST.captures(raw)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Parse the brace span of `raw`, substituting `default()` on any failure.
pub fn parse_brace_span<T, F>(raw: &str, default: F) -> ParseOutcome<T>
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    let Some(span) = brace_span(raw) else {
        return ParseOutcome::Fallback {
            value: default(),
            reason: "No JSON object found in response".into(),
        };
    };
    match serde_json::from_str(span) {
        Ok(v) => ParseOutcome::Parsed(v),
        Err(e) => ParseOutcome::Fallback {
            value: default(),
            reason: format!("Invalid JSON: {}", e),
        },
    }
}

/// Parse a fenced block or the outermost braces of `raw`; when neither is
/// present the whole reply is tried. No default.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> ParseOutcome<T> {
    match fenced_or_outermost(raw) {
        Some(candidate) => match serde_json::from_str(candidate) {
            Ok(v) => ParseOutcome::Parsed(v),
            Err(e) => ParseOutcome::Failed(format!("Failed to parse JSON: {}, JSON: {}", e, candidate)),
        },
        None => match serde_json::from_str(raw.trim()) {
            Ok(v) => ParseOutcome::Parsed(v),
            Err(_) => ParseOutcome::Failed(format!("Failed to extract JSON from response: {}", raw)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_brace_span_ignores_prose() {
        let raw = "Sure! Here you go: {\"a\": {\"b\": 1}} Hope that helps.";
        assert_eq!(brace_span(raw), Some("{\"a\": {\"b\": 1}}"));
        assert_eq!(brace_span("no json here"), None);
        assert_eq!(brace_span("} backwards {"), None);
    }

    #[test]
    fn test_fenced_block_preferred() {
        let raw = "Intro {ignored}\n```json\n{\"x\": 2}\n```";
        // the fence wins only when it appears before any brace
        assert_eq!(fenced_or_outermost(raw), Some("{ignored}\n```json\n{\"x\": 2}"));
        let raw = "```json\n{\"x\": 2}\n```\ntrailing";
        assert_eq!(fenced_or_outermost(raw), Some("{\"x\": 2}"));
    }

    #[test]
    fn test_parse_brace_span_fallback() {
        let outcome: ParseOutcome<Value> = parse_brace_span("I can't do that", || json!({"d": 1}));
        assert!(matches!(outcome, ParseOutcome::Fallback { ref value, .. } if value == &json!({"d": 1})));

        let outcome: ParseOutcome<Value> = parse_brace_span("{broken: }", || json!(null));
        assert!(!outcome.is_parsed());
        assert_eq!(outcome.value(), Some(&json!(null)));

        let outcome: ParseOutcome<Value> = parse_brace_span("ok {\"k\": true}", || json!(null));
        assert_eq!(outcome, ParseOutcome::Parsed(json!({"k": true})));
    }

    #[test]
    fn test_parse_structured_failures() {
        let outcome: ParseOutcome<Value> = parse_structured("```json\n{\"a\": }\n```");
        assert!(matches!(outcome, ParseOutcome::Failed(ref m) if m.starts_with("Failed to parse JSON")));

        let outcome: ParseOutcome<Value> = parse_structured("plain words");
        assert!(matches!(outcome.clone().into_result(), Err(Error::Parse(_))));

        let outcome: ParseOutcome<Value> = parse_structured("[1, 2]");
        assert_eq!(outcome, ParseOutcome::Parsed(json!([1, 2])));
    }
}
