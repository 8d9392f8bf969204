use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::domain::common::entities::app_errors::ExtractionError;

const EXCERPT_CHARS: usize = 500;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json|JSON)?\s*(\{[\s\S]*\})\s*```").expect("fenced block pattern is valid")
});

/// Recovers a JSON object from free-text model output.
///
/// Tries the outermost `{`..`}` span first, then an object inside a fenced
/// code block. Prose before or after the payload is ignored, and a fence
/// holding no object counts as no JSON at all.
pub fn extract_json(raw: &str) -> Result<Value, ExtractionError> {
    let text = raw.trim();

    let span = brace_span(text);
    let span_error = match span.map(serde_json::from_str::<Value>) {
        Some(Ok(value)) => return Ok(value),
        Some(Err(e)) => Some(e),
        None => None,
    };

    if let Some(block) = fenced_block(text) {
        match serde_json::from_str::<Value>(block) {
            Ok(value) => return Ok(value),
            Err(e) if span_error.is_none() => {
                return Err(invalid_json(&e, block));
            }
            Err(_) => {}
        }
    }

    match (span, span_error) {
        (Some(span), Some(e)) => {
            tracing::error!(
                error = %e,
                excerpt = %excerpt(span),
                "Model output contained an unparsable JSON span"
            );
            Err(invalid_json(&e, span))
        }
        _ => Err(ExtractionError::NoJson),
    }
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn fenced_block(text: &str) -> Option<&str> {
    FENCED_BLOCK
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

fn invalid_json(error: &serde_json::Error, source: &str) -> ExtractionError {
    ExtractionError::InvalidJson {
        message: error.to_string(),
        excerpt: excerpt(source),
    }
}

fn excerpt(source: &str) -> String {
    source.chars().take(EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_plain_json() {
        let value = extract_json(r#"{"productName": "Granola", "confidence": 80}"#).unwrap();
        assert_eq!(value, json!({"productName": "Granola", "confidence": 80}));
    }

    #[test]
    fn test_extract_json_wrapped_in_prose() {
        let raw = "Sure! Here is the analysis:\n{\"productName\": \"Granola\"}\nLet me know.";
        assert_eq!(
            extract_json(raw).unwrap(),
            extract_json(r#"{"productName": "Granola"}"#).unwrap()
        );
    }

    #[test]
    fn test_extract_json_from_fenced_block() {
        let raw = "```json\n{\"productName\": \"Granola\", \"allergens\": [\"oats\"]}\n```";
        assert_eq!(
            extract_json(raw).unwrap(),
            json!({"productName": "Granola", "allergens": ["oats"]})
        );
    }

    #[test]
    fn test_fenced_block_wins_over_stray_braces() {
        let raw = "```json\n{\"a\": 1}\n```\nNote: values in {braces} are estimates.";
        assert_eq!(extract_json(raw).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_no_json() {
        assert_eq!(
            extract_json("I could not read the label, sorry."),
            Err(ExtractionError::NoJson)
        );
        assert_eq!(extract_json("   "), Err(ExtractionError::NoJson));
        assert_eq!(extract_json("} backwards {"), Err(ExtractionError::NoJson));
    }

    #[test]
    fn test_invalid_json_carries_excerpt() {
        let err = extract_json("Result: {\"productName\": \"Granola\",}").unwrap_err();
        match err {
            ExtractionError::InvalidJson { message, excerpt } => {
                assert!(!message.is_empty());
                assert!(excerpt.starts_with("{\"productName\""));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_excerpt_is_truncated() {
        let raw = format!("{{\"x\": \"{}\" oops}}", "y".repeat(2000));
        match extract_json(&raw).unwrap_err() {
            ExtractionError::InvalidJson { excerpt, .. } => {
                assert_eq!(excerpt.chars().count(), EXCERPT_CHARS)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fenced_prose_is_no_json() {
        assert_eq!(
            extract_json("```text\nI could not read the label.\n```"),
            Err(ExtractionError::NoJson)
        );
        assert_eq!(
            extract_json("```json\n[1, 2]\n```"),
            Err(ExtractionError::NoJson)
        );
    }
}
