//! Tolerant recovery of the JSON array embedded in a portal response.

use ai_llm_service::error_handler::make_snippet;
use serde_json::Value;
use tracing::debug;

use crate::errors::{CorpusError, Result};

/// Parses the substring from the first `[` to the last `]` of `body` as JSON.
///
/// SharePoint wraps the useful payload in noise; everything outside the outermost
/// brackets is ignored.
///
/// # Errors
/// [`CorpusError::MalformedPayload`] when no bracket pair exists or the slice is not valid JSON.
/// The error carries an excerpt of the raw body.
pub fn recover_payload(body: &str) -> Result<Value> {
    let malformed = |reason: String| CorpusError::MalformedPayload {
        reason,
        excerpt: make_snippet(body),
    };

    let start = body
        .find('[')
        .ok_or_else(|| malformed("no '[' in response".into()))?;
    let end = body
        .rfind(']')
        .ok_or_else(|| malformed("no ']' in response".into()))?;
    if end < start {
        return Err(malformed("last ']' precedes first '['".into()));
    }

    let slice = &body[start..=end];
    let value: Value = serde_json::from_str(slice).map_err(|e| malformed(e.to_string()))?;
    debug!(target: "legis_corpus::payload", bytes = slice.len(), "payload recovered");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_noise_around_array() {
        let v = recover_payload(r#"while(1); [{"a": 1}, [2]] tail"#).unwrap();
        assert_eq!(v, json!([{"a": 1}, [2]]));
    }

    #[test]
    fn bracket_in_prefix_breaks_the_slice() {
        let v = recover_payload(r#"log[1: {"a": 1}]"#);
        assert!(matches!(v, Err(CorpusError::MalformedPayload { .. })));
    }

    #[test]
    fn missing_brackets_is_malformed() {
        let err = recover_payload("<html>Forbidden</html>").unwrap_err();
        match err {
            CorpusError::MalformedPayload { excerpt, .. } => {
                assert_eq!(excerpt, "<html>Forbidden</html>")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn long_bodies_are_cut_to_a_snippet() {
        let body = format!("  {}  ", "é".repeat(1000));
        match recover_payload(&body).unwrap_err() {
            CorpusError::MalformedPayload { excerpt, .. } => {
                assert_eq!(excerpt.chars().count(), ai_llm_service::error_handler::SNIPPET_MAX_CHARS);
                assert!(excerpt.starts_with('é'));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reversed_brackets_is_malformed() {
        assert!(matches!(
            recover_payload("] nothing ["),
            Err(CorpusError::MalformedPayload { .. })
        ));
    }
}
