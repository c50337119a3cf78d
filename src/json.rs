//! Recover a JSON object from free-form model output.
//!
//! Vision models asked for "JSON only" still wrap their answer in
//! ```` ```json ```` fences, prepend "Here is the extracted data:", or append a
//! closing remark. [`extract_first_json_object`] finds the first balanced
//! `{...}` in such text with a lexical scan; [`parse_model_json`] applies the
//! usual policy of trying the whole reply first and extracting only if that
//! fails.
//!
//! The scan is purely lexical. It tracks brace depth, whether it is inside a
//! string literal, and whether the previous character was a backslash inside
//! that string. It does not validate JSON grammar; `serde_json` does that on
//! the returned slice.

use crate::error::ExtractError;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Return the first balanced `{...}` substring of `text`.
///
/// Braces and quotes inside string literals are ignored, so values such as
/// `"}"` or `"say \"hi\""` do not disturb the depth count.
///
/// # Errors
/// - [`ExtractError::NoJsonStart`] if `text` contains no `{`
/// - [`ExtractError::UnbalancedJson`] if the text ends before the object closes
///
/// # Example
/// ```rust
/// use receipt_prep::extract_first_json_object;
///
/// let reply = "```json\n{\"x\":1}\n```";
/// assert_eq!(extract_first_json_object(reply).unwrap(), "{\"x\":1}");
/// ```
pub fn extract_first_json_object(text: &str) -> Result<&str, ExtractError> {
    let start = text.find('{').ok_or(ExtractError::NoJsonStart)?;

    // Every structural character is ASCII, and ASCII bytes never occur inside
    // a multi-byte UTF-8 sequence, so a byte scan yields char-boundary indices.
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + 1;
                    debug!(start, end, "Extracted JSON object");
                    return Ok(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    Err(ExtractError::UnbalancedJson)
}

/// Parse a model reply into `T`, tolerating text around the JSON.
///
/// The whole (trimmed) reply is parsed first. Only if that fails is the first
/// balanced object extracted and parsed.
///
/// # Errors
/// Extraction errors from [`extract_first_json_object`], or
/// [`ExtractError::InvalidJson`] when the extracted object does not parse as `T`.
pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> Result<T, ExtractError> {
    match serde_json::from_str(text.trim()) {
        Ok(value) => Ok(value),
        Err(e) => {
            debug!(error = %e, "Reply is not bare JSON; scanning for an object");
            let object = extract_first_json_object(text)?;
            serde_json::from_str(object).map_err(|source| ExtractError::InvalidJson { source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn brace_inside_string_is_ignored() {
        let text = "prefix {\"a\": \"}\", \"b\":1} suffix";
        assert_eq!(extract_first_json_object(text).unwrap(), "{\"a\": \"}\", \"b\":1}");
    }

    #[test]
    fn no_brace_is_no_start() {
        assert!(matches!(
            extract_first_json_object("no braces here"),
            Err(ExtractError::NoJsonStart)
        ));
        assert!(matches!(extract_first_json_object(""), Err(ExtractError::NoJsonStart)));
    }

    #[test]
    fn unclosed_object_is_unbalanced() {
        assert!(matches!(
            extract_first_json_object("{ \"a\": 1"),
            Err(ExtractError::UnbalancedJson)
        ));
        // The closing brace is inside an unterminated string.
        assert!(matches!(
            extract_first_json_object("{\"a\": \"}"),
            Err(ExtractError::UnbalancedJson)
        ));
    }

    #[test]
    fn markdown_fence_is_ignored() {
        assert_eq!(
            extract_first_json_object("```json\n{\"x\":1}\n```").unwrap(),
            "{\"x\":1}"
        );
    }

    #[test]
    fn escaped_quote_stays_in_string() {
        let text = r#"{"say": "he said \"}\" loudly", "n": 2} trailing"#;
        assert_eq!(
            extract_first_json_object(text).unwrap(),
            r#"{"say": "he said \"}\" loudly", "n": 2}"#
        );
    }

    #[test]
    fn escaped_backslash_before_quote_closes_string() {
        // The string value is a single backslash; the quote after `\\` closes it.
        let text = r#"{"path": "C:\\"} after {"x": 1}"#;
        assert_eq!(extract_first_json_object(text).unwrap(), r#"{"path": "C:\\"}"#);
    }

    #[test]
    fn nested_objects_return_outermost() {
        let text = "note: {\"a\": {\"b\": {\"c\": []}}, \"d\": 0} and {\"e\": 1}";
        assert_eq!(
            extract_first_json_object(text).unwrap(),
            "{\"a\": {\"b\": {\"c\": []}}, \"d\": 0}"
        );
    }

    #[test]
    fn stray_closing_brace_before_object_is_skipped() {
        // Scanning starts at the first `{`, so an earlier `}` is never seen.
        assert_eq!(extract_first_json_object("} oops {\"k\":1}").unwrap(), "{\"k\":1}");
    }

    #[test]
    fn multibyte_text_slices_on_char_boundaries() {
        let text = "Voilà ✓ {\"café\": \"crème ☕ }\"} fin";
        assert_eq!(
            extract_first_json_object(text).unwrap(),
            "{\"café\": \"crème ☕ }\"}"
        );
    }

    #[test]
    fn parse_prefers_whole_reply() {
        let v: Value = parse_model_json("  {\"total\": 12.5}\n").unwrap();
        assert_eq!(v, json!({"total": 12.5}));
        // A bare array is valid JSON and is returned without extraction.
        let v: Value = parse_model_json("[1, 2]").unwrap();
        assert_eq!(v, json!([1, 2]));
    }

    #[test]
    fn parse_falls_back_to_extraction() {
        let reply = "Sure! Here is the receipt:\n```json\n{\"merchant\": \"Cafe {Blue}\"}\n```\nAnything else?";
        let v: Value = parse_model_json(reply).unwrap();
        assert_eq!(v, json!({"merchant": "Cafe {Blue}"}));
    }

    #[test]
    fn parse_reports_invalid_extracted_json() {
        let err = parse_model_json::<Value>("result: {trailing, comma,}").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidJson { .. }));
    }

    #[test]
    fn parse_empty_reply_has_no_start() {
        let err = parse_model_json::<Value>("   ").unwrap_err();
        assert!(matches!(err, ExtractError::NoJsonStart));
    }
}
