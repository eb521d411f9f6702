//! JSON extraction from raw LLM text.

use crate::error::FormatError;
use serde::de::DeserializeOwned;

/// Find the last balanced `{...}` span in `text`, scanning from the end.
/// Tracks brace depth and skips braces inside string literals so that a
/// `{` appearing in prose before the payload does not break the count.
fn last_balanced_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut candidates: Vec<(usize, usize)> = Vec::new();

    let mut depth: i32 = 0;
    let mut start: Option<usize> = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        candidates.push((s, i + 1));
                    }
                } else if depth < 0 {
                    depth = 0;
                    start = None;
                }
            }
            _ => {}
        }
    }

    candidates.last().map(|&(s, e)| &text[s..e])
}

/// Extract and parse the last balanced JSON object in `text` as `T`.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, FormatError> {
    let candidate = last_balanced_object(text).ok_or_else(|| FormatError {
        reason: "no balanced '{...}' span found".to_string(),
        raw: text.to_string(),
    })?;
    serde_json::from_str(candidate).map_err(|e| FormatError {
        reason: format!("JSON parse failed: {e}"),
        raw: text.to_string(),
    })
}

/// Extract the raw `serde_json::Value` without a known target shape, used by
/// Reflection's `format_error` salvage path to inspect a malformed response.
pub fn extract_json_value(text: &str) -> Result<serde_json::Value, FormatError> {
    extract_json(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Envelope {
        #[serde(rename = "enosPoint")]
        enos_point: String,
    }

    #[test]
    fn extracts_clean_json() {
        let out: Envelope = extract_json(r#"{"enosPoint": "CH-SYS_1_PUMP_raw_frequency"}"#).unwrap();
        assert_eq!(out.enos_point, "CH-SYS_1_PUMP_raw_frequency");
    }

    #[test]
    fn extracts_last_balanced_object_from_surrounding_prose() {
        let text = r#"Sure, here is my answer: {"note": "intermediate"} and the final result is {"enosPoint": "X"}"#;
        let out: Envelope = extract_json(text).unwrap();
        assert_eq!(out.enos_point, "X");
    }

    #[test]
    fn ignores_braces_inside_string_literals() {
        let text = r#"{"enosPoint": "weird{brace}name"}"#;
        let out: Envelope = extract_json(text).unwrap();
        assert_eq!(out.enos_point, "weird{brace}name");
    }

    #[test]
    fn markdown_fenced_json_is_recovered() {
        let text = "```json\n{\"enosPoint\": \"Y\"}\n```";
        let out: Envelope = extract_json(text).unwrap();
        assert_eq!(out.enos_point, "Y");
    }

    #[test]
    fn truncated_json_raises_format_error_with_raw_text() {
        let text = r#"{"enosPoint": "X""#;
        let err = extract_json::<Envelope>(text).unwrap_err();
        assert_eq!(err.raw, text);
    }

    #[test]
    fn wrong_field_name_raises_format_error() {
        let text = r#"{"point": "X"}"#;
        let err = extract_json::<Envelope>(text).unwrap_err();
        assert!(err.reason.contains("parse"));
    }
}
