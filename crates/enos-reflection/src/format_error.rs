//! `format_error` sub-mode: the LLM's raw response failed JSON extraction.
//! Try to salvage a candidate id locally before asking the LLM to retry.

use enos_core::reflection::{Reflection, ReflectionType};
use serde_json::Value;

/// Field names other than the canonical `enosPoint`/`function`/`equipment_type`
/// a model might plausibly use instead, worth trying before giving up.
const ALTERNATE_FIELD_NAMES: &[&str] = &["enos_point", "enosPoint", "id", "point", "canonical_id", "canonicalId"];

/// Outcome of attempting local recovery from a malformed LLM response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// A candidate id was found inside the allowed set; rewrite the
    /// `Mapping` locally, no further LLM call needed.
    Recovered(String),
    /// Nothing recoverable; retry with this corrective prompt.
    Retry,
}

fn find_value_with_alternate_field(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw.trim()).ok()?;
    let obj = value.as_object()?;
    ALTERNATE_FIELD_NAMES
        .iter()
        .find_map(|key| obj.get(*key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn find_bare_identifier(raw: &str, candidate_ids: &[String]) -> Option<String> {
    candidate_ids.iter().find(|id| raw.contains(id.as_str())).cloned()
}

/// Try to salvage a candidate id from a response that failed strict JSON
/// extraction: wrong field name, or a bare identifier embedded in prose.
/// Truncated JSON (an open `{` with no matching close) recovers nothing and
/// always falls through to `Recovery::Retry`.
#[must_use]
pub fn recover(raw: &str, candidate_ids: &[String]) -> (Reflection, Recovery) {
    let mut reflection = Reflection::new(ReflectionType::FormatError);
    reflection.analysis.push(format!("raw response failed JSON extraction ({} bytes)", raw.len()));

    if let Some(id) = find_value_with_alternate_field(raw).filter(|id| candidate_ids.iter().any(|c| c == id)) {
        reflection.analysis.push(format!("recovered candidate id '{id}' from an alternate field name"));
        return (reflection, Recovery::Recovered(id));
    }
    if let Some(id) = find_bare_identifier(raw, candidate_ids) {
        reflection.analysis.push(format!("recovered candidate id '{id}' as a bare identifier in the response text"));
        return (reflection, Recovery::Recovered(id));
    }

    reflection.analysis.push("no candidate id recoverable locally; issuing a corrective prompt".to_string());
    reflection.corrected_format = Some(format!(
        "Respond with exactly one JSON object of the form {{\"enosPoint\": \"<id>\"}}, \
         where <id> is one of: {}, or \"unknown\". No other text, no markdown fences.",
        candidate_ids.join(", ")
    ));
    (reflection, Recovery::Retry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_from_alternate_field_name() {
        let (reflection, recovery) = recover(r#"{"enos_point": "CH-SYS_PUMP_raw_frequency"}"#, &["CH-SYS_PUMP_raw_frequency".to_string()]);
        assert_eq!(recovery, Recovery::Recovered("CH-SYS_PUMP_raw_frequency".to_string()));
        assert_eq!(reflection.reflection_type, ReflectionType::FormatError);
    }

    #[test]
    fn recovers_bare_identifier_in_prose() {
        let raw = "I believe the best match is CH-SYS_PUMP_raw_frequency given the units.";
        let (_, recovery) = recover(raw, &["CH-SYS_PUMP_raw_frequency".to_string(), "CH-SYS_VALVE_position".to_string()]);
        assert_eq!(recovery, Recovery::Recovered("CH-SYS_PUMP_raw_frequency".to_string()));
    }

    #[test]
    fn truncated_json_falls_through_to_retry_with_corrective_prompt() {
        let raw = r#"{"enosPoint": "CH-SYS_PUM"#;
        let (reflection, recovery) = recover(raw, &["CH-SYS_PUMP_raw_frequency".to_string()]);
        assert_eq!(recovery, Recovery::Retry);
        assert!(reflection.corrected_format.is_some());
    }

    #[test]
    fn unrelated_text_is_not_falsely_recovered() {
        let raw = "unknown";
        let (_, recovery) = recover(raw, &["CH-SYS_PUMP_raw_frequency".to_string()]);
        assert_eq!(recovery, Recovery::Retry);
    }
}
