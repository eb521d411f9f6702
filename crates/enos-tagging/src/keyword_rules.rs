//! Name-pattern keyword rules backing Tagging precedence step (b)
//!. Kept separate from `enos-analyzer`'s `property` signal
//! because the mapping to `Function` is tagging-specific.

use enos_core::tagged_point::Function;

const FUNCTION_KEYWORDS: &[(&str, Function)] = &[
    ("cmd", Function::Command),
    ("command", Function::Command),
    ("sp", Function::Setpoint),
    ("setpoint", Function::Setpoint),
    ("stpt", Function::Setpoint),
    ("status", Function::Status),
    ("state", Function::Status),
    ("alarm", Function::Status),
    ("fault", Function::Status),
];

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Tagging precedence (b): keyword rules over the point name.
#[must_use]
pub fn function_from_keywords(point_name: &str) -> Option<Function> {
    FUNCTION_KEYWORDS
        .iter()
        .find(|(keyword, _)| contains_ci(point_name, keyword))
        .map(|(_, function)| *function)
}

/// Component/subcomponent match against the equipment's component catalog
///: first match against the point name wins `component`; a
/// second, distinct match supplies `subcomponent`.
#[must_use]
pub fn match_components<'a>(point_name: &str, device_hint: Option<&str>, catalog: &'a [String]) -> (Option<&'a str>, Option<&'a str>) {
    let mut matches: Vec<&str> = catalog
        .iter()
        .filter(|c| contains_ci(point_name, c) || device_hint.is_some_and(|d| c.eq_ignore_ascii_case(d)))
        .map(String::as_str)
        .collect();
    matches.dedup();
    (matches.first().copied(), matches.get(1).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_rules_detect_command_and_setpoint() {
        assert_eq!(function_from_keywords("AHU.Fan.Cmd"), Some(Function::Command));
        assert_eq!(function_from_keywords("Room.Temp.SP"), Some(Function::Setpoint));
        assert_eq!(function_from_keywords("Totally.Unrelated"), None);
    }

    #[test]
    fn component_match_prefers_device_hint_when_name_is_silent() {
        let catalog = vec!["pump".to_string(), "valve".to_string()];
        let (component, subcomponent) = match_components("CH-SYS-1.VSD.Hz", Some("pump"), &catalog);
        assert_eq!(component, Some("pump"));
        assert_eq!(subcomponent, None);
    }
}
