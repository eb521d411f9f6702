//! `{{placeholder}}` prompt templating, resolved with plain `String::replace`
//! rather than a templating engine.

use std::collections::BTreeMap;

/// Render `template`, replacing every `{{key}}` with its value from `vars`.
/// Placeholders with no matching key are left untouched, so a caller can
/// chain two rendering passes over disjoint variable sets.
#[must_use]
pub fn render(template: &str, vars: &BTreeMap<&str, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}
