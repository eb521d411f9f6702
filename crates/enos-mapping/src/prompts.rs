//! Prompt construction for delegating low-confidence candidate selection to
//! the LLM adapter.

use enos_core::CanonicalPoint;
use serde::Deserialize;

pub const MAPPING_SYSTEM_PROMPT: &str = "You select the best canonical point for one building-management-system \
point from a short ranked candidate list. Respond with exactly one JSON object of the form \
{\"enosPoint\": \"<id>\"}, where <id> is copied verbatim from the candidate list, or \"unknown\" if none fit. \
No other text.";

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct EnosPointEnvelope {
    #[serde(rename = "enosPoint")]
    pub enos_point: String,
}

pub const UNKNOWN_ENVELOPE_VALUE: &str = "unknown";

#[must_use]
pub fn build_user_prompt(point_name: &str, description: &str, candidates: &[&CanonicalPoint]) -> String {
    let mut listed = String::new();
    for candidate in candidates {
        listed.push_str(&format!(
            "- id={} name={} measurement={} unit={}\n",
            candidate.id,
            candidate.name,
            candidate.measurement,
            candidate.unit.as_deref().unwrap_or("unknown")
        ));
    }
    format!(
        "Point name: {point_name}\nDescription: {description}\n\nCandidates:\n{listed}\n\
Choose the single best candidate id, or \"unknown\" if none plausibly match."
    )
}
