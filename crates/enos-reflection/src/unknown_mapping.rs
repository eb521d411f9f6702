//! `unknown_mapping` sub-mode: the Mapping Engine produced
//! `unmapped`. Re-decompose the point name, derive the closest canonical
//! candidates, and emit a refined prompt for a retried LLM call.

use enos_analyzer::{analyze, Decomposition};
use enos_core::reflection::{Reflection, ReflectionType};
use enos_core::tagged_point::TaggedPoint;
use enos_core::CanonicalPoint;
use enos_ontology::OntologyStore;

const TOP_CLOSEST: usize = 5;

fn contains_ci(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Resolves a generic `"drive"` signal from the point analyzer to the
/// equipment's actual primary mover (e.g. a cooling tower's `"fan"` rather
/// than a chiller's `"pump"`) before it's used to pick closest matches or
/// worded into a suggestion.
fn resolve_device(decomposition: &Decomposition, ontology: &OntologyStore, equipment_type: &str) -> Option<String> {
    let device = decomposition.device.as_deref()?;
    if device != "drive" {
        return Some(device.to_string());
    }
    ontology
        .equipment_type_info(equipment_type)
        .and_then(|info| info.primary_device.clone())
        .or_else(|| Some(device.to_string()))
}

fn relevance(candidate: &CanonicalPoint, measurement_type: Option<&str>, device: Option<&str>, unit: Option<&str>) -> u32 {
    let mut score = 0;
    if let Some(measurement_type) = measurement_type {
        if candidate.measurement.eq_ignore_ascii_case(measurement_type) {
            score += 2;
        }
    }
    if let Some(device) = device {
        if candidate.component.iter().any(|c| contains_ci(c, device)) || contains_ci(&candidate.name, device) {
            score += 2;
        }
    }
    if let Some(unit) = unit {
        if candidate.unit.as_deref().is_some_and(|u| u.eq_ignore_ascii_case(unit)) {
            score += 1;
        }
    }
    score
}

/// Re-derive a decomposition and the top candidate ids worth a second LLM
/// attempt, combining measurement-type, device, and unit signals.
#[must_use]
pub fn reflect(tagged: &TaggedPoint, ontology: &OntologyStore, candidates: &[CanonicalPoint]) -> Reflection {
    let abbreviations: Vec<&str> = ontology
        .equipment_type_info(&tagged.equipment_type)
        .map(|info| info.abbreviations.iter().map(String::as_str).collect())
        .unwrap_or_default();
    let decomposition = analyze(&tagged.source.point_name, tagged.source.unit.as_deref(), &abbreviations);
    let device = resolve_device(&decomposition, ontology, &tagged.equipment_type);

    let mut scored: Vec<(&CanonicalPoint, u32)> = candidates
        .iter()
        .map(|c| (c, relevance(c, decomposition.measurement_type.as_deref(), device.as_deref(), tagged.source.unit.as_deref())))
        .filter(|(_, score)| *score > 0)
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
    let closest_matches: Vec<String> = scored.iter().take(TOP_CLOSEST).map(|(c, _)| c.id.clone()).collect();

    let mut reflection = Reflection::new(ReflectionType::UnknownMapping);
    reflection.analysis.push(format!(
        "no canonical candidate scored above threshold for '{}'; re-decomposed name for a second attempt",
        tagged.source.point_name
    ));
    reflection.decomposition = serde_json::to_value(&decomposition).ok();

    if let (Some(device), Some(measurement_type)) = (&device, &decomposition.measurement_type) {
        if let Some((top, _)) = scored.first() {
            reflection
                .suggestions
                .push(format!("{device}+{measurement_type} \u{21d2} consider {}", top.id));
        }
    }
    reflection.closest_matches = closest_matches;
    reflection
}
