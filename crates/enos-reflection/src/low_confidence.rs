//! `low_confidence` sub-mode: the Mapping Engine produced a
//! mapping whose confidence sits below `tau_reflect`. Identify the weakest
//! scoring factor and propose a targeted improvement.

use enos_core::reflection::{Reflection, ReflectionType};
use enos_mapping::MappingScores;

/// One entry per `MappingScores` factor, in a fixed order, so the weakest
/// factor can be named and targeted individually.
fn factors(scores: &MappingScores) -> [(&'static str, f64); 6] {
    [
        ("name_similarity", scores.name_similarity),
        ("function_match", scores.function_match),
        ("component_overlap", scores.component_overlap),
        ("phenomenon_match", scores.phenomenon_match),
        ("unit_compatibility", scores.unit_compatibility),
        ("tag_overlap", scores.tag_overlap),
    ]
}

fn weakest(scores: &MappingScores) -> (&'static str, f64) {
    factors(scores)
        .into_iter()
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or(("name_similarity", 0.0))
}

fn suggestion_for(factor: &str) -> String {
    match factor {
        "name_similarity" => "propose a new name pattern closer to the candidate's canonical name".to_string(),
        "function_match" => "propose an alternate function interpretation for this point".to_string(),
        "component_overlap" => "propose an additional component alias covering this point's naming".to_string(),
        "phenomenon_match" => "propose an alternate phenomenon interpretation for this reading".to_string(),
        "unit_compatibility" => "propose a unit reconciliation (conversion formula or ontology unit update)".to_string(),
        "tag_overlap" => "propose additional tags bridging the point and candidate vocabularies".to_string(),
        other => format!("propose an improvement for '{other}'"),
    }
}

/// Projected improvement applied to the weakest factor only; every other
/// factor is assumed unchanged.
const IMPROVEMENT_NUDGE: f64 = 0.5;

/// Diagnose the weakest factor and produce a candidate revised `Reflection`.
/// The caller decides whether to emit a revised `Mapping` by checking
/// `Reflection::projected_confidence(baseline) >= tau_sugg`.
#[must_use]
pub fn reflect(scores: &MappingScores, baseline_confidence: f64) -> Reflection {
    let (factor, value) = weakest(scores);
    let mut reflection = Reflection::new(ReflectionType::LowConfidence);
    reflection
        .analysis
        .push(format!("weakest scoring factor is '{factor}' at {value:.2}; baseline confidence {baseline_confidence:.2}"));
    reflection.suggestions.push(suggestion_for(factor));
    let improved = value + (1.0 - value) * IMPROVEMENT_NUDGE;
    reflection.confidence_improvements.insert(factor.to_string(), improved);
    reflection
}
