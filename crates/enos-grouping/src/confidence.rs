//! Confidence metric for one grouped `(equipment_type, instance_id)` bucket.

use crate::types::{AssignmentSource, GroupConfidence};
use enos_core::point::{Point, PointType};
use enos_ontology::OntologyStore;
use std::collections::HashMap;

/// How strongly the assignment source itself implies a correct naming-pattern
/// match, before looking at the group's actual points.
fn source_dominance(source: AssignmentSource) -> f64 {
    match source {
        AssignmentSource::Explicit => 1.0,
        AssignmentSource::OntologyDirect => 1.0,
        AssignmentSource::ComponentSubstring => 0.7,
        AssignmentSource::StandardPointName => 0.6,
        AssignmentSource::Llm => 0.5,
        AssignmentSource::Unknown => 0.0,
    }
}

fn point_type_consistency(points: &[Point]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let mut counts: HashMap<PointType, usize> = HashMap::new();
    for p in points {
        *counts.entry(p.point_type).or_insert(0) += 1;
    }
    let dominant = counts.values().copied().max().unwrap_or(0);
    dominant as f64 / points.len() as f64
}

fn unit_consistency(points: &[Point]) -> f64 {
    let units: Vec<&str> = points.iter().filter_map(|p| p.unit.as_deref()).collect();
    if units.is_empty() {
        return 1.0;
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for u in &units {
        *counts.entry(u).or_insert(0) += 1;
    }
    let dominant = counts.values().copied().max().unwrap_or(0);
    dominant as f64 / units.len() as f64
}

/// Absence of contradiction substrings is the clearest observable signal of
/// "overall coherence" at this stage.
fn overall_coherence(equipment_type: &str, points: &[Point], ontology: &OntologyStore) -> f64 {
    let Some(info) = ontology.equipment_type_info(equipment_type) else {
        return 0.5;
    };
    let contradicted = info
        .contradiction_substrings
        .iter()
        .any(|bad| points.iter().any(|p| p.point_name.to_lowercase().contains(&bad.to_lowercase())));
    if contradicted {
        0.0
    } else {
        1.0
    }
}

#[must_use]
pub fn score_group(
    equipment_type: &str,
    points: &[Point],
    ontology: &OntologyStore,
    source: AssignmentSource,
) -> GroupConfidence {
    GroupConfidence {
        naming_pattern_dominance: source_dominance(source),
        point_type_consistency: point_type_consistency(points),
        unit_consistency: unit_consistency(points),
        overall_coherence: overall_coherence(equipment_type, points, ontology),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_mean_matches_stated_weights() {
        let c = GroupConfidence {
            naming_pattern_dominance: 1.0,
            point_type_consistency: 0.5,
            unit_consistency: 0.5,
            overall_coherence: 1.0,
        };
        assert!((c.weighted() - (0.4 + 0.1 + 0.1 + 0.2)).abs() < 1e-9);
    }
}
