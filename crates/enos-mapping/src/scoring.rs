//! Computes the six weighted scoring factors for one
//! `(TaggedPoint, CanonicalPoint)` pair.
//!
//! `CanonicalPoint` itself only carries `name`/`measurement`/
//! `component`/`unit` — it has no `function` or `phenomenon` field, those
//! were folded into `component` by the schema adapter. The authoritative
//! source for a candidate's expected function/phenomenon/quantity is the
//! ontology's `StandardPoint` entry whose `canonical_id` matches the
//! candidate's `id`; when no such entry exists those factors fall back to
//! their "unknown" score rather than zero, the same leniency granted an
//! unknown `TaggedPoint.function`.

use enos_core::tagged_point::{Function, TaggedPoint};
use enos_core::CanonicalPoint;
use enos_ontology::{OntologyStore, StandardPoint};
use std::collections::BTreeSet;

use crate::types::MappingScores;

/// Known unit conversions the engine can express as a `Transform::UnitConversion`
///. Not
/// exhaustive — limited to the conversions this pipeline's BMS estate
/// actually needs.
pub const UNIT_CONVERSIONS: &[(&str, &str, &str)] = &[
    ("degF", "degC", "(x - 32) * 5 / 9"),
    ("degC", "degF", "x * 9 / 5 + 32"),
    ("kPa", "bar", "x / 100"),
    ("bar", "kPa", "x * 100"),
    ("psi", "kPa", "x * 6.89476"),
    ("kPa", "psi", "x / 6.89476"),
    ("cfm", "l/s", "x * 0.471947"),
    ("l/s", "cfm", "x / 0.471947"),
    ("in-wc", "Pa", "x * 249.089"),
    ("Pa", "in-wc", "x / 249.089"),
];

#[must_use]
pub fn conversion_formula(from: &str, to: &str) -> Option<&'static str> {
    UNIT_CONVERSIONS
        .iter()
        .find(|(f, t, _)| f.eq_ignore_ascii_case(from) && t.eq_ignore_ascii_case(to))
        .map(|(_, _, formula)| *formula)
}

#[must_use]
pub fn standard_point_for<'o>(ontology: &'o OntologyStore, equipment_type: &str, canonical_id: &str) -> Option<&'o StandardPoint> {
    ontology
        .standard_points(equipment_type)
        .iter()
        .find(|sp| sp.canonical_id.as_deref() == Some(canonical_id))
}

fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(['_', '.', '-'], " ")
}

fn name_similarity(tagged_name: &str, candidate_name: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize_name(tagged_name), &normalize_name(candidate_name))
}

fn function_match(tagged_function: Function, candidate_function: Option<&str>) -> f64 {
    let Some(candidate_function) = candidate_function else {
        return 0.5;
    };
    if tagged_function == Function::Unknown {
        return 0.5;
    }
    if tagged_function.to_string().eq_ignore_ascii_case(candidate_function) {
        1.0
    } else {
        0.0
    }
}

fn jaccard(a: &BTreeSet<&str>, b: &BTreeSet<&str>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

fn component_overlap(tagged: &TaggedPoint, candidate: &CanonicalPoint) -> f64 {
    let mut tagged_components: BTreeSet<&str> = BTreeSet::new();
    if let Some(c) = tagged.component.as_deref() {
        tagged_components.insert(c);
    }
    if let Some(c) = tagged.subcomponent.as_deref() {
        tagged_components.insert(c);
    }
    let candidate_components: BTreeSet<&str> = candidate.component.iter().map(String::as_str).collect();
    jaccard(&tagged_components, &candidate_components)
}

fn phenomenon_match(ontology: &OntologyStore, tagged_phenomenon: Option<&str>, candidate_phenomenon: Option<&str>) -> f64 {
    match (tagged_phenomenon, candidate_phenomenon) {
        (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => 1.0,
        (Some(a), Some(b)) if ontology.phenomena_related(a, b) => 0.4,
        _ => 0.0,
    }
}

fn unit_compatibility(tagged_unit: Option<&str>, candidate_unit: Option<&str>) -> f64 {
    match (tagged_unit, candidate_unit) {
        (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => 1.0,
        (Some(a), Some(b)) if conversion_formula(a, b).is_some() => 0.8,
        _ => 0.0,
    }
}

/// Tags a candidate would carry if it were tagged the same way a `TaggedPoint`
/// is, synthesized from the fields `CanonicalPoint`
/// and its `StandardPoint` sidecar actually carry.
fn candidate_tags(candidate: &CanonicalPoint, standard_point: Option<&StandardPoint>) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    tags.insert(TaggedPoint::tag("equipment", &candidate.equipment_type));
    for component in &candidate.component {
        tags.insert(TaggedPoint::tag("component", component));
    }
    if let Some(unit) = &candidate.unit {
        tags.insert(TaggedPoint::tag("unit", unit));
    }
    if let Some(sp) = standard_point {
        if let Some(function) = &sp.function {
            tags.insert(TaggedPoint::tag("function", function));
        }
    }
    tags
}

fn tag_overlap(tagged: &TaggedPoint, candidate: &CanonicalPoint, standard_point: Option<&StandardPoint>) -> f64 {
    let candidate_tags = candidate_tags(candidate, standard_point);
    let a: BTreeSet<&str> = tagged.tags.iter().map(String::as_str).collect();
    let b: BTreeSet<&str> = candidate_tags.iter().map(String::as_str).collect();
    jaccard(&a, &b)
}

/// Score one candidate against a tagged point.
#[must_use]
pub fn score(ontology: &OntologyStore, tagged: &TaggedPoint, candidate: &CanonicalPoint) -> MappingScores {
    let standard_point = standard_point_for(ontology, &candidate.equipment_type, &candidate.id);
    let candidate_function = standard_point.and_then(|sp| sp.function.as_deref());
    let candidate_phenomenon = standard_point.and_then(|sp| sp.phenomenon.as_deref());

    MappingScores {
        name_similarity: name_similarity(&tagged.source.point_name, &candidate.name),
        function_match: function_match(tagged.function, candidate_function),
        component_overlap: component_overlap(tagged, candidate),
        phenomenon_match: phenomenon_match(ontology, tagged.phenomenon.as_deref(), candidate_phenomenon),
        unit_compatibility: unit_compatibility(tagged.source.unit.as_deref(), candidate.unit.as_deref()),
        tag_overlap: tag_overlap(tagged, candidate, standard_point),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enos_core::point::{Point, PointType};
    use enos_ontology::{EquipmentInfo, OntologyDocument, ResourceOntology};
    use std::collections::{BTreeSet as Set, HashMap};

    fn ontology() -> OntologyStore {
        let mut equipment = HashMap::new();
        let mut resources = ResourceOntology::default();
        resources.related_phenomena.insert("airflow".to_string(), vec!["volume_flow".to_string()]);
        equipment.insert(
            "CH-SYS".to_string(),
            EquipmentInfo {
                abbreviations: vec![],
                standard_points: vec![enos_ontology::StandardPoint {
                    name_pattern: "CWP.VSD.Hz".to_string(),
                    canonical_id: Some("CH-SYS_PUMP_raw_frequency".to_string()),
                    phenomenon: Some("frequency".to_string()),
                    quantity: Some("frequency".to_string()),
                    unit: Some("Hz".to_string()),
                    function: Some("sensor".to_string()),
                    component: Some("pump".to_string()),
                }],
                components: vec!["pump".to_string()],
                contradiction_substrings: vec![],
                description: String::new(),
                primary_device: None,
            },
        );
        let (store, _) = OntologyStore::load(OntologyDocument { equipment, resources }).unwrap();
        store
    }

    fn tagged_point() -> TaggedPoint {
        let source = Point::new("p1", "CH-SYS-1.CWP.VSD.Hz", PointType::AnalogInput).with_unit("Hz");
        let mut tags = Set::new();
        tags.insert("equipment:CH-SYS".to_string());
        tags.insert("component:pump".to_string());
        TaggedPoint {
            source,
            equipment_type: "CH-SYS".to_string(),
            instance_id: "1".to_string(),
            component: Some("pump".to_string()),
            subcomponent: None,
            function: Function::Sensor,
            phenomenon: Some("frequency".to_string()),
            quantity: Some("frequency".to_string()),
            tags,
            enhanced_description: String::new(),
        }
    }

    fn canonical() -> CanonicalPoint {
        CanonicalPoint::new("CH-SYS_PUMP_raw_frequency", "CH-SYS", "PUMP_raw_frequency", "frequency")
            .with_unit("Hz")
            .with_component("pump")
    }

    #[test]
    fn exact_match_scores_near_perfect() {
        let ontology = ontology();
        let tagged = tagged_point();
        let scores = score(&ontology, &tagged, &canonical());
        assert_eq!(scores.function_match, 1.0);
        assert_eq!(scores.phenomenon_match, 1.0);
        assert_eq!(scores.unit_compatibility, 1.0);
        assert!(scores.component_overlap > 0.9);
        assert!(scores.weighted() > 0.9, "weighted={}", scores.weighted());
    }

    #[test]
    fn unknown_function_scores_half_not_zero() {
        let ontology = ontology();
        let mut tagged = tagged_point();
        tagged.function = Function::Unknown;
        let scores = score(&ontology, &tagged, &canonical());
        assert_eq!(scores.function_match, 0.5);
    }

    #[test]
    fn related_phenomenon_scores_partial_credit() {
        assert_eq!(phenomenon_match(&ontology(), Some("airflow"), Some("volume_flow")), 0.4);
        assert_eq!(phenomenon_match(&ontology(), Some("airflow"), Some("temperature")), 0.0);
    }

    #[test]
    fn convertible_unit_scores_partial_credit() {
        assert_eq!(unit_compatibility(Some("degF"), Some("degC")), 0.8);
        assert_eq!(unit_compatibility(Some("Hz"), Some("rpm")), 0.0);
    }
}
