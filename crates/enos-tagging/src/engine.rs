//! Tagging Engine.

use crate::description;
use crate::keyword_rules::{function_from_keywords, match_components};
use crate::prompts::{build_user_prompt, FunctionEnvelope, TAGGING_SYSTEM_PROMPT};
use enos_analyzer::{analyze, suffix};
use enos_core::point::{Point, PointType};
use enos_core::tagged_point::{Function, TaggedPoint};
use enos_llm::{extract_json, LlmAdapter};
use enos_ontology::{OntologyStore, StandardPoint};
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;
use tracing::warn;

fn point_type_tag(point_type: PointType) -> &'static str {
    match point_type {
        PointType::AnalogInput => "analog-input",
        PointType::BinaryInput => "binary-input",
        PointType::MultiStateInput => "multi-state-input",
        PointType::AnalogOutput => "analog-output",
        PointType::AnalogValue => "analog-value",
        PointType::StructuredView => "structured-view",
        PointType::Device => "device",
    }
}

fn parse_function(s: &str) -> Function {
    match s.to_lowercase().as_str() {
        "sensor" => Function::Sensor,
        "command" => Function::Command,
        "setpoint" => Function::Setpoint,
        "status" => Function::Status,
        _ => Function::Unknown,
    }
}

pub struct TaggingEngine<'a> {
    ontology: &'a OntologyStore,
}

impl<'a> TaggingEngine<'a> {
    #[must_use]
    pub fn new(ontology: &'a OntologyStore) -> Self {
        Self { ontology }
    }

    fn matching_standard_point(&self, equipment_type: &str, point_suffix: &str) -> Option<&StandardPoint> {
        self.ontology
            .standard_points(equipment_type)
            .iter()
            .find(|sp| sp.name_pattern.eq_ignore_ascii_case(point_suffix))
    }

    /// Deterministic pass: rules (a)-(c) plus the tag-set and description
    /// builder. Never consults an LLM.
    #[must_use]
    pub fn tag(&self, point: &Point, equipment_type: &str, instance_id: &str) -> TaggedPoint {
        let abbreviations: Vec<&str> = self
            .ontology
            .equipment_type_info(equipment_type)
            .map(|info| info.abbreviations.iter().map(String::as_str).collect())
            .unwrap_or_default();
        let decomposition = analyze(&point.point_name, point.unit.as_deref(), &abbreviations);

        let empty_catalog: Vec<String> = Vec::new();
        let catalog = self
            .ontology
            .equipment_type_info(equipment_type)
            .map(|info| &info.components)
            .unwrap_or(&empty_catalog);
        let (component, subcomponent) = match_components(&point.point_name, decomposition.device.as_deref(), catalog);

        let point_suffix = suffix(&point.point_name);
        let standard_point = self.matching_standard_point(equipment_type, point_suffix);

        // Tagging precedence, resolved most-specific-first:
        // a literal standard-point lookup outranks a generic keyword rule,
        // which outranks the transport-type default. Otherwise the transport
        // default (which fires for almost every point) would make the more
        // specific rules unreachable.
        let function = standard_point
            .and_then(|sp| sp.function.as_deref())
            .map(parse_function)
            .or_else(|| function_from_keywords(&point.point_name))
            .or_else(|| point.point_type.default_function_hint().map(parse_function))
            .unwrap_or(Function::Unknown);

        let phenomenon = standard_point
            .and_then(|sp| sp.phenomenon.clone())
            .or_else(|| decomposition.measurement_type.clone());
        let quantity = standard_point
            .and_then(|sp| sp.quantity.clone())
            .or_else(|| decomposition.measurement_type.clone());

        let component = component.map(str::to_string).or_else(|| standard_point.and_then(|sp| sp.component.clone()));
        let subcomponent = subcomponent.map(str::to_string);

        let mut tags = BTreeSet::new();
        tags.insert(TaggedPoint::tag("equipment", equipment_type));
        tags.insert(TaggedPoint::tag("instance", instance_id));
        tags.insert(TaggedPoint::tag("transport", point_type_tag(point.point_type)));
        tags.insert(TaggedPoint::tag("function", &function.to_string()));
        if let Some(component) = &component {
            tags.insert(TaggedPoint::tag("component", component));
        }
        if let Some(unit) = &point.unit {
            tags.insert(TaggedPoint::tag("unit", unit));
        }
        if let Some(sp) = standard_point {
            tags.insert(TaggedPoint::tag("standard_point", &sp.name_pattern));
        }

        let enhanced_description = description::build(
            equipment_type,
            instance_id,
            component.as_deref(),
            function,
            phenomenon.as_deref(),
            quantity.as_deref(),
            point.unit.as_deref(),
        );

        TaggedPoint {
            source: point.clone(),
            equipment_type: equipment_type.to_string(),
            instance_id: instance_id.to_string(),
            component,
            subcomponent,
            function,
            phenomenon,
            quantity,
            tags,
            enhanced_description,
        }
    }

    /// Tag a point, escalating to the LLM only when rules
    /// (a)-(c) all fell through to `Function::Unknown` and the point carries
    /// description text worth reasoning over.
    pub async fn tag_with_fallback(
        &self,
        point: &Point,
        equipment_type: &str,
        instance_id: &str,
        adapter: Option<&LlmAdapter>,
        cancel: &CancellationToken,
    ) -> TaggedPoint {
        let mut tagged = self.tag(point, equipment_type, instance_id);
        if tagged.function != Function::Unknown {
            return tagged;
        }
        let Some(description_text) = point.description.as_deref().filter(|d| !d.trim().is_empty()) else {
            return tagged;
        };
        let Some(adapter) = adapter else {
            return tagged;
        };

        let user = build_user_prompt(&point.point_name, description_text, equipment_type);
        match adapter.invoke(TAGGING_SYSTEM_PROMPT, &user, cancel).await {
            Ok(raw) => match extract_json::<FunctionEnvelope>(&raw) {
                Ok(envelope) => {
                    let function = parse_function(&envelope.function);
                    if function != Function::Unknown {
                        tagged.tags.insert(TaggedPoint::tag("function", &function.to_string()));
                        tagged.function = function;
                        tagged.enhanced_description = description::build(
                            equipment_type,
                            instance_id,
                            tagged.component.as_deref(),
                            function,
                            tagged.phenomenon.as_deref(),
                            tagged.quantity.as_deref(),
                            point.unit.as_deref(),
                        );
                    }
                }
                Err(e) => warn!(point_id = %point.point_id, error = %e, "tagging LLM response failed JSON extraction"),
            },
            Err(e) => warn!(point_id = %point.point_id, error = %e, "tagging LLM call failed"),
        }
        tagged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enos_ontology::{EquipmentInfo, OntologyDocument, ResourceOntology};
    use std::collections::HashMap;

    fn ontology() -> OntologyStore {
        let mut equipment = HashMap::new();
        equipment.insert(
            "CH-SYS".to_string(),
            EquipmentInfo {
                abbreviations: vec!["CWP".to_string()],
                standard_points: vec![StandardPoint {
                    name_pattern: "CWP.VSD.Hz".to_string(),
                    canonical_id: Some("CH-SYS_PUMP_raw_frequency".to_string()),
                    phenomenon: Some("frequency".to_string()),
                    quantity: Some("frequency".to_string()),
                    unit: Some("Hz".to_string()),
                    function: Some("sensor".to_string()),
                    component: Some("pump".to_string()),
                }],
                components: vec!["pump".to_string(), "valve".to_string()],
                contradiction_substrings: vec![],
                description: "Chiller plant system".to_string(),
                primary_device: Some("pump".to_string()),
            },
        );
        let (store, _) = OntologyStore::load(OntologyDocument {
            equipment,
            resources: ResourceOntology::default(),
        })
        .unwrap();
        store
    }

    #[tokio::test]
    async fn standard_point_lookup_drives_function_and_phenomenon() {
        let ontology = ontology();
        let engine = TaggingEngine::new(&ontology);
        let point = Point::new("p1", "CH-SYS-1.CWP.VSD.Hz", PointType::AnalogInput).with_unit("Hz");
        let tagged = engine.tag(&point, "CH-SYS", "1");
        assert_eq!(tagged.function, Function::Sensor);
        assert_eq!(tagged.phenomenon.as_deref(), Some("frequency"));
        assert_eq!(tagged.component.as_deref(), Some("pump"));
        assert!(tagged.tags.contains("standard_point:CWP.VSD.Hz"));
        assert_eq!(
            tagged.enhanced_description,
            "CH-SYS 1 — pump — sensor — frequency — in Hz"
        );
    }

    #[tokio::test]
    async fn keyword_rule_overrides_transport_default_when_more_specific() {
        let ontology = ontology();
        let engine = TaggingEngine::new(&ontology);
        // AnalogOutput defaults to `command`; the "SP" keyword should win
        // over that generic default since it is a more specific signal.
        let point = Point::new("p2", "CH-SYS-1.Temp.SP", PointType::AnalogOutput);
        let tagged = engine.tag(&point, "CH-SYS", "1");
        assert_eq!(tagged.function, Function::Setpoint);
    }

    #[tokio::test]
    async fn transport_default_applies_when_nothing_more_specific_matches() {
        let ontology = ontology();
        let engine = TaggingEngine::new(&ontology);
        let point = Point::new("p3", "CH-SYS-1.Unrelated.Thing", PointType::AnalogOutput);
        let tagged = engine.tag(&point, "CH-SYS", "1");
        assert_eq!(tagged.function, Function::Command);
    }

    #[tokio::test]
    async fn no_llm_fallback_when_function_already_resolved() {
        let ontology = ontology();
        let engine = TaggingEngine::new(&ontology);
        let point = Point::new("p1", "CH-SYS-1.CWP.VSD.Hz", PointType::AnalogInput).with_unit("Hz");
        let tagged = engine.tag_with_fallback(&point, "CH-SYS", "1", None, &CancellationToken::new()).await;
        assert_eq!(tagged.function, Function::Sensor);
    }

    #[tokio::test]
    async fn unknown_function_without_description_skips_llm_call() {
        let ontology = ontology();
        let engine = TaggingEngine::new(&ontology);
        let point = Point::new("p4", "CH-SYS-1.Mystery", PointType::StructuredView);
        let tagged = engine.tag_with_fallback(&point, "CH-SYS", "1", None, &CancellationToken::new()).await;
        assert_eq!(tagged.function, Function::Unknown);
    }
}
