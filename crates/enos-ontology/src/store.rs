//! Ontology Store — load/validate equipment and
//! canonical-schema definitions; expose lookups.

use crate::error::OntologyError;
use crate::types::{EquipmentInfo, OntologyDocument, StandardPoint};
use std::collections::HashMap;

/// Loaded, validated ontology, read-only after construction.
#[derive(Debug, Clone)]
pub struct OntologyStore {
    doc: OntologyDocument,
}

impl OntologyStore {
    /// Load from a parsed document. Collects warnings for missing optional
    /// fields rather than failing; fails only on structurally invalid input.
    pub fn load(doc: OntologyDocument) -> Result<(Self, Vec<String>), OntologyError> {
        let mut warnings = Vec::new();
        if doc.equipment.is_empty() {
            return Err(OntologyError::Schema(
                "ontology document declares no equipment types".to_string(),
            ));
        }
        for (name, info) in &doc.equipment {
            if info.abbreviations.is_empty() {
                warnings.push(format!("equipment '{name}' has no abbreviations"));
            }
            if info.standard_points.is_empty() {
                warnings.push(format!("equipment '{name}' has no standard_points"));
            }
            if info.description.is_empty() {
                warnings.push(format!("equipment '{name}' has no description"));
            }
        }
        Ok((Self { doc }, warnings))
    }

    /// Parse then load from raw JSON, translating `serde_json` errors into
    /// `OntologyError::Load`.
    pub fn load_from_json(raw: &str) -> Result<(Self, Vec<String>), OntologyError> {
        let doc: OntologyDocument =
            serde_json::from_str(raw).map_err(|e| OntologyError::Load(e.to_string()))?;
        Self::load(doc)
    }

    #[must_use]
    pub fn equipment_type_info(&self, equipment_type: &str) -> Option<&EquipmentInfo> {
        self.doc.equipment.get(equipment_type)
    }

    #[must_use]
    pub fn standard_points(&self, equipment_type: &str) -> &[StandardPoint] {
        self.doc
            .equipment
            .get(equipment_type)
            .map(|e| e.standard_points.as_slice())
            .unwrap_or(&[])
    }

    /// All abbreviations across all equipment types, mapped back to the
    /// equipment type(s) that declare them.
    #[must_use]
    pub fn abbreviations(&self) -> HashMap<&str, Vec<&str>> {
        let mut out: HashMap<&str, Vec<&str>> = HashMap::new();
        for (equipment_type, info) in &self.doc.equipment {
            for abbr in &info.abbreviations {
                out.entry(abbr.as_str()).or_default().push(equipment_type.as_str());
            }
        }
        out
    }

    #[must_use]
    pub fn units_for(&self, phenomenon: &str, quantity: &str) -> Option<&str> {
        self.doc
            .resources
            .units
            .get(&format!("{phenomenon}:{quantity}"))
            .map(String::as_str)
    }

    #[must_use]
    pub fn phenomena_related(&self, a: &str, b: &str) -> bool {
        if a.eq_ignore_ascii_case(b) {
            return true;
        }
        self.doc
            .resources
            .related_phenomena
            .get(a)
            .is_some_and(|related| related.iter().any(|r| r.eq_ignore_ascii_case(b)))
    }

    #[must_use]
    pub fn all_equipment_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.doc.equipment.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    #[must_use]
    pub fn document(&self) -> &OntologyDocument {
        &self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceOntology;

    fn sample_doc() -> OntologyDocument {
        let mut equipment = HashMap::new();
        equipment.insert(
            "CH-SYS".to_string(),
            EquipmentInfo {
                abbreviations: vec!["CWP".to_string(), "CHW".to_string()],
                standard_points: vec![StandardPoint {
                    name_pattern: "VSD.Hz".to_string(),
                    canonical_id: Some("CH-SYS_PUMP_raw_frequency".to_string()),
                    phenomenon: Some("frequency".to_string()),
                    quantity: Some("frequency".to_string()),
                    unit: Some("Hz".to_string()),
                    function: Some("sensor".to_string()),
                    component: Some("CWP".to_string()),
                }],
                components: vec!["CWP".to_string()],
                contradiction_substrings: vec!["airflow".to_string(), "damper".to_string()],
                description: "Chiller plant system".to_string(),
                primary_device: Some("pump".to_string()),
            },
        );
        OntologyDocument {
            equipment,
            resources: ResourceOntology::default(),
        }
    }

    #[test]
    fn load_succeeds_and_warns_on_missing_optional_fields() {
        let mut doc = sample_doc();
        doc.equipment.insert("VAV".to_string(), EquipmentInfo::default());
        let (store, warnings) = OntologyStore::load(doc).expect("load should succeed");
        assert!(warnings.iter().any(|w| w.contains("VAV")));
        assert_eq!(store.all_equipment_types(), vec!["CH-SYS", "VAV"]);
    }

    #[test]
    fn load_fails_on_empty_equipment_table() {
        let doc = OntologyDocument::default();
        let err = OntologyStore::load(doc).unwrap_err();
        assert!(matches!(err, OntologyError::Schema(_)));
    }

    #[test]
    fn standard_points_lookup() {
        let (store, _) = OntologyStore::load(sample_doc()).unwrap();
        let points = store.standard_points("CH-SYS");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].name_pattern, "VSD.Hz");
        assert!(store.standard_points("unknown").is_empty());
    }
}
