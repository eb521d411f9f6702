//! In-memory shape of the equipment ontology and general resource ontology.
//! Equipment and components are stored as flat tables keyed by id (never
//! direct pointers), so either table can reload independently.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One standard point name known for an equipment type, with the semantic
/// tags it carries when matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardPoint {
    /// Literal or dotted suffix pattern, e.g. `"VSD.Hz"`.
    pub name_pattern: String,
    #[serde(default)]
    pub canonical_id: Option<String>,
    #[serde(default)]
    pub phenomenon: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
}

/// Ontology entry for one equipment type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EquipmentInfo {
    #[serde(default)]
    pub abbreviations: Vec<String>,
    #[serde(default)]
    pub standard_points: Vec<StandardPoint>,
    #[serde(default)]
    pub components: Vec<String>,
    /// Substrings that, if found in a group's points, contradict this
    /// equipment type, e.g. `CH-SYS` lists
    /// `["airflow", "damper", "duct"]`.
    #[serde(default)]
    pub contradiction_substrings: Vec<String>,
    /// Free-text one-line description used in LLM batch-inference prompts.
    #[serde(default)]
    pub description: String,
    /// The equipment's primary moving/actuating component (e.g. `"fan"` for a
    /// cooling tower, `"pump"` for a chiller-system), used by reflection to
    /// resolve a generic drive/VSD signal from the point analyzer into the
    /// equipment-specific device it actually drives.
    #[serde(default)]
    pub primary_device: Option<String>,
}

/// General resource ontology: phenomena, quantities, aspects, and the units
/// associated with each (phenomenon, quantity) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResourceOntology {
    #[serde(default)]
    pub phenomena: Vec<String>,
    #[serde(default)]
    pub quantities: Vec<String>,
    #[serde(default)]
    pub aspects: Vec<String>,
    /// `"phenomenon:quantity"` -> unit.
    #[serde(default)]
    pub units: HashMap<String, String>,
    /// Phenomena considered related to each other for the mapping engine's
    /// "related by ontology" phenomenon-match factor.
    #[serde(default)]
    pub related_phenomena: HashMap<String, Vec<String>>,
}

/// Declarative ontology document as loaded from external storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OntologyDocument {
    #[serde(default)]
    pub equipment: HashMap<String, EquipmentInfo>,
    #[serde(default)]
    pub resources: ResourceOntology,
}
