//! Output shapes for the Grouping Engine.

use enos_core::point::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel instance id for points whose group has no extractable instance
/// (e.g. a `StructuredView` container, or `equipment_type=unknown`).
pub const NO_INSTANCE: &str = "_";

/// Weighted confidence breakdown for one `(equipment_type, instance_id)`
/// group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupConfidence {
    pub naming_pattern_dominance: f64,
    pub point_type_consistency: f64,
    pub unit_consistency: f64,
    pub overall_coherence: f64,
}

impl GroupConfidence {
    /// Weighted mean: naming-pattern dominance at 0.4, the other three
    /// factors at 0.2 each.
    #[must_use]
    pub fn weighted(&self) -> f64 {
        0.4 * self.naming_pattern_dominance
            + 0.2 * self.point_type_consistency
            + 0.2 * self.unit_consistency
            + 0.2 * self.overall_coherence
    }
}

/// Which cascade step produced an assignment, kept for diagnostics and
/// reasoning-chain detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSource {
    Explicit,
    OntologyDirect,
    ComponentSubstring,
    StandardPointName,
    Llm,
    Unknown,
}

/// One `(equipment_type, instance_id)` group and its members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub equipment_type: String,
    pub instance_id: String,
    pub points: Vec<Point>,
    pub source: AssignmentSource,
    pub confidence: GroupConfidence,
}

/// Full grouping-pass output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupingResult {
    pub groups: Vec<Group>,
}

impl GroupingResult {
    /// Nested view for callers that want to iterate per equipment type.
    #[must_use]
    pub fn by_equipment_and_instance(&self) -> HashMap<&str, HashMap<&str, &[Point]>> {
        let mut out: HashMap<&str, HashMap<&str, &[Point]>> = HashMap::new();
        for group in &self.groups {
            out.entry(group.equipment_type.as_str())
                .or_default()
                .insert(group.instance_id.as_str(), group.points.as_slice());
        }
        out
    }
}
