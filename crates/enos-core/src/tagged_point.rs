//! `TaggedPoint` — a `Point` enriched with semantic tags.

use crate::point::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The role a point plays against its equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Function {
    Sensor,
    Command,
    Setpoint,
    Status,
    Unknown,
}

impl Default for Function {
    fn default() -> Self {
        Function::Unknown
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Function::Sensor => "sensor",
            Function::Command => "command",
            Function::Setpoint => "setpoint",
            Function::Status => "status",
            Function::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// A `Point` enriched by the Grouping and Tagging engines.
///
/// Invariant: every field of the originating `Point` is preserved byte-for-byte
/// on `source`; nothing here ever mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedPoint {
    pub source: Point,
    pub equipment_type: String,
    pub instance_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcomponent: Option<String>,
    pub function: Function,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phenomenon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    /// `key:value` strings, ordering irrelevant — `BTreeSet` gives a
    /// stable iteration order for hashing/serialization without implying meaning.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub enhanced_description: String,
}

impl TaggedPoint {
    /// Equipment type when unknown, used as the sentinel throughout the pipeline.
    pub const UNKNOWN_EQUIPMENT: &'static str = "unknown";

    #[must_use]
    pub fn tag(component: &str, value: &str) -> String {
        format!("{component}:{value}")
    }
}
