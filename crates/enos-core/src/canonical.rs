//! `CanonicalPoint` — the normalized target-schema entry ("EnOS point").

use serde::{Deserialize, Serialize};

/// One entry of the canonical schema, after schema-adapter normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPoint {
    pub id: String,
    pub equipment_type: String,
    pub name: String,
    pub measurement: String,
    #[serde(default)]
    pub component: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

impl CanonicalPoint {
    #[must_use]
    pub fn new(id: impl Into<String>, equipment_type: impl Into<String>, name: impl Into<String>, measurement: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            equipment_type: equipment_type.into(),
            name: name.into(),
            measurement: measurement.into(),
            component: Vec::new(),
            unit: None,
            data_type: None,
        }
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component.push(component.into());
        self
    }
}
