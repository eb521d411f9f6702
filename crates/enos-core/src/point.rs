//! The immutable input record.

use crate::ids::PointId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Transport-level type of a BMS point, as emitted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointType {
    AnalogInput,
    BinaryInput,
    MultiStateInput,
    AnalogOutput,
    AnalogValue,
    StructuredView,
    Device,
}

impl PointType {
    /// Default `function` a transport type maps to absent any other signal.
    #[must_use]
    pub fn default_function_hint(self) -> Option<&'static str> {
        match self {
            PointType::AnalogInput | PointType::BinaryInput | PointType::MultiStateInput => {
                Some("sensor")
            }
            PointType::AnalogOutput => Some("command"),
            PointType::AnalogValue => Some("setpoint"),
            PointType::StructuredView | PointType::Device => None,
        }
    }
}

/// A raw BMS point, immutable after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub point_id: PointId,
    pub point_name: String,
    pub point_type: PointType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Arbitrary source-system fields preserved verbatim.
    #[serde(default)]
    pub raw: HashMap<String, serde_json::Value>,
    /// Equipment type already known at ingestion (grouping pass 1, "explicit").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_type: Option<String>,
}

impl Point {
    /// Construct a point with only the required fields set.
    #[must_use]
    pub fn new(point_id: impl Into<PointId>, point_name: impl Into<String>, point_type: PointType) -> Self {
        Self {
            point_id: point_id.into(),
            point_name: point_name.into(),
            point_type,
            description: None,
            device_id: None,
            value_type: None,
            unit: None,
            min: None,
            max: None,
            raw: HashMap::new(),
            equipment_type: None,
        }
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_equipment_type(mut self, equipment_type: impl Into<String>) -> Self {
        self.equipment_type = Some(equipment_type.into());
        self
    }
}
