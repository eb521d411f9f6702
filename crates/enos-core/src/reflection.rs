//! `Reflection` — the bounded second pass over a failing
//! mapping attempt.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which of the three reflection sub-modes produced this record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionType {
    FormatError,
    UnknownMapping,
    LowConfidence,
}

/// Diagnosis and corrective material produced by the Reflection Engine for one
/// failing mapping attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    #[serde(rename = "type")]
    pub reflection_type: ReflectionType,
    pub analysis: Vec<String>,
    /// Present for `unknown_mapping`; the Point Analyzer's decomposition, as a
    /// JSON value so this crate doesn't need to depend on `enos-analyzer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decomposition: Option<serde_json::Value>,
    #[serde(default)]
    pub closest_matches: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_format: Option<String>,
    /// Factor name -> proposed new score. Kept separate from `Mapping.confidence`
    /// so the pre-reflection per-factor breakdown is never silently overwritten.
    #[serde(default)]
    pub confidence_improvements: BTreeMap<String, f64>,
}

impl Reflection {
    #[must_use]
    pub fn new(reflection_type: ReflectionType) -> Self {
        Self {
            reflection_type,
            analysis: Vec::new(),
            decomposition: None,
            closest_matches: Vec::new(),
            suggestions: Vec::new(),
            corrected_format: None,
            confidence_improvements: BTreeMap::new(),
        }
    }

    /// Sum of proposed factor improvements weighted evenly, used to decide
    /// whether a revised mapping should be emitted.
    #[must_use]
    pub fn projected_confidence(&self, baseline: f64) -> f64 {
        if self.confidence_improvements.is_empty() {
            return baseline;
        }
        let n = self.confidence_improvements.len() as f64;
        let avg_improvement: f64 = self.confidence_improvements.values().sum::<f64>() / n;
        avg_improvement.clamp(0.0, 1.0)
    }
}
