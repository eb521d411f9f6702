//! `Mapping` — the ownership/authorship record produced by mapping and
//! reflection.

use crate::canonical::CanonicalPoint;
use crate::ids::OperationId;
use crate::point::Point;
use serde::{Deserialize, Serialize};

/// How a `Mapping` was produced, and what confidence band it falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingKind {
    Auto,
    Suggested,
    Manual,
    Unmapped,
}

impl std::fmt::Display for MappingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MappingKind::Auto => "auto",
            MappingKind::Suggested => "suggested",
            MappingKind::Manual => "manual",
            MappingKind::Unmapped => "unmapped",
        };
        write!(f, "{s}")
    }
}

/// A unit conversion, linear scaling, or enum remap applied when translating a
/// tagged point's raw value into the canonical point's expected shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    UnitConversion { from: String, to: String, formula: String },
    Scale { factor: f64, offset: f64 },
    EnumMap { mapping: std::collections::BTreeMap<String, String> },
}

/// Ownership/authorship record: which canonical point (if any) a source point
/// maps to, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub operation_id: OperationId,
    pub source_point: Point,
    pub target: Option<CanonicalPoint>,
    pub confidence: f64,
    pub kind: MappingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    pub rationale: String,
    /// Points at the `ReasoningChain` record for `(operation_id, point_id)`.
    pub reasoning_ref: crate::reasoning::ReasoningRef,
    /// Machine-readable reason, set whenever `kind == Unmapped`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Mapping {
    /// Validate the threshold invariants:
    /// `confidence ∈ [0,1]`; `kind=auto ⇒ confidence ≥ τ_auto`;
    /// `kind=suggested ⇒ τ_sugg ≤ confidence < τ_auto`; `kind=unmapped ⇒ target=null`.
    #[must_use]
    pub fn satisfies_thresholds(&self, tau_auto: f64, tau_sugg: f64) -> bool {
        if !(0.0..=1.0).contains(&self.confidence) {
            return false;
        }
        match self.kind {
            MappingKind::Auto => self.confidence >= tau_auto,
            MappingKind::Suggested => self.confidence >= tau_sugg && self.confidence < tau_auto,
            MappingKind::Unmapped => self.target.is_none(),
            MappingKind::Manual => true,
        }
    }
}
