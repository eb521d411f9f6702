//! Request/response shapes for the operator surface.

use enos_core::ids::{OperationId, PointId};
use enos_core::mapping::{Mapping, MappingKind};
use enos_core::progress::OperationProgress;
use serde::{Deserialize, Serialize};

/// One `submit` call's input: the points to map plus the configuration
/// governing this operation.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub points: Vec<enos_core::point::Point>,
    pub config: enos_core::config::PipelineConfig,
}

/// Counts of emitted `Mapping.kind` values, used by the `summary` operator
/// verb.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingCounts {
    pub auto: usize,
    pub suggested: usize,
    pub manual: usize,
    pub unmapped: usize,
}

impl MappingCounts {
    fn record(&mut self, kind: MappingKind) {
        match kind {
            MappingKind::Auto => self.auto += 1,
            MappingKind::Suggested => self.suggested += 1,
            MappingKind::Manual => self.manual += 1,
            MappingKind::Unmapped => self.unmapped += 1,
        }
    }
}

/// `fetch mapping summary` operator verb: a snapshot of every
/// `Mapping` committed so far for one operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingSummary {
    pub operation_id: Option<OperationId>,
    pub counts: MappingCounts,
    pub mappings: Vec<Mapping>,
}

impl MappingSummary {
    #[must_use]
    pub fn from_mappings(operation_id: OperationId, mappings: Vec<Mapping>) -> Self {
        let mut counts = MappingCounts::default();
        for m in &mappings {
            counts.record(m.kind);
        }
        Self { operation_id: Some(operation_id), counts, mappings }
    }
}

/// `request per-point remap with reflection` operator verb.
/// `raw_format_error_response` lets a caller hand the orchestrator a raw LLM
/// response it already knows failed JSON extraction, driving the
/// `format_error` reflection sub-mode directly.
#[derive(Debug, Clone)]
pub struct RemapRequest {
    pub point_id: PointId,
    pub raw_format_error_response: Option<String>,
}

/// Outcome of `PipelineApi::progress` — `None` if the operation is unknown.
pub type ProgressSnapshot = Option<OperationProgress>;
