//! `OperationProgress` — mutated only by its owning orchestrator.

use crate::ids::OperationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Why an operation reached `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Grouping,
    Tagging,
    Mapping,
    Reflection,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Grouping => "grouping",
            Phase::Tagging => "tagging",
            Phase::Mapping => "mapping",
            Phase::Reflection => "reflection",
        };
        write!(f, "{s}")
    }
}

/// A snapshot of one operation's progress. Readers only ever see
/// clones of this; the orchestrator is the sole mutator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationProgress {
    pub operation_id: OperationId,
    pub kind: String,
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub state: OperationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_batch_index: Option<usize>,
}

impl OperationProgress {
    #[must_use]
    pub fn new(operation_id: OperationId, kind: impl Into<String>, total: usize, now: DateTime<Utc>) -> Self {
        Self {
            operation_id,
            kind: kind.into(),
            total,
            processed: 0,
            succeeded: 0,
            failed: 0,
            started_at: now,
            last_update: now,
            state: OperationState::Pending,
            failure_phase: None,
            failure_batch_index: None,
        }
    }

    /// `processed` never decreases; `processed <= total`;
    /// `succeeded + failed <= processed`.
    #[must_use]
    pub fn is_monotone_against(&self, previous: &OperationProgress) -> bool {
        self.processed >= previous.processed
            && self.processed <= self.total
            && self.succeeded + self.failed <= self.processed
    }
}
