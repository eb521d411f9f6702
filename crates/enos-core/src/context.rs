//! `ErrorContext` — "every error carries a context record with
//! operation_id, phase, batch_index, point_id, and a human-readable message."

use crate::ids::{OperationId, PointId};
use crate::progress::Phase;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    pub operation_id: OperationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_id: Option<PointId>,
    pub message: String,
}

impl ErrorContext {
    #[must_use]
    pub fn new(operation_id: OperationId, message: impl Into<String>) -> Self {
        Self {
            operation_id,
            phase: None,
            batch_index: None,
            point_id: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    #[must_use]
    pub fn with_batch_index(mut self, batch_index: usize) -> Self {
        self.batch_index = Some(batch_index);
        self
    }

    #[must_use]
    pub fn with_point_id(mut self, point_id: PointId) -> Self {
        self.point_id = Some(point_id);
        self
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[op={}", self.operation_id)?;
        if let Some(phase) = self.phase {
            write!(f, " phase={phase}")?;
        }
        if let Some(idx) = self.batch_index {
            write!(f, " batch={idx}")?;
        }
        if let Some(pid) = &self.point_id {
            write!(f, " point={pid}")?;
        }
        write!(f, "] {}", self.message)
    }
}
