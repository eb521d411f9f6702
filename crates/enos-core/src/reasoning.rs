//! `ReasoningChain` — append-only log of how a point's mapping
//! decision was reached, keyed by `(operation_id, point_id)`.

use crate::ids::{OperationId, PointId};
use serde::{Deserialize, Serialize};

/// Points at the chain for one point within one operation, without embedding
/// the (possibly large) chain itself inside every `Mapping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningRef {
    pub operation_id: OperationId,
    pub point_id: PointId,
}

/// The kind of step recorded in a reasoning chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Analysis,
    Identification,
    Matching,
    Generation,
    SchemaAnalysis,
    Reflection,
}

/// One step in a `ReasoningChain`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub step_no: u32,
    pub step_type: StepType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// Ordered, append-only sequence of steps for one point in one operation
///. Construction always goes through `push`, which assigns the
/// next `step_no`, so callers can't create out-of-order chains by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningChain {
    pub operation_id: OperationId,
    pub point_id: PointId,
    pub steps: Vec<ReasoningStep>,
}

impl ReasoningChain {
    #[must_use]
    pub fn new(operation_id: OperationId, point_id: PointId) -> Self {
        Self {
            operation_id,
            point_id,
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub fn reference(&self) -> ReasoningRef {
        ReasoningRef {
            operation_id: self.operation_id.clone(),
            point_id: self.point_id.clone(),
        }
    }

    /// Append a step, assigning the next sequential `step_no`.
    pub fn push(
        &mut self,
        step_type: StepType,
        description: impl Into<String>,
        detail: Option<String>,
        payload: Option<serde_json::Value>,
    ) {
        let step_no = self.steps.len() as u32 + 1;
        self.steps.push(ReasoningStep {
            step_no,
            step_type,
            description: description.into(),
            detail,
            payload,
        });
    }
}
