//! One append-only log record: either a full reasoning chain
//! (one per point per phase) or a single reflection record.

use enos_core::ids::{OperationId, PointId};
use enos_core::reasoning::ReasoningChain;
use enos_core::reflection::Reflection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record_type", rename_all = "snake_case")]
pub enum LogRecord {
    Chain(ReasoningChain),
    Reflection {
        operation_id: OperationId,
        point_id: PointId,
        reflection: Reflection,
    },
}

impl LogRecord {
    #[must_use]
    pub fn key(&self) -> (&OperationId, &PointId) {
        match self {
            LogRecord::Chain(chain) => (&chain.operation_id, &chain.point_id),
            LogRecord::Reflection { operation_id, point_id, .. } => (operation_id, point_id),
        }
    }
}
