//! Reasoning Logger: append-only sink for per-point
//! reasoning chains and reflections, keyed by `(operation_id, point_id)`.
//! No mutation, no compaction; must be safe against concurrent writers
//! within one operation.

pub mod error;
pub mod jsonl;
pub mod memory;
pub mod record;

pub use error::LogError;
pub use jsonl::JsonlReasoningLog;
pub use memory::MemoryReasoningLog;
pub use record::LogRecord;

use async_trait::async_trait;
use enos_core::ids::{OperationId, PointId};
use enos_core::reasoning::ReasoningChain;
use enos_core::reflection::Reflection;

/// The append-only sink every engine writes its reasoning through
///. Implementations must serialize concurrent calls so two
/// writers in the same operation never interleave a partial record.
#[async_trait]
pub trait ReasoningLog: Send + Sync {
    async fn append_chain(&self, chain: ReasoningChain) -> Result<(), LogError>;

    async fn append_reflection(&self, operation_id: OperationId, point_id: PointId, reflection: Reflection) -> Result<(), LogError>;
}
