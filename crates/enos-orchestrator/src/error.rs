//! Errors from the Pipeline Orchestrator.

use enos_core::context::ErrorContext;
use enos_core::ids::OperationId;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OrchestratorError {
    #[error("unknown operation: {0}")]
    UnknownOperation(OperationId),

    #[error("internal invariant violated during orchestration: {0}")]
    InternalInvariant(ErrorContext),
}
