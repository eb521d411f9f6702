//! Cross-cutting error kinds that don't belong to one specific component.

use crate::context::ErrorContext;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    /// An individual point is malformed; the point is skipped and counted in
    /// `failed`, never aborts the operation.
    #[error("invalid point: {0}")]
    InputValidation(ErrorContext),

    /// A mapping candidate belongs to a different equipment class than the
    /// tagged point; the mapping is rejected, the operation proceeds.
    #[error("equipment mismatch: {0}")]
    EquipmentMismatch(ErrorContext),

    /// A broken invariant that should be structurally impossible; fatal for
    /// the operation.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(ErrorContext),

    /// Operation-terminal: a cancellation request was observed at a checkpoint
    ///. Already-committed results are retained.
    #[error("operation cancelled: {0}")]
    OperationCancelled(ErrorContext),

    /// Operation-terminal: the overall operation deadline elapsed.
    #[error("operation timed out: {0}")]
    OperationTimeout(ErrorContext),
}
