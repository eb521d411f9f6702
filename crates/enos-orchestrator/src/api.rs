//! `PipelineApi`: request/response verbs that
//! map one-to-one onto the Orchestrator's entry points. Binding this to HTTP,
//! a queue, or anything else is out of scope and left to the
//! caller; this crate provides the one direct in-process implementation.

use crate::types::{MappingSummary, RemapRequest, SubmitRequest};
use async_trait::async_trait;
use enos_core::ids::OperationId;
use enos_core::mapping::Mapping;
use enos_core::progress::OperationProgress;

#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Submit a mapping operation; returns immediately with an `operation_id`
    /// while the batches run in the background.
    async fn submit(&self, request: SubmitRequest) -> OperationId;

    /// Fetch a progress snapshot by `operation_id`; `None` if unknown.
    async fn progress(&self, operation_id: &OperationId) -> Option<OperationProgress>;

    /// Fetch a mapping summary by `operation_id`; `None` if unknown.
    async fn summary(&self, operation_id: &OperationId) -> Option<MappingSummary>;

    /// Request a per-point remap with reflection. Returns the
    /// revised `Mapping` if reflection produced one in-bounds.
    async fn remap(&self, operation_id: &OperationId, request: RemapRequest) -> Option<Mapping>;

    /// Cancel an in-flight operation; `true` if it was running and is now
    /// transitioning to `cancelled`.
    async fn cancel(&self, operation_id: &OperationId) -> bool;
}
