//! Shared data model, error, and adapter-trait types for the EnOS point
//! mapping pipeline.
//!
//! Every other crate in this workspace depends on this one; it depends on
//! nothing else in the workspace.

pub mod canonical;
pub mod config;
pub mod context;
pub mod error;
pub mod ids;
pub mod llm_client;
pub mod mapping;
pub mod point;
pub mod progress;
pub mod reasoning;
pub mod reflection;
pub mod retry;
pub mod tagged_point;

#[cfg(feature = "test-support")]
pub mod test_prelude;

pub use canonical::CanonicalPoint;
pub use config::PipelineConfig;
pub use context::ErrorContext;
pub use error::CoreError;
pub use ids::{OperationId, PointId};
pub use llm_client::{LlmClient, LlmError, LlmRequest};
pub use mapping::{Mapping, MappingKind, Transform};
pub use point::{Point, PointType};
pub use progress::{OperationProgress, OperationState, Phase};
pub use reasoning::{ReasoningChain, ReasoningRef, ReasoningStep, StepType};
pub use reflection::{Reflection, ReflectionType};
pub use retry::RetryPolicy;
pub use tagged_point::{Function, TaggedPoint};
