//! The seam the LLM adapter sits behind: a minimal chat-model trait that any
//! backend can implement.
//!
//! This trait is deliberately transport-only: it takes a `{system, user}`
//! prompt pair and returns raw response text or a transport-level error.
//! JSON extraction, caching, retry, and rate limiting are the LLM Adapter's
//! job (crate `enos-llm`), not the client's.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One LLM invocation's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    pub system: String,
    pub user: String,
    pub model_id: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Transport-level failure from a `LlmClient`.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum LlmError {
    #[error("transport error calling {model_id}: {message}")]
    Transport { model_id: String, message: String },

    #[error("rate limit exceeded for {model_id}")]
    RateLimited { model_id: String },

    #[error("call to {model_id} exceeded its deadline")]
    Timeout { model_id: String },

    #[error("operation was cancelled")]
    Cancelled,
}

impl LlmError {
    /// Retry only on transport errors and rate limits. `FormatError` lives one
    /// layer up (it's a parse failure, not a transport failure), so this only
    /// covers the transport-level retryable kinds.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Transport { .. } | LlmError::RateLimited { .. } | LlmError::Timeout { .. })
    }
}

/// A single call point for LLM interactions.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Human-readable identifier for logging/metrics, e.g. `"rule-based-fallback"`.
    fn name(&self) -> &str;

    /// Issue one completion request, returning the raw response text.
    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError>;
}
