use thiserror::Error;

/// Raised when a response cannot be turned into the expected JSON shape.
/// Carries the raw text so reflection can attempt salvage.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("could not extract JSON from LLM response: {reason}")]
pub struct FormatError {
    pub reason: String,
    pub raw: String,
}

/// Outcome of one `LlmAdapter::invoke` call.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum AdapterError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("operation was cancelled before a response was obtained")]
    Cancelled,

    /// All retries were exhausted on transport-level failures. Callers must
    /// route to the rule-based fallback path.
    #[error("exhausted {attempts} attempt(s) calling {model_id}: {last_error}")]
    Exhausted {
        model_id: String,
        attempts: u32,
        last_error: String,
    },
}
