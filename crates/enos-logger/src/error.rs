//! Errors from the Reasoning Logger.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LogError {
    #[error("failed to write reasoning log record: {0}")]
    Write(String),

    #[error("failed to serialize reasoning log record: {0}")]
    Serialize(#[from] serde_json::Error),
}
