//! LLM Adapter: the single call point through which the
//! pipeline engines reach an LLM, wrapping deterministic settings, JSON
//! extraction, caching, retry, and rate limiting around an `LlmClient`.

pub mod adapter;
pub mod cache;
pub mod error;
pub mod fallback;
pub mod json;
pub mod rate_limit;
pub mod templating;

#[cfg(feature = "http")]
pub mod http_client;

pub use adapter::{estimate_tokens, LlmAdapter};
pub use cache::{hash_prompt, PromptCache};
pub use error::{AdapterError, FormatError};
pub use fallback::RuleBasedFallbackClient;
pub use json::{extract_json, extract_json_value};
pub use rate_limit::{AcquireCancelled, TokenBucketLimiter};
pub use templating::render;
