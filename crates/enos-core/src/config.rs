//! Every pipeline tunable, as explicit configuration structs with `Default`
//! impls matching the documented defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Confidence thresholds gating `Mapping.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// `kind=auto` requires `confidence >= tau_auto`.
    pub tau_auto: f64,
    /// `kind=suggested` requires `tau_sugg <= confidence < tau_auto`.
    pub tau_sugg: f64,
    /// Reflection triggers when `confidence < tau_reflect`.
    pub tau_reflect: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            tau_auto: 0.60,
            tau_sugg: 0.10,
            tau_reflect: 0.50,
        }
    }
}

/// Which numeric group of a compound instance id (e.g. `FCU_01_25`) is
/// canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstancePolicy {
    /// Use the first numeric group found in the leading segment.
    FirstGroup,
    /// Use the last numeric group found in the leading segment.
    LastGroup,
}

impl Default for InstancePolicy {
    fn default() -> Self {
        InstancePolicy::LastGroup
    }
}

/// LLM call tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub model_id: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(with = "duration_secs")]
    pub call_deadline: Duration,
    pub token_budget: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model_id: "local-fallback".to_string(),
            temperature: 0.1,
            max_tokens: 2000,
            call_deadline: Duration::from_secs(30),
            token_budget: 6000,
        }
    }
}

/// Prompt/response cache tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    #[serde(with = "duration_secs")]
    pub ttl: Duration,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(86_400),
            max_entries: 10_000,
        }
    }
}

/// Token-bucket rate limit tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_window: u32,
    #[serde(with = "duration_secs")]
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: 60,
            window: Duration::from_secs(60),
        }
    }
}

/// Retry/backoff tuning for the LLM Adapter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub n_retry: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            n_retry: 2,
            base_backoff_ms: 200,
            max_backoff_ms: 5_000,
        }
    }
}

/// Top-level configuration for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub batch_size: usize,
    pub parallel_llm_calls: usize,
    pub n_reflect: u32,
    pub thresholds: Thresholds,
    pub instance_policy: InstancePolicy,
    pub llm: LlmConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryConfig,
    #[serde(with = "duration_secs")]
    pub operation_deadline: Duration,
    /// When `false`, the pipeline never calls `LlmClient` and relies purely on
    /// deterministic local rules.
    pub llm_enabled: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            parallel_llm_calls: 4,
            n_reflect: 1,
            thresholds: Thresholds::default(),
            instance_policy: InstancePolicy::default(),
            llm: LlmConfig::default(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            operation_deadline: Duration::from_secs(3600),
            llm_enabled: true,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}
