//! Exponential backoff retry policy for the LLM adapter.

use std::time::Duration;

/// Backoff schedule for retrying a retryable LLM call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    base_ms: u64,
    max_ms: u64,
    multiplier: f64,
    jitter_ms: u64,
}

impl RetryPolicy {
    /// Exponential backoff, base 200ms doubling up to 5s, no jitter.
    #[must_use]
    pub fn exponential(max_attempts: u32) -> Self {
        Self::exponential_with_params(max_attempts, 200, 5_000)
    }

    #[must_use]
    pub fn exponential_with_params(max_attempts: u32, base_ms: u64, max_ms: u64) -> Self {
        Self {
            max_attempts,
            base_ms,
            max_ms,
            multiplier: 2.0,
            jitter_ms: 0,
        }
    }

    #[must_use]
    pub fn exponential_jitter(
        max_attempts: u32,
        base_ms: u64,
        max_ms: u64,
        multiplier: f64,
        jitter_ms: u64,
    ) -> Self {
        Self {
            max_attempts,
            base_ms,
            max_ms,
            multiplier,
            jitter_ms,
        }
    }

    /// Delay before attempt `attempt` (1-indexed: the delay *before* the retry
    /// following a failed attempt `attempt`).
    #[must_use]
    pub fn delay_for(&self, attempt: u32, jitter_fraction: f64) -> Duration {
        let exp = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let base = (self.base_ms as f64 * exp).min(self.max_ms as f64);
        let jitter = if self.jitter_ms > 0 {
            self.jitter_ms as f64 * jitter_fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Duration::from_millis((base + jitter) as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(2)
    }
}
