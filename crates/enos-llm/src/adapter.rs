//! `LlmAdapter`: wraps any `LlmClient` with deterministic
//! call settings, caching, retry-with-backoff, and rate limiting. This is the
//! only seam through which the pipeline engines (C4-C7) reach an LLM.

use crate::cache::{hash_prompt, PromptCache};
use crate::error::AdapterError;
use crate::rate_limit::TokenBucketLimiter;
use enos_core::config::LlmConfig;
use enos_core::llm_client::{LlmClient, LlmRequest};
use enos_core::retry::RetryPolicy;
use rand::Rng;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Rough token estimate (chars / 4), used only for the token-budget split
/// decision, never for billing.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

pub struct LlmAdapter {
    client: Arc<dyn LlmClient>,
    cache: PromptCache,
    limiter: TokenBucketLimiter,
    retry: RetryPolicy,
    config: LlmConfig,
}

impl LlmAdapter {
    #[must_use]
    pub fn new(
        client: Arc<dyn LlmClient>,
        config: LlmConfig,
        cache: PromptCache,
        limiter: TokenBucketLimiter,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            cache,
            limiter,
            retry,
            config,
        }
    }

    #[must_use]
    pub fn token_budget(&self) -> usize {
        self.config.token_budget
    }

    /// Issue one `{system, user}` call, transparently applying caching,
    /// rate limiting, and retry. Returns the raw response text; JSON
    /// extraction is the caller's job via [`crate::json::extract_json`].
    pub async fn invoke(
        &self,
        system: &str,
        user: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AdapterError> {
        let prompt_hash = hash_prompt(system, user);
        if let Some(cached) = self.cache.get(prompt_hash, &self.config.model_id) {
            debug!(model_id = %self.config.model_id, "prompt cache hit");
            return Ok(cached);
        }

        let request = LlmRequest {
            system: system.to_string(),
            user: user.to_string(),
            model_id: self.config.model_id.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut last_error = None;
        for attempt in 1..=self.retry.max_attempts.max(1) {
            if cancel.is_cancelled() {
                return Err(AdapterError::Cancelled);
            }
            self.limiter
                .acquire(&self.config.model_id, cancel)
                .await
                .map_err(|_| AdapterError::Cancelled)?;

            let outcome = tokio::time::timeout(self.config.call_deadline, self.client.complete(&request)).await;
            match outcome {
                Ok(Ok(text)) => {
                    self.cache.put(prompt_hash, &self.config.model_id, text.clone());
                    return Ok(text);
                }
                Ok(Err(e)) => {
                    warn!(model_id = %self.config.model_id, attempt, error = %e, "LLM call failed");
                    let retryable = e.is_retryable();
                    last_error = Some(e.to_string());
                    if !retryable || attempt == self.retry.max_attempts {
                        break;
                    }
                }
                Err(_) => {
                    warn!(model_id = %self.config.model_id, attempt, "LLM call timed out");
                    last_error = Some("call exceeded deadline".to_string());
                    if attempt == self.retry.max_attempts {
                        break;
                    }
                }
            }

            let jitter_fraction = rand::thread_rng().gen_range(0.0..=1.0);
            let delay = self.retry.delay_for(attempt, jitter_fraction);
            tokio::select! {
                () = cancel.cancelled() => return Err(AdapterError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }

        Err(AdapterError::Exhausted {
            model_id: self.config.model_id.clone(),
            attempts: self.retry.max_attempts,
            last_error: last_error.unwrap_or_else(|| "unknown error".to_string()),
        })
    }
}
