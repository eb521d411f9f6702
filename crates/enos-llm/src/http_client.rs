//! Generic HTTP-backed `LlmClient` (reqwest with pooled connections and
//! explicit timeouts). Speaks a minimal
//! `{system, user} -> {text}` JSON contract so it can sit in front of any
//! self-hosted or gateway chat endpoint without per-vendor request shaping.

use async_trait::async_trait;
use enos_core::llm_client::{LlmClient, LlmError, LlmRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 8;
const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    system: &'a str,
    user: &'a str,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    text: String,
}

/// Talks to one chat-completion endpoint over HTTP.
pub struct HttpChatClient {
    name: String,
    endpoint: String,
    client: reqwest::Client,
}

impl HttpChatClient {
    /// Build a client with LLM-call-shaped connection pooling: modest
    /// keep-alive pool sizing, no long idle reuse assumptions.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Result<Self, LlmError> {
        let name = name.into();
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(DEFAULT_POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(DEFAULT_POOL_IDLE_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Transport {
                model_id: name.clone(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            name,
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl LlmClient for HttpChatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let body = ChatRequestBody {
            model: &request.model_id,
            system: &request.system,
            user: &request.user,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_or_rate_limit(&self.name, &e))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited {
                model_id: self.name.clone(),
            });
        }
        if !response.status().is_success() {
            return Err(LlmError::Transport {
                model_id: self.name.clone(),
                message: format!("endpoint returned status {}", response.status()),
            });
        }

        let parsed: ChatResponseBody = response.json().await.map_err(|e| LlmError::Transport {
            model_id: self.name.clone(),
            message: format!("failed to parse response body: {e}"),
        })?;
        Ok(parsed.text)
    }
}

fn transport_or_rate_limit(model_id: &str, e: &reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout {
            model_id: model_id.to_string(),
        }
    } else {
        LlmError::Transport {
            model_id: model_id.to_string(),
            message: e.to_string(),
        }
    }
}
