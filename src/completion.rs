//! Text-completion capability: trait, error type, and the OpenAI-compatible
//! client implementation.
//!
//! Every pipeline stage that talks to a language model goes through the
//! [`TextCompletion`] trait, so tests can substitute scripted responses and
//! the client can point at any OpenAI-compatible endpoint (a local model
//! server included). The client, model name, and tuning values are built
//! from [`CompletionConfig`] and passed in explicitly — nothing reads
//! ambient state besides the `OPENAI_API_KEY` environment variable.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::config::CompletionConfig;

/// A completion request: system framing, user prompt, and per-call limits.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Error at the completion boundary. Callers in the analysis, gap, and
/// synthesis stages must catch this and degrade; it never aborts a run
/// on its own.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("completion request failed: {0}")]
    Network(String),
    #[error("completion response missing content")]
    EmptyResponse,
    #[error("OPENAI_API_KEY environment variable not set")]
    MissingApiKey,
}

/// Capability trait for language-model completions.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiCompletion {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    max_retries: u32,
}

impl OpenAiCompletion {
    /// Build a client from configuration.
    ///
    /// Reads `OPENAI_API_KEY` from the environment. Endpoints that need no
    /// key (local servers) still require the variable to be set; any dummy
    /// value works.
    pub fn new(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let api_key =
            std::env::var("OPENAI_API_KEY").map_err(|_| CompletionError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl TextCompletion for OpenAiCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let url = format!("{}/chat/completions", self.base_url);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| CompletionError::Network(e.to_string()))?;
                        return parse_completion_response(&json);
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(CompletionError::Api {
                            status: status.as_u16(),
                            body: body_text,
                        });
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    return Err(CompletionError::Api {
                        status: status.as_u16(),
                        body: body_text,
                    });
                }
                Err(e) => {
                    last_err = Some(CompletionError::Network(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or(CompletionError::EmptyResponse))
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_completion_response(json: &serde_json::Value) -> Result<String, CompletionError> {
    let content = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or(CompletionError::EmptyResponse)?;

    if content.trim().is_empty() {
        return Err(CompletionError::EmptyResponse);
    }

    Ok(content.to_string())
}
