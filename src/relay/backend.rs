//! Inference backends: prompt in, reply out.

use crate::config::LlmConfig;
use crate::error::{AvatarError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Something that turns a prompt into a reply.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Generate a reply for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Non-streaming client for Ollama's `/api/generate`.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaBackend {
    /// Backend for `config.api_url` and `config.model`.
    ///
    /// A `request_timeout_secs` of zero leaves requests unbounded.
    pub fn new(config: &LlmConfig) -> Self {
        let mut builder = reqwest::Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        Self {
            client: builder.build().unwrap_or_default(),
            endpoint: format!("{}/api/generate", config.api_url.trim_end_matches('/')),
            model: config.model.clone(),
        }
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        debug!(model = %self.model, chars = prompt.len(), "inference request");

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AvatarError::Inference(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let detail: String = text.chars().take(500).collect();
            return Err(AvatarError::Inference(format!("HTTP {status}: {detail}")));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| AvatarError::Inference(format!("invalid response body: {e}")))?;
        parsed
            .response
            .ok_or_else(|| AvatarError::Inference("response field missing".to_owned()))
    }
}
