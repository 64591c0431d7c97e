//! Text generation backends.
//!
//! The pipeline only needs "prompt in, text out"; [`GenerativeClient`] hides
//! whether that is an OpenAI-compatible server (vLLM, NIM), Ollama or Gemini.

pub mod gemini;
pub mod ollama;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::GenerativeConfig;

/// Sampling options applied to one completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&GenerativeConfig> for GenerationOptions {
    fn from(config: &GenerativeConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Complete `prompt` and return the raw model text.
    async fn generate(&self, prompt: &str) -> Result<String>;

    fn model(&self) -> &str;
}

/// Create a generative client from config.
pub fn create_client(config: &GenerativeConfig) -> Result<Arc<dyn GenerativeClient>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(openai::OpenAiClient::new(config)?)),
        "ollama" => Ok(Arc::new(ollama::OllamaClient::new(config)?)),
        "gemini" => Ok(Arc::new(gemini::GeminiClient::new(config)?)),
        other => anyhow::bail!(
            "unknown generative provider: {other}. Supported: openai, ollama, gemini"
        ),
    }
}

pub(crate) fn build_http(timeout_secs: Option<u64>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().context("failed to build generative HTTP client")
}

/// Fail with the response body when the status is not 2xx.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("{provider} returned HTTP {status}: {body}")
}
