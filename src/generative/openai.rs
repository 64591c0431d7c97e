//! OpenAI-compatible `/chat/completions` client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{build_http, check_status, GenerationOptions, GenerativeClient};
use crate::config::GenerativeConfig;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    options: GenerationOptions,
}

impl OpenAiClient {
    pub fn new(config: &GenerativeConfig) -> Result<Self> {
        Ok(Self {
            http: build_http(config.timeout_secs)?,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            options: GenerationOptions::from(config),
        })
    }
}

#[async_trait]
impl GenerativeClient for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        };

        let mut builder = self.http.post(&self.endpoint).json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }
        let response = builder
            .send()
            .await
            .with_context(|| format!("completion request to {} failed", self.endpoint))?;

        let parsed: ChatResponse = check_status("chat completions", response)
            .await?
            .json()
            .await
            .context("chat completions returned malformed JSON")?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("chat completions returned no choices"))?;
        tracing::debug!(model = %self.model, chars = text.len(), "completion received");
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
