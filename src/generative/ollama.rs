//! Ollama `/api/generate` client (non-streaming).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{build_http, check_status, GenerationOptions, GenerativeClient};
use crate::config::GenerativeConfig;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    options: GenerationOptions,
}

impl OllamaClient {
    pub fn new(config: &GenerativeConfig) -> Result<Self> {
        Ok(Self {
            http: build_http(config.timeout_secs)?,
            endpoint: format!("{}/api/generate", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            options: GenerationOptions::from(config),
        })
    }
}

#[async_trait]
impl GenerativeClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.options.temperature,
                num_predict: self.options.max_tokens,
            },
        };
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("generate request to {} failed", self.endpoint))?;

        let parsed: GenerateResponse = check_status("ollama", response)
            .await?
            .json()
            .await
            .context("ollama returned malformed JSON")?;
        Ok(parsed.response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn generate_disables_streaming_and_reads_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "llama3",
                "prompt": "count to two",
                "stream": false,
                "options": { "num_predict": 32 }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"model": "llama3", "response": "one, two", "done": true}"#)
            .create_async()
            .await;

        let client = OllamaClient::new(&GenerativeConfig {
            provider: "ollama".into(),
            base_url: server.url(),
            model: "llama3".into(),
            max_tokens: 32,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(client.generate("count to two").await.unwrap(), "one, two");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_model_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/generate")
            .with_status(404)
            .with_body(r#"{"error": "model 'llama3' not found"}"#)
            .create_async()
            .await;

        let client = OllamaClient::new(&GenerativeConfig {
            base_url: server.url(),
            ..Default::default()
        })
        .unwrap();
        let err = client.generate("hi").await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
