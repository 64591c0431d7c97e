//! Client for the embedding service (`POST /embed`).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{with_query_prefix, Embedder, EMBEDDING_DIM};
use crate::config::EmbeddingConfig;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

pub struct HttpEmbedder {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().context("failed to build embedding HTTP client")?;
        let endpoint = format!("{}/embed", config.url.trim_end_matches('/'));
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        anyhow::ensure!(!text.trim().is_empty(), "cannot embed empty text");
        let input = with_query_prefix(text);

        let response = self
            .http
            .post(&self.endpoint)
            .json(&EmbedRequest { text: &input })
            .send()
            .await
            .with_context(|| format!("embedding request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("embedding service returned HTTP {status}: {body}");
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .context("embedding service returned malformed JSON")?;

        anyhow::ensure!(
            parsed.embedding.len() == EMBEDDING_DIM,
            "embedding service returned {} dimensions, expected {EMBEDDING_DIM}",
            parsed.embedding.len()
        );
        tracing::debug!(chars = text.len(), "embedded text via service");
        Ok(parsed.embedding)
    }
}
