//! Pinecone data-plane client (`/query`, `/vectors/upsert`).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{IndexedFeedback, MetadataFilter, VectorIndex};
use crate::config::VectorConfig;
use crate::types::{FeedbackMetadata, FeedbackRecord};

/// Pinecone caps upsert requests; 96 records per batch stays under the limit.
const UPSERT_BATCH: usize = 96;
const API_VERSION: &str = "2024-07";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "str::is_empty")]
    namespace: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Deserialize)]
struct Match {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<FeedbackMetadata>,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a FeedbackMetadata,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
    #[serde(skip_serializing_if = "str::is_empty")]
    namespace: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

pub struct PineconeIndex {
    http: reqwest::Client,
    host: String,
    api_key: String,
    namespace: String,
}

impl PineconeIndex {
    pub fn new(config: &VectorConfig) -> Result<Self> {
        anyhow::ensure!(
            !config.index_host.is_empty(),
            "vector.index_host is not set (or PINECONE_INDEX_HOST)"
        );
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let host = if config.index_host.starts_with("http") {
            config.index_host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", config.index_host.trim_end_matches('/'))
        };
        Ok(Self {
            http: builder.build().context("failed to build Pinecone HTTP client")?,
            host,
            api_key: config.api_key.clone(),
            namespace: config.namespace.clone(),
        })
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let url = format!("{}{path}", self.host);
        let response = self
            .http
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("pinecone {path} returned HTTP {status}: {text}");
        }
        Ok(response)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<FeedbackRecord>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: &self.namespace,
            filter: filter.filter(|f| !f.is_empty()).map(MetadataFilter::to_pinecone),
        };

        let parsed: QueryResponse = self
            .post("/query", &request)
            .await?
            .json()
            .await
            .context("pinecone query returned malformed JSON")?;

        tracing::debug!(
            top_k,
            filtered = request.filter.is_some(),
            matches = parsed.matches.len(),
            "pinecone query"
        );

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| FeedbackRecord {
                id: m.id,
                score: m.score,
                metadata: m.metadata.unwrap_or_default(),
            })
            .collect())
    }

    async fn upsert(&self, items: Vec<IndexedFeedback>) -> Result<usize> {
        let mut written = 0;
        for batch in items.chunks(UPSERT_BATCH) {
            let request = UpsertRequest {
                vectors: batch
                    .iter()
                    .map(|item| UpsertVector {
                        id: &item.id,
                        values: &item.values,
                        metadata: &item.metadata,
                    })
                    .collect(),
                namespace: &self.namespace,
            };
            let parsed: UpsertResponse = self
                .post("/vectors/upsert", &request)
                .await?
                .json()
                .await
                .context("pinecone upsert returned malformed JSON")?;
            written += parsed.upserted_count;
        }
        tracing::info!(written, "upserted vectors to pinecone");
        Ok(written)
    }
}
