//! Text-to-vector embedding.
//!
//! Provides the [`Embedder`] trait and two implementations of e5-base-v2
//! (768 dimensions, mean-pooled, L2-normalized): [`http::HttpEmbedder`] talks to
//! the embedding service, [`local::LocalEmbedder`] runs the ONNX export in
//! process. The local model is heavy, so [`LazyEmbedder`] defers loading it to
//! the first request and reuses it afterwards.

pub mod http;
pub mod local;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::config::EmbeddingConfig;

/// Number of dimensions in the embedding vectors (e5-base-v2).
pub const EMBEDDING_DIM: usize = 768;

/// Trait for embedding text into vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text string into a vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of text strings. Implementations may override for batched inference.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// e5 models expect every input to say whether it is a query or a passage.
/// Text without either marker is treated as a query.
pub fn with_query_prefix(text: &str) -> String {
    if text.starts_with("query: ") || text.starts_with("passage: ") {
        text.to_string()
    } else {
        format!("query: {text}")
    }
}

/// Prefix used when embedding documents for storage.
pub fn as_passage(text: &str) -> String {
    if text.starts_with("passage: ") {
        text.to_string()
    } else {
        format!("passage: {text}")
    }
}

/// Create an embedder from config.
///
/// `"http"` returns a client for the embedding service; `"local"` returns a
/// [`LazyEmbedder`] that loads the ONNX model on first use.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "http" => Ok(Arc::new(http::HttpEmbedder::new(config)?)),
        "local" => Ok(Arc::new(LazyEmbedder::new(config.clone()))),
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: http, local"),
    }
}

/// Loads the local ONNX model on first use and keeps it for the life of the process.
pub struct LazyEmbedder {
    config: EmbeddingConfig,
    cell: OnceCell<Arc<local::LocalEmbedder>>,
}

impl LazyEmbedder {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    async fn get(&self) -> Result<Arc<local::LocalEmbedder>> {
        let embedder = self
            .cell
            .get_or_try_init(|| async {
                let config = self.config.clone();
                let loaded =
                    tokio::task::spawn_blocking(move || local::LocalEmbedder::new(&config))
                        .await??;
                Ok::<_, anyhow::Error>(Arc::new(loaded))
            })
            .await?;
        Ok(Arc::clone(embedder))
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}

#[async_trait]
impl Embedder for LazyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.get().await?.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.get().await?.embed_batch(texts).await
    }
}
