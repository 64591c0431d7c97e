//! Nearest-neighbour search over feedback vectors.
//!
//! [`VectorIndex`] is the seam between the pipeline and whichever store holds
//! the vectors: [`pinecone::PineconeIndex`] for the hosted index or
//! [`local::LocalIndex`] for a SQLite + sqlite-vec file.

pub mod local;
pub mod pinecone;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{expand_tilde, VectorConfig};
use crate::types::{FeedbackMetadata, FeedbackRecord};

/// Inclusive Unix-second range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

/// Server-side metadata predicates. All set fields must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    pub timestamp: Option<TimeRange>,
    pub source_platform: Option<String>,
    pub sentiment_label: Option<String>,
    pub post_type: Option<String>,
}

impl MetadataFilter {
    pub fn time_range(range: TimeRange) -> Self {
        Self {
            timestamp: Some(range),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.timestamp.is_none()
            && self.source_platform.is_none()
            && self.sentiment_label.is_none()
            && self.post_type.is_none()
    }

    /// Pinecone filter document, e.g. `{"timestamp": {"$gte": 1, "$lte": 2}}`.
    pub fn to_pinecone(&self) -> serde_json::Value {
        let mut doc = serde_json::Map::new();
        if let Some(range) = self.timestamp {
            doc.insert(
                "timestamp".into(),
                serde_json::json!({ "$gte": range.start, "$lte": range.end }),
            );
        }
        if let Some(platform) = &self.source_platform {
            doc.insert("source_platform".into(), serde_json::json!({ "$eq": platform }));
        }
        if let Some(label) = &self.sentiment_label {
            doc.insert("sentiment_label".into(), serde_json::json!({ "$eq": label }));
        }
        if let Some(kind) = &self.post_type {
            doc.insert("post_type".into(), serde_json::json!({ "$eq": kind }));
        }
        serde_json::Value::Object(doc)
    }

    /// Client-side equivalent of the server filter.
    pub fn matches(&self, metadata: &FeedbackMetadata) -> bool {
        if let Some(range) = self.timestamp {
            match metadata.timestamp {
                Some(ts) if range.contains(ts) => {}
                _ => return false,
            }
        }
        if let Some(platform) = &self.source_platform {
            if metadata.source_platform.as_deref() != Some(platform.as_str()) {
                return false;
            }
        }
        if let Some(label) = &self.sentiment_label {
            if metadata.sentiment_label.as_deref() != Some(label.as_str()) {
                return false;
            }
        }
        if let Some(kind) = &self.post_type {
            if metadata.post_type.as_deref() != Some(kind.as_str()) {
                return false;
            }
        }
        true
    }
}

/// A vector ready to be written to an index.
#[derive(Debug, Clone)]
pub struct IndexedFeedback {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: FeedbackMetadata,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` records closest to `vector`, best first.
    ///
    /// An all-zero vector asks for a metadata-only listing.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<FeedbackRecord>>;

    /// Insert or replace vectors by id. Returns the number written.
    async fn upsert(&self, items: Vec<IndexedFeedback>) -> Result<usize>;
}

/// Create a vector index client from config.
pub fn create_index(config: &VectorConfig) -> Result<Arc<dyn VectorIndex>> {
    match config.provider.as_str() {
        "pinecone" => Ok(Arc::new(pinecone::PineconeIndex::new(config)?)),
        "local" => {
            let path = expand_tilde(&config.db_path);
            Ok(Arc::new(local::LocalIndex::open(&path)?))
        }
        other => anyhow::bail!("unknown vector provider: {other}. Supported: pinecone, local"),
    }
}
