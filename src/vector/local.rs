//! SQLite + sqlite-vec feedback index.
//!
//! Stores each vector as a little-endian f32 BLOB and ranks with
//! `vec_distance_cosine`, so no virtual table is needed and metadata
//! predicates are ordinary `WHERE` clauses.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, Row};

use super::{IndexedFeedback, MetadataFilter, VectorIndex};
use crate::db;
use crate::types::{FeedbackMetadata, FeedbackRecord};

const COLUMNS: &str = "id, text, timestamp, datetime, source_platform, sentiment_label, \
     sentiment_score, post_type, author, upvotes, source_identifier, url, location_country, \
     location_state, location_city, latitude, longitude";

// ?1 vector, ?2..?6 timestamp bounds, platform, label and post type, ?7 limit
const FILTER_SQL: &str = "(?2 IS NULL OR timestamp >= ?2) \
     AND (?3 IS NULL OR timestamp <= ?3) \
     AND (?4 IS NULL OR source_platform = ?4) \
     AND (?5 IS NULL OR sentiment_label = ?5) \
     AND (?6 IS NULL OR post_type = ?6)";

#[derive(Clone)]
pub struct LocalIndex {
    conn: Arc<Mutex<Connection>>,
}

impl LocalIndex {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_connection(db::open_database(path)?))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::from_connection(db::open_memory_database()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Number of stored vectors.
    pub async fn count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM feedback", [], |r| r.get(0))?;
            Ok(n as usize)
        })
        .await
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| anyhow::anyhow!("index lock poisoned: {e}"))?;
            f(&guard)
        })
        .await
        .context("index task panicked")?
    }
}

#[async_trait]
impl VectorIndex for LocalIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<FeedbackRecord>> {
        let listing = vector.iter().all(|v| *v == 0.0);
        let blob = vector_to_blob(vector);
        let filter = filter.cloned().unwrap_or_default();

        self.with_conn(move |conn| {
            let range = filter.timestamp;
            let sql = if listing {
                format!(
                    "SELECT {COLUMNS}, 0.0 AS score FROM feedback \
                     WHERE {FILTER_SQL} \
                     ORDER BY timestamp DESC LIMIT ?7"
                )
            } else {
                format!(
                    "SELECT {COLUMNS}, 1.0 - vec_distance_cosine(embedding, ?1) AS score \
                     FROM feedback WHERE {FILTER_SQL} \
                     ORDER BY score DESC LIMIT ?7"
                )
            };
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    params![
                        blob,
                        range.map(|r| r.start),
                        range.map(|r| r.end),
                        filter.source_platform,
                        filter.sentiment_label,
                        filter.post_type,
                        top_k as i64,
                    ],
                    row_to_record,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            tracing::debug!(top_k, listing, matches = rows.len(), "local index query");
            Ok(rows)
        })
        .await
    }

    async fn upsert(&self, items: Vec<IndexedFeedback>) -> Result<usize> {
        self.with_conn(move |conn| {
            let tx = conn.unchecked_transaction()?;
            {
                let mut stmt = tx.prepare(&format!(
                    "INSERT OR REPLACE INTO feedback ({COLUMNS}, embedding) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
                ))?;
                for item in &items {
                    let m = &item.metadata;
                    stmt.execute(params![
                        item.id,
                        m.text,
                        m.timestamp,
                        m.datetime,
                        m.source_platform,
                        m.sentiment_label,
                        m.sentiment_score,
                        m.post_type,
                        m.author,
                        m.upvotes,
                        m.source_identifier,
                        m.url,
                        m.country,
                        m.region,
                        m.city,
                        m.latitude,
                        m.longitude,
                        vector_to_blob(&item.values),
                    ])?;
                }
            }
            tx.commit()?;
            tracing::info!(written = items.len(), "upserted vectors to local index");
            Ok(items.len())
        })
        .await
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<FeedbackRecord> {
    let score: f64 = row.get(17)?;
    Ok(FeedbackRecord {
        id: row.get(0)?,
        score: score as f32,
        metadata: FeedbackMetadata {
            text: row.get(1)?,
            timestamp: row.get(2)?,
            datetime: row.get(3)?,
            source_platform: row.get(4)?,
            sentiment_label: row.get(5)?,
            sentiment_score: row.get(6)?,
            post_type: row.get(7)?,
            author: row.get(8)?,
            upvotes: row.get(9)?,
            source_identifier: row.get(10)?,
            url: row.get(11)?,
            country: row.get(12)?,
            region: row.get(13)?,
            city: row.get(14)?,
            latitude: row.get(15)?,
            longitude: row.get(16)?,
        },
    })
}

/// sqlite-vec reads float32 vectors as packed little-endian bytes.
fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}
