//! Loading scraped feedback into a vector index.
//!
//! Each item gets an id derived from its platform and its id on that platform,
//! so re-importing a file replaces rows instead of duplicating them and equal
//! ids from two platforms stay distinct.

use anyhow::Result;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::embedding::{as_passage, Embedder};
use crate::types::FeedbackMetadata;
use crate::vector::{IndexedFeedback, VectorIndex};

/// Stored text is cut to this many characters; the embedding sees all of it.
pub const MAX_STORED_CHARS: usize = 1000;
pub const EMBED_BATCH: usize = 32;

/// One feedback item as written by the scrapers.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportItem {
    /// The item's id on its source platform.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub metadata: FeedbackMetadata,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub written: usize,
    /// Items without text.
    pub skipped: usize,
}

/// Stable vector id: the first 128 bits of `sha256("{platform}_{source}")` as hex.
///
/// `source` is the platform id, or the text itself when the item has none.
pub fn vector_id(platform: Option<&str>, source_id: Option<&str>, text: &str) -> String {
    let platform = platform.filter(|p| !p.is_empty()).unwrap_or("unknown");
    let source = source_id.filter(|s| !s.is_empty()).unwrap_or(text);
    let digest = Sha256::digest(format!("{platform}_{source}").as_bytes());
    digest[..16].iter().map(|b| format!("{b:02x}")).collect()
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

/// Embed `items` in batches and upsert them. `on_batch` receives the size of
/// each finished batch.
pub async fn ingest<F>(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    items: Vec<ImportItem>,
    mut on_batch: F,
) -> Result<IngestReport>
where
    F: FnMut(usize),
{
    let total = items.len();
    let items: Vec<ImportItem> = items
        .into_iter()
        .filter(|item| {
            item.metadata
                .text
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty())
        })
        .collect();
    let mut report = IngestReport {
        written: 0,
        skipped: total - items.len(),
    };

    for batch in items.chunks(EMBED_BATCH) {
        let texts: Vec<String> = batch
            .iter()
            .map(|item| as_passage(item.metadata.text.as_deref().unwrap_or_default()))
            .collect();
        let vectors = embedder.embed_batch(&texts).await?;
        anyhow::ensure!(
            vectors.len() == batch.len(),
            "embedder returned {} vectors for {} texts",
            vectors.len(),
            batch.len()
        );

        let records = batch
            .iter()
            .zip(vectors)
            .map(|(item, values)| to_indexed(item, values))
            .collect();
        report.written += index.upsert(records).await?;
        on_batch(batch.len());
    }

    tracing::info!(
        written = report.written,
        skipped = report.skipped,
        "feedback ingested"
    );
    Ok(report)
}

fn to_indexed(item: &ImportItem, values: Vec<f32>) -> IndexedFeedback {
    let mut metadata = item.metadata.clone();
    let text = metadata.text.take().unwrap_or_default();
    let source_id = item
        .id
        .clone()
        .or_else(|| metadata.source_identifier.clone());

    let id = vector_id(
        metadata.source_platform.as_deref(),
        source_id.as_deref(),
        &text,
    );
    metadata.source_identifier = source_id;
    metadata.text = Some(truncate_chars(&text, MAX_STORED_CHARS));
    IndexedFeedback {
        id,
        values,
        metadata,
    }
}
