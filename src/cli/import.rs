use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use ttime::config::TtimeConfig;
use ttime::db;
use ttime::embedding;
use ttime::ingest::{self, ImportItem};
use ttime::vector::{self, local::LocalIndex, VectorIndex};

/// Embed a JSON array of feedback items and upsert them into the configured index.
///
/// Items without text are skipped. Ids come from the platform and source id,
/// so importing the same file twice leaves the index unchanged.
pub async fn import(config: &TtimeConfig, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;
    let items: Vec<ImportItem> =
        serde_json::from_str(&json).context("failed to parse import JSON (expected an array)")?;

    let index = open_index(config)?;
    let embedder = embedding::create_embedder(&config.embedding)?;

    println!("Importing {} feedback items...", items.len());
    let pb = super::progress_bar(
        Some(items.len() as u64),
        "  {bar:40.cyan/blue} {pos}/{len} ({eta})",
    )?;
    let report = ingest::ingest(embedder.as_ref(), index.as_ref(), items, |n| {
        pb.inc(n as u64)
    })
    .await?;
    pb.finish_and_clear();

    println!("Import complete:");
    println!("  Upserted: {}", report.written);
    if report.skipped > 0 {
        println!("  Skipped:  {} (no text)", report.skipped);
    }
    Ok(())
}

/// The local index also records which embedding model filled it.
fn open_index(config: &TtimeConfig) -> Result<Arc<dyn VectorIndex>> {
    if config.vector.provider != "local" {
        return vector::create_index(&config.vector);
    }

    let conn = db::open_database(config.resolved_db_path())?;
    match db::schema::embedding_model(&conn)? {
        Some(stored) if stored != config.embedding.model => {
            tracing::warn!(
                stored = %stored,
                configured = %config.embedding.model,
                "index was built with a different embedding model; scores will be meaningless"
            );
        }
        Some(_) => {}
        None => db::schema::set_embedding_model(&conn, &config.embedding.model)?,
    }
    Ok(Arc::new(LocalIndex::from_connection(conn)))
}
