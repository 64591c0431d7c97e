//! SQLite storage for the local feedback index.

pub mod schema;

use std::path::Path;
use std::sync::Once;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;
use sqlite_vec::sqlite3_vec_init;

/// How long a writer waits on a lock held by another process (e.g. an import
/// running next to the server).
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

static SQLITE_VEC_INIT: Once = Once::new();

/// Register sqlite-vec as an auto extension so every later connection has
/// `vec_distance_cosine`. Idempotent.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Open (or create) the index file at `path`, creating parent directories.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    load_sqlite_vec();
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open feedback index at {}", path.display()))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    let conn = prepare(conn)?;

    tracing::info!(path = %path.display(), "feedback index opened");
    Ok(conn)
}

/// A throwaway index that lives as long as the connection.
pub fn open_memory_database() -> Result<Connection> {
    load_sqlite_vec();
    prepare(Connection::open_in_memory().context("failed to open in-memory index")?)
}

fn prepare(conn: Connection) -> Result<Connection> {
    schema::init_schema(&conn).context("failed to initialize feedback schema")?;
    Ok(conn)
}
