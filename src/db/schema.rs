//! DDL for the local feedback index.
//!
//! One `feedback` row per embedded post with its metadata in plain columns and
//! the vector as a little-endian f32 BLOB that sqlite-vec's distance functions
//! read directly. `schema_meta` records which embedding model filled the table.

use rusqlite::{Connection, OptionalExtension};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS feedback (
    id TEXT PRIMARY KEY,
    text TEXT,
    timestamp INTEGER,
    datetime TEXT,
    source_platform TEXT,
    sentiment_label TEXT,
    sentiment_score REAL,
    post_type TEXT,
    author TEXT,
    upvotes INTEGER,
    source_identifier TEXT,
    url TEXT,
    location_country TEXT,
    location_state TEXT,
    location_city TEXT,
    latitude REAL,
    longitude REAL,
    embedding BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_feedback_timestamp ON feedback(timestamp);
CREATE INDEX IF NOT EXISTS idx_feedback_platform ON feedback(source_platform);
CREATE INDEX IF NOT EXISTS idx_feedback_label ON feedback(sentiment_label);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

pub const SCHEMA_VERSION: u32 = 2;

/// Columns added after version 1, with their types.
const ADDED_COLUMNS: &[(&str, &str)] = &[("upvotes", "INTEGER"), ("source_identifier", "TEXT")];

/// Initialize all tables and bring a version 1 file up to date. Idempotent.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    let version = schema_version(conn)?;
    if version < SCHEMA_VERSION {
        let existing: Vec<String> = conn
            .prepare("SELECT name FROM pragma_table_info('feedback')")?
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        let tx = conn.unchecked_transaction()?;
        for (column, kind) in ADDED_COLUMNS {
            if !existing.iter().any(|c| c == column) {
                tx.execute_batch(&format!("ALTER TABLE feedback ADD COLUMN {column} {kind};"))?;
            }
        }
        tx.execute(
            "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
            [SCHEMA_VERSION.to_string()],
        )?;
        tx.commit()?;
        tracing::info!(from = version, to = SCHEMA_VERSION, "feedback schema migrated");
    }
    Ok(())
}

pub fn schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| row.get::<_, String>(0),
    )
    .map(|v| v.parse().unwrap_or(0))
}

pub fn embedding_model(conn: &Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'embedding_model'",
        [],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_embedding_model(conn: &Connection, model: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO schema_meta (key, value) VALUES ('embedding_model', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [model],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_tables_and_loads_vec() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(tables, vec!["feedback".to_string(), "schema_meta".to_string()]);

        let version: String = conn
            .query_row("SELECT vec_version()", [], |r| r.get(0))
            .unwrap();
        assert!(!version.is_empty());
    }

    #[test]
    fn schema_is_idempotent() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
    }

    #[test]
    fn version_one_file_gains_new_columns() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE feedback (
                 id TEXT PRIMARY KEY, text TEXT, timestamp INTEGER, datetime TEXT,
                 source_platform TEXT, sentiment_label TEXT, sentiment_score REAL,
                 post_type TEXT, author TEXT, url TEXT, location_country TEXT,
                 location_state TEXT, location_city TEXT, latitude REAL, longitude REAL,
                 embedding BLOB NOT NULL
             );
             CREATE TABLE schema_meta (key TEXT PRIMARY KEY, value TEXT NOT NULL);
             INSERT INTO schema_meta (key, value) VALUES ('schema_version', '1');",
        )
        .unwrap();

        init_schema(&conn).unwrap();

        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
        let columns: Vec<String> = conn
            .prepare("SELECT name FROM pragma_table_info('feedback')")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(columns.contains(&"upvotes".to_string()));
        assert!(columns.contains(&"source_identifier".to_string()));
    }

    #[test]
    fn embedding_model_round_trips() {
        let conn = crate::db::open_memory_database().unwrap();
        assert_eq!(embedding_model(&conn).unwrap(), None);
        set_embedding_model(&conn, "intfloat/e5-base-v2").unwrap();
        set_embedding_model(&conn, "intfloat/e5-large-v2").unwrap();
        assert_eq!(
            embedding_model(&conn).unwrap().as_deref(),
            Some("intfloat/e5-large-v2")
        );
    }
}
