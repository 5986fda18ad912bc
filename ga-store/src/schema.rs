//! Physical table layout shared by every database the store opens.
//!
//! Partitions are rows in `partitions`; records live in a single `records`
//! table keyed by `(partition, key)`. The logical schema (which partitions
//! exist) is owned by the upgrade callback, not by this file.

use rusqlite::Connection;
use ga_core::error::{GaError, GaResult};
use tracing::debug;

/// Create the bookkeeping tables if they do not exist.
///
/// A file that is not a SQLite database fails here, which the store reports
/// as unavailable storage.
pub fn create_tables(conn: &Connection) -> GaResult<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| GaError::StorageUnavailable(format!("failed to create schema: {e}")))?;
    debug!("store tables verified");
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS partitions (
    name        TEXT PRIMARY KEY NOT NULL,
    created_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS records (
    partition   TEXT NOT NULL REFERENCES partitions(name),
    key         INTEGER NOT NULL,
    content     TEXT NOT NULL,
    timestamp   INTEGER NOT NULL,
    PRIMARY KEY (partition, key)
) WITHOUT ROWID;
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table'
                 AND name IN ('schema_version', 'partitions', 'records')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_record_requires_partition() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        create_tables(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO records (partition, key, content, timestamp) VALUES ('nope', 0, 'x', 0)",
            [],
        );
        assert!(result.is_err());
    }
}
