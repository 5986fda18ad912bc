//! Versioned, additive-only schema upgrades.
//!
//! Opening a database at a version higher than the stored one runs the
//! caller's setup callback once, inside a transaction, and then records the
//! new version. Opening at the same version does nothing. Opening at a
//! lower version is refused and leaves the file untouched.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;
use ga_core::error::{GaError, GaResult};

use crate::record::now_ms;

/// Upgrade context handed to the schema setup callback.
///
/// Exposes only additive operations: partitions can be created, never
/// dropped or cleared.
pub struct SchemaUpgrade<'a> {
    conn: &'a Connection,
    old_version: u32,
    new_version: u32,
}

impl<'a> SchemaUpgrade<'a> {
    /// Version stored before this upgrade (0 for a new database).
    pub fn old_version(&self) -> u32 {
        self.old_version
    }

    /// Version being upgraded to.
    pub fn new_version(&self) -> u32 {
        self.new_version
    }

    /// Create a partition. Existing partitions and their records are kept.
    pub fn create_partition(&mut self, name: &str) -> GaResult<()> {
        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                params![name, now_ms()],
            )
            .map_err(|e| GaError::TransactionFailure(e.to_string()))?;
        if inserted > 0 {
            info!("created partition '{name}'");
        }
        Ok(())
    }

    /// Whether a partition already exists.
    pub fn has_partition(&self, name: &str) -> GaResult<bool> {
        has_partition(self.conn, name)
    }

    /// Names of all partitions, sorted.
    pub fn partition_names(&self) -> GaResult<Vec<String>> {
        partition_names(self.conn)
    }
}

/// Bring the database to `requested`, calling `setup` if it is behind.
pub fn apply<F>(conn: &mut Connection, requested: u32, setup: F) -> GaResult<()>
where
    F: FnOnce(&mut SchemaUpgrade<'_>) -> GaResult<()>,
{
    if requested == 0 {
        return Err(GaError::VersionError { requested, stored: 0 });
    }

    let tx = conn
        .transaction()
        .map_err(|e| GaError::TransactionFailure(e.to_string()))?;
    let stored = stored_version(&tx)?;

    if requested < stored {
        return Err(GaError::VersionError { requested, stored });
    }
    if requested == stored {
        info!("schema is up to date (version {stored})");
        return Ok(());
    }

    info!("upgrading schema from version {stored} to {requested}");
    {
        let mut upgrade = SchemaUpgrade {
            conn: &tx,
            old_version: stored,
            new_version: requested,
        };
        setup(&mut upgrade)?;
    }
    set_version(&tx, stored, requested)?;

    tx.commit()
        .map_err(|e| GaError::TransactionFailure(e.to_string()))?;
    info!("schema upgrade complete, now at version {requested}");
    Ok(())
}

/// Version recorded in the database, 0 if none.
pub fn stored_version(conn: &Connection) -> GaResult<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .optional()
        .map_err(|e| GaError::TransactionFailure(e.to_string()))?;
    Ok(version.unwrap_or(0))
}

fn set_version(conn: &Connection, stored: u32, version: u32) -> GaResult<()> {
    let sql = if stored == 0 {
        "INSERT INTO schema_version (version) VALUES (?1)"
    } else {
        "UPDATE schema_version SET version = ?1"
    };
    conn.execute(sql, [version])
        .map_err(|e| GaError::TransactionFailure(e.to_string()))?;
    Ok(())
}

pub(crate) fn has_partition(conn: &Connection, name: &str) -> GaResult<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM partitions WHERE name = ?1", [name], |row| row.get(0))
        .optional()
        .map_err(|e| GaError::TransactionFailure(e.to_string()))?;
    Ok(found.is_some())
}

pub(crate) fn partition_names(conn: &Connection) -> GaResult<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM partitions ORDER BY name")
        .map_err(|e| GaError::TransactionFailure(e.to_string()))?;
    let names = stmt
        .query_map([], |row| row.get(0))
        .map_err(|e| GaError::TransactionFailure(e.to_string()))?
        .collect::<Result<Vec<String>, _>>()
        .map_err(|e| GaError::TransactionFailure(e.to_string()))?;
    Ok(names)
}
