//! Database handle, connection pooling, and blocking-work offload.
//!
//! A `Database` is a cheap, clonable handle onto one opened database file.
//! All clones share the same pool: closing any of them closes all of them,
//! after which every operation fails with `StoreClosed`.
//!
//! SQLite calls block, so async callers go through `Database::run` or
//! `Database::run_in_transaction`, which move the work onto tokio's blocking
//! pool and resume the caller once it completes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info, warn};

use ga_core::config::StoreConfig;
use ga_core::error::{GaError, GaResult};

use crate::schema;
use crate::upgrade::{self, SchemaUpgrade};

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Shared handle onto an open database.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DbInner>,
}

struct DbInner {
    name: String,
    version: u32,
    path: PathBuf,
    /// `None` once closed.
    pool: RwLock<Option<DbPool>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.inner.name)
            .field("version", &self.inner.version)
            .field("path", &self.inner.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Database {
    /// Open (or create) the database file at `path` and bring its schema up
    /// to `version`, calling `setup` if an upgrade is needed.
    ///
    /// Blocking; `LocalStore::open` runs this on the blocking pool.
    pub(crate) fn open_blocking<F>(
        name: &str,
        path: &Path,
        version: u32,
        config: &StoreConfig,
        setup: F,
    ) -> GaResult<Self>
    where
        F: FnOnce(&mut SchemaUpgrade<'_>) -> GaResult<()>,
    {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GaError::StorageUnavailable(format!(
                    "cannot create storage root {}: {e}",
                    parent.display()
                ))
            })?;
        }

        debug!("opening database '{name}' at {}", path.display());

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_customizer(Box::new(ConnectionCustomizer {
                wal_mode: config.wal_mode,
            }))
            .build(manager)
            .map_err(|e| GaError::StorageUnavailable(format!("cannot open '{name}': {e}")))?;

        {
            let mut conn = pool
                .get()
                .map_err(|e| GaError::StorageUnavailable(format!("cannot open '{name}': {e}")))?;
            schema::create_tables(&conn)?;
            upgrade::apply(&mut conn, version, setup)?;
        }

        info!("database '{name}' open at version {version}");
        Ok(Self {
            inner: Arc::new(DbInner {
                name: name.to_string(),
                version,
                path: path.to_path_buf(),
                pool: RwLock::new(Some(pool)),
            }),
        })
    }

    /// Open an existing database file without creating, migrating, or
    /// writing anything. The handle carries the stored schema version.
    ///
    /// Blocking; `LocalStore::open_existing` runs this on the blocking pool.
    pub(crate) fn open_read_only_blocking(
        name: &str,
        path: &Path,
        config: &StoreConfig,
    ) -> GaResult<Self> {
        debug!("opening database '{name}' read-only at {}", path.display());

        let manager = SqliteConnectionManager::file(path).with_flags(
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        );
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_customizer(Box::new(ConnectionCustomizer { wal_mode: false }))
            .build(manager)
            .map_err(|e| GaError::StorageUnavailable(format!("cannot open '{name}': {e}")))?;

        let version = {
            let conn = pool
                .get()
                .map_err(|e| GaError::StorageUnavailable(format!("cannot open '{name}': {e}")))?;
            upgrade::stored_version(&conn).map_err(|e| {
                GaError::StorageUnavailable(format!("'{name}' is not a message store: {e}"))
            })?
        };

        info!("database '{name}' open read-only at version {version}");
        Ok(Self {
            inner: Arc::new(DbInner {
                name: name.to_string(),
                version,
                path: path.to_path_buf(),
                pool: RwLock::new(Some(pool)),
            }),
        })
    }

    /// Name the database was opened under.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Schema version the database was opened at.
    pub fn version(&self) -> u32 {
        self.inner.version
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Get a connection from the pool.
    pub fn conn(&self) -> GaResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        let guard = self
            .inner
            .pool
            .read()
            .map_err(|_| GaError::Internal("database handle lock poisoned".into()))?;
        let pool = guard
            .as_ref()
            .ok_or_else(|| GaError::StoreClosed(self.inner.name.clone()))?;
        pool.get()
            .map_err(|e| GaError::TransactionFailure(format!("no connection available: {e}")))
    }

    /// Whether `close` has been called on this handle or any clone of it.
    pub fn is_closed(&self) -> bool {
        self.inner
            .pool
            .read()
            .map(|pool| pool.is_none())
            .unwrap_or(true)
    }

    /// Release the connection pool. Safe to call any number of times.
    ///
    /// Returns `true` if this call performed the close.
    pub fn close(&self) -> bool {
        let taken = match self.inner.pool.write() {
            Ok(mut pool) => pool.take(),
            Err(_) => {
                warn!("database '{}' handle lock poisoned during close", self.inner.name);
                None
            }
        };
        match taken {
            Some(_) => {
                info!("database '{}' closed", self.inner.name);
                true
            }
            None => {
                debug!("database '{}' already closed", self.inner.name);
                false
            }
        }
    }

    /// Run blocking work against a pooled connection without blocking the
    /// async caller.
    pub async fn run<T, F>(&self, f: F) -> GaResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> GaResult<T> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.conn()?;
            f(&conn)
        })
        .await
        .map_err(|e| GaError::Internal(format!("store task failed: {e}")))?
    }

    /// Like `run`, but inside a transaction committed when `f` succeeds.
    pub async fn run_in_transaction<T, F>(&self, f: F) -> GaResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> GaResult<T> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = db.conn()?;
            let tx = conn
                .transaction()
                .map_err(|e| GaError::TransactionFailure(e.to_string()))?;
            let result = f(&tx)?;
            tx.commit()
                .map_err(|e| GaError::TransactionFailure(e.to_string()))?;
            Ok(result)
        })
        .await
        .map_err(|e| GaError::Internal(format!("store task failed: {e}")))?
    }
}

/// r2d2 connection customizer that applies PRAGMA settings.
#[derive(Debug)]
struct ConnectionCustomizer {
    wal_mode: bool,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch("PRAGMA busy_timeout=5000;")?;

        if self.wal_mode {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }

        // Records reference their partition; writes into a partition the
        // schema never created must fail.
        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;
             PRAGMA foreign_keys=ON;",
        )?;

        Ok(())
    }
}
