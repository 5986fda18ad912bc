//! The storage origin: opens, closes, and deletes named databases.
//!
//! A `LocalStore` is rooted at one directory and holds at most one open
//! handle per database name. Handles it gives out are explicit values; the
//! seeder and query layer receive them instead of reopening the database.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use ga_core::config::StoreConfig;
use ga_core::error::{GaError, GaResult};

use crate::db::Database;
use crate::upgrade::SchemaUpgrade;

/// SQLite side files removed together with the main database file.
const SIDE_FILE_SUFFIXES: &[&str] = &["-wal", "-shm", "-journal"];

/// Result of `LocalStore::delete_database`. Deletion never raises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The database existed and all of its files were removed.
    Deleted,
    /// There was nothing to delete.
    Absent,
    /// Deletion failed or was blocked; the reason has been logged.
    Failed(String),
}

impl DeleteOutcome {
    /// Whether no database remains afterwards.
    pub fn is_gone(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted | DeleteOutcome::Absent)
    }
}

impl std::fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deleted => write!(f, "deleted"),
            Self::Absent => write!(f, "absent"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Storage origin holding the open database handles.
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<LocalStoreInner>,
}

struct LocalStoreInner {
    root: PathBuf,
    config: StoreConfig,
    handles: Mutex<HashMap<String, Database>>,
}

impl LocalStore {
    /// Create a store rooted at `root`. Nothing is touched on disk until
    /// the first `open`.
    pub fn new(root: impl Into<PathBuf>, config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(LocalStoreInner {
                root: root.into(),
                config,
                handles: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Storage root directory.
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Configuration the store was created with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Path of the file backing database `name`.
    pub fn database_path(&self, name: &str) -> PathBuf {
        self.inner.root.join(format!("{name}.db"))
    }

    /// Whether database `name` exists on disk.
    pub fn exists(&self, name: &str) -> bool {
        self.database_path(name).exists()
    }

    /// The open handle for `name`, if any.
    pub fn handle(&self, name: &str) -> Option<Database> {
        self.lock_handles()
            .ok()?
            .get(name)
            .filter(|db| !db.is_closed())
            .cloned()
    }

    /// Open or create database `name` at `version`.
    ///
    /// `schema_setup` runs only when the stored version is behind `version`
    /// (always for a new database). Reopening at the version already open
    /// returns the existing handle and leaves data untouched.
    pub async fn open<F>(&self, name: &str, version: u32, schema_setup: F) -> GaResult<Database>
    where
        F: FnOnce(&mut SchemaUpgrade<'_>) -> GaResult<()> + Send + 'static,
    {
        validate_name(name)?;

        if let Some(existing) = self.handle(name) {
            if existing.version() == version {
                debug!("database '{name}' already open at version {version}");
                return Ok(existing);
            }
            if existing.version() > version {
                return Err(GaError::VersionError {
                    requested: version,
                    stored: existing.version(),
                });
            }
            // A version change needs an exclusive connection.
            info!(
                "closing database '{name}' at version {} to reopen at {version}",
                existing.version()
            );
            existing.close();
        }

        let path = self.database_path(name);
        let config = self.inner.config.clone();
        let owned_name = name.to_string();
        let opened = tokio::task::spawn_blocking(move || {
            Database::open_blocking(&owned_name, &path, version, &config, schema_setup)
        })
        .await
        .map_err(|e| GaError::Internal(format!("open task failed: {e}")))?;

        let db = match opened {
            Ok(db) => db,
            Err(e) => {
                warn!("failed to open database '{name}': {e}");
                return Err(e);
            }
        };

        // Another open of the same name may have finished while this one
        // ran; the registered handle wins so none is left unclosable.
        let mut handles = self.lock_handles()?;
        if let Some(registered) = handles.get(name).filter(|h| !h.is_closed()) {
            if registered.version() >= version {
                debug!("database '{name}' was opened concurrently; reusing that handle");
                let registered = registered.clone();
                drop(handles);
                db.close();
                return Ok(registered);
            }
            registered.close();
        }
        handles.insert(name.to_string(), db.clone());
        Ok(db)
    }

    /// Open an existing database for inspection only.
    ///
    /// Never creates the file, runs no schema setup, and writes nothing; the
    /// handle is at the stored version and is not registered with this store.
    /// Returns `None` if the database does not exist. A stored version other
    /// than `expected` is logged and the database is opened as stored.
    pub async fn open_existing(&self, name: &str, expected: u32) -> GaResult<Option<Database>> {
        validate_name(name)?;
        if !self.exists(name) {
            return Ok(None);
        }

        let path = self.database_path(name);
        let config = self.inner.config.clone();
        let owned_name = name.to_string();
        let db = tokio::task::spawn_blocking(move || {
            Database::open_read_only_blocking(&owned_name, &path, &config)
        })
        .await
        .map_err(|e| GaError::Internal(format!("open task failed: {e}")))??;

        if db.version() != expected {
            warn!(
                "database '{name}' is at version {}, expected {expected}; inspecting as stored",
                db.version()
            );
        }
        Ok(Some(db))
    }

    /// Close the handle for `name`. Safe to call repeatedly or when nothing
    /// is open; returns `true` if a handle was closed.
    pub fn close(&self, name: &str) -> bool {
        let removed = match self.lock_handles() {
            Ok(mut handles) => handles.remove(name),
            Err(e) => {
                warn!("cannot close database '{name}': {e}");
                None
            }
        };
        removed.map(|db| db.close()).unwrap_or(false)
    }

    /// Close every handle this store has open.
    pub fn close_all(&self) {
        let drained: Vec<Database> = match self.lock_handles() {
            Ok(mut handles) => handles.drain().map(|(_, db)| db).collect(),
            Err(_) => Vec::new(),
        };
        for db in drained {
            db.close();
        }
    }

    /// Irreversibly remove database `name` and all its partitions.
    ///
    /// Closes this store's handle first. Failures are logged and reported in
    /// the outcome, never returned as errors.
    pub async fn delete_database(&self, name: &str) -> DeleteOutcome {
        if let Err(e) = validate_name(name) {
            warn!("refusing to delete database '{name}': {e}");
            return DeleteOutcome::Failed(e.to_string());
        }

        self.close(name);

        let path = self.database_path(name);
        let owned_name = name.to_string();
        let joined = tokio::task::spawn_blocking(move || remove_database_files(&path)).await;

        let outcome = match joined {
            Ok(Ok(true)) => DeleteOutcome::Deleted,
            Ok(Ok(false)) => DeleteOutcome::Absent,
            Ok(Err(e)) => DeleteOutcome::Failed(e.to_string()),
            Err(e) => DeleteOutcome::Failed(format!("delete task failed: {e}")),
        };

        match &outcome {
            DeleteOutcome::Deleted => info!("database '{owned_name}' deleted"),
            DeleteOutcome::Absent => debug!("database '{owned_name}' did not exist"),
            DeleteOutcome::Failed(reason) => {
                warn!("{}", GaError::DeletionFailure(format!("'{owned_name}': {reason}")))
            }
        }
        outcome
    }

    fn lock_handles(&self) -> GaResult<std::sync::MutexGuard<'_, HashMap<String, Database>>> {
        self.inner
            .handles
            .lock()
            .map_err(|_| GaError::Internal("store handle registry lock poisoned".into()))
    }
}

fn validate_name(name: &str) -> GaResult<()> {
    let has_separator = name.contains(|c: char| c == '/' || c == '\\');
    if name.trim().is_empty() || has_separator || name == "." || name == ".." {
        return Err(GaError::Config(format!("invalid database name '{name}'")));
    }
    Ok(())
}

/// Remove the database file and its side files. Returns whether the main
/// file existed.
fn remove_database_files(path: &Path) -> GaResult<bool> {
    let existed = match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => return Err(GaError::DeletionFailure(format!("{}: {e}", path.display()))),
    };

    for suffix in SIDE_FILE_SUFFIXES {
        let mut side = path.as_os_str().to_owned();
        side.push(suffix);
        match std::fs::remove_file(&side) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(GaError::DeletionFailure(format!(
                    "{}: {e}",
                    Path::new(&side).display()
                )))
            }
        }
    }

    Ok(existed)
}
