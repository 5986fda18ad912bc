//! Global error types for the GaChat local message store.
//!
//! All error categories are unified into a single `GaError` enum with
//! conversions from underlying library errors. Store-level library errors
//! (SQLite, connection pool) are mapped at the call site into the variant
//! matching the failing step.

use thiserror::Error;

/// Convenience type alias for Results using GaError.
pub type GaResult<T> = Result<T, GaError>;

/// Unified error type covering all error categories in GaChat.
#[derive(Error, Debug)]
pub enum GaError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    // -- Store errors --
    /// The platform denied opening or creating the database
    /// (unwritable storage root, quota, locked file).
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// An individual read or write failed mid-flight.
    #[error("transaction failed: {0}")]
    TransactionFailure(String),

    /// The database was opened at a version lower than the stored one.
    #[error("version error: requested {requested}, stored {stored}")]
    VersionError {
        /// Version passed to `open`.
        requested: u32,
        /// Version already recorded in the database.
        stored: u32,
    },

    /// The operation was issued against a handle that has been closed.
    #[error("database is closed: {0}")]
    StoreClosed(String),

    /// Deleting the database failed or was blocked.
    #[error("deletion failed: {0}")]
    DeletionFailure(String),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GaError {
    /// Whether this error came from the platform denying storage access.
    ///
    /// Startup treats these as a reason to continue in degraded mode.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, GaError::StorageUnavailable(_) | GaError::Io(_))
    }
}

impl From<serde_json::Error> for GaError {
    fn from(e: serde_json::Error) -> Self {
        GaError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for GaError {
    fn from(e: toml::de::Error) -> Self {
        GaError::Config(e.to_string())
    }
}
