//! Application configuration management.
//!
//! Covers where the local message store lives, which database and partition
//! it opens, the reset/teardown policy, and the placeholder seed set.
//! Configuration is persisted as TOML on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DB_SCHEMA_VERSION, DEFAULT_DATABASE_NAME, DEFAULT_PARTITION, DEFAULT_SEED_DOUBLINGS,
    DEFAULT_TEARDOWN_DEADLINE_MS, PLACEHOLDER_MESSAGES,
};
use crate::error::{GaError, GaResult};
use crate::platform::Platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Local store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Placeholder seeding settings.
    #[serde(default)]
    pub seed: SeedConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Local message store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Storage root for database files. If empty, uses the platform data dir.
    #[serde(default)]
    pub directory: String,

    /// Name of the database opened at startup.
    #[serde(default = "default_database_name")]
    pub database_name: String,

    /// Schema version the database is opened at.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Partition created by the schema setup and seeded at startup.
    #[serde(default = "default_partition")]
    pub partition: String,

    /// Delete any pre-existing database before opening it at startup.
    #[serde(default = "default_true")]
    pub reset_on_load: bool,

    /// Delete the database when the host page is discarded.
    #[serde(default = "default_true")]
    pub delete_on_unload: bool,

    /// Upper bound on the detached teardown task in milliseconds.
    #[serde(default = "default_teardown_deadline")]
    pub teardown_deadline_ms: u64,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

/// Placeholder seed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Seed the partition at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base list of placeholder message contents.
    #[serde(default = "default_seed_messages")]
    pub messages: Vec<String>,

    /// How many times the base list is doubled before seeding.
    #[serde(default = "default_doublings")]
    pub doublings: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output.
    #[serde(default)]
    pub json_output: bool,
}

// Default value functions for serde

fn default_true() -> bool {
    true
}

fn default_database_name() -> String {
    DEFAULT_DATABASE_NAME.to_string()
}

fn default_schema_version() -> u32 {
    DB_SCHEMA_VERSION
}

fn default_partition() -> String {
    DEFAULT_PARTITION.to_string()
}

fn default_teardown_deadline() -> u64 {
    DEFAULT_TEARDOWN_DEADLINE_MS
}

fn default_pool_size() -> u32 {
    4
}

fn default_seed_messages() -> Vec<String> {
    PLACEHOLDER_MESSAGES.iter().map(|m| m.to_string()).collect()
}

fn default_doublings() -> u32 {
    DEFAULT_SEED_DOUBLINGS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: String::new(),
            database_name: default_database_name(),
            schema_version: default_schema_version(),
            partition: default_partition(),
            reset_on_load: true,
            delete_on_unload: true,
            teardown_deadline_ms: default_teardown_deadline(),
            pool_size: default_pool_size(),
            wal_mode: true,
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            messages: default_seed_messages(),
            doublings: default_doublings(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl StoreConfig {
    /// A configuration rooted at `dir`, otherwise default.
    pub fn in_directory(dir: &Path) -> Self {
        Self {
            directory: dir.display().to_string(),
            ..Self::default()
        }
    }

    /// Whether the store survives across sessions under this policy.
    pub fn is_persistent(&self) -> bool {
        !self.reset_on_load && !self.delete_on_unload
    }
}

impl AppConfig {
    /// Load configuration from the default config file path.
    pub fn load_default() -> GaResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> GaResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> GaResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| GaError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the store cannot work with.
    pub fn validate(&self) -> GaResult<()> {
        if self.store.database_name.trim().is_empty() {
            return Err(GaError::Config("store.database_name must not be empty".into()));
        }
        if self.store.schema_version == 0 {
            return Err(GaError::Config("store.schema_version must be at least 1".into()));
        }
        if self.store.partition.trim().is_empty() {
            return Err(GaError::Config("store.partition must not be empty".into()));
        }
        if self.store.teardown_deadline_ms == 0 {
            return Err(GaError::Config(
                "store.teardown_deadline_ms must be at least 1".into(),
            ));
        }
        if self.store.pool_size == 0 {
            return Err(GaError::Config("store.pool_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> GaResult<PathBuf> {
        let data_dir = Platform::data_dir()?;
        Ok(data_dir.join("config.toml"))
    }

    /// Get the effective storage root, using the configured path or the default.
    pub fn effective_store_dir(&self) -> GaResult<PathBuf> {
        if self.store.directory.is_empty() {
            Platform::data_dir()
        } else {
            Ok(PathBuf::from(&self.store.directory))
        }
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> GaResult<PathBuf> {
        if self.logging.directory.is_empty() {
            let data_dir = Platform::data_dir()?;
            Ok(data_dir.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }
}

/// Thread-safe configuration holder for shared access across services.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    /// Create a new configuration handle.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Read the configuration.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    /// Write/update the configuration.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.store.database_name, "ChatMessages");
        assert_eq!(config.store.partition, "GaMessages");
        assert_eq!(config.store.schema_version, 1);
        assert!(config.store.reset_on_load);
        assert!(config.store.delete_on_unload);
        assert!(!config.store.is_persistent());
        assert_eq!(config.seed.messages.len(), 5);
        assert_eq!(config.seed.doublings, 2);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            "[store]\nreset_on_load = false\ndelete_on_unload = false\n",
        )
        .unwrap();
        assert!(config.store.is_persistent());
        assert_eq!(config.store.database_name, "ChatMessages");
        assert!(config.seed.enabled);
    }

    #[test]
    fn test_validate_rejects_zero_version() {
        let mut config = AppConfig::default();
        config.store.schema_version = 0;
        assert!(matches!(config.validate(), Err(GaError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_teardown_deadline() {
        let mut config = AppConfig::default();
        config.store.teardown_deadline_ms = 0;
        assert!(matches!(config.validate(), Err(GaError::Config(_))));
        config.store.teardown_deadline_ms = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_roundtrip_toml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.store.teardown_deadline_ms = 500;
        config.seed.messages = vec!["a".into(), "b".into()];
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.store.teardown_deadline_ms, 500);
        assert_eq!(loaded.seed.messages, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_effective_store_dir_override() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = AppConfig {
            store: StoreConfig::in_directory(dir.path()),
            ..AppConfig::default()
        };
        assert_eq!(config.effective_store_dir().unwrap(), dir.path());
    }
}
