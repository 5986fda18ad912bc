//! GaChat Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by the other GaChat crates:
//! - Store and seed configuration (database name, schema version, reset policy)
//! - The error taxonomy for the local message store
//! - Structured logging with tracing
//! - Platform data directory resolution
//! - Common constants

pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod constants;

// Re-export commonly used items at the crate root
pub use config::AppConfig;
pub use error::{GaError, GaResult};
pub use logging::init_logging;
pub use platform::Platform;
