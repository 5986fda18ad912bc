//! GaChat Store - On-device, versioned, per-conversation message cache.
//!
//! This crate owns all local persistence for the chat client:
//! - `LocalStore`: the storage origin; opens, closes, and deletes named databases
//! - `Database`: an explicit handle shared with the seeder and query layer
//! - Versioned, additive-only schema upgrades creating partitions
//! - `SeedLoader`: best-effort sequential population of a partition
//! - `MessageQuery`: read-only count / get-all / get-one accessors

pub mod db;
pub mod schema;
pub mod upgrade;
pub mod record;
pub mod store;
pub mod seed;
pub mod query;

// Re-export key types
pub use db::{Database, DbPool};
pub use record::{MessageRecord, MessageSnapshot};
pub use store::{DeleteOutcome, LocalStore};
pub use upgrade::SchemaUpgrade;
pub use seed::{SeedLoader, SeedReport};
pub use query::MessageQuery;
