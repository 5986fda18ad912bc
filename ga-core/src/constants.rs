//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "GaChat";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the on-device message database.
pub const DEFAULT_DATABASE_NAME: &str = "ChatMessages";

/// Schema version the store is opened at.
pub const DB_SCHEMA_VERSION: u32 = 1;

/// Partition created by the default schema setup.
pub const DEFAULT_PARTITION: &str = "GaMessages";

/// Upper bound on the detached teardown task, in milliseconds.
pub const DEFAULT_TEARDOWN_DEADLINE_MS: u64 = 2_000;

/// Number of times the placeholder list is doubled before seeding.
pub const DEFAULT_SEED_DOUBLINGS: u32 = 2;

/// Placeholder conversation written into the default partition at startup.
pub const PLACEHOLDER_MESSAGES: &[&str] = &[
    "Hi there! How are you today?",
    "I'm doing well, thank you for asking.",
    "This chat interface has an adjustable message area.",
    "You can type messages in the input below and click send.",
    "You can type messages in the input below and click send.",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_constants() {
        assert_eq!(PLACEHOLDER_MESSAGES.len(), 5);
        assert_eq!(DEFAULT_PARTITION, "GaMessages");
        assert!(DB_SCHEMA_VERSION >= 1);
    }
}
