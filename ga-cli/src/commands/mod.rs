//! CLI command implementations.

pub mod run;
pub mod messages;
pub mod db;

use comfy_table::{Table, presets::UTF8_FULL, modifiers::UTF8_ROUND_CORNERS, ContentArrangement};

use ga_core::config::{AppConfig, ConfigHandle};
use ga_core::error::GaResult;
use ga_store::{LocalStore, MessageQuery, MessageRecord};

/// Helper to build the storage origin from config.
pub async fn open_store(config: &ConfigHandle) -> GaResult<(LocalStore, AppConfig)> {
    let app_config = config.read().await.clone();
    let root = app_config.effective_store_dir()?;
    Ok((LocalStore::new(root, app_config.store.clone()), app_config))
}

/// Helper to open the configured database for inspection.
///
/// Read-only: returns `None` when no database exists rather than creating
/// one, and never upgrades or writes to an existing one.
pub async fn open_existing(config: &ConfigHandle) -> GaResult<Option<MessageQuery>> {
    let (store, app_config) = open_store(config).await?;
    let db = store
        .open_existing(&app_config.store.database_name, app_config.store.schema_version)
        .await?;
    Ok(db.map(MessageQuery::new))
}

/// Render messages as a table.
pub fn message_table(records: &[MessageRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["Key", "Content", "Written"]);
    for record in records {
        table.add_row(vec![
            record.key.to_string(),
            truncate(&record.content, 60),
            format_timestamp(record),
        ]);
    }
    table
}

/// Format a record's write time for display.
pub fn format_timestamp(record: &MessageRecord) -> String {
    record
        .written_at()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| record.timestamp.to_string())
}

/// Truncate a string to a maximum number of characters, appending an
/// ellipsis if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}
