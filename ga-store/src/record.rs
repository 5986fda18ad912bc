//! Message record model.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// A single cached chat message, stored under a writer-assigned key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Key within the partition.
    pub key: i64,
    /// Message body.
    pub content: String,
    /// Wall-clock write time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl MessageRecord {
    /// Build a record from a `records` row selected as `key, content, timestamp`.
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get(0)?,
            content: row.get(1)?,
            timestamp: row.get(2)?,
        })
    }

    /// The write time as a UTC datetime, if representable.
    pub fn written_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Count and contents of a partition read in one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSnapshot {
    pub len: u64,
    pub messages: Vec<MessageRecord>,
}

impl MessageSnapshot {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
