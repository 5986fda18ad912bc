//! Best-effort population of a partition with placeholder messages.
//!
//! Each content string becomes a `MessageRecord` keyed by its 0-based index
//! and stamped with the wall-clock time of its own write. Writes are issued
//! and awaited one at a time in input order. A failed write is logged and
//! recorded in the report; the remaining writes still run.

use rusqlite::params;
use tracing::{debug, info, warn};

use ga_core::error::{GaError, GaResult};

use crate::db::Database;
use crate::record::now_ms;

/// Outcome of a `SeedLoader::seed` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Number of records written.
    pub written: usize,
    /// Keys whose write failed, with the error message.
    pub failed: Vec<(i64, String)>,
}

impl SeedReport {
    /// Whether every record was written.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of records attempted.
    pub fn attempted(&self) -> usize {
        self.written + self.failed.len()
    }
}

impl std::fmt::Display for SeedReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "written={}, failed={}", self.written, self.failed.len())
    }
}

/// Writes records into partitions of an open database.
#[derive(Debug, Clone)]
pub struct SeedLoader {
    db: Database,
}

impl SeedLoader {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Write `records` into `partition` under keys `0..records.len()`.
    ///
    /// Existing records at the same keys are overwritten, so seeding twice
    /// with the same input leaves the count unchanged.
    pub async fn seed<S: AsRef<str>>(&self, partition: &str, records: &[S]) -> SeedReport {
        let mut report = SeedReport::default();

        for (index, content) in records.iter().enumerate() {
            let key = index as i64;
            match self.put(partition, key, content.as_ref()).await {
                Ok(()) => report.written += 1,
                Err(e) => {
                    warn!("seed write {partition}[{key}] failed: {e}");
                    report.failed.push((key, e.to_string()));
                }
            }
        }

        if report.is_complete() {
            info!("seeded {} record(s) into '{partition}'", report.written);
        } else {
            warn!("seeded '{partition}' partially: {report}");
        }
        report
    }

    /// Upsert a single record, stamped with the current time.
    pub async fn put(&self, partition: &str, key: i64, content: &str) -> GaResult<()> {
        let partition = partition.to_string();
        let content = content.to_string();
        let timestamp = now_ms();
        self.db
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO records (partition, key, content, timestamp)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(partition, key) DO UPDATE SET
                        content = excluded.content,
                        timestamp = excluded.timestamp",
                    params![partition, key, content, timestamp],
                )
                .map_err(|e| GaError::TransactionFailure(format!("put {partition}[{key}]: {e}")))?;
                debug!("wrote {partition}[{key}]");
                Ok(())
            })
            .await
    }
}

/// Build the placeholder set by doubling `base` `doublings` times.
///
/// Duplicated contents are intentional; each copy gets its own key.
pub fn placeholder_messages<S: AsRef<str>>(base: &[S], doublings: u32) -> Vec<String> {
    let mut messages: Vec<String> = base.iter().map(|s| s.as_ref().to_string()).collect();
    for _ in 0..doublings {
        let copy = messages.clone();
        messages.extend(copy);
    }
    messages
}
