//! Read-only accessors over the partitions of an open database.
//!
//! Queries never open or close the database and never write. An unknown
//! partition reads as empty; a missing key is `None`. Failures (closed
//! handle, I/O) are returned to the caller so an empty result can be told
//! apart from a failed one.

use rusqlite::{Connection, OptionalExtension};

use ga_core::error::{GaError, GaResult};

use crate::db::Database;
use crate::record::{MessageRecord, MessageSnapshot};
use crate::upgrade;

/// Query surface handed to chat view consumers.
#[derive(Debug, Clone)]
pub struct MessageQuery {
    db: Database,
}

impl MessageQuery {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The handle this query reads from.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Number of records in `partition`; 0 if it is empty or does not exist.
    pub async fn count(&self, partition: &str) -> GaResult<u64> {
        let partition = partition.to_string();
        self.db.run(move |conn| count_records(conn, &partition)).await
    }

    /// All records in `partition` in ascending key order.
    pub async fn get_all(&self, partition: &str) -> GaResult<Vec<MessageRecord>> {
        let partition = partition.to_string();
        self.db.run(move |conn| list_records(conn, &partition)).await
    }

    /// The record at `key`, or `None` if there is none.
    pub async fn get_one(&self, partition: &str, key: i64) -> GaResult<Option<MessageRecord>> {
        let partition = partition.to_string();
        self.db
            .run(move |conn| {
                conn.query_row(
                    "SELECT key, content, timestamp FROM records
                     WHERE partition = ?1 AND key = ?2",
                    rusqlite::params![partition, key],
                    MessageRecord::from_row,
                )
                .optional()
                .map_err(|e| GaError::TransactionFailure(e.to_string()))
            })
            .await
    }

    /// Count and records of `partition` read in a single transaction, so
    /// `len` always matches `messages`.
    pub async fn snapshot(&self, partition: &str) -> GaResult<MessageSnapshot> {
        let partition = partition.to_string();
        self.db
            .run_in_transaction(move |conn| {
                let len = count_records(conn, &partition)?;
                let messages = list_records(conn, &partition)?;
                Ok(MessageSnapshot { len, messages })
            })
            .await
    }

    /// Names of every partition in the database.
    pub async fn partitions(&self) -> GaResult<Vec<String>> {
        self.db.run(|conn| upgrade::partition_names(conn)).await
    }
}

fn count_records(conn: &Connection, partition: &str) -> GaResult<u64> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM records WHERE partition = ?1",
            [partition],
            |row| row.get(0),
        )
        .map_err(|e| GaError::TransactionFailure(e.to_string()))?;
    Ok(count.max(0) as u64)
}

fn list_records(conn: &Connection, partition: &str) -> GaResult<Vec<MessageRecord>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT key, content, timestamp FROM records
             WHERE partition = ?1 ORDER BY key ASC",
        )
        .map_err(|e| GaError::TransactionFailure(e.to_string()))?;
    let records = stmt
        .query_map([partition], MessageRecord::from_row)
        .map_err(|e| GaError::TransactionFailure(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| GaError::TransactionFailure(e.to_string()))?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::SeedLoader;
    use crate::store::LocalStore;
    use ga_core::config::StoreConfig;
    use tempfile::TempDir;

    async fn seeded(contents: &[&str]) -> (MessageQuery, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path(), StoreConfig::default());
        let db = store
            .open("query", 1, |up| up.create_partition("GaMessages"))
            .await
            .unwrap();
        SeedLoader::new(db.clone()).seed("GaMessages", contents).await;
        (MessageQuery::new(db), dir)
    }

    #[tokio::test]
    async fn test_count_and_get_all_ordered() {
        let (query, _dir) = seeded(&["a", "b", "c"]).await;
        assert_eq!(query.count("GaMessages").await.unwrap(), 3);

        let all = query.get_all("GaMessages").await.unwrap();
        let keys: Vec<i64> = all.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![0, 1, 2]);
        assert_eq!(all[1].content, "b");
        assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_get_one_present_and_missing() {
        let (query, _dir) = seeded(&["a", "b", "c"]).await;
        assert_eq!(query.get_one("GaMessages", 1).await.unwrap().unwrap().content, "b");
        assert!(query.get_one("GaMessages", 5).await.unwrap().is_none());
        assert!(query.get_one("GaMessages", -1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_partition_reads_empty() {
        let (query, _dir) = seeded(&["a"]).await;
        assert_eq!(query.count("Elsewhere").await.unwrap(), 0);
        assert!(query.get_all("Elsewhere").await.unwrap().is_empty());
        assert!(query.get_one("Elsewhere", 0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_partition() {
        let (query, _dir) = seeded(&[]).await;
        assert_eq!(query.count("GaMessages").await.unwrap(), 0);
        let snapshot = query.snapshot("GaMessages").await.unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.messages.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_matches() {
        let (query, _dir) = seeded(&["a", "b"]).await;
        let snapshot = query.snapshot("GaMessages").await.unwrap();
        assert_eq!(snapshot.len, 2);
        assert_eq!(snapshot.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_queries_are_read_only() {
        let (query, _dir) = seeded(&["a", "b"]).await;
        let before = query.get_all("GaMessages").await.unwrap();
        let _ = query.count("GaMessages").await.unwrap();
        let _ = query.get_one("GaMessages", 0).await.unwrap();
        let _ = query.snapshot("GaMessages").await.unwrap();
        assert_eq!(query.get_all("GaMessages").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_closed_handle_propagates() {
        let (query, _dir) = seeded(&["a"]).await;
        query.database().close();
        assert!(matches!(query.count("GaMessages").await, Err(GaError::StoreClosed(_))));
        assert!(query.get_all("GaMessages").await.is_err());
        assert!(query.get_one("GaMessages", 0).await.is_err());
    }

    #[tokio::test]
    async fn test_partitions_listed() {
        let (query, _dir) = seeded(&[]).await;
        assert_eq!(query.partitions().await.unwrap(), vec!["GaMessages".to_string()]);
    }
}
