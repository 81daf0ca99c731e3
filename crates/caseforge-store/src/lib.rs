//! Caseforge History Store
//!
//! Implements the `HistoryStore` trait on SQLite. Each saved batch is one JSON
//! document keyed by a generated id, tagged with the user/session key and a server
//! timestamp.
//!
//! # Examples
//!
//! ```
//! use caseforge_domain::traits::HistoryStore;
//! use caseforge_domain::TestCaseRecord;
//! use caseforge_store::SqliteHistoryStore;
//!
//! let mut store = SqliteHistoryStore::new(":memory:").unwrap();
//! let id = store.save_batch("session-1", &[TestCaseRecord::new("Verify login")]).unwrap();
//! assert_eq!(store.load_batch(&id).unwrap().unwrap().len(), 1);
//! ```

#![warn(missing_docs)]

use caseforge_domain::traits::{HistoryEntry, HistoryStore};
use caseforge_domain::TestCaseRecord;
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt::Display;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored document could not be encoded or decoded
    #[error("Invalid data: {0}")]
    InvalidData(#[from] serde_json::Error),
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS history_batches (
    id           TEXT PRIMARY KEY,
    user_key     TEXT NOT NULL,
    saved_at     INTEGER NOT NULL,
    record_count INTEGER NOT NULL,
    records      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_history_user ON history_batches (user_key, saved_at);
";

/// SQLite-based implementation of HistoryStore
///
/// SQLite connections are not thread-safe; share one store behind a mutex.
pub struct SqliteHistoryStore {
    conn: Connection,
}

impl SqliteHistoryStore {
    /// Open (or create) the store at the given path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl HistoryStore for SqliteHistoryStore {
    type Error = StoreError;

    fn save_batch(&mut self, user_key: &str, records: &[TestCaseRecord]) -> Result<String, StoreError> {
        let id = Uuid::now_v7().to_string();
        let json = serde_json::to_string(records)?;

        self.conn.execute(
            "INSERT INTO history_batches (id, user_key, saved_at, record_count, records)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, user_key, now_secs() as i64, records.len() as i64, json],
        )?;

        info!("Saved {} test cases to history as {}", records.len(), id);
        Ok(id)
    }

    fn list_batches(&self, user_key: &str) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_key, saved_at, record_count FROM history_batches
             WHERE user_key = ?1
             ORDER BY saved_at DESC, rowid DESC",
        )?;

        let entries = stmt
            .query_map(params![user_key], |row| {
                Ok(HistoryEntry {
                    id: row.get(0)?,
                    user_key: row.get(1)?,
                    saved_at: row.get::<_, i64>(2)? as u64,
                    record_count: row.get::<_, i64>(3)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn load_batch(&self, id: &str) -> Result<Option<Vec<TestCaseRecord>>, StoreError> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT records FROM history_batches WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

/// Save a batch and describe the outcome as a user-facing confirmation
///
/// A missing store or a failed save is reported in the string, never as an error.
pub fn save_with_confirmation<S>(
    store: Option<&mut S>,
    user_key: &str,
    records: &[TestCaseRecord],
) -> String
where
    S: HistoryStore,
    S::Error: Display,
{
    let Some(store) = store else {
        return "History store not configured. Cannot save test cases.".to_string();
    };

    match store.save_batch(user_key, records) {
        Ok(id) => format!("Test cases saved to history with ID: {}", id),
        Err(e) => {
            warn!("Error saving to history: {}", e);
            format!("Error saving to history: {}", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let store = SqliteHistoryStore::new(":memory:").unwrap();
        store.conn.execute_batch(SCHEMA).unwrap();
    }

    #[test]
    fn test_empty_batch_is_saved() {
        let mut store = SqliteHistoryStore::new(":memory:").unwrap();
        let id = store.save_batch("u", &[]).unwrap();
        assert_eq!(store.load_batch(&id).unwrap(), Some(Vec::new()));
        assert_eq!(store.list_batches("u").unwrap()[0].record_count, 0);
    }
}
