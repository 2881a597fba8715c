use std::sync::Mutex;

use chrono::Utc;
use rusqlite::Connection;

use crate::error::StoreError;

pub const STATE_TABLE_DDL: &str = "CREATE TABLE IF NOT EXISTS kv_state (\
     key TEXT PRIMARY KEY, \
     value TEXT NOT NULL, \
     updated_at TEXT NOT NULL\
 )";

/// SQLite-backed key-value store.
///
/// The connection is synchronized via `Mutex` since `rusqlite::Connection`
/// is not `Sync`. Writes are wholesale upserts, last-writer-wins.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(STATE_TABLE_DDL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database. Useful for testing.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(STATE_TABLE_DDL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn get_sync(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("connection mutex poisoned: {e}")))?;
        let mut stmt = conn.prepare_cached("SELECT value FROM kv_state WHERE key = ?1")?;
        let result = stmt.query_row(rusqlite::params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    pub fn put_sync(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("connection mutex poisoned: {e}")))?;
        conn.execute(
            "INSERT OR REPLACE INTO kv_state (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
