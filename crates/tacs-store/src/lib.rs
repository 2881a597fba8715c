//! Persistence collaborator for the TACS coordinator.
//!
//! The coordinator persists only a trimmed recent-message tail and the
//! performance singleton, written wholesale under a single key. This crate
//! provides the `StateStore` trait plus SQLite and in-memory backends.

pub mod error;
pub mod memory;
pub mod sqlite;

pub use error::StoreError;
pub use memory::{FailingStore, MemoryStore};
pub use sqlite::SqliteStore;

use async_trait::async_trait;

/// Async key-value interface the coordinator persists through.
///
/// Failures are always best-effort from the caller's perspective: a store
/// error must never block returning a decision already computed in memory.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.get_sync(key)
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.put_sync(key, value)
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.get_sync(key)
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.put_sync(key, value)
    }
}

#[async_trait]
impl StateStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("failing store".to_string()))
    }

    async fn put(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("failing store".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trait_roundtrip_through_sqlite() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put("state", "value").await.unwrap();
        assert_eq!(store.get("state").await.unwrap().as_deref(), Some("value"));
    }

    #[tokio::test]
    async fn failing_store_errors() {
        let store = FailingStore::new();
        assert!(store.get("state").await.is_err());
        assert!(store.put("state", "v").await.is_err());
    }
}
