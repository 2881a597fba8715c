use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StoreError;

/// In-memory key-value store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_sync(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("entries mutex poisoned: {e}")))?;
        Ok(entries.get(key).cloned())
    }

    pub fn put_sync(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("entries mutex poisoned: {e}")))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store double whose every call fails. Exercises the best-effort
/// persistence contract in tests.
#[derive(Default)]
pub struct FailingStore;

impl FailingStore {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_put_then_get() {
        let store = MemoryStore::new();
        store.put_sync("k", "v").unwrap();
        assert_eq!(store.get_sync("k").unwrap().as_deref(), Some("v"));
        assert!(store.get_sync("other").unwrap().is_none());
    }
}
