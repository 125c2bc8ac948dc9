//! An in-memory storage backend.

use std::{collections::BTreeMap, sync::Mutex};

use crate::{Error, storage::Storage};

/// Keeps every record in a map that lives as long as the value.
///
/// Used in tests and anywhere persistence is not wanted.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, Error> {
        self.records.lock().map_err(|error| {
            tracing::error!("could not acquire memory storage lock: {error}");
            Error::LockError("memory storage")
        })
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.records()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.records()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), Error> {
        self.records()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.records()?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod memory_storage_tests {
    use crate::storage::{MemoryStorage, Storage};

    #[test]
    fn get_returns_none_for_missing_key() {
        let storage = MemoryStorage::new();

        assert_eq!(storage.get("missing"), Ok(None));
    }

    #[test]
    fn set_replaces_previous_value() {
        let storage = MemoryStorage::new();

        storage.set("key", "first").unwrap();
        storage.set("key", "second").unwrap();

        assert_eq!(storage.get("key"), Ok(Some("second".to_owned())));
        assert_eq!(storage.keys(), Ok(vec!["key".to_owned()]));
    }

    #[test]
    fn delete_missing_key_succeeds() {
        let storage = MemoryStorage::new();

        assert_eq!(storage.delete("missing"), Ok(()));
    }
}
