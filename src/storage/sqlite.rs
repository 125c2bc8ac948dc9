//! A storage backend that keeps records in a single SQLite table.

use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};

use rusqlite::{Connection, OptionalExtension};

use crate::{Error, storage::Storage};

/// Persists records in the `record` table of a SQLite database.
///
/// This is the authoritative local store used by the command line front end.
#[derive(Debug)]
pub struct SqliteStorage {
    connection: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the database at `path` and make sure the record table exists.
    ///
    /// # Errors
    /// Returns an [Error::StorageError] if the database cannot be opened or initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    /// Create a database that only lives in memory.
    pub fn open_in_memory() -> Result<Self, Error> {
        let connection = Connection::open_in_memory()?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, Error> {
        create_record_table(&connection)?;

        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::LockError("database")
        })
    }
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.connection()?
            .prepare("SELECT value FROM record WHERE key = ?1;")?
            .query_row([key], |row| row.get(0))
            .optional()
            .map_err(|error| error.into())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.connection()?.execute(
            "INSERT INTO record (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            (key, value),
        )?;

        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), Error> {
        self.connection()?
            .execute("DELETE FROM record WHERE key = ?1;", [key])?;

        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, Error> {
        self.connection()?
            .prepare("SELECT key FROM record ORDER BY key ASC;")?
            .query_map([], |row| row.get(0))?
            .map(|maybe_key| maybe_key.map_err(|error| error.into()))
            .collect()
    }
}

/// Initialize the record table.
fn create_record_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS record (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;

    Ok(())
}

#[cfg(test)]
mod sqlite_storage_tests {
    use crate::storage::{SqliteStorage, Storage};

    fn get_test_storage() -> SqliteStorage {
        SqliteStorage::open_in_memory().expect("Could not open in-memory SQLite database")
    }

    #[test]
    fn get_missing_key_returns_none() {
        let storage = get_test_storage();

        assert_eq!(storage.get("budgetConfig"), Ok(None));
    }

    #[test]
    fn set_then_get_returns_value() {
        let storage = get_test_storage();

        storage
            .set("transactions_2026-02-07", "{\"a\":1}")
            .expect("Could not set record");

        assert_eq!(
            storage.get("transactions_2026-02-07"),
            Ok(Some("{\"a\":1}".to_owned()))
        );
    }

    #[test]
    fn set_overwrites_existing_value() {
        let storage = get_test_storage();

        storage.set("key", "old").unwrap();
        storage.set("key", "new").unwrap();

        assert_eq!(storage.get("key"), Ok(Some("new".to_owned())));
    }

    #[test]
    fn delete_removes_key() {
        let storage = get_test_storage();
        storage.set("key", "value").unwrap();

        storage.delete("key").expect("Could not delete record");

        assert_eq!(storage.get("key"), Ok(None));
        assert_eq!(storage.delete("key"), Ok(()));
    }

    #[test]
    fn keys_are_sorted() {
        let storage = get_test_storage();
        storage.set("b", "2").unwrap();
        storage.set("a", "1").unwrap();

        assert_eq!(storage.keys(), Ok(vec!["a".to_owned(), "b".to_owned()]));
    }

    #[test]
    fn records_persist_across_connections() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("budget.db");

        SqliteStorage::open(&path)
            .unwrap()
            .set("budgetConfig", "{}")
            .unwrap();

        let reopened = SqliteStorage::open(&path).unwrap();
        assert_eq!(reopened.get("budgetConfig"), Ok(Some("{}".to_owned())));
    }
}
