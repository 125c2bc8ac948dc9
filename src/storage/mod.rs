//! Key/value persistence backends for the budget stores.
//!
//! Every store in the crate talks to persistence through the [Storage] trait,
//! so the same code runs against an in-memory map in tests, a SQLite file on
//! the local machine, or a directory of JSON files on the mirror server.

mod directory;
mod memory;
mod sqlite;

pub use directory::DirectoryStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::Error;

/// A flat string key/value store.
///
/// Implementations must be safe to share between threads. Values are JSON
/// documents, but the backend treats them as opaque strings.
pub trait Storage: Send + Sync {
    /// Get the value stored under `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), Error>;

    /// List every key in the store.
    fn keys(&self) -> Result<Vec<String>, Error>;
}
