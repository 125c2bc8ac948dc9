//! A storage backend that keeps each record in its own JSON file.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{Error, storage::Storage};

const FILE_EXTENSION: &str = "json";

/// Persists each key as `<key>.json` inside a directory.
///
/// This is the layout used by the mirror server, so the directory can be
/// inspected or backed up with ordinary file tools.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    /// Use `root` as the data directory, creating it if needed.
    ///
    /// # Errors
    /// Returns an [Error::StorageError] if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        Ok(Self { root })
    }

    /// The data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, Error> {
        validate_key(key)?;

        Ok(self.root.join(format!("{key}.{FILE_EXTENSION}")))
    }
}

impl Storage for DirectoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let path = self.path_for(key)?;
        // Write to a sibling file first so readers never observe a half-written record.
        let staging_path = path.with_extension(format!("{FILE_EXTENSION}.tmp"));

        fs::write(&staging_path, value)?;
        fs::rename(&staging_path, &path)?;

        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), Error> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, Error> {
        let mut keys = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();

            if path.extension().and_then(|extension| extension.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }

            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_owned());
            }
        }

        keys.sort();

        Ok(keys)
    }
}

/// Keys become file names, so only allow characters that cannot escape the directory.
fn validate_key(key: &str) -> Result<(), Error> {
    let is_valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if is_valid {
        Ok(())
    } else {
        Err(Error::InvalidKey(key.to_owned()))
    }
}

#[cfg(test)]
mod directory_storage_tests {
    use tempfile::TempDir;

    use crate::{
        Error,
        storage::{DirectoryStorage, Storage},
    };

    fn get_test_storage() -> (TempDir, DirectoryStorage) {
        let dir = TempDir::new().expect("Could not create temp dir");
        let storage = DirectoryStorage::new(dir.path()).expect("Could not create storage");

        (dir, storage)
    }

    #[test]
    fn set_writes_json_file_named_after_key() {
        let (dir, storage) = get_test_storage();

        storage
            .set("transactions_2026-02-07", "{}")
            .expect("Could not set record");

        let contents = std::fs::read_to_string(dir.path().join("transactions_2026-02-07.json"))
            .expect("Could not read record file");
        assert_eq!(contents, "{}");
    }

    #[test]
    fn get_missing_key_returns_none() {
        let (_dir, storage) = get_test_storage();

        assert_eq!(storage.get("transactions_2026-02-07"), Ok(None));
    }

    #[test]
    fn keys_ignores_other_files() {
        let (dir, storage) = get_test_storage();
        storage.set("transactions_2026-02-07", "{}").unwrap();
        storage.set("budgetConfig", "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        assert_eq!(
            storage.keys(),
            Ok(vec![
                "budgetConfig".to_owned(),
                "transactions_2026-02-07".to_owned()
            ])
        );
    }

    #[test]
    fn delete_removes_file_and_is_idempotent() {
        let (dir, storage) = get_test_storage();
        storage.set("transactions_2026-02-07", "{}").unwrap();

        storage.delete("transactions_2026-02-07").unwrap();

        assert!(!dir.path().join("transactions_2026-02-07.json").exists());
        assert_eq!(storage.delete("transactions_2026-02-07"), Ok(()));
    }

    #[test]
    fn rejects_keys_that_escape_the_directory() {
        let (_dir, storage) = get_test_storage();

        assert_eq!(
            storage.set("../evil", "{}"),
            Err(Error::InvalidKey("../evil".to_owned()))
        );
    }
}
