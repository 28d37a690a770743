//! Durable string key/value storage for client state.
//!
//! # Responsibility
//! - Persist preferences and the local todo snapshot across sessions.
//! - Keep browser-storage semantics: whole string values under fixed keys.
//!
//! # Invariants
//! - The backing file is one JSON object of string values.
//! - Writes replace the file atomically (temp file + rename).
//! - A missing or corrupt file reads as empty storage.

use log::warn;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Storage key of the local todo snapshot.
pub const TODO_ITEMS_KEY: &str = "todo-items-v1";
/// Storage key of the data-source preference (`local|api|auto`).
pub const DATA_SOURCE_KEY: &str = "data-source";
/// Storage key of the remote API base URL.
pub const API_BASE_KEY: &str = "api-base";

const STORAGE_FILE_NAME: &str = "storage.json";

/// File-backed string key/value store.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage file `storage.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::open(dir.as_ref().join(STORAGE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    pub fn remove_item(&self, key: &str) -> io::Result<()> {
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }

    fn read_all(&self) -> io::Result<BTreeMap<String, String>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err),
        };

        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(err) => {
                warn!(
                    "event=storage_read module=storage status=corrupt path={} error={}",
                    self.path.display(),
                    err
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let serialized = serde_json::to_string(items).map_err(io::Error::other)?;
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        std::fs::write(&tmp_path, serialized)?;
        std::fs::rename(&tmp_path, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::LocalStorage;

    #[test]
    fn items_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        assert_eq!(storage.get_item("k").unwrap(), None);

        storage.set_item("k", "v1").unwrap();
        storage.set_item("other", "x").unwrap();
        storage.set_item("k", "v2").unwrap();

        let reopened = LocalStorage::in_dir(dir.path());
        assert_eq!(reopened.get_item("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(reopened.get_item("other").unwrap().as_deref(), Some("x"));

        reopened.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
        assert_eq!(storage.get_item("other").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn corrupt_file_reads_as_empty_and_is_replaced_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        std::fs::write(storage.path(), "{not json").unwrap();

        assert_eq!(storage.get_item("k").unwrap(), None);
        storage.set_item("k", "v").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn missing_parent_directory_is_created_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path().join("nested").join("deeper"));

        storage.set_item("k", "v").unwrap();
        assert!(storage.path().exists());
    }
}
