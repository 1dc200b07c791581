use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Durable key holding the elapsed-updates counter from the last visit.
pub const UPDATE_COUNTER_KEY: &str = "numberOfUpdates";
/// Session key holding the opaque credential sent to the backend.
pub const AUTHORIZATION_KEY: &str = "Authorization";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read storage file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse storage file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write storage file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// String key-value storage in the spirit of the browser storage APIs.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Session-scoped storage; lives as long as the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Durable storage backed by a JSON object on disk. Every `set` rewrites the
/// whole file so values survive restarts.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens `path`; a missing file starts out empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| StorageError::Parse {
                    path: path.display().to_string(),
                    source: e,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(StorageError::Read {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };
        Ok(Self { path, values })
    }

    fn flush(&self) -> Result<(), StorageError> {
        let write_err = |e| StorageError::Write {
            path: self.path.display().to_string(),
            source: e,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let contents = serde_json::to_string_pretty(&self.values).unwrap_or_else(|_| "{}".to_string());
        std::fs::write(&self.path, contents).map_err(write_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = FileStore::open(&path).unwrap();
        assert_eq!(store.get(UPDATE_COUNTER_KEY), None);
        store.set(UPDATE_COUNTER_KEY, "7").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(UPDATE_COUNTER_KEY).as_deref(), Some("7"));
    }

    #[test]
    fn file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StorageError::Parse { .. })));
    }

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryStore::new();
        store.set(AUTHORIZATION_KEY, "Basic abc").unwrap();
        assert_eq!(store.get(AUTHORIZATION_KEY).as_deref(), Some("Basic abc"));
    }
}
