//! Key/value persistence for journal state.
//!
//! Values are whole JSON documents; every save overwrites the previous value.
//! Entry and material lists are namespaced per craft mode, accounts and the
//! active-mode pointer are global.

use crate::mode::CraftMode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Key holding the account list.
pub const USERS_KEY: &str = "users";
/// Key holding the logged-in account id.
pub const CURRENT_USER_KEY: &str = "current_user";
/// Key holding the active craft mode slug.
pub const CURRENT_MODE_KEY: &str = "current_mode";

/// Key holding the entry list of a mode.
pub fn entries_key(mode: CraftMode) -> String {
    format!("entries:{}", mode.slug())
}

/// Key holding the material list of a mode.
pub fn materials_key(mode: CraftMode) -> String {
    format!("materials:{}", mode.slug())
}

/// Errors from store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A synchronous byte-string key/value store.
pub trait Store {
    /// Read a value; `None` when the key was never written or was removed.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Overwrite a value.
    fn save(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Delete a value. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Load a JSON array stored under `key`.
///
/// Absent and malformed values both yield an empty list; malformed data is
/// logged and otherwise ignored.
pub fn load_list<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Result<Vec<T>, StoreError> {
    let Some(bytes) = store.load(key)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_slice(&bytes) {
        Ok(list) => Ok(list),
        Err(e) => {
            warn!(key, error = %e, "discarding malformed stored value");
            Ok(Vec::new())
        }
    }
}

/// Serialize `items` as a JSON array and overwrite `key`.
pub fn save_list<T: Serialize>(store: &mut dyn Store, key: &str, items: &[T]) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(items)?;
    debug!(key, count = items.len(), bytes = bytes.len(), "saving list");
    store.save(key, &bytes)
}

/// Load a plain text value, treating non-UTF-8 data as absent.
pub fn load_text(store: &dyn Store, key: &str) -> Result<Option<String>, StoreError> {
    Ok(store.load(key)?.and_then(|bytes| match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(_) => {
            warn!(key, "discarding non-UTF-8 stored value");
            None
        }
    }))
}

/// In-memory store, used by tests and throwaway sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a key currently holds a value.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Directory-backed store: one `.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// The directory holding the value files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path backing a key.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let sanitized = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect::<String>();
        self.dir.join(format!("{sanitized}.json"))
    }
}

impl Store for FileStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn save(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let io_err = |source: std::io::Error| StoreError::Io {
            key: key.to_string(),
            source,
        };
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_keys_are_namespaced_by_mode() {
        assert_eq!(entries_key(CraftMode::Pottery), "entries:pottery");
        assert_eq!(materials_key(CraftMode::Glass), "materials:glass");
    }

    #[test]
    fn test_load_list_absent_is_empty() {
        let store = MemoryStore::new();
        let list: Vec<String> = load_list(&store, "missing").unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_load_list_malformed_is_empty() {
        let mut store = MemoryStore::new();
        store.save("entries:pottery", b"{not json").unwrap();
        let list: Vec<String> = load_list(&store, "entries:pottery").unwrap();
        assert!(list.is_empty());

        store.save("entries:pottery", br#"{"an":"object"}"#).unwrap();
        let list: Vec<String> = load_list(&store, "entries:pottery").unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_save_list_overwrites_whole_value() {
        let mut store = MemoryStore::new();
        save_list(&mut store, "k", &["a", "b"]).unwrap();
        save_list(&mut store, "k", &["c"]).unwrap();
        let list: Vec<String> = load_list(&store, "k").unwrap();
        assert_eq!(list, vec!["c".to_string()]);
    }

    #[test]
    fn test_file_store_path_sanitizes_key() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::open(temp_dir.path()).unwrap();
        let path = store.path_for("entries:pottery");
        assert!(path.ends_with("entries_pottery.json"));
    }

    #[test]
    fn test_file_store_save_load_remove() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut store = FileStore::open(temp_dir.path().join("nested")).unwrap();

        assert_eq!(store.load(CURRENT_MODE_KEY).unwrap(), None);
        store.save(CURRENT_MODE_KEY, b"glass").unwrap();
        assert_eq!(
            load_text(&store, CURRENT_MODE_KEY).unwrap().as_deref(),
            Some("glass")
        );

        store.remove(CURRENT_MODE_KEY).unwrap();
        assert_eq!(store.load(CURRENT_MODE_KEY).unwrap(), None);
        // Removing twice is fine.
        store.remove(CURRENT_MODE_KEY).unwrap();
    }
}
