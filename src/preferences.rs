//! Persisted Preferences
//!
//! A small string key-value store standing in for browser local storage.
//! The dashboard keeps exactly one entry in it: the dark-mode flag.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Key under which the dark-mode flag is stored
pub const DARK_MODE_KEY: &str = "darkMode";

const ENABLED: &str = "enabled";
const DISABLED: &str = "disabled";

/// Errors from the preference store
#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("IO error on {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse preferences {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// String key-value storage that survives restarts
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// Read the dark-mode flag; anything but `enabled` means off
pub fn load_dark_mode(store: &dyn PreferenceStore) -> Result<bool, PreferenceError> {
    Ok(store.get(DARK_MODE_KEY)?.as_deref() == Some(ENABLED))
}

/// Persist the dark-mode flag
pub fn store_dark_mode(store: &dyn PreferenceStore, enabled: bool) -> Result<(), PreferenceError> {
    store.set(DARK_MODE_KEY, if enabled { ENABLED } else { DISABLED })
}

/// Preferences kept in a JSON object on disk
pub struct FilePreferenceStore {
    path: PathBuf,
    // Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<data_local_dir>/ecoguard/preferences.json`
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .map(|p| p.join("ecoguard").join("preferences.json"))
            .unwrap_or_else(|| PathBuf::from("./ecoguard_preferences.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PreferenceError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(PreferenceError::Io {
                    path: self.path.clone(),
                    error: e.to_string(),
                })
            }
        };

        serde_json::from_str(&content).map_err(|e| PreferenceError::Parse {
            path: self.path.clone(),
            error: e.to_string(),
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), PreferenceError> {
        let io_err = |e: std::io::Error| PreferenceError::Io {
            path: self.path.clone(),
            error: e.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(entries).map_err(|e| PreferenceError::Parse {
            path: self.path.clone(),
            error: e.to_string(),
        })?;
        std::fs::write(&self.path, content).map_err(io_err)
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }
}

/// Preferences that live only as long as the process
#[derive(Default)]
pub struct MemoryPreferenceStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_dark_mode_round_trip_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");
        let store = FilePreferenceStore::new(&path);

        assert!(!load_dark_mode(&store).unwrap());

        store_dark_mode(&store, true).unwrap();
        assert!(load_dark_mode(&store).unwrap());

        // A fresh store over the same file sees the persisted value
        let reopened = FilePreferenceStore::new(&path);
        assert!(load_dark_mode(&reopened).unwrap());
        assert_eq!(
            reopened.get(DARK_MODE_KEY).unwrap().as_deref(),
            Some("enabled")
        );

        store_dark_mode(&reopened, false).unwrap();
        assert_eq!(store.get(DARK_MODE_KEY).unwrap().as_deref(), Some("disabled"));
    }

    #[test]
    fn test_other_keys_preserved() {
        let dir = tempdir().unwrap();
        let store = FilePreferenceStore::new(dir.path().join("preferences.json"));

        store.set("language", "en-US").unwrap();
        store_dark_mode(&store, true).unwrap();

        assert_eq!(store.get("language").unwrap().as_deref(), Some("en-US"));
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FilePreferenceStore::new(&path);
        assert!(matches!(
            load_dark_mode(&store),
            Err(PreferenceError::Parse { .. })
        ));
    }

    #[test]
    fn test_unknown_value_means_off() {
        let store = MemoryPreferenceStore::new();
        store.set(DARK_MODE_KEY, "maybe").unwrap();
        assert!(!load_dark_mode(&store).unwrap());
    }
}
