//! Router option persistence.
//!
//! Backends persist their options through the [`OptionStore`] trait, a
//! string key/value store with typed helpers on top. Keys are namespaced per
//! backend (`routers/<backend>/<option>`). Two implementations are provided:
//!
//! - `FileStore` keeps a single JSON file holding a map of string keys to
//!   string values. It is read once on open and flushed synchronously on every
//!   mutation.
//! - `MemoryStore` keeps everything in memory; used by tests and by callers
//!   that do not want anything written to disk.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Platform storage error: {0}")]
    Platform(String),

    #[error("Invalid value {value:?} for option {key}")]
    InvalidValue { key: String, value: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Key/value store for backend options.
///
/// Keys and values are UTF-8 strings; booleans and integers are stored in
/// their canonical textual form.
pub trait OptionStore: Send + Sync {
    /// Store a string value for a key.
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Read a string value for a key. Returns Ok(None) when key is missing.
    fn get_string(&self, key: &str) -> StorageResult<Option<String>>;

    /// Remove a key (no-op if key does not exist).
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// All stored keys, in no particular order.
    fn keys(&self) -> StorageResult<Vec<String>>;

    fn set_bool(&self, key: &str, value: bool) -> StorageResult<()> {
        self.set_string(key, if value { "true" } else { "false" })
    }

    fn get_bool(&self, key: &str) -> StorageResult<Option<bool>> {
        self.get_parsed(key)
    }

    fn set_int(&self, key: &str, value: i64) -> StorageResult<()> {
        self.set_string(key, &value.to_string())
    }

    fn get_int(&self, key: &str) -> StorageResult<Option<i64>> {
        self.get_parsed(key)
    }
}

trait ParsedValue {
    fn get_parsed<T: std::str::FromStr>(&self, key: &str) -> StorageResult<Option<T>>;
}

impl<S: OptionStore + ?Sized> ParsedValue for S {
    fn get_parsed<T: std::str::FromStr>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.get_string(key)? {
            Some(value) => match value.trim().parse::<T>() {
                Ok(parsed) => Ok(Some(parsed)),
                Err(_) => Err(StorageError::InvalidValue {
                    key: key.to_string(),
                    value,
                }),
            },
            None => Ok(None),
        }
    }
}

fn lock_error<T>(err: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Platform(format!("mutex poisoned: {}", err))
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionStore for MemoryStore {
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
        self.inner
            .lock()
            .map_err(lock_error)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.inner.lock().map_err(lock_error)?.get(key).cloned())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.inner.lock().map_err(lock_error)?.remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.inner.lock().map_err(lock_error)?.keys().cloned().collect())
    }
}

/// File-based store: a single JSON file which is a map of key -> string value.
pub struct FileStore {
    /// Path to the backing JSON file.
    path: PathBuf,
    /// In-memory copy of key -> value
    inner: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Default location of the options file for the current user:
    /// - On Windows: %APPDATA%/Mappero/options.json
    /// - Else: $HOME/.config/mappero/options.json
    pub fn default_path() -> PathBuf {
        if cfg!(windows)
            && let Ok(appdata) = std::env::var("APPDATA")
        {
            return Path::new(&appdata).join("Mappero").join("options.json");
        }

        if let Ok(home) = std::env::var("HOME") {
            return Path::new(&home)
                .join(".config")
                .join("mappero")
                .join("options.json");
        }

        // Fallback to current directory
        Path::new(".").join("mappero-options.json")
    }

    /// Open (or lazily create) the store at `path`
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        let mut map: HashMap<String, String> = HashMap::new();
        if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|e| StorageError::Io(format!("Failed to read options file: {}", e)))?;
            if !contents.trim().is_empty() {
                map = serde_json::from_str(&contents).map_err(|e| {
                    StorageError::Json(format!("Failed to parse options JSON: {}", e))
                })?;
            }
        }
        tracing::debug!(path = %path.display(), entries = map.len(), "Option store opened");

        Ok(FileStore {
            path,
            inner: Mutex::new(map),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush_locked(&self, locked: &HashMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::Io(format!("Failed to create options directory: {}", e))
            })?;
        }
        let contents =
            serde_json::to_string_pretty(locked).map_err(|e| StorageError::Json(e.to_string()))?;
        fs::write(&self.path, contents)
            .map_err(|e| StorageError::Io(format!("write failed: {}", e)))
    }
}

impl OptionStore for FileStore {
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut guard = self.inner.lock().map_err(lock_error)?;
        let mut updated = guard.clone();
        updated.insert(key.to_string(), value.to_string());
        self.flush_locked(&updated)?;
        *guard = updated;
        Ok(())
    }

    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        let guard = self.inner.lock().map_err(lock_error)?;
        Ok(guard.get(key).cloned())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut guard = self.inner.lock().map_err(lock_error)?;
        if guard.contains_key(key) {
            let mut updated = guard.clone();
            updated.remove(key);
            self.flush_locked(&updated)?;
            *guard = updated;
        }
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let guard = self.inner.lock().map_err(lock_error)?;
        Ok(guard.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_typed_values() {
        let store = MemoryStore::new();
        assert_eq!(store.get_bool("routers/test/flag").unwrap(), None);

        store.set_bool("routers/test/flag", true).unwrap();
        store.set_int("routers/test/count", -4).unwrap();
        assert_eq!(store.get_bool("routers/test/flag").unwrap(), Some(true));
        assert_eq!(store.get_int("routers/test/count").unwrap(), Some(-4));
        assert_eq!(
            store.get_string("routers/test/flag").unwrap().as_deref(),
            Some("true")
        );

        store.remove("routers/test/flag").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["routers/test/count".to_string()]);
    }

    #[test]
    fn test_invalid_typed_value() {
        let store = MemoryStore::new();
        store.set_string("routers/test/flag", "maybe").unwrap();
        let err = store.get_bool("routers/test/flag").unwrap_err();
        assert!(matches!(err, StorageError::InvalidValue { ref value, .. } if value == "maybe"));
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("options.json");

        let store = FileStore::open(&path).unwrap();
        assert!(!path.exists());
        store.set_bool("routers/yandex/use_traffic", true).unwrap();
        store.set_int("routers/direct/steps", 12).unwrap();
        assert!(path.exists());
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.path(), path.as_path());
        assert_eq!(
            reopened.get_bool("routers/yandex/use_traffic").unwrap(),
            Some(true)
        );
        assert_eq!(reopened.get_int("routers/direct/steps").unwrap(), Some(12));

        reopened.remove("routers/direct/steps").unwrap();
        let again = FileStore::open(&path).unwrap();
        assert_eq!(again.keys().unwrap().len(), 1);
    }

    #[test]
    fn test_file_store_keeps_memory_in_sync_when_flush_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let store = FileStore::open(blocker.join("options.json")).unwrap();
        assert!(matches!(
            store.set_string("routers/google/avoid_highways", "true"),
            Err(StorageError::Io(_))
        ));
        assert_eq!(store.get_string("routers/google/avoid_highways").unwrap(), None);
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StorageError::Json(_))));

        fs::write(&path, "  \n").unwrap();
        assert!(FileStore::open(&path).unwrap().keys().unwrap().is_empty());
    }

    #[test]
    fn test_default_path_is_json_file() {
        let path = FileStore::default_path();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
    }
}
