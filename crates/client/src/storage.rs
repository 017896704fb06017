//! Key-value persistence for client state.
//!
//! Modelled on browser local storage: string keys, string values, no
//! transactions. The session credential, the serialized identity and the cart
//! snapshot are the only things written.
//!
//! - [`MemoryStore`] keeps everything in process memory (tests, ephemeral use).
//! - [`FileStore`] keeps one JSON document on disk, rewritten atomically.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, warn};

/// Storage keys used by the stores.
pub mod keys {
    /// Key for the bearer credential.
    pub const AUTH_TOKEN: &str = "authToken";

    /// Key for the serialized [`Identity`](phoneplace_core::Identity).
    pub const USER: &str = "user";

    /// Key for the cart snapshot.
    pub const CART: &str = "cart";
}

/// Errors that can occur when reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The state file exists but is not a JSON object of strings.
    #[error("storage file {path} is corrupt: {source}")]
    Corrupt {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be serialized.
    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),

    /// A previous writer panicked while holding the lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// String key-value storage surviving restarts.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage shared between the cart and session stores.
pub type SharedStore = Arc<dyn KeyValueStore>;

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.values.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// =============================================================================
// FileStore
// =============================================================================

/// File name of the state document inside the state directory.
const STATE_FILE: &str = "state.json";

/// Storage backed by `<dir>/state.json`.
///
/// The whole document is held in memory and rewritten on every change through
/// a temporary file and a rename, so a crash never leaves a half-written file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store in `dir`.
    ///
    /// A corrupt state file is set aside as `state.json.corrupt` and the store
    /// starts empty, so a damaged file never blocks startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file exists
    /// but cannot be read.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(STATE_FILE);
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(values) => values,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding corrupt state file");
                    let aside = path.with_extension("json.corrupt");
                    if let Err(e) = std::fs::rename(&path, &aside) {
                        warn!(error = %e, "Failed to move corrupt state file aside");
                    }
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        debug!(path = %path.display(), keys = values.len(), "Opened state file");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Location of the state document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.values.lock().map_err(|_| StorageError::Poisoned)
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let encoded = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, encoded).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Apply `change` to a copy, flush it, and only then publish it.
    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let mut values = self.lock()?;
        let mut next = values.clone();
        change(&mut next);
        if next == *values {
            return Ok(());
        }
        self.flush(&next)?;
        *values = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|values| {
            values.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("phoneplace-storage-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(keys::CART).unwrap(), None);
        store.set(keys::CART, "[]").unwrap();
        assert_eq!(store.get(keys::CART).unwrap().as_deref(), Some("[]"));
        store.remove(keys::CART).unwrap();
        store.remove(keys::CART).unwrap();
        assert_eq!(store.get(keys::CART).unwrap(), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = scratch_dir();
        {
            let store = FileStore::open(&dir).unwrap();
            store.set(keys::AUTH_TOKEN, "abc").unwrap();
            store.set(keys::USER, "{}").unwrap();
            store.remove(keys::USER).unwrap();
        }

        let store = FileStore::open(&dir).unwrap();
        assert_eq!(store.get(keys::AUTH_TOKEN).unwrap().as_deref(), Some("abc"));
        assert_eq!(store.get(keys::USER).unwrap(), None);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_file_store_sets_aside_corrupt_file() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(STATE_FILE), "{ not json").unwrap();

        let store = FileStore::open(&dir).unwrap();
        assert_eq!(store.get(keys::AUTH_TOKEN).unwrap(), None);
        assert!(dir.join("state.json.corrupt").exists());

        store.set(keys::CART, "[]").unwrap();
        assert!(dir.join(STATE_FILE).exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
