//! Durable key/value media
//!
//! A medium is a flat string → string map with no prefix scan. Two media
//! are provided:
//! - `MemoryMedium`: process-local, used by tests and ephemeral runs
//! - `FileMedium`: a JSON object on disk, rewritten on every change

use crate::error::{StoreError, StoreResult};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Raw string-keyed, string-valued storage
///
/// Only `CacheStore` talks to a medium directly.
pub trait StorageMedium: Send + Sync + Debug {
    /// Read value for key
    ///
    /// # Errors
    /// Medium-specific read failure
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write value for key, replacing any previous value
    ///
    /// # Errors
    /// Medium-specific write failure
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove key; absent keys are ignored
    ///
    /// # Errors
    /// Medium-specific write failure
    fn remove_item(&self, key: &str) -> StoreResult<()>;

    /// Enumerate every key currently stored
    ///
    /// # Errors
    /// Medium-specific read failure
    fn keys(&self) -> StoreResult<Vec<String>>;
}

/// In-memory medium
#[derive(Debug, Default)]
pub struct MemoryMedium {
    entries: DashMap<String, String>,
}

impl MemoryMedium {
    /// Create empty medium
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No stored keys
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key is present
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl StorageMedium for MemoryMedium {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.iter().map(|e| e.key().clone()).collect())
    }
}

/// JSON-file medium
///
/// The whole map is held in memory and written back through a sibling
/// temp file plus rename after each mutation.
#[derive(Debug)]
pub struct FileMedium {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileMedium {
    /// Open medium at `path`, starting empty when the file does not exist
    ///
    /// # Errors
    /// - `StoreError::Io` if the file exists but cannot be read
    /// - `StoreError::Corrupt` if the file is not a JSON string map
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let entries: BTreeMap<String, String> = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => {
                serde_json::from_str(&raw).map_err(|e| StoreError::corrupt(&path, e))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::io_error(&path, e)),
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "opened file medium");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Backing file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::corrupt(&self.path, e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io_error(parent, e))?;
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, raw).map_err(|e| StoreError::io_error(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::io_error(&self.path, e))
    }
}

impl StorageMedium for FileMedium {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut guard = self.entries.lock();
        guard.insert(key.to_string(), value.to_string());
        self.persist(&guard)
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        let mut guard = self.entries.lock();
        if guard.remove(key).is_some() {
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}
