//! Cache store over a durable medium
//!
//! The only component that touches a `StorageMedium`. Values are opaque
//! serialized strings; typing happens in the query controller.

use crate::error::StoreResult;
use crate::medium::{MemoryMedium, StorageMedium};
use std::sync::Arc;

/// Key/value cache persisted in a medium
#[derive(Debug, Clone)]
pub struct CacheStore {
    medium: Arc<dyn StorageMedium>,
}

impl CacheStore {
    /// Create store over a medium
    #[inline]
    #[must_use]
    pub fn new(medium: Arc<dyn StorageMedium>) -> Self {
        Self { medium }
    }

    /// Create store over a fresh in-memory medium
    #[inline]
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryMedium::new()))
    }

    /// Get serialized value
    ///
    /// # Errors
    /// Propagates medium read failures
    #[inline]
    pub fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.medium.get_item(key)
    }

    /// Set serialized value
    ///
    /// # Errors
    /// Propagates medium write failures
    #[inline]
    pub fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.medium.set_item(key, value)
    }

    /// Remove every entry whose key starts with `prefix`
    ///
    /// The medium has no prefix scan, so all keys are enumerated first.
    /// Returns the number of removed entries.
    ///
    /// # Errors
    /// Propagates the first medium failure; entries removed before it stay
    /// removed
    pub fn clear_by_prefix(&self, prefix: &str) -> StoreResult<usize> {
        let matching: Vec<String> = self
            .medium
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect();

        for key in &matching {
            self.medium.remove_item(key)?;
        }

        tracing::debug!(prefix, removed = matching.len(), "cleared cache entries");
        Ok(matching.len())
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
