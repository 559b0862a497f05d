//! Dashboard configuration
//!
//! All fields have defaults; a TOML file only needs the ones it overrides.
//!
//! ```toml
//! namespace = "dashboard"
//! default_start = "2023-01-01"
//! search_debounce_ms = 300
//! simulated_latency_ms = 1000
//! store_path = "cache/dashboard.json"
//! export_dir = "exports"
//! ```

use crate::error::ConfigError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Dashboard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Cache key namespace
    pub namespace: String,
    /// Start date restored by "clear filters"
    pub default_start: NaiveDate,
    /// Quiet period before a search edit commits
    pub search_debounce_ms: u64,
    /// Latency of the mock sales source
    pub simulated_latency_ms: u64,
    /// JSON file backing the cache; in-memory when unset
    pub store_path: Option<PathBuf>,
    /// Directory CSV exports are written to
    pub export_dir: PathBuf,
}

impl DashboardConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed TOML or wrong field types
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Parse` on malformed TOML
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_toml_str(&raw)
    }

    /// With namespace
    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// With default start date
    #[inline]
    #[must_use]
    pub fn with_default_start(mut self, date: NaiveDate) -> Self {
        self.default_start = date;
        self
    }

    /// With search debounce
    #[inline]
    #[must_use]
    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With simulated source latency
    #[inline]
    #[must_use]
    pub fn with_simulated_latency(mut self, latency: Duration) -> Self {
        self.simulated_latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With file-backed store
    #[inline]
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// With export directory
    #[inline]
    #[must_use]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// Search debounce as a duration
    #[inline]
    #[must_use]
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Source latency as a duration
    #[inline]
    #[must_use]
    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            namespace: "dashboard".to_string(),
            default_start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            search_debounce_ms: 300,
            simulated_latency_ms: 1000,
            store_path: None,
            export_dir: PathBuf::from("."),
        }
    }
}
