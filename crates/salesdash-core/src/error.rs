//! Error types for the dashboard
//!
//! Fetch failures never reach this level; they end in the view-model's
//! error field. What remains is configuration, cache maintenance and export.

use salesdash_cache::StoreError;
use std::path::PathBuf;

/// Errors loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML did not match the config schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors exporting the current view
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Current series has no points
    #[error("nothing to export: current view is empty")]
    NothingToExport,

    /// IO error writing the artifact
    #[error("io error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Combined dashboard error
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

/// Result type alias for dashboard operations
pub type DashboardResult<T> = Result<T, DashboardError>;
