//! Error types for the cache layer
//!
//! Provides error handling for:
//! - Durable medium operations (read, write, enumerate)
//! - Data collaborator fetches

use std::path::PathBuf;

/// Errors from the durable key/value medium
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error on the backing file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backing file exists but is not a JSON string map
    #[error("corrupt store file {path}: {message}")]
    Corrupt { path: PathBuf, message: String },
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create corrupt-file error for path
    pub fn corrupt(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Corrupt {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Errors from the sales data collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Collaborator rejected the request
    #[error("fetch rejected: {0}")]
    Rejected(String),
}

/// Result type alias for medium operations
pub type StoreResult<T> = Result<T, StoreError>;
