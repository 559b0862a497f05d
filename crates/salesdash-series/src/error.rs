//! Error types for the series model

/// Errors raised while building series values from untrusted input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeriesError {
    /// Category name outside the fixed set
    #[error("unknown category: '{0}'")]
    UnknownCategory(String),

    /// Date string not in `YYYY-MM-DD` form
    #[error("invalid date '{input}': {message}")]
    InvalidDate {
        /// Raw input
        input: String,
        /// Parser message
        message: String,
    },
}

impl SeriesError {
    /// Create invalid date error
    pub fn invalid_date(input: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidDate {
            input: input.into(),
            message: message.to_string(),
        }
    }
}
