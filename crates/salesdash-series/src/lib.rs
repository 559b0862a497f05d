//! Salesdash Series
//!
//! The data half of the sales dashboard: the per-day series model, the
//! deterministic range generator that stands in for the remote sales API,
//! and the derived aggregations the view renders.
//!
//! # Pipeline
//!
//! ```text
//! (DateRange, Option<Category>) → generate → Series → columns_of → summarize
//!                                              └──────→ filter_rows(search)
//! ```
//!
//! # Example
//!
//! ```rust
//! use salesdash_series::{columns_of, generate, summarize, DateRange};
//! use chrono::NaiveDate;
//!
//! let range = DateRange::new(
//!     NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(),
//! );
//! let series = generate(&range, None);
//! let columns = columns_of(&series);
//! let summary = summarize(&series, &columns);
//! assert_eq!(series.len(), 3);
//! assert_eq!(summary.overall_total, 5950);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod aggregate;
pub mod error;
pub mod generator;
pub mod types;

// Re-exports for convenience
pub use aggregate::{columns_of, filter_rows, summarize};
pub use error::SeriesError;
pub use generator::{daily_value, generate};
pub use types::{parse_date, Category, DateRange, Series, SeriesPoint, SummaryStats, DATE_FORMAT};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with sales series
    pub use crate::aggregate::{columns_of, filter_rows, summarize};
    pub use crate::generator::generate;
    pub use crate::types::{Category, DateRange, Series, SeriesPoint, SummaryStats};
}
