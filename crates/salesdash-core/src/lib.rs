//! Salesdash Core - Dashboard controller
//!
//! Drives the sales dashboard:
//! - Owns the filter state (range, category, search, forced refresh)
//! - Turns filter edits into cached query cycles
//! - Debounces search input
//! - Keeps the memoized view-model (columns, summary, filtered rows)
//! - Exports the current view as CSV
//!
//! # Example
//!
//! ```rust,ignore
//! use salesdash_core::{DashboardConfig, DashboardController};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut dashboard = DashboardController::from_config(DashboardConfig::new())?;
//! dashboard.load();
//! dashboard.settle().await;
//!
//! let view = dashboard.view();
//! println!("Overall total: {}", view.summary.overall_total);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod debounce;
pub mod error;
pub mod export;
pub mod filter;
pub mod telemetry;

// Re-exports for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::DashboardConfig;
pub use dashboard::{DashboardController, DashboardView, DerivationCounters};
pub use debounce::{DebounceState, Debouncer};
pub use error::{ConfigError, DashboardError, DashboardResult, ExportError};
pub use export::{export_file_name, CsvExport, ExportSink, FileExportSink, MemoryExportSink};
pub use filter::FilterState;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the dashboard
    pub use crate::{
        DashboardConfig, DashboardController, DashboardView, ExportSink, FileExportSink,
        FilterState,
    };
    pub use salesdash_series::{Category, DateRange, Series, SummaryStats};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
