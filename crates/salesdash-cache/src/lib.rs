//! Salesdash Cache
//!
//! Key-derived caching of sales series over a durable key/value medium.
//!
//! # Architecture
//!
//! ```text
//! QueryRequest → CacheKey ─┬→ CacheStore → StorageMedium (memory | JSON file)
//!                          └→ SalesSource (on miss or forced refresh)
//!                                   ↓
//!                       watch::Sender<QueryState> (series, loading, error)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use salesdash_cache::{CacheStore, MockSalesSource, QueryCacheController, QueryRequest};
//! use std::sync::Arc;
//!
//! # async fn example(range: salesdash_series::DateRange) {
//! let ctrl = QueryCacheController::new(
//!     "dashboard",
//!     CacheStore::in_memory(),
//!     Arc::new(MockSalesSource::instant()),
//! );
//!
//! let first = ctrl.query(QueryRequest::new(range, None)).await;
//! let second = ctrl.query(QueryRequest::new(range, None)).await;
//! assert!(!first.from_cache && second.from_cache);
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod error;
pub mod key;
pub mod medium;
pub mod query;
pub mod source;
pub mod store;

// Re-exports for convenience
pub use error::{FetchError, StoreError, StoreResult};
pub use key::{namespace_prefix, CacheKey, ALL_CATEGORIES};
pub use medium::{FileMedium, MemoryMedium, StorageMedium};
pub use query::{
    QueryCacheController, QueryOutcome, QueryRequest, QueryState, QueryStatus, QueryTicket,
    FETCH_ERROR_MESSAGE,
};
pub use source::{MockSalesSource, SalesSource};
pub use store::CacheStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
