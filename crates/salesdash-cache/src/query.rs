//! Query cache controller
//!
//! Resolves a (range, category, force refresh) request to a series:
//! 1. Activate: derive the cache key and take a new generation
//! 2. Unless forced, serve from the cache store on hit
//! 3. Otherwise fetch from the source while `loading` is set
//! 4. Write the fresh series back (skipped for forced refreshes)
//! 5. Commit to the observable state only if no later request was activated
//!
//! Failures never escape: a rejected fetch becomes the state's error message
//! with an empty series.

use crate::error::StoreResult;
use crate::key::{namespace_prefix, CacheKey};
use crate::source::SalesSource;
use crate::store::CacheStore;
use salesdash_series::{Category, DateRange, Series};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// User-visible message for any fetch failure
pub const FETCH_ERROR_MESSAGE: &str = "Could not load data. Please try again.";

/// One query cycle's inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryRequest {
    /// Date range
    pub range: DateRange,
    /// Selected category, `None` for all
    pub category: Option<Category>,
    /// Bypass cache read and write for this cycle
    pub force_refresh: bool,
}

impl QueryRequest {
    /// Create non-forced request
    #[inline]
    #[must_use]
    pub fn new(range: DateRange, category: Option<Category>) -> Self {
        Self {
            range,
            category,
            force_refresh: false,
        }
    }

    /// With force refresh flag
    #[inline]
    #[must_use]
    pub fn with_force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }
}

/// Observable controller state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    /// Last committed series
    pub series: Series,
    /// A fetch for the active key is in flight
    pub loading: bool,
    /// Message of the last failed cycle
    pub error: Option<String>,
    /// Key of the most recently activated request
    pub active_key: Option<CacheKey>,
    /// Bumped on every activation
    pub generation: u64,
    /// Bumped on every commit of `series`
    pub revision: u64,
}

/// An activated request, ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    /// Request to run
    pub request: QueryRequest,
    /// Key the request resolves to
    pub key: CacheKey,
    /// Activation this ticket belongs to
    pub generation: u64,
}

/// How a query cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Result became the current state
    Committed,
    /// A newer request took over before this one finished
    Superseded,
    /// Fetch failed; state carries the error
    Failed,
}

/// Result of one query cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    /// Key the cycle ran under
    pub key: CacheKey,
    /// Series produced (empty on failure)
    pub series: Series,
    /// Served from the cache store
    pub from_cache: bool,
    /// Terminal status
    pub status: QueryStatus,
}

impl QueryOutcome {
    /// Result reached the observable state without error
    #[inline]
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.status == QueryStatus::Committed
    }
}

/// Cache-first query controller
///
/// Shareable across tasks; all state lives in a watch channel and every
/// state change of a cycle is checked against its generation under the
/// channel's lock.
pub struct QueryCacheController {
    namespace: String,
    store: CacheStore,
    source: Arc<dyn SalesSource>,
    state: watch::Sender<QueryState>,
}

impl QueryCacheController {
    /// Create controller
    #[must_use]
    pub fn new(namespace: impl Into<String>, store: CacheStore, source: Arc<dyn SalesSource>) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            namespace: namespace.into(),
            store,
            source,
            state,
        }
    }

    /// Cache key namespace
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Key a request resolves to
    #[inline]
    #[must_use]
    pub fn key_for(&self, request: &QueryRequest) -> CacheKey {
        CacheKey::derive(&self.namespace, &request.range, request.category)
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> QueryState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.state.subscribe()
    }

    /// Make `request` the one whose result may commit
    ///
    /// Activation order, not completion order, decides which cycle wins:
    /// callers that spawn cycles activate before spawning.
    #[must_use]
    pub fn activate(&self, request: QueryRequest) -> QueryTicket {
        let key = self.key_for(&request);
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            s.active_key = Some(key.clone());
            generation = s.generation;
        });
        QueryTicket {
            request,
            key,
            generation,
        }
    }

    /// Activate and run one query cycle
    pub async fn query(&self, request: QueryRequest) -> QueryOutcome {
        let ticket = self.activate(request);
        self.run(ticket).await
    }

    /// Run a previously activated cycle
    pub async fn run(&self, ticket: QueryTicket) -> QueryOutcome {
        let QueryTicket {
            request,
            key,
            generation,
        } = ticket;

        if request.force_refresh {
            tracing::debug!(%key, "forced refresh, bypassing cache");
        } else if let Some(series) = self.read_cached(&key) {
            let status = if self.commit_if_current(generation, series.clone(), None) {
                tracing::debug!(%key, points = series.len(), "using cached data");
                QueryStatus::Committed
            } else {
                tracing::debug!(%key, "discarding superseded cache hit");
                QueryStatus::Superseded
            };
            return QueryOutcome {
                key,
                series,
                from_cache: true,
                status,
            };
        } else {
            tracing::debug!(%key, "no cache entry, fetching");
        }

        self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            s.loading = true;
            s.error = None;
            true
        });

        match self.source.fetch(request.range, request.category).await {
            Ok(series) => {
                if !request.force_refresh {
                    self.write_cached(&key, &series);
                }

                let status = if self.commit_if_current(generation, series.clone(), None) {
                    QueryStatus::Committed
                } else {
                    tracing::debug!(%key, "discarding superseded result");
                    QueryStatus::Superseded
                };
                QueryOutcome {
                    key,
                    series,
                    from_cache: false,
                    status,
                }
            }
            Err(e) => {
                tracing::error!(%key, error = %e, "sales fetch failed");

                let status = if self.commit_if_current(
                    generation,
                    Series::empty(),
                    Some(FETCH_ERROR_MESSAGE.to_string()),
                ) {
                    QueryStatus::Failed
                } else {
                    QueryStatus::Superseded
                };

                QueryOutcome {
                    key,
                    series: Series::empty(),
                    from_cache: false,
                    status,
                }
            }
        }
    }

    /// Remove every entry of this controller's namespace
    ///
    /// # Errors
    /// Propagates medium failures
    pub fn clear_cache(&self) -> StoreResult<usize> {
        let removed = self.store.clear_by_prefix(&namespace_prefix(&self.namespace))?;
        tracing::info!(namespace = %self.namespace, removed, "dashboard cache cleared");
        Ok(removed)
    }

    /// Check and commit under one lock; false if a newer cycle was activated
    fn commit_if_current(&self, generation: u64, series: Series, error: Option<String>) -> bool {
        self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            s.series = series;
            s.error = error;
            s.loading = false;
            s.revision += 1;
            true
        })
    }

    /// Unreadable or malformed entries count as a miss
    fn read_cached(&self, key: &CacheKey) -> Option<Series> {
        let raw = match self.store.get(key.as_str()) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(%key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<Series>(&raw) {
            Ok(series) => Some(series),
            Err(e) => {
                tracing::warn!(%key, error = %e, "malformed cache entry, treating as miss");
                None
            }
        }
    }

    fn write_cached(&self, key: &CacheKey, series: &Series) {
        let raw = match serde_json::to_string(series) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(%key, error = %e, "could not serialize series for cache");
                return;
            }
        };

        match self.store.set(key.as_str(), &raw) {
            Ok(()) => tracing::debug!(%key, "saved fresh data to cache"),
            Err(e) => tracing::warn!(%key, error = %e, "cache write failed"),
        }
    }
}

impl fmt::Debug for QueryCacheController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCacheController")
            .field("namespace", &self.namespace)
            .field("store", &self.store)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::medium::{MemoryMedium, StorageMedium};
    use crate::source::MockSalesSource;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use salesdash_series::generate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn range(from: u32, to: u32) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2023, 1, from).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, to).unwrap(),
        )
    }

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SalesSource for Counting {
        async fn fetch(&self, range: DateRange, category: Option<Category>) -> Result<Series, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(generate(&range, category))
        }
    }

    struct Rejecting;

    #[async_trait]
    impl SalesSource for Rejecting {
        async fn fetch(&self, _: DateRange, _: Option<Category>) -> Result<Series, FetchError> {
            Err(FetchError::Rejected("offline".to_string()))
        }
    }

    /// Slow for "all categories", fast for a single category
    struct Staggered;

    #[async_trait]
    impl SalesSource for Staggered {
        async fn fetch(&self, range: DateRange, category: Option<Category>) -> Result<Series, FetchError> {
            let delay = if category.is_none() { 500 } else { 50 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(generate(&range, category))
        }
    }

    fn controller_with(source: Arc<dyn SalesSource>) -> (QueryCacheController, Arc<MemoryMedium>) {
        let medium = Arc::new(MemoryMedium::new());
        let store = CacheStore::new(medium.clone());
        (QueryCacheController::new("dashboard", store, source), medium)
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let source = Arc::new(Counting::default());
        let (ctrl, medium) = controller_with(source.clone());
        let request = QueryRequest::new(range(1, 3), None);

        let first = ctrl.query(request).await;
        assert!(!first.from_cache);
        assert!(first.is_committed());
        assert!(medium.contains("dashboard_2023-01-01_2023-01-03_all"));

        let second = ctrl.query(request).await;
        assert!(second.from_cache);
        assert_eq!(second.series, first.series);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let state = ctrl.state();
        assert_eq!(state.series, first.series);
        assert!(!state.loading);
        assert_eq!(state.revision, 2);
    }

    #[tokio::test]
    async fn forced_refresh_skips_read_and_write() {
        let source = Arc::new(Counting::default());
        let (ctrl, medium) = controller_with(source.clone());
        let request = QueryRequest::new(range(1, 3), None).with_force_refresh(true);

        let outcome = ctrl.query(request).await;

        assert!(!outcome.from_cache);
        assert!(outcome.is_committed());
        assert!(medium.is_empty());

        // an existing entry is not consulted either
        medium.set_item(ctrl.key_for(&request).as_str(), "[]").unwrap();
        let again = ctrl.query(request).await;
        assert_eq!(again.series.len(), 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failure_sets_error_and_empties_series() {
        let (ctrl, _) = controller_with(Arc::new(Counting::default()));
        ctrl.query(QueryRequest::new(range(1, 3), None)).await;
        assert_eq!(ctrl.state().series.len(), 3);

        let failing = QueryCacheController::new("dashboard", ctrl.store().clone(), Arc::new(Rejecting));
        let outcome = failing.query(QueryRequest::new(range(4, 6), None)).await;

        assert_eq!(outcome.status, QueryStatus::Failed);
        let state = failing.state();
        assert!(state.series.is_empty());
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some(FETCH_ERROR_MESSAGE));
    }

    /// Rejects the first call only
    #[derive(Default)]
    struct FlakyOnce {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SalesSource for FlakyOnce {
        async fn fetch(&self, range: DateRange, category: Option<Category>) -> Result<Series, FetchError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(FetchError::Rejected("timeout".to_string()));
            }
            Ok(generate(&range, category))
        }
    }

    #[tokio::test]
    async fn retry_after_failure_clears_error() {
        let (ctrl, medium) = controller_with(Arc::new(FlakyOnce::default()));
        let request = QueryRequest::new(range(1, 2), None);

        ctrl.query(request).await;
        assert!(ctrl.state().error.is_some());
        assert!(medium.is_empty());

        let outcome = ctrl.query(request).await;
        assert!(!outcome.from_cache);
        assert!(ctrl.state().error.is_none());
        assert_eq!(ctrl.state().series.len(), 2);
    }

    #[tokio::test]
    async fn malformed_entry_is_a_miss() {
        let source = Arc::new(Counting::default());
        let (ctrl, medium) = controller_with(source.clone());
        let request = QueryRequest::new(range(1, 3), None);
        medium.set_item(ctrl.key_for(&request).as_str(), "{not json").unwrap();

        let outcome = ctrl.query(request).await;

        assert!(!outcome.from_cache);
        assert_eq!(outcome.series.len(), 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        // entry repaired by the fresh write
        let raw = medium.get_item(ctrl.key_for(&request).as_str()).unwrap().unwrap();
        assert_eq!(serde_json::from_str::<Series>(&raw).unwrap(), outcome.series);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_result_does_not_overwrite_newer_request() {
        let (ctrl, medium) = controller_with(Arc::new(Staggered));
        let slow = QueryRequest::new(range(1, 10), None);
        let fast = QueryRequest::new(range(1, 10), Some(Category::Food));

        let (slow_out, fast_out) = tokio::join!(ctrl.query(slow), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            ctrl.query(fast).await
        });

        assert_eq!(fast_out.status, QueryStatus::Committed);
        assert_eq!(slow_out.status, QueryStatus::Superseded);

        let state = ctrl.state();
        assert_eq!(state.series, fast_out.series);
        assert_eq!(state.active_key, Some(ctrl.key_for(&fast)));
        assert!(!state.loading);
        // the stale result is still valid for its own key
        assert!(medium.contains(ctrl.key_for(&slow).as_str()));
    }

    #[tokio::test]
    async fn activation_order_decides_the_winner() {
        let (ctrl, medium) = controller_with(Arc::new(Counting::default()));
        let older = ctrl.activate(QueryRequest::new(range(1, 10), None));
        let newer = ctrl.activate(QueryRequest::new(range(1, 10), Some(Category::Food)));
        assert!(newer.generation > older.generation);

        // newer finishes first, older must not overwrite it
        let newer_out = ctrl.run(newer.clone()).await;
        let older_out = ctrl.run(older.clone()).await;

        assert_eq!(newer_out.status, QueryStatus::Committed);
        assert_eq!(older_out.status, QueryStatus::Superseded);
        let state = ctrl.state();
        assert_eq!(state.series, newer_out.series);
        assert_eq!(state.active_key, Some(newer.key));
        assert_eq!(state.revision, 1);
        assert!(!state.loading);
        assert!(medium.contains(older.key.as_str()));
    }

    #[tokio::test]
    async fn superseded_cache_hit_does_not_commit() {
        let (ctrl, _) = controller_with(Arc::new(Counting::default()));
        let cached = QueryRequest::new(range(1, 3), None);
        ctrl.query(cached).await;
        let revision = ctrl.state().revision;

        let stale = ctrl.activate(cached);
        let current = ctrl.activate(QueryRequest::new(range(1, 2), Some(Category::Books)));

        let outcome = ctrl.run(stale).await;
        assert!(outcome.from_cache);
        assert_eq!(outcome.status, QueryStatus::Superseded);
        assert_eq!(ctrl.state().revision, revision);
        assert_eq!(ctrl.state().active_key, Some(current.key));
    }

    #[tokio::test]
    async fn superseded_fetch_leaves_loading_untouched() {
        let (ctrl, _) = controller_with(Arc::new(Rejecting));
        let stale = ctrl.activate(QueryRequest::new(range(1, 3), None));
        let _current = ctrl.activate(QueryRequest::new(range(1, 4), None));

        let outcome = ctrl.run(stale).await;

        assert_eq!(outcome.status, QueryStatus::Superseded);
        let state = ctrl.state();
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.revision, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn loading_visible_while_in_flight() {
        let (ctrl, _) = controller_with(Arc::new(MockSalesSource::new(Duration::from_millis(200))));
        let mut rx = ctrl.subscribe();

        let query = ctrl.query(QueryRequest::new(range(1, 2), None));
        let watcher = async {
            rx.wait_for(|s| s.loading).await.unwrap();
            rx.wait_for(|s| !s.loading).await.unwrap();
        };
        let (outcome, ()) = tokio::join!(query, watcher);

        assert!(outcome.is_committed());
    }

    #[tokio::test]
    async fn clear_cache_only_touches_namespace() {
        let (ctrl, medium) = controller_with(Arc::new(Counting::default()));
        ctrl.query(QueryRequest::new(range(1, 2), None)).await;
        ctrl.query(QueryRequest::new(range(1, 2), Some(Category::Books))).await;
        medium.set_item("cart", "[]").unwrap();

        assert_eq!(ctrl.clear_cache().unwrap(), 2);
        assert_eq!(medium.keys().unwrap(), vec!["cart".to_string()]);
    }
}
