//! Dashboard controller
//!
//! Owns the filter state and turns filter edits into query cycles:
//!
//! ```text
//! set_start / set_end / set_category / clear_cache ──→ launch cycle (tokio task)
//! edit_search ──→ Debouncer ──→ committed search term (no re-fetch)
//!                                      ↓
//! QueryState (watch) ──→ columns ──→ summary
//!                   └──────────────→ filtered rows (series + search)
//! ```
//!
//! Cycles run concurrently; each is activated before its task is spawned and
//! `QueryCacheController` discards any result of an earlier activation. `settle` awaits every outstanding cycle,
//! `view` only collects the ones that already finished.

use crate::clock::{Clock, SystemClock};
use crate::config::DashboardConfig;
use crate::debounce::Debouncer;
use crate::error::{DashboardResult, ExportError};
use crate::export::{CsvExport, ExportSink};
use crate::filter::FilterState;
use chrono::NaiveDate;
use futures::FutureExt;
use salesdash_cache::{
    CacheStore, FileMedium, MockSalesSource, QueryCacheController, QueryOutcome, QueryRequest,
    QueryState,
};
use salesdash_series::{columns_of, filter_rows, summarize, Category, Series, SummaryStats};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

/// Everything the presentation layer renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    /// Current filters
    pub filters: FilterState,
    /// Search input not yet committed by the debouncer
    pub pending_search: Option<String>,
    /// Full series of the active query
    pub series: Series,
    /// A fetch is in flight
    pub loading: bool,
    /// User-visible error of the last failed cycle
    pub error: Option<String>,
    /// Columns present in the series
    pub columns: Vec<String>,
    /// Totals per column and overall
    pub summary: SummaryStats,
    /// Rows matching the committed search term
    pub filtered_rows: Series,
}

impl DashboardView {
    /// (shown, total) record counts
    #[inline]
    #[must_use]
    pub fn record_counts(&self) -> (usize, usize) {
        (self.filtered_rows.len(), self.series.len())
    }
}

/// How many times each derivation ran
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivationCounters {
    /// `columns_of` runs
    pub columns: u64,
    /// `summarize` runs
    pub summary: u64,
    /// `filter_rows` runs
    pub filtered_rows: u64,
}

/// Memoized derivations, dirty-checked against the series revision and
/// the search term
#[derive(Debug, Default)]
struct Derived {
    revision: Option<u64>,
    search_term: Option<String>,
    series: Series,
    columns: Vec<String>,
    summary: SummaryStats,
    filtered_rows: Series,
    counters: DerivationCounters,
}

impl Derived {
    fn sync(&mut self, state: &QueryState, search_term: &str) {
        let series_changed = self.revision != Some(state.revision);

        if series_changed {
            self.series = state.series.clone();
            self.revision = Some(state.revision);

            self.columns = columns_of(&self.series);
            self.counters.columns += 1;

            self.summary = summarize(&self.series, &self.columns);
            self.counters.summary += 1;
        }

        if series_changed || self.search_term.as_deref() != Some(search_term) {
            self.filtered_rows = filter_rows(&self.series, search_term);
            self.search_term = Some(search_term.to_string());
            self.counters.filtered_rows += 1;
        }
    }
}

#[derive(Debug)]
struct PendingCycle {
    request: QueryRequest,
    handle: JoinHandle<QueryOutcome>,
}

/// Filter owner and view-model producer
///
/// Commands that launch a query cycle spawn a Tokio task and must be called
/// from within a runtime.
#[derive(Debug)]
pub struct DashboardController {
    config: DashboardConfig,
    clock: Arc<dyn Clock>,
    query: Arc<QueryCacheController>,
    filters: FilterState,
    search: Debouncer,
    derived: Derived,
    pending: Vec<PendingCycle>,
    cycles_launched: u64,
}

impl DashboardController {
    /// Create controller with default filters; no cycle runs until `load`
    #[must_use]
    pub fn new(config: DashboardConfig, query: Arc<QueryCacheController>, clock: Arc<dyn Clock>) -> Self {
        let filters = FilterState::defaults(config.default_start, clock.today());
        let search = Debouncer::new(config.search_debounce());
        Self {
            config,
            clock,
            query,
            filters,
            search,
            derived: Derived::default(),
            pending: Vec::new(),
            cycles_launched: 0,
        }
    }

    /// Build the production wiring: mock source, configured store, UTC clock
    ///
    /// # Errors
    /// `DashboardError::Store` if the configured store file cannot be opened
    pub fn from_config(config: DashboardConfig) -> DashboardResult<Self> {
        let store = match &config.store_path {
            Some(path) => CacheStore::new(Arc::new(FileMedium::open(path)?)),
            None => CacheStore::in_memory(),
        };
        let source = Arc::new(MockSalesSource::new(config.simulated_latency()));
        let query = Arc::new(QueryCacheController::new(config.namespace.clone(), store, source));
        Ok(Self::new(config, query, Arc::new(SystemClock)))
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Current filters
    #[inline]
    #[must_use]
    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Underlying query controller
    #[inline]
    #[must_use]
    pub fn query_controller(&self) -> &Arc<QueryCacheController> {
        &self.query
    }

    /// Query cycles started so far
    #[inline]
    #[must_use]
    pub fn cycles_launched(&self) -> u64 {
        self.cycles_launched
    }

    /// Some cycle has not been collected yet
    #[inline]
    #[must_use]
    pub fn has_pending_cycles(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Derivation run counts
    #[inline]
    #[must_use]
    pub fn derivation_counters(&self) -> DerivationCounters {
        self.derived.counters
    }

    /// Run the initial query cycle
    pub fn load(&mut self) {
        self.launch();
    }

    /// Change range start; returns whether a cycle was launched
    pub fn set_start(&mut self, start: NaiveDate) -> bool {
        if self.filters.start == start {
            return false;
        }
        self.filters.start = start;
        self.launch();
        true
    }

    /// Change range end; returns whether a cycle was launched
    pub fn set_end(&mut self, end: NaiveDate) -> bool {
        if self.filters.end == end {
            return false;
        }
        self.filters.end = end;
        self.launch();
        true
    }

    /// Change category; returns whether a cycle was launched
    pub fn set_category(&mut self, category: Option<Category>) -> bool {
        if self.filters.category == category {
            return false;
        }
        self.filters.category = category;
        self.launch();
        true
    }

    /// Commit a search term immediately, dropping any pending input
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search.cancel();
        self.filters.search_term = term.into();
    }

    /// Feed raw search input into the debouncer
    pub fn edit_search(&mut self, raw: impl Into<String>) {
        self.search.edit(raw, Instant::now());
    }

    /// Commit the pending search input if its quiet period elapsed
    pub fn poll_search(&mut self) -> bool {
        match self.search.poll(Instant::now()) {
            Some(term) => {
                self.filters.search_term = term;
                true
            }
            None => false,
        }
    }

    /// Wait out the pending search input and commit it
    pub async fn settle_search(&mut self) -> bool {
        match self.search.settle().await {
            Some(term) => {
                self.filters.search_term = term;
                true
            }
            None => false,
        }
    }

    /// Restore default filters
    ///
    /// Launches a cycle only if range or category changed.
    pub fn clear_filters(&mut self) -> bool {
        let before = self.filters.fetch_inputs();
        let defaults = FilterState::defaults(self.config.default_start, self.clock.today());

        self.filters.start = defaults.start;
        self.filters.end = defaults.end;
        self.filters.category = defaults.category;
        self.filters.search_term = defaults.search_term;
        self.search.cancel();

        if self.filters.fetch_inputs() == before {
            return false;
        }
        self.launch();
        true
    }

    /// Drop every cached entry of the namespace and refetch bypassing the
    /// cache
    ///
    /// # Errors
    /// `DashboardError::Store` if the medium fails while clearing
    pub fn clear_cache(&mut self) -> DashboardResult<usize> {
        let removed = self.query.clear_cache()?;
        self.filters.force_refresh = true;
        self.launch();
        Ok(removed)
    }

    /// Await every outstanding cycle, including follow-ups they trigger
    pub async fn settle(&mut self) {
        while !self.pending.is_empty() {
            for cycle in std::mem::take(&mut self.pending) {
                let result = cycle.handle.await;
                self.after_cycle(cycle.request, result);
            }
        }
        self.sync_derived();
    }

    /// Current view-model
    pub fn view(&mut self) -> DashboardView {
        self.reap_finished();
        let state = self.sync_derived();

        DashboardView {
            filters: self.filters.clone(),
            pending_search: self.search.pending().map(str::to_string),
            series: self.derived.series.clone(),
            loading: state.loading,
            error: state.error,
            columns: self.derived.columns.clone(),
            summary: self.derived.summary.clone(),
            filtered_rows: self.derived.filtered_rows.clone(),
        }
    }

    /// CSV of the full current series
    ///
    /// # Errors
    /// `ExportError::NothingToExport` when the series is empty
    pub fn build_export(&mut self) -> Result<CsvExport, ExportError> {
        self.reap_finished();
        self.sync_derived();
        CsvExport::build(&self.filters.range(), &self.derived.columns, &self.derived.series)
    }

    /// Build the CSV and hand it to `sink`
    ///
    /// # Errors
    /// `DashboardError::Export` when the view is empty or delivery fails
    pub fn export_current_view(&mut self, sink: &dyn ExportSink) -> DashboardResult<CsvExport> {
        let export = self.build_export()?;
        sink.deliver(&export)?;
        Ok(export)
    }

    fn launch(&mut self) {
        let request = self.filters.request();
        // activate before spawning so launch order decides which result commits
        let ticket = self.query.activate(request);
        let query = Arc::clone(&self.query);
        let handle = tokio::spawn(async move { query.run(ticket).await });

        self.cycles_launched += 1;
        tracing::debug!(
            range = %request.range,
            category = ?request.category,
            force_refresh = request.force_refresh,
            "query cycle launched"
        );
        self.pending.push(PendingCycle { request, handle });
    }

    fn reap_finished(&mut self) {
        let (done, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|cycle| cycle.handle.is_finished());
        self.pending = running;

        for cycle in done {
            if let Some(result) = cycle.handle.now_or_never() {
                self.after_cycle(cycle.request, result);
            }
        }
    }

    /// A committed forced cycle disarms the flag, which itself counts as a
    /// fetch-input change
    fn after_cycle(&mut self, request: QueryRequest, result: Result<QueryOutcome, JoinError>) {
        match result {
            Ok(outcome) => {
                if request.force_refresh && outcome.is_committed() && self.filters.force_refresh {
                    tracing::debug!(key = %outcome.key, "forced refresh complete, disarming");
                    self.filters.force_refresh = false;
                    self.launch();
                }
            }
            Err(e) => tracing::error!(error = %e, "query cycle task failed"),
        }
    }

    fn sync_derived(&mut self) -> QueryState {
        let state = self.query.state();
        self.derived.sync(&state, &self.filters.search_term);
        state
    }
}
