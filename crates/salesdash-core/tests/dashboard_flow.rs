//! End-to-end dashboard flows against instrumented collaborators

use pretty_assertions::assert_eq;
use salesdash_cache::{CacheStore, QueryCacheController, FETCH_ERROR_MESSAGE};
use salesdash_core::{
    DashboardConfig, DashboardController, DashboardError, ExportError, FileExportSink,
    FilterState, FixedClock, MemoryExportSink,
};
use salesdash_series::Category;
use salesdash_test_utils::{day, CountingMedium, CountingSource};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    dashboard: DashboardController,
    medium: Arc<CountingMedium>,
    source: Arc<CountingSource>,
}

fn harness_with(source: CountingSource) -> Harness {
    let medium = Arc::new(CountingMedium::new());
    let source = Arc::new(source);
    let query = Arc::new(QueryCacheController::new(
        "dashboard",
        CacheStore::new(medium.clone()),
        source.clone(),
    ));
    let dashboard = DashboardController::new(
        DashboardConfig::default(),
        query,
        Arc::new(FixedClock(day(2023, 1, 3))),
    );
    Harness {
        dashboard,
        medium,
        source,
    }
}

fn harness() -> Harness {
    harness_with(CountingSource::new())
}

#[tokio::test]
async fn test_clear_filters_restores_defaults() {
    let mut h = harness();
    h.dashboard.load();
    h.dashboard.set_category(Some(Category::Food));
    h.dashboard.set_end(day(2023, 1, 2));
    h.dashboard.set_search_term("01-02");
    h.dashboard.settle().await;

    assert!(h.dashboard.clear_filters());
    assert_eq!(
        h.dashboard.filters(),
        &FilterState::defaults(day(2023, 1, 1), day(2023, 1, 3))
    );

    h.dashboard.settle().await;
    let view = h.dashboard.view();
    assert_eq!(view.summary.overall_total, 5950);
    assert_eq!(view.record_counts(), (3, 3));

    // already at defaults
    assert!(!h.dashboard.clear_filters());
}

#[tokio::test]
async fn test_clear_filters_with_only_search_does_not_fetch() {
    let mut h = harness();
    h.dashboard.load();
    h.dashboard.settle().await;
    h.dashboard.set_search_term("01-03");

    assert!(!h.dashboard.clear_filters());
    assert_eq!(h.dashboard.filters().search_term, "");
    assert_eq!(h.dashboard.cycles_launched(), 1);
}

#[tokio::test]
async fn test_clear_cache_refetches_and_repopulates() {
    let mut h = harness();
    h.dashboard.load();
    h.dashboard.settle().await;
    assert_eq!(h.source.calls(), 1);
    assert!(h.medium.inner().contains("dashboard_2023-01-01_2023-01-03_all"));

    let removed = h.dashboard.clear_cache().unwrap();
    assert_eq!(removed, 1);
    assert!(h.dashboard.filters().force_refresh);

    h.dashboard.settle().await;

    // forced fetch, then the follow-up once the flag is disarmed
    assert_eq!(h.source.calls(), 3);
    assert_eq!(h.dashboard.cycles_launched(), 3);
    assert!(!h.dashboard.filters().force_refresh);
    assert!(h.medium.inner().contains("dashboard_2023-01-01_2023-01-03_all"));

    let view = h.dashboard.view();
    assert_eq!(view.summary.overall_total, 5950);
    assert!(view.error.is_none());
}

#[tokio::test]
async fn test_failed_forced_refresh_stays_armed() {
    let mut h = harness();
    h.dashboard.load();
    h.dashboard.settle().await;

    h.source.set_failing(true);
    h.dashboard.clear_cache().unwrap();
    h.dashboard.settle().await;

    let view = h.dashboard.view();
    assert_eq!(view.error.as_deref(), Some(FETCH_ERROR_MESSAGE));
    assert!(view.series.is_empty());
    assert!(view.filters.force_refresh);
    assert_eq!(h.dashboard.cycles_launched(), 2);

    h.source.set_failing(false);
    h.dashboard.set_category(Some(Category::Food));
    h.dashboard.settle().await;

    let view = h.dashboard.view();
    assert!(view.error.is_none());
    assert!(!view.filters.force_refresh);
    assert_eq!(view.columns, vec!["Food".to_string()]);
    assert_eq!(h.dashboard.cycles_launched(), 4);
    assert!(h.medium.inner().contains("dashboard_2023-01-01_2023-01-03_Food"));
}

#[tokio::test]
async fn test_search_never_refetches() {
    let mut h = harness();
    h.dashboard.load();
    h.dashboard.settle().await;

    h.dashboard.set_search_term("01-02");
    let view = h.dashboard.view();
    assert_eq!(view.record_counts(), (1, 3));
    assert_eq!(view.filtered_rows.first().map(|p| p.date_string()), Some("2023-01-02".to_string()));

    h.dashboard.set_search_term("");
    assert_eq!(h.dashboard.view().record_counts(), (3, 3));

    assert_eq!(h.source.calls(), 1);
    assert_eq!(h.dashboard.cycles_launched(), 1);
    assert!(!h.dashboard.has_pending_cycles());
}

#[tokio::test(start_paused = true)]
async fn test_search_edits_commit_after_quiet_period() {
    let mut h = harness();
    h.dashboard.load();
    h.dashboard.settle().await;

    h.dashboard.edit_search("01-0");
    tokio::time::advance(Duration::from_millis(200)).await;
    h.dashboard.edit_search("01-03");
    tokio::time::advance(Duration::from_millis(200)).await;

    // second edit restarted the timer
    assert!(!h.dashboard.poll_search());
    let view = h.dashboard.view();
    assert_eq!(view.pending_search.as_deref(), Some("01-03"));
    assert_eq!(view.filters.search_term, "");
    assert_eq!(view.record_counts(), (3, 3));

    tokio::time::advance(Duration::from_millis(100)).await;
    assert!(h.dashboard.poll_search());

    let view = h.dashboard.view();
    assert!(view.pending_search.is_none());
    assert_eq!(view.filters.search_term, "01-03");
    assert_eq!(view.record_counts(), (1, 3));
    assert_eq!(h.source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_settle_search_waits_out_the_timer() {
    let mut h = harness();
    h.dashboard.edit_search("2023");
    assert!(h.dashboard.settle_search().await);
    assert_eq!(h.dashboard.filters().search_term, "2023");
    assert!(!h.dashboard.settle_search().await);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_range_edits_show_only_latest() {
    let mut h = harness_with(CountingSource::with_latency(Duration::from_millis(500)));
    h.dashboard.load();
    h.dashboard.set_end(day(2023, 1, 2));

    let loading = h.dashboard.view();
    assert!(h.dashboard.has_pending_cycles());
    assert!(loading.series.is_empty());

    h.dashboard.settle().await;

    let view = h.dashboard.view();
    assert_eq!(view.series.len(), 2);
    assert_eq!(view.filters.end, day(2023, 1, 2));
    assert!(!view.loading);
    assert_eq!(h.source.calls(), 2);

    // the superseded result was still cached
    assert!(h.medium.inner().contains("dashboard_2023-01-01_2023-01-03_all"));
    assert!(h.medium.inner().contains("dashboard_2023-01-01_2023-01-02_all"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_latest_filters_win_on_multi_thread_runtime() {
    for _ in 0..500 {
        let mut h = harness();
        h.dashboard.set_end(day(2023, 1, 10));
        h.dashboard.set_category(Some(Category::Food));
        h.dashboard.settle().await;

        let view = h.dashboard.view();
        assert_eq!(view.series.len(), 10);
        assert_eq!(view.columns, vec!["Food".to_string()]);
        assert!(!view.loading);
    }
}

#[tokio::test]
async fn test_inverted_range_yields_empty_view() {
    let mut h = harness();
    h.dashboard.load();
    h.dashboard.set_start(day(2023, 1, 5));
    h.dashboard.settle().await;

    let view = h.dashboard.view();
    assert!(view.series.is_empty());
    assert!(view.error.is_none());
    assert!(view.columns.is_empty());
    assert_eq!(view.summary.overall_total, 0);

    let err = h
        .dashboard
        .export_current_view(&MemoryExportSink::new())
        .unwrap_err();
    assert!(matches!(err, DashboardError::Export(ExportError::NothingToExport)));
}

#[tokio::test]
async fn test_export_to_memory_sink() {
    let mut h = harness();
    h.dashboard.load();
    h.dashboard.settle().await;

    let sink = MemoryExportSink::new();
    let export = h.dashboard.export_current_view(&sink).unwrap();

    assert_eq!(export.file_name, "sales_data_2023-01-01_to_2023-01-03.csv");
    assert_eq!(export.row_count(), 3);
    let mut lines = export.content.lines();
    assert_eq!(lines.next(), Some("date,Electronics,Clothing,Food,Books"));
    assert_eq!(lines.next(), Some("2023-01-01,90,200,330,480"));
    assert_eq!(sink.delivered(), vec![export]);
}

#[tokio::test]
async fn test_export_ignores_search_term() {
    let mut h = harness();
    h.dashboard.load();
    h.dashboard.set_search_term("01-02");
    h.dashboard.settle().await;

    let export = h.dashboard.build_export().unwrap();
    assert_eq!(export.row_count(), 3);
}

#[tokio::test]
async fn test_export_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = harness();
    h.dashboard.set_category(Some(Category::Books));
    h.dashboard.settle().await;

    let sink = FileExportSink::new(dir.path());
    let export = h.dashboard.export_current_view(&sink).unwrap();

    let written = std::fs::read_to_string(dir.path().join(&export.file_name)).unwrap();
    assert_eq!(written, export.content);
    assert!(written.starts_with("date,Books\n2023-01-01,480\n"));
}

#[tokio::test]
async fn test_file_store_survives_controller_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = DashboardConfig::default()
        .with_store_path(dir.path().join("cache.json"))
        .with_simulated_latency(Duration::ZERO);

    let mut first = DashboardController::from_config(config.clone()).unwrap();
    first.set_end(day(2023, 1, 3));
    first.settle().await;
    let expected = first.view().series;

    let mut second = DashboardController::from_config(config).unwrap();
    let cached = second
        .query_controller()
        .store()
        .get("dashboard_2023-01-01_2023-01-03_all")
        .unwrap();
    assert!(cached.is_some());

    second.set_end(day(2023, 1, 3));
    second.settle().await;
    assert_eq!(second.view().series, expected);
    assert_eq!(expected.len(), 3);
}
