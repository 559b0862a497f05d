//! Testing utilities for Salesdash workspace
//!
//! Shared test helpers, fixtures, and instrumented collaborators.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::NaiveDate;
use salesdash_cache::{FetchError, MemoryMedium, SalesSource, StorageMedium, StoreResult};
use salesdash_series::{generate, Category, DateRange, Series};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange::new(start, end)
}

/// 2023-01-01..=2023-01-03
pub fn first_three_days() -> DateRange {
    range(day(2023, 1, 1), day(2023, 1, 3))
}

/// Generator-backed source that counts calls and can be switched to fail
#[derive(Debug, Default)]
pub struct CountingSource {
    calls: AtomicUsize,
    failing: AtomicBool,
    latency: Duration,
}

impl CountingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl SalesSource for CountingSource {
    async fn fetch(&self, range: DateRange, category: Option<Category>) -> Result<Series, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Rejected("scripted failure".to_string()));
        }
        Ok(generate(&range, category))
    }
}

/// Memory medium that counts reads
#[derive(Debug, Default)]
pub struct CountingMedium {
    inner: MemoryMedium,
    reads: AtomicUsize,
}

impl CountingMedium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryMedium {
        &self.inner
    }
}

impl StorageMedium for CountingMedium {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.inner.remove_item(key)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        self.inner.keys()
    }
}
