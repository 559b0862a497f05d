//! Sales data collaborator
//!
//! The query controller only sees `SalesSource`; any rejection is a fetch
//! error. `MockSalesSource` wraps the deterministic generator behind a
//! simulated network delay.

use crate::error::FetchError;
use async_trait::async_trait;
use salesdash_series::{generate, Category, DateRange, Series};
use std::time::Duration;

/// Asynchronous provider of sales series
#[async_trait]
pub trait SalesSource: Send + Sync {
    /// Fetch the series for a range and optional category
    ///
    /// # Errors
    /// `FetchError` when the collaborator rejects the request
    async fn fetch(&self, range: DateRange, category: Option<Category>) -> Result<Series, FetchError>;
}

/// Generator-backed source with fixed latency
#[derive(Debug, Clone, Copy)]
pub struct MockSalesSource {
    latency: Duration,
}

impl MockSalesSource {
    /// Create source with latency
    #[inline]
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Source that answers without delay
    #[inline]
    #[must_use]
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Configured latency
    #[inline]
    #[must_use]
    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for MockSalesSource {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

#[async_trait]
impl SalesSource for MockSalesSource {
    async fn fetch(&self, range: DateRange, category: Option<Category>) -> Result<Series, FetchError> {
        tracing::debug!(
            start = %range.start,
            end = %range.end,
            category = category.map_or("All", Category::name),
            "mock source fetching"
        );

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let series = generate(&range, category);
        tracing::debug!(points = series.len(), "mock source returning");
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 7).unwrap(),
        )
    }

    #[tokio::test]
    async fn instant_source_matches_generator() {
        let series = MockSalesSource::instant().fetch(range(), None).await.unwrap();
        assert_eq!(series, generate(&range(), None));
    }

    #[tokio::test(start_paused = true)]
    async fn default_source_waits_one_second() {
        let source = MockSalesSource::default();
        let started = tokio::time::Instant::now();

        let series = source.fetch(range(), Some(Category::Clothing)).await.unwrap();

        assert_eq!(series.len(), 7);
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }
}
