//! Dashboard filter state

use chrono::NaiveDate;
use salesdash_cache::QueryRequest;
use salesdash_series::{Category, DateRange};
use serde::{Deserialize, Serialize};

/// User-editable filters plus the one-shot refresh flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Range start
    pub start: NaiveDate,
    /// Range end
    pub end: NaiveDate,
    /// Selected category, `None` for all
    pub category: Option<Category>,
    /// Committed search term
    pub search_term: String,
    /// Next query cycle bypasses the cache
    pub force_refresh: bool,
}

impl FilterState {
    /// Fixed defaults: `default_start` through `today`, all categories, no search
    #[must_use]
    pub fn defaults(default_start: NaiveDate, today: NaiveDate) -> Self {
        Self {
            start: default_start,
            end: today,
            category: None,
            search_term: String::new(),
            force_refresh: false,
        }
    }

    /// Selected date range
    #[inline]
    #[must_use]
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start, self.end)
    }

    /// Query these filters resolve to
    #[inline]
    #[must_use]
    pub fn request(&self) -> QueryRequest {
        QueryRequest::new(self.range(), self.category).with_force_refresh(self.force_refresh)
    }

    /// Inputs that drive a re-fetch; the search term is not one of them
    #[inline]
    #[must_use]
    pub fn fetch_inputs(&self) -> (NaiveDate, NaiveDate, Option<Category>, bool) {
        (self.start, self.end, self.category, self.force_refresh)
    }
}
