//! Core types for sales series
//!
//! Defines:
//! - The closed category set and its fixed ranks
//! - Inclusive calendar date ranges
//! - Per-day series points and the immutable series container
//! - Summary totals derived from a series

use crate::error::SeriesError;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Date format used for keys, file names and the search match
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date
///
/// # Errors
/// `SeriesError::InvalidDate` if the input is not a valid calendar date
pub fn parse_date(input: &str) -> Result<NaiveDate, SeriesError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|e| SeriesError::invalid_date(input, e))
}

/// Product category (fixed, closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Rank 0
    Electronics,
    /// Rank 1
    Clothing,
    /// Rank 2
    Food,
    /// Rank 3
    Books,
}

impl Category {
    /// All categories in rank order
    pub const ALL: [Category; 4] = [
        Category::Electronics,
        Category::Clothing,
        Category::Food,
        Category::Books,
    ];

    /// Fixed rank of the category
    #[inline]
    #[must_use]
    pub fn rank(self) -> u32 {
        match self {
            Category::Electronics => 0,
            Category::Clothing => 1,
            Category::Food => 2,
            Category::Books => 3,
        }
    }

    /// Column name used in series points
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Clothing => "Clothing",
            Category::Food => "Food",
            Category::Books => "Books",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SeriesError::UnknownCategory(s.to_string()))
    }
}

/// Inclusive calendar date range
///
/// `start > end` is a valid value; it denotes an empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First day (inclusive)
    pub start: NaiveDate,
    /// Last day (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Create new range
    #[inline]
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Start is strictly after end
    #[inline]
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    /// Number of days covered, both endpoints included
    #[must_use]
    pub fn day_count(&self) -> usize {
        if self.is_inverted() {
            return 0;
        }
        let span = (self.end - self.start).num_days();
        usize::try_from(span).map_or(0, |d| d + 1)
    }

    /// Iterate every day in ascending order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.day_count())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One day of sales
///
/// Serializes flat, e.g. `{"date":"2023-01-01","Electronics":90}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Day
    pub date: NaiveDate,
    /// Category name → units, in insertion order
    #[serde(flatten)]
    pub values: IndexMap<String, u64>,
}

impl SeriesPoint {
    /// Create point with no values
    #[inline]
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: IndexMap::new(),
        }
    }

    /// With a value for a column
    #[must_use]
    pub fn with_value(mut self, column: impl Into<String>, value: u64) -> Self {
        self.values.insert(column.into(), value);
        self
    }

    /// Value for a column, zero when absent
    #[inline]
    #[must_use]
    pub fn value(&self, column: &str) -> u64 {
        self.values.get(column).copied().unwrap_or(0)
    }

    /// ISO date string (`YYYY-MM-DD`)
    #[inline]
    #[must_use]
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Ordered, immutable sequence of series points
///
/// Cloning shares the underlying points; a series is replaced wholesale,
/// never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series(Arc<[SeriesPoint]>);

impl Series {
    /// Create series from points
    #[inline]
    #[must_use]
    pub fn new(points: Vec<SeriesPoint>) -> Self {
        Self(Arc::from(points))
    }

    /// Empty series
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Number of points
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No points
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Points as a slice
    #[inline]
    #[must_use]
    pub fn points(&self) -> &[SeriesPoint] {
        &self.0
    }

    /// First point, if any
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&SeriesPoint> {
        self.0.first()
    }

    /// Iterate points in date order
    pub fn iter(&self) -> std::slice::Iter<'_, SeriesPoint> {
        self.0.iter()
    }

    /// Both handles share the same allocation
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Series {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<SeriesPoint>> for Series {
    fn from(points: Vec<SeriesPoint>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<SeriesPoint> for Series {
    fn from_iter<I: IntoIterator<Item = SeriesPoint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a SeriesPoint;
    type IntoIter = std::slice::Iter<'a, SeriesPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Totals derived from a series
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Column → summed units, in column order
    pub per_category: IndexMap<String, u64>,
    /// Sum over every column and point
    pub overall_total: u64,
}

impl SummaryStats {
    /// Total for a column, zero when absent
    #[inline]
    #[must_use]
    pub fn total_for(&self, column: &str) -> u64 {
        self.per_category.get(column).copied().unwrap_or(0)
    }
}
