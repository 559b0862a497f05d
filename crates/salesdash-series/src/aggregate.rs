//! Derived aggregations over a series
//!
//! Three pure, chained derivations:
//! - `columns_of`: value keys of the first point
//! - `summarize`: per-column and overall totals
//! - `filter_rows`: case-insensitive date search
//!
//! None of them memoize; the caller decides when a dependency changed.

use crate::types::{Series, SummaryStats};

/// Column names present in the first point, in encountered order
#[must_use]
pub fn columns_of(series: &Series) -> Vec<String> {
    series
        .first()
        .map(|point| point.values.keys().cloned().collect())
        .unwrap_or_default()
}

/// Sum every column across all points
///
/// Values missing from a point count as zero.
#[must_use]
pub fn summarize(series: &Series, columns: &[String]) -> SummaryStats {
    let mut stats = SummaryStats {
        per_category: columns.iter().map(|c| (c.clone(), 0)).collect(),
        overall_total: 0,
    };

    for point in series {
        for column in columns {
            let value = point.value(column);
            if let Some(total) = stats.per_category.get_mut(column) {
                *total += value;
            }
            stats.overall_total += value;
        }
    }

    stats
}

/// Points whose date string contains `search_term`, ignoring case
///
/// A blank term returns the same series handle.
#[must_use]
pub fn filter_rows(series: &Series, search_term: &str) -> Series {
    let needle = search_term.trim();
    if needle.is_empty() {
        return series.clone();
    }

    // Matches against the untrimmed term, lowercased
    let needle = search_term.to_lowercase();
    series
        .iter()
        .filter(|point| point.date_string().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
