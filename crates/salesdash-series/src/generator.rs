//! Deterministic range series generator
//!
//! Stands in for the remote sales API. Output is a pure function of the
//! inputs: the "random" factor is derived from the day of month and the
//! category rank.

use crate::types::{Category, DateRange, Series, SeriesPoint};
use chrono::{Datelike, NaiveDate};

/// Units sold for one category on one day
///
/// `base = (weekday_from_sunday + 1) * 100`, `multiplier = rank + 1`,
/// `factor = 0.8 + ((day_of_month + rank) % 5) * 0.1`. The factor is kept in
/// tenths so the product stays an exact integer.
#[must_use]
pub fn daily_value(date: NaiveDate, category: Category) -> u64 {
    let base = (u64::from(date.weekday().num_days_from_sunday()) + 1) * 100;
    let multiplier = u64::from(category.rank()) + 1;
    let factor_tenths = 8 + u64::from((date.day() + category.rank()) % 5);
    base * multiplier * factor_tenths / 10
}

/// Generate one point per day of `range`
///
/// With no category every category is emitted, in rank order. An inverted
/// range yields an empty series.
#[must_use]
pub fn generate(range: &DateRange, category: Option<Category>) -> Series {
    if range.is_inverted() {
        tracing::warn!(%range, "start date is after end date, returning empty series");
        return Series::empty();
    }

    let selected: &[Category] = match category {
        Some(ref c) => std::slice::from_ref(c),
        None => &Category::ALL,
    };

    let series: Series = range
        .days()
        .map(|date| {
            selected.iter().fold(SeriesPoint::new(date), |point, &cat| {
                point.with_value(cat.name(), daily_value(date, cat))
            })
        })
        .collect();

    tracing::debug!(%range, points = series.len(), "generated series");
    series
}
