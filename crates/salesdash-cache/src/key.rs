//! Cache key derivation
//!
//! Keys have the form `<namespace>_<start>_<end>_<category-or-"all">`, with
//! ISO dates. Identical (start, end, category) always map to the same key.

use salesdash_series::{Category, DateRange, DATE_FORMAT};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category segment when no category is selected
pub const ALL_CATEGORIES: &str = "all";

/// Deterministic key for one filter combination
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive key for a query
    #[must_use]
    pub fn derive(namespace: &str, range: &DateRange, category: Option<Category>) -> Self {
        Self(format!(
            "{}{}_{}_{}",
            namespace_prefix(namespace),
            range.start.format(DATE_FORMAT),
            range.end.format(DATE_FORMAT),
            category.map_or(ALL_CATEGORIES, Category::name),
        ))
    }

    /// Key as string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key belongs to `namespace`
    #[inline]
    #[must_use]
    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.0.starts_with(&namespace_prefix(namespace))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Prefix shared by every key of a namespace
#[inline]
#[must_use]
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{namespace}_")
}
