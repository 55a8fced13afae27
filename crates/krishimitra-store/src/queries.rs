//! Query builder for price views.
//!
//! A [`PriceQuery`] bundles the filter and sort state of one view so that the
//! same query can drive a JSON listing and a CSV export.
//!
//! # Example
//!
//! ```
//! use krishimitra_store::{PriceQuery, RecordStore, SortField};
//! use krishimitra_types::Trend;
//!
//! let store = RecordStore::sample();
//! let query = PriceQuery::new()
//!     .crop("Potato")
//!     .trend(Trend::Stable)
//!     .sort_descending(SortField::Price);
//!
//! let view = store.query(&query);
//! let ids: Vec<u32> = view.records.iter().map(|r| r.id).collect();
//! assert_eq!(ids, vec![4, 10]);
//! ```

use krishimitra_types::Trend;

use crate::filter::FilterState;
use crate::sort::{SortField, SortKey, SortState};

/// Filter plus sort for one view of the store.
///
/// Filters narrow the record set; the sort only orders what is left.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PriceQuery {
    /// Search term and selection sets.
    pub filter: FilterState,
    /// Active sort, if any.
    pub sort: SortState,
}

impl PriceQuery {
    /// A query returning every record in insertion order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole filter.
    pub fn filter(mut self, filter: FilterState) -> Self {
        self.filter = filter;
        self
    }

    /// Set the free-text search term.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.filter.search = term.into();
        self
    }

    /// Allow a crop.
    pub fn crop(mut self, crop: impl Into<String>) -> Self {
        self.filter.crops.insert(crop.into());
        self
    }

    /// Allow a state.
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.filter.states.insert(state.into());
        self
    }

    /// Allow a market.
    pub fn market(mut self, market: impl Into<String>) -> Self {
        self.filter.markets.insert(market.into());
        self
    }

    /// Allow a trend.
    pub fn trend(mut self, trend: Trend) -> Self {
        self.filter.trends.insert(trend);
        self
    }

    /// Sort by an explicit key, or clear the sort with `None`.
    pub fn sort(mut self, key: Option<SortKey>) -> Self {
        self.sort = key.map(SortState::with_key).unwrap_or_default();
        self
    }

    /// Sort ascending by `field`.
    pub fn sort_ascending(self, field: SortField) -> Self {
        self.sort(Some(SortKey::ascending(field)))
    }

    /// Sort descending by `field`.
    pub fn sort_descending(self, field: SortField) -> Self {
        self.sort(Some(SortKey::descending(field)))
    }

    /// Clear the search term and all selections. The sort is kept.
    pub fn clear_filters(&mut self) {
        self.filter.clear();
    }

    /// Clear filters and sort.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
