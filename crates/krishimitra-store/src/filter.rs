//! Free-text search and multi-select filtering over price records.
//!
//! A [`FilterState`] holds one selection set per [`FilterDimension`] and a
//! search term. An empty selection set places no restriction on its
//! dimension; values inside one set are alternatives (OR) and the dimensions
//! combine with AND. The search term matches case-insensitively as a
//! substring of the crop, variety, market or state.
//!
//! # Example
//!
//! ```
//! use krishimitra_store::{FilterState, filter_records, sample_records};
//! use krishimitra_types::Trend;
//!
//! let records = sample_records();
//! let filter = FilterState::new()
//!     .with_search("kufri")
//!     .with_trend(Trend::Stable);
//!
//! let matched = filter_records(&records, &filter);
//! assert_eq!(matched.len(), 2);
//! ```

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use krishimitra_types::{ParseError, PriceRecord, Trend};

/// A column that can be restricted by a selection set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterDimension {
    /// The crop name.
    Crop,
    /// The state of the market.
    State,
    /// The market name.
    Market,
    /// The price trend.
    Trend,
}

impl FilterDimension {
    /// Lowercase name of the dimension.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterDimension::Crop => "crop",
            FilterDimension::State => "state",
            FilterDimension::Market => "market",
            FilterDimension::Trend => "trend",
        }
    }

    /// The text value of this dimension on a record.
    pub fn value_of<'a>(&self, record: &'a PriceRecord) -> &'a str {
        match self {
            FilterDimension::Crop => &record.crop,
            FilterDimension::State => &record.state,
            FilterDimension::Market => &record.market,
            FilterDimension::Trend => record.trend.as_str(),
        }
    }
}

impl fmt::Display for FilterDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search term plus one selection set per dimension.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    /// Free-text search term. Empty means no search.
    pub search: String,
    /// Allowed crop names.
    pub crops: BTreeSet<String>,
    /// Allowed state names.
    pub states: BTreeSet<String>,
    /// Allowed market names.
    pub markets: BTreeSet<String>,
    /// Allowed trends.
    pub trends: BTreeSet<Trend>,
}

impl FilterState {
    /// A filter that lets every record through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search term.
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    /// Add a crop to the crop selection.
    pub fn with_crop(mut self, crop: impl Into<String>) -> Self {
        self.crops.insert(crop.into());
        self
    }

    /// Add a state to the state selection.
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.states.insert(state.into());
        self
    }

    /// Add a market to the market selection.
    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.markets.insert(market.into());
        self
    }

    /// Add a trend to the trend selection.
    pub fn with_trend(mut self, trend: Trend) -> Self {
        self.trends.insert(trend);
        self
    }

    /// Add `value` to the selection for `dimension` if absent, remove it if present.
    ///
    /// Returns whether the value is selected afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownTrend`] when toggling the trend dimension
    /// with a value that is not a trend name.
    pub fn toggle(&mut self, dimension: FilterDimension, value: &str) -> Result<bool, ParseError> {
        let selected = match dimension {
            FilterDimension::Crop => toggle_in(&mut self.crops, value.to_string()),
            FilterDimension::State => toggle_in(&mut self.states, value.to_string()),
            FilterDimension::Market => toggle_in(&mut self.markets, value.to_string()),
            FilterDimension::Trend => toggle_in(&mut self.trends, Trend::from_str(value)?),
        };
        Ok(selected)
    }

    /// Clear every selection and the search term.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether this filter lets every record through.
    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.crops.is_empty()
            && self.states.is_empty()
            && self.markets.is_empty()
            && self.trends.is_empty()
    }

    /// Whether a single record passes the search term and every selection.
    pub fn matches(&self, record: &PriceRecord) -> bool {
        self.matches_search(record)
            && allows(&self.crops, &record.crop)
            && allows(&self.states, &record.state)
            && allows(&self.markets, &record.market)
            && (self.trends.is_empty() || self.trends.contains(&record.trend))
    }

    fn matches_search(&self, record: &PriceRecord) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let term = self.search.to_lowercase();
        [
            &record.crop,
            &record.variety,
            &record.market,
            &record.state,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
    }
}

fn toggle_in<T: Ord>(set: &mut BTreeSet<T>, value: T) -> bool {
    if set.remove(&value) {
        false
    } else {
        set.insert(value);
        true
    }
}

fn allows(selection: &BTreeSet<String>, value: &str) -> bool {
    selection.is_empty() || selection.contains(value)
}

/// Keep the records that pass `filter`, preserving their relative order.
///
/// Works on owned records or on references, so an already-filtered view can
/// be filtered again without cloning.
pub fn filter_records<T>(records: &[T], filter: &FilterState) -> Vec<T>
where
    T: Borrow<PriceRecord> + Clone,
{
    records
        .iter()
        .filter(|record| filter.matches(<T as Borrow<PriceRecord>>::borrow(record)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::sample_records;
    use proptest::prelude::*;

    fn ids(records: &[&PriceRecord]) -> Vec<u32> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_empty_filter_returns_everything_in_order() {
        let records = sample_records();
        let refs: Vec<&PriceRecord> = records.iter().collect();
        let matched = filter_records(&refs, &FilterState::new());
        assert_eq!(ids(&matched), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let records = sample_records();
        let refs: Vec<&PriceRecord> = records.iter().collect();

        // crop
        let matched = filter_records(&refs, &FilterState::new().with_search("TOMATO"));
        assert_eq!(ids(&matched), vec![1, 2, 9]);

        // variety
        let matched = filter_records(&refs, &FilterState::new().with_search("basmati"));
        assert_eq!(ids(&matched), vec![7]);

        // market
        let matched = filter_records(&refs, &FilterState::new().with_search("karnal"));
        assert_eq!(ids(&matched), vec![6, 7]);

        // state
        let matched = filter_records(&refs, &FilterState::new().with_search("pradesh"));
        assert_eq!(ids(&matched), vec![3, 5]);
    }

    #[test]
    fn test_search_does_not_look_at_unit_or_trend() {
        let records = sample_records();
        let refs: Vec<&PriceRecord> = records.iter().collect();

        assert!(filter_records(&refs, &FilterState::new().with_search("quintal")).is_empty());
        assert!(filter_records(&refs, &FilterState::new().with_search("stable")).is_empty());
    }

    #[test]
    fn test_unmatched_search_yields_empty() {
        let records = sample_records();
        let matched = filter_records(&records, &FilterState::new().with_search("saffron"));
        assert!(matched.is_empty());
    }

    #[test]
    fn test_selection_is_or_within_and_across_dimensions() {
        let records = sample_records();
        let refs: Vec<&PriceRecord> = records.iter().collect();

        let filter = FilterState::new().with_crop("Tomato").with_crop("Wheat");
        assert_eq!(ids(&filter_records(&refs, &filter)), vec![1, 2, 5, 6, 9]);

        let filter = filter.with_trend(Trend::Down);
        assert_eq!(ids(&filter_records(&refs, &filter)), vec![9]);

        let filter = FilterState::new()
            .with_state("Haryana")
            .with_market("Karnal")
            .with_search("rice");
        assert_eq!(ids(&filter_records(&refs, &filter)), vec![7]);
    }

    #[test]
    fn test_selection_membership_is_exact() {
        let records = sample_records();
        let matched = filter_records(&records, &FilterState::new().with_crop("tomato"));
        assert!(matched.is_empty());
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut filter = FilterState::new();

        assert!(filter.toggle(FilterDimension::Crop, "Onion").unwrap());
        assert!(filter.crops.contains("Onion"));

        assert!(!filter.toggle(FilterDimension::Crop, "Onion").unwrap());
        assert!(filter.crops.is_empty());
        assert!(filter.is_empty());
    }

    #[test]
    fn test_toggle_trend_parses_value() {
        let mut filter = FilterState::new();
        assert!(filter.toggle(FilterDimension::Trend, "down").unwrap());
        assert!(filter.trends.contains(&Trend::Down));
        assert!(filter.toggle(FilterDimension::Trend, "flat").is_err());
    }

    #[test]
    fn test_clear_resets_search_and_selections() {
        let mut filter = FilterState::new()
            .with_search("wheat")
            .with_state("Punjab")
            .with_trend(Trend::Up);
        assert!(!filter.is_empty());

        filter.clear();
        assert!(filter.is_empty());
        assert_eq!(filter, FilterState::default());
    }

    #[test]
    fn test_dimension_value_of() {
        let record = &sample_records()[7];
        assert_eq!(FilterDimension::Crop.value_of(record), "Onion");
        assert_eq!(FilterDimension::Market.value_of(record), "Lasalgaon");
        assert_eq!(FilterDimension::Trend.value_of(record), "down");
    }

    fn arb_filter() -> impl Strategy<Value = FilterState> {
        let crops = prop::sample::subsequence(vec!["Tomato", "Potato", "Wheat", "Rice", "Onion"], 0..3);
        let trends = prop::sample::subsequence(Trend::ALL.to_vec(), 0..2);
        let search = prop::sample::select(vec!["", "a", "kar", "POT", "zz", "Local"]);
        (crops, trends, search).prop_map(|(crops, trends, search)| {
            let mut filter = FilterState::new().with_search(search);
            for crop in crops {
                filter = filter.with_crop(crop);
            }
            for trend in trends {
                filter = filter.with_trend(trend);
            }
            filter
        })
    }

    proptest! {
        #[test]
        fn prop_search_result_is_exactly_the_matching_records(term in "[a-zA-Z ]{1,4}") {
            let records = sample_records();
            let refs: Vec<&PriceRecord> = records.iter().collect();
            let filter = FilterState::new().with_search(term.clone());
            let matched = filter_records(&refs, &filter);
            let needle = term.to_lowercase();

            let hit = |r: &PriceRecord| {
                [&r.crop, &r.variety, &r.market, &r.state]
                    .iter()
                    .any(|f| f.to_lowercase().contains(&needle))
            };

            for record in &records {
                let included = matched.iter().any(|m| m.id == record.id);
                prop_assert_eq!(included, hit(record));
            }
        }

        #[test]
        fn prop_filter_is_idempotent(filter in arb_filter()) {
            let records = sample_records();
            let refs: Vec<&PriceRecord> = records.iter().collect();
            let once = filter_records(&refs, &filter);
            let twice = filter_records(&once, &filter);
            prop_assert_eq!(ids(&once), ids(&twice));
        }

        #[test]
        fn prop_filter_preserves_relative_order(filter in arb_filter()) {
            let records = sample_records();
            let matched = filter_records(&records, &filter);
            let got: Vec<u32> = matched.iter().map(|r| r.id).collect();
            let mut sorted = got.clone();
            sorted.sort_unstable();
            prop_assert_eq!(got, sorted);
        }
    }
}
