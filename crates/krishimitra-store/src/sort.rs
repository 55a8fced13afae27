//! Stable single-column ordering of price records.
//!
//! Numeric columns compare numerically, text columns lexicographically.
//! Descending order flips the comparator rather than reversing the output,
//! so records with equal keys keep their input order in both directions.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use krishimitra_types::{ParseError, PriceRecord};

/// A price record column that can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Id,
    Crop,
    Variety,
    Price,
    Unit,
    Market,
    State,
    Trend,
    Change,
    LastUpdated,
}

impl SortField {
    /// Wire name of the column, matching the record's JSON field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Crop => "crop",
            SortField::Variety => "variety",
            SortField::Price => "price",
            SortField::Unit => "unit",
            SortField::Market => "market",
            SortField::State => "state",
            SortField::Trend => "trend",
            SortField::Change => "change",
            SortField::LastUpdated => "lastUpdated",
        }
    }

    /// Whether the column holds numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, SortField::Id | SortField::Price | SortField::Change)
    }

    /// Compare two records on this column in ascending order.
    pub fn compare(&self, a: &PriceRecord, b: &PriceRecord) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Crop => a.crop.cmp(&b.crop),
            SortField::Variety => a.variety.cmp(&b.variety),
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::Unit => a.unit.cmp(&b.unit),
            SortField::Market => a.market.cmp(&b.market),
            SortField::State => a.state.cmp(&b.state),
            SortField::Trend => a.trend.cmp(&b.trend),
            SortField::Change => a.change.total_cmp(&b.change),
            SortField::LastUpdated => a.last_updated.cmp(&b.last_updated),
        }
    }
}

impl FromStr for SortField {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "id" => Ok(SortField::Id),
            "crop" => Ok(SortField::Crop),
            "variety" => Ok(SortField::Variety),
            "price" => Ok(SortField::Price),
            "unit" => Ok(SortField::Unit),
            "market" => Ok(SortField::Market),
            "state" => Ok(SortField::State),
            "trend" => Ok(SortField::Trend),
            "change" => Ok(SortField::Change),
            "lastUpdated" | "last_updated" => Ok(SortField::LastUpdated),
            _ => Err(ParseError::UnknownSortField(s.to_string())),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl FromStr for SortDirection {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Ok(SortDirection::Ascending),
            "descending" | "desc" => Ok(SortDirection::Descending),
            _ => Err(ParseError::UnknownSortDirection(s.to_string())),
        }
    }
}

/// An active sort: one column and a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortKey {
    /// Ascending sort on `field`.
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    /// Descending sort on `field`.
    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }

    /// Compare two records under this key.
    pub fn compare(&self, a: &PriceRecord, b: &PriceRecord) -> Ordering {
        let ordering = self.field.compare(a, b);
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// The sort currently applied to a view, or none for insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    active: Option<SortKey>,
}

impl SortState {
    /// Insertion order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an explicit key.
    pub fn with_key(key: SortKey) -> Self {
        Self { active: Some(key) }
    }

    /// The active key, if any.
    pub fn key(&self) -> Option<SortKey> {
        self.active
    }

    /// Handle a click on a column header.
    ///
    /// Requesting the column that is already sorted ascending flips it to
    /// descending; any other request sorts that column ascending.
    ///
    /// ```
    /// use krishimitra_store::{SortDirection, SortField, SortState};
    ///
    /// let mut sort = SortState::new();
    /// sort.request_sort(SortField::Price);
    /// sort.request_sort(SortField::Price);
    /// assert_eq!(sort.key().unwrap().direction, SortDirection::Descending);
    /// ```
    pub fn request_sort(&mut self, field: SortField) -> SortKey {
        let direction = match self.active {
            Some(key) if key.field == field && key.direction == SortDirection::Ascending => {
                SortDirection::Descending
            }
            _ => SortDirection::Ascending,
        };
        let key = SortKey { field, direction };
        self.active = Some(key);
        key
    }

    /// Drop the active key and go back to insertion order.
    pub fn clear(&mut self) {
        self.active = None;
    }
}

/// Order `records` in place under `key`; with no key the order is untouched.
///
/// The sort is stable: records comparing equal keep their relative order.
pub fn sort_records<T>(records: &mut [T], key: Option<SortKey>)
where
    T: Borrow<PriceRecord>,
{
    if let Some(key) = key {
        records.sort_by(|a, b| {
            key.compare(
                <T as Borrow<PriceRecord>>::borrow(a),
                <T as Borrow<PriceRecord>>::borrow(b),
            )
        });
    }
}
