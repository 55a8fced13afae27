//! In-memory mandi price store.
//!
//! This crate holds the price table served by KrishiMitra and the pure engines
//! that shape it for display: free-text search, multi-select filtering and a
//! stable single-column sort.
//!
//! # Features
//!
//! - Built-in sample data, or records loaded from CSV/JSON
//! - Case-insensitive search across crop, variety, market and state
//! - Selection sets per dimension (OR within, AND across)
//! - Stable ascending/descending sort with header-click toggling
//! - Facet listing and CSV export of any view
//!
//! # Example
//!
//! ```
//! use krishimitra_store::{PriceQuery, RecordStore, SortField};
//!
//! let store = RecordStore::sample();
//! let query = PriceQuery::new()
//!     .search("tomato")
//!     .sort_ascending(SortField::Price);
//!
//! let view = store.query(&query);
//! assert_eq!(view.count(), 3);
//! assert_eq!(view.records[0].market, "Kolkata");
//! ```

mod error;
mod filter;
mod queries;
mod seed;
mod sort;
mod store;

pub use error::{Error, Result};
pub use filter::{FilterDimension, FilterState, filter_records};
pub use queries::PriceQuery;
pub use seed::{SEED_DATE, sample_records};
pub use sort::{SortDirection, SortField, SortKey, SortState, sort_records};
pub use store::{EmptyState, Facets, PriceView, RecordStore};
