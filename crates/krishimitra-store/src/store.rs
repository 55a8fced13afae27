//! Main store implementation.

use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use krishimitra_types::{PriceRecord, Trend};

use crate::error::{Error, Result};
use crate::filter::FilterDimension;
use crate::queries::PriceQuery;
use crate::seed::sample_records;
use crate::sort::sort_records;

/// Why a view has no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    /// The store holds no records at all.
    NoData,
    /// Records exist but the filters excluded all of them.
    NoMatches,
}

impl EmptyState {
    /// Text shown in place of the table.
    pub fn message(&self) -> &'static str {
        match self {
            EmptyState::NoData => "No price data available.",
            EmptyState::NoMatches => "No matching price data found. Try adjusting your filters.",
        }
    }
}

/// The result of running a [`PriceQuery`] against a [`RecordStore`].
#[derive(Debug, Clone)]
pub struct PriceView<'a> {
    /// Matching records in display order.
    pub records: Vec<&'a PriceRecord>,
    /// Number of records in the store.
    pub total: usize,
}

impl PriceView<'_> {
    /// Number of records in the view.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Why the view is empty, or `None` when it has rows.
    pub fn empty_state(&self) -> Option<EmptyState> {
        if !self.records.is_empty() {
            None
        } else if self.total == 0 {
            Some(EmptyState::NoData)
        } else {
            Some(EmptyState::NoMatches)
        }
    }
}

/// Distinct values per filter dimension, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub crops: Vec<String>,
    pub states: Vec<String>,
    pub markets: Vec<String>,
    pub trends: Vec<Trend>,
}

impl Facets {
    /// The facet values for one dimension, as text.
    pub fn values(&self, dimension: FilterDimension) -> Vec<&str> {
        match dimension {
            FilterDimension::Crop => self.crops.iter().map(String::as_str).collect(),
            FilterDimension::State => self.states.iter().map(String::as_str).collect(),
            FilterDimension::Market => self.markets.iter().map(String::as_str).collect(),
            FilterDimension::Trend => self.trends.iter().map(Trend::as_str).collect(),
        }
    }
}

/// Read-only in-memory store of mandi price records.
///
/// Records are seeded once and never mutated; every query returns borrowed
/// views in insertion order unless a sort is requested.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<PriceRecord>,
}

impl RecordStore {
    /// A store holding the built-in sample data.
    pub fn sample() -> Self {
        Self {
            records: sample_records(),
        }
    }

    /// Build a store from records, validating them first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] when two records share an id, and
    /// [`Error::InvalidRecord`] for a non-positive price or a blank crop.
    pub fn from_records(records: Vec<PriceRecord>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id) {
                return Err(Error::DuplicateId(record.id));
            }
            validate_record(record)?;
        }
        Ok(Self { records })
    }

    /// Load records from a `.csv` or `.json` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        info!("Loading price records from {}", path.display());
        let file = std::fs::File::open(path).map_err(|e| Error::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let records = match extension.as_deref() {
            Some("csv") => read_csv(file)?,
            Some("json") => serde_json::from_reader(std::io::BufReader::new(file))?,
            _ => return Err(Error::UnsupportedFormat(path.to_path_buf())),
        };

        let store = Self::from_records(records)?;
        info!("Loaded {} price records", store.len());
        Ok(store)
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id.
    pub fn get(&self, id: u32) -> Option<&PriceRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Distinct values of every filter dimension.
    pub fn facets(&self) -> Facets {
        let mut facets = Facets::default();
        for record in &self.records {
            push_unique(&mut facets.crops, &record.crop);
            push_unique(&mut facets.states, &record.state);
            push_unique(&mut facets.markets, &record.market);
            if !facets.trends.contains(&record.trend) {
                facets.trends.push(record.trend);
            }
        }
        facets
    }

    /// Map user-supplied text onto the stored spelling of a value.
    ///
    /// Comparison ignores case and surrounding whitespace. Returns `None` when
    /// no record carries the value.
    pub fn canonical(&self, dimension: FilterDimension, raw: &str) -> Option<String> {
        let wanted = raw.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.records
            .iter()
            .map(|record| dimension.value_of(record))
            .find(|value| value.to_lowercase() == wanted)
            .map(str::to_string)
    }

    /// Filter then sort the records.
    pub fn query(&self, query: &PriceQuery) -> PriceView<'_> {
        let mut records: Vec<&PriceRecord> = self
            .records
            .iter()
            .filter(|record| query.filter.matches(record))
            .collect();
        sort_records(&mut records, query.sort.key());

        debug!(
            "Price query matched {} of {} records",
            records.len(),
            self.records.len()
        );

        PriceView {
            records,
            total: self.records.len(),
        }
    }

    /// Write `records` as CSV with a header row.
    pub fn export_csv<W: Write>(records: &[&PriceRecord], writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        if records.is_empty() {
            csv.write_record(CSV_HEADER)?;
        }
        for record in records {
            csv.serialize(record)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Render `records` as a CSV string.
    pub fn export_csv_string(records: &[&PriceRecord]) -> Result<String> {
        let mut buffer = Vec::new();
        Self::export_csv(records, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}

const CSV_HEADER: [&str; 10] = [
    "id",
    "crop",
    "variety",
    "price",
    "unit",
    "market",
    "state",
    "trend",
    "change",
    "lastUpdated",
];

fn read_csv<R: Read>(reader: R) -> Result<Vec<PriceRecord>> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for row in csv.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

fn validate_record(record: &PriceRecord) -> Result<()> {
    if !(record.price.is_finite() && record.price > 0.0) {
        return Err(Error::InvalidRecord {
            id: record.id,
            reason: format!("price must be positive, got {}", record.price),
        });
    }
    if !record.change.is_finite() {
        return Err(Error::InvalidRecord {
            id: record.id,
            reason: "change must be a finite number".to_string(),
        });
    }
    if record.crop.trim().is_empty() {
        return Err(Error::InvalidRecord {
            id: record.id,
            reason: "crop must not be empty".to_string(),
        });
    }
    Ok(())
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}
