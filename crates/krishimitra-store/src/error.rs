//! Error types for krishimitra-store.

use std::path::PathBuf;

/// Result type for krishimitra-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or exporting price records.
///
/// Querying a store never fails; these only arise at the file boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to read a seed file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The seed file extension is neither `.csv` nor `.json`.
    #[error("Unsupported seed file format: {0}")]
    UnsupportedFormat(PathBuf),

    /// CSV parse or write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parse error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Two records share an identifier.
    #[error("Duplicate record id: {0}")]
    DuplicateId(u32),

    /// A record failed validation.
    #[error("Invalid record {id}: {reason}")]
    InvalidRecord { id: u32, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
