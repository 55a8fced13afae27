//! Error types for parsing values in krishimitra-types.

use thiserror::Error;

/// Errors that can occur when parsing KrishiMitra values from text.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The trend name is not one of `up`, `down`, `stable`.
    #[error("Unknown trend: {0}")]
    UnknownTrend(String),

    /// The language code is not supported.
    #[error("Unsupported language: {0}")]
    UnknownLanguage(String),

    /// The sender is not one of `user`, `bot`.
    #[error("Unknown sender: {0}")]
    UnknownSender(String),

    /// The sort field does not name a price record column.
    #[error("Unknown sort field: {0}")]
    UnknownSortField(String),

    /// The sort direction is not `ascending` or `descending`.
    #[error("Unknown sort direction: {0}")]
    UnknownSortDirection(String),
}

/// Result type alias using krishimitra-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
