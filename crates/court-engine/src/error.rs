//! Error types for court-engine operations.

use chrono::NaiveDate;
use thiserror::Error;

use crate::time::SlotTime;

/// Errors raised while building an availability matrix.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    /// The cell source produced nothing that could be indexed.
    /// Distinct from a valid matrix with zero free cells.
    #[error("No data: cell source yielded no usable cells")]
    NoData,

    #[error("Invalid reliability {reliability} for {resource} on {date}: expected a value in [0, 1]")]
    InvalidReliability {
        resource: String,
        date: NaiveDate,
        reliability: f64,
    },
}

/// Errors raised while parsing an `HH:MM` time of day.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    #[error("Invalid time: '{0}' (expected HH:MM)")]
    Malformed(String),

    #[error("Time out of range: '{0}'")]
    OutOfRange(String),
}

/// Errors surfaced by [`crate::isolation::analyze_isolation`].
///
/// `check_isolation` never returns these; it folds them into an isolating
/// verdict instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IsolationError {
    #[error("Invalid date: '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error(transparent)]
    InvalidTime(#[from] TimeError),

    #[error("Invalid duration: {0} minutes (must be a positive multiple of 30 within one day)")]
    InvalidDuration(u32),

    #[error("Unknown resource: '{0}'")]
    UnknownResource(String),

    /// The matrix never observed the candidate's start cell.
    #[error("No cell observed for {resource} at {date}T{start}")]
    MissingEntry {
        resource: String,
        date: NaiveDate,
        start: SlotTime,
    },
}

/// Configuration errors for slot-pair search parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Invalid target date: '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error(transparent)]
    InvalidTime(#[from] TimeError),
}

/// Convenience alias for matrix construction results.
pub type Result<T> = std::result::Result<T, MatrixError>;
