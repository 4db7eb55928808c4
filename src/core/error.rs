//! Errors produced by the tracking core.

use crate::source::SourceError;
use chrono::{DateTime, Utc};

/// Failures of window selection, aggregation and peak extraction.
///
/// Every failure is returned to the caller; nothing is replaced by a
/// placeholder value.
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    /// The day sequence ran out before the requested range was satisfied.
    #[error("Insufficient data: needed {required} qualifying days, found {found} in {available} records")]
    InsufficientData {
        required: usize,
        found: usize,
        available: usize,
    },

    /// A label's shape vectors differ in length across days.
    #[error("Shape dimension mismatch for label {label} on {date}: expected {expected}, found {found}")]
    ShapeDimensionMismatch {
        label: i32,
        date: DateTime<Utc>,
        expected: usize,
        found: usize,
    },

    /// Required data is missing for a shape-tracking sensor type.
    #[error("Missing {field} on {date}")]
    MissingField {
        field: &'static str,
        date: DateTime<Utc>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Source(#[from] SourceError),
}
