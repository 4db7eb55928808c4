//! Day-record retrieval boundary.
//!
//! The core never talks to a store directly. Callers hand it an explicit
//! source handle implementing [`DayRecordSource`]; two implementations ship
//! with the crate:
//! - [`MemorySource`] for pre-materialized records (tests, embedding)
//! - [`JsonDirSource`] for exported clustering collections on disk

pub mod json;
pub mod memory;
pub mod types;

use std::path::PathBuf;

// Re-export commonly used types
pub use json::JsonDirSource;
pub use memory::MemorySource;
pub use types::{
    Axis, DayRecord, DayRecordQuery, SensorType, TemperatureReading, TracePoint, OUTLIER_LABEL,
};

/// Errors raised while retrieving records.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error in {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Supplies day records for one structure/group/sensor-type/axis.
///
/// Implementations must return records sorted ascending by date; the core
/// does not re-sort.
pub trait DayRecordSource {
    fn fetch_day_records(&self, query: &DayRecordQuery) -> Result<Vec<DayRecord>, SourceError>;
}

/// Supplies raw temperature samples for a structure.
pub trait TemperatureSource {
    fn fetch_temperatures(&self, structure_id: &str)
        -> Result<Vec<TemperatureReading>, SourceError>;
}
