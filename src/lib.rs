//! SHM Trace Agent - modal trace aggregation for structural health monitoring.
//!
//! Daily clustering output groups detected vibration modes into labelled
//! traces. This library turns an ordered sequence of those day records into
//! per-trace time series and baselines, and splits the raw peak vectors into
//! an initialization period and a tracking period.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        SHM Trace Agent                           │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌──────────────┐   ┌──────────────────┐       │
//! │  │   Source    │──▶│    Window    │──▶│ Label aggregator │       │
//! │  │ (day recs)  │   │  selection   │   │  (means/series)  │       │
//! │  └─────────────┘   └──────────────┘   └──────────────────┘       │
//! │                           │                                      │
//! │                           ▼                                      │
//! │                    ┌──────────────┐   ┌──────────────────┐       │
//! │                    │ Peak vectors │──▶│ Tracking report  │       │
//! │                    │ (init/track) │   │     export       │       │
//! │                    └──────────────┘   └──────────────────┘       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use shm_trace_agent::core::{run_tracking, InitializationDays, TrackingTarget};
//! use shm_trace_agent::source::{Axis, JsonDirSource, SensorType};
//!
//! let source = JsonDirSource::new("/var/lib/shm/export");
//! let target = TrackingTarget {
//!     name: "bridge-x".into(),
//!     structure_id: "6183ec3f5c580e131f45ac37".into(),
//!     group_id: "62e252a3b694b0ac5818c0e5".into(),
//!     sensor_type: SensorType::AccelerometerShape,
//!     axis: Some(Axis::X),
//!     expected_sensor_count: 6,
//!     initialization_days: InitializationDays::Days(14),
//! };
//!
//! let outcome = run_tracking(&source, &target).expect("tracking failed");
//! for (label, mean) in outcome.labels.mean_frequencies() {
//!     println!("trace {label}: {mean:.5} Hz");
//! }
//! ```

pub mod config;
pub mod core;
pub mod runlog;
pub mod source;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use crate::core::{
    run_all, run_tracking, InitializationDays, InitializationWindowSelector, LabelAggregator,
    PeakVectorExtractor, ReportBuilder, TrackingError, TrackingOutcome, TrackingReport,
    TrackingTarget,
};
pub use runlog::{RunLog, RunStats, SharedRunLog};
pub use source::{
    Axis, DayRecord, DayRecordQuery, DayRecordSource, JsonDirSource, MemorySource, SensorType,
    SourceError, TemperatureSource, TracePoint,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
