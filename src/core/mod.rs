//! Core functionality for the trace agent.
//!
//! This module contains:
//! - Initialization window selection over day records
//! - Per-label aggregation of trace points
//! - Raw peak-vector extraction split at the window boundary
//! - Daily temperature summaries
//! - Tracking runs and report building

pub mod aggregate;
pub mod error;
pub mod peaks;
pub mod pipeline;
pub mod report;
pub mod temperature;
pub mod window;

// Re-export commonly used types
pub use aggregate::{
    AggregatedLabelSeries, DatedValue, LabelAggregation, LabelAggregator, OutlierPoint,
};
pub use error::TrackingError;
pub use peaks::{PeakSegments, PeakVector, PeakVectorExtractor};
pub use pipeline::{
    aggregate_full_series, process_days, run_all, run_tracking, TargetResult, TrackingOutcome,
    TrackingTarget,
};
pub use report::{ExportFormat, ReportBuilder, TrackingReport, PRODUCER_NAME, REPORT_VERSION};
pub use temperature::{summarize_daily, DailyTemperature};
pub use window::{InitializationDays, InitializationWindow, InitializationWindowSelector};
