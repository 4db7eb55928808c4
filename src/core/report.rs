//! Serializable tracking reports.
//!
//! A report bundles a tracking outcome with producer metadata so downstream
//! analysis and plotting tools can consume it without access to the store.

use crate::core::aggregate::{AggregatedLabelSeries, DatedValue, OutlierPoint};
use crate::core::peaks::PeakVector;
use crate::core::pipeline::{TrackingOutcome, TrackingTarget};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The current report format version.
pub const REPORT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "shm-trace-agent";

/// Producer metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    /// Unique instance identifier (UUID)
    pub instance_id: String,
}

/// Initialization window summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSummary {
    /// Requested number of qualifying days (0 when disabled)
    pub target_len: usize,
    /// Raw index where tracking begins
    pub boundary: usize,
    pub accepted_dates: Vec<DateTime<Utc>>,
    /// Days skipped for sensor-count mismatch before the boundary
    pub skipped_dates: Vec<DateTime<Utc>>,
}

/// One trace in a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSummary {
    pub label: i32,
    pub points: usize,
    pub mean_frequency: f64,
    pub frequency_std_dev: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_shape: Option<Vec<f64>>,
    pub frequencies: Vec<DatedValue<f64>>,
}

impl From<&AggregatedLabelSeries> for TraceSummary {
    fn from(series: &AggregatedLabelSeries) -> Self {
        Self {
            label: series.label,
            points: series.len(),
            mean_frequency: series.mean_frequency,
            frequency_std_dev: series.frequency_std_dev,
            mean_shape: series.mean_shape.clone(),
            frequencies: series.frequencies.clone(),
        }
    }
}

/// Complete report for one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingReport {
    pub report_version: String,
    pub computed_at_utc: String,
    pub producer: ReportProducer,
    pub target: TrackingTarget,
    pub day_count: usize,
    pub window: WindowSummary,
    pub traces: Vec<TraceSummary>,
    pub outliers: Vec<OutlierPoint>,
    pub initialization: Vec<PeakVector>,
    pub tracking: Vec<PeakVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,
}

/// Builds reports stamped with this process's instance ID.
pub struct ReportBuilder {
    instance_id: Uuid,
}

impl ReportBuilder {
    /// Create a new builder with a unique instance ID.
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4(),
        }
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Build a report from a tracking outcome.
    pub fn build(&self, outcome: &TrackingOutcome) -> TrackingReport {
        let window = &outcome.window;

        TrackingReport {
            report_version: REPORT_VERSION.to_string(),
            computed_at_utc: Utc::now().to_rfc3339(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: crate::VERSION.to_string(),
                instance_id: self.instance_id.to_string(),
            },
            target: outcome.target.clone(),
            day_count: outcome.day_count,
            window: WindowSummary {
                target_len: window.target_len,
                boundary: window.boundary,
                accepted_dates: window.accepted_dates(),
                skipped_dates: window.skipped_dates.clone(),
            },
            traces: outcome.labels.series.values().map(TraceSummary::from).collect(),
            outliers: outcome.labels.outliers.clone(),
            initialization: outcome.peaks.initialization.clone(),
            tracking: outcome.peaks.tracking.clone(),
            sample_rate: outcome.peaks.sample_rate(),
        }
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Output encoding for exported reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Pretty-printed JSON array
    #[default]
    Json,
    /// One compact JSON document per line
    JsonLines,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::JsonLines => "jsonl",
        }
    }

    /// Encode reports in this format.
    pub fn render(&self, reports: &[TrackingReport]) -> Result<String, serde_json::Error> {
        match self {
            ExportFormat::Json => serde_json::to_string_pretty(reports),
            ExportFormat::JsonLines => {
                let lines = reports
                    .iter()
                    .map(serde_json::to_string)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(lines.join("\n"))
            }
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "jsonl" => Ok(ExportFormat::JsonLines),
            other => Err(format!("unknown export format '{other}' (expected json or jsonl)")),
        }
    }
}
