//! Per-label aggregation of trace points.
//!
//! Groups the labelled points of a day window into per-trace time series
//! and computes each trace's mean frequency and, for shape-tracking sensor
//! types, its elementwise mean mode shape. Outlier points are kept apart
//! and never enter a mean.

use crate::core::error::TrackingError;
use crate::source::types::{DayRecord, SensorType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// A value observed on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedValue<T> {
    pub date: DateTime<Utc>,
    pub value: T,
}

impl<T> DatedValue<T> {
    pub fn new(date: DateTime<Utc>, value: T) -> Self {
        Self { date, value }
    }
}

/// Time series and summary statistics for one trace label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedLabelSeries {
    pub label: i32,
    /// Frequencies in chronological order
    pub frequencies: Vec<DatedValue<f64>>,
    /// Mode shapes in chronological order (shape-tracking types only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shapes: Option<Vec<DatedValue<Vec<f64>>>>,
    pub mean_frequency: f64,
    /// Population standard deviation of the frequencies
    pub frequency_std_dev: f64,
    /// Elementwise mean of the shapes (shape-tracking types only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_shape: Option<Vec<f64>>,
}

impl AggregatedLabelSeries {
    /// Number of points in the series.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Days on which the label appears.
    pub fn dates(&self) -> Vec<DateTime<Utc>> {
        self.frequencies.iter().map(|p| p.date).collect()
    }
}

/// An unclustered point, kept for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierPoint {
    pub date: DateTime<Utc>,
    pub frequency: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<f64>>,
}

/// Result of aggregating a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelAggregation {
    /// Trace series keyed by label, ascending
    pub series: BTreeMap<i32, AggregatedLabelSeries>,
    /// Outlier points in chronological order
    pub outliers: Vec<OutlierPoint>,
    /// Whether mode shapes were aggregated
    #[serde(default)]
    pub tracks_shapes: bool,
}

impl LabelAggregation {
    pub fn get(&self, label: i32) -> Option<&AggregatedLabelSeries> {
        self.series.get(&label)
    }

    /// Trace labels in ascending order.
    pub fn labels(&self) -> Vec<i32> {
        self.series.keys().copied().collect()
    }

    /// `(label, mean frequency)` pairs in ascending label order.
    pub fn mean_frequencies(&self) -> Vec<(i32, f64)> {
        self.series
            .values()
            .map(|s| (s.label, s.mean_frequency))
            .collect()
    }

    /// `(label, mean shape)` pairs; `None` when shapes are not tracked.
    pub fn mean_shapes(&self) -> Option<Vec<(i32, Vec<f64>)>> {
        if !self.tracks_shapes {
            return None;
        }
        self.series
            .values()
            .map(|s| s.mean_shape.clone().map(|shape| (s.label, shape)))
            .collect()
    }

    pub fn outlier_count(&self) -> usize {
        self.outliers.len()
    }
}

#[derive(Default)]
struct LabelAccumulator {
    frequencies: Vec<DatedValue<f64>>,
    shapes: Vec<DatedValue<Vec<f64>>>,
}

/// Groups trace points by label.
#[derive(Debug, Clone, Copy)]
pub struct LabelAggregator {
    tracks_shapes: bool,
}

impl LabelAggregator {
    pub fn new(tracks_shapes: bool) -> Self {
        Self { tracks_shapes }
    }

    pub fn for_sensor(sensor_type: SensorType) -> Self {
        Self::new(sensor_type.tracks_shapes())
    }

    pub fn tracks_shapes(&self) -> bool {
        self.tracks_shapes
    }

    /// Aggregate a chronologically ordered window of days.
    ///
    /// Fails on the first label whose shapes change dimensionality; no
    /// partial result is returned.
    pub fn aggregate(&self, days: &[DayRecord]) -> Result<LabelAggregation, TrackingError> {
        let mut accumulators: BTreeMap<i32, LabelAccumulator> = BTreeMap::new();
        let mut outliers = Vec::new();

        for day in days {
            for point in &day.traces {
                if point.is_outlier() {
                    outliers.push(OutlierPoint {
                        date: day.date,
                        frequency: point.frequency,
                        shape: if self.tracks_shapes {
                            point.shape.clone()
                        } else {
                            None
                        },
                    });
                    continue;
                }

                let acc = accumulators.entry(point.label).or_default();
                acc.frequencies
                    .push(DatedValue::new(day.date, point.frequency));

                if self.tracks_shapes {
                    let shape = point.shape.as_ref().ok_or(TrackingError::MissingField {
                        field: "shape_value",
                        date: day.date,
                    })?;

                    if let Some(first) = acc.shapes.first() {
                        if first.value.len() != shape.len() {
                            return Err(TrackingError::ShapeDimensionMismatch {
                                label: point.label,
                                date: day.date,
                                expected: first.value.len(),
                                found: shape.len(),
                            });
                        }
                    }
                    acc.shapes.push(DatedValue::new(day.date, shape.clone()));
                }
            }
        }

        let series: BTreeMap<i32, AggregatedLabelSeries> = accumulators
            .into_iter()
            .map(|(label, acc)| (label, self.finish(label, acc)))
            .collect();

        tracing::info!(
            "Aggregated {} traces and {} outlier points over {} days",
            series.len(),
            outliers.len(),
            days.len()
        );

        Ok(LabelAggregation {
            series,
            outliers,
            tracks_shapes: self.tracks_shapes,
        })
    }

    fn finish(&self, label: i32, acc: LabelAccumulator) -> AggregatedLabelSeries {
        let values: Vec<f64> = acc.frequencies.iter().map(|p| p.value).collect();
        let mean_frequency = values.iter().mean();
        let frequency_std_dev = values.iter().population_std_dev();

        let (shapes, mean_shape) = if self.tracks_shapes {
            let mean_shape = elementwise_mean(&acc.shapes);
            (Some(acc.shapes), Some(mean_shape))
        } else {
            (None, None)
        };

        AggregatedLabelSeries {
            label,
            frequencies: acc.frequencies,
            shapes,
            mean_frequency,
            frequency_std_dev,
            mean_shape,
        }
    }
}

/// Mean of each vector position across all shapes (all of equal length).
fn elementwise_mean(shapes: &[DatedValue<Vec<f64>>]) -> Vec<f64> {
    let dim = shapes.first().map(|s| s.value.len()).unwrap_or(0);
    (0..dim)
        .map(|m| shapes.iter().map(|s| s.value[m]).mean())
        .collect()
}
