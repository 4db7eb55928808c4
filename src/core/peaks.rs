//! Raw peak-vector extraction.
//!
//! Splits the full day sequence into an initialization segment (accepted
//! window days only) and a tracking segment (every day from the window
//! boundary onward, regardless of sensor composition).

use crate::core::error::TrackingError;
use crate::core::window::InitializationWindow;
use crate::source::types::{DayRecord, SensorType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw peaks of a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakVector {
    /// Raw position in the fetched sequence
    pub index: usize,
    pub date: DateTime<Utc>,
    pub frequencies: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_shapes: Option<Vec<Vec<f64>>>,
    pub total_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,
    /// Sensor channel order, for re-mapping when the composition changes
    pub sensor_ordering: Vec<String>,
}

/// Initialization and tracking segments of a sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakSegments {
    pub initialization: Vec<PeakVector>,
    pub tracking: Vec<PeakVector>,
    /// Sample rate of the latest record (shape-tracking types only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,
}

impl PeakSegments {
    pub fn sample_rate(&self) -> Option<f64> {
        self.sample_rate
    }

    /// Total number of days across both segments.
    pub fn len(&self) -> usize {
        self.initialization.len() + self.tracking.len()
    }

    pub fn is_empty(&self) -> bool {
        self.initialization.is_empty() && self.tracking.is_empty()
    }
}

/// Extracts per-day peak vectors.
#[derive(Debug, Clone, Copy)]
pub struct PeakVectorExtractor {
    tracks_shapes: bool,
}

impl PeakVectorExtractor {
    pub fn new(tracks_shapes: bool) -> Self {
        Self { tracks_shapes }
    }

    pub fn for_sensor(sensor_type: SensorType) -> Self {
        Self::new(sensor_type.tracks_shapes())
    }

    /// Partition `days` at the window boundary.
    pub fn extract(
        &self,
        days: &[DayRecord],
        window: &InitializationWindow,
    ) -> Result<PeakSegments, TrackingError> {
        let initialization = self.extract_initialization(days, window)?;
        let tracking = self.extract_tracking(days, window.boundary)?;

        let sample_rate = match days.last() {
            Some(last) if self.tracks_shapes => Some(last.sample_rate.ok_or(
                TrackingError::MissingField {
                    field: "fSample",
                    date: last.date,
                },
            )?),
            _ => None,
        };

        tracing::info!(
            "Extracted {} initialization and {} tracking peak vectors",
            initialization.len(),
            tracking.len()
        );

        Ok(PeakSegments {
            initialization,
            tracking,
            sample_rate,
        })
    }

    /// Peak vectors of the accepted window days, in chronological order.
    pub fn extract_initialization(
        &self,
        days: &[DayRecord],
        window: &InitializationWindow,
    ) -> Result<Vec<PeakVector>, TrackingError> {
        window
            .accepted_indices
            .iter()
            .map(|&idx| {
                let day = days.get(idx).ok_or(TrackingError::InsufficientData {
                    required: idx + 1,
                    found: days.len(),
                    available: days.len(),
                })?;
                self.peak_vector(idx, day)
            })
            .collect()
    }

    /// Peak vectors of every day from `boundary` onward.
    pub fn extract_tracking(
        &self,
        days: &[DayRecord],
        boundary: usize,
    ) -> Result<Vec<PeakVector>, TrackingError> {
        if boundary > days.len() {
            return Err(TrackingError::InsufficientData {
                required: boundary,
                found: days.len(),
                available: days.len(),
            });
        }

        days[boundary..]
            .iter()
            .enumerate()
            .map(|(offset, day)| self.peak_vector(boundary + offset, day))
            .collect()
    }

    fn peak_vector(&self, index: usize, day: &DayRecord) -> Result<PeakVector, TrackingError> {
        let mode_shapes = if self.tracks_shapes {
            Some(day.mode_shapes.clone().ok_or(TrackingError::MissingField {
                field: "modalshapeVector",
                date: day.date,
            })?)
        } else {
            None
        };

        let sample_rate = if self.tracks_shapes {
            Some(day.sample_rate.ok_or(TrackingError::MissingField {
                field: "fSample",
                date: day.date,
            })?)
        } else {
            None
        };

        Ok(PeakVector {
            index,
            date: day.date,
            frequencies: day.peak_frequencies.clone(),
            mode_shapes,
            total_time: day.total_time,
            sample_rate,
            sensor_ordering: day.sensor_ordering.clone(),
        })
    }
}
