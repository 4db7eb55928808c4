//! Day-record types exchanged across the retrieval boundary.
//!
//! A `DayRecord` is one day of clustering output for a single
//! structure/group/sensor-type/axis. Labels, frequencies and shapes arrive
//! pre-computed; nothing here performs mode detection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label carried by clustered points that do not belong to any trace.
pub const OUTLIER_LABEL: i32 = -1;

/// A single clustered point in a day record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    /// Trace label (`OUTLIER_LABEL` for unclustered points)
    pub label: i32,
    /// Modal frequency in Hz
    pub frequency: f64,
    /// Mode shape, one component per sensor (shape-tracking sensor types only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<f64>>,
}

impl TracePoint {
    pub fn new(label: i32, frequency: f64) -> Self {
        Self {
            label,
            frequency,
            shape: None,
        }
    }

    pub fn with_shape(label: i32, frequency: f64, shape: Vec<f64>) -> Self {
        Self {
            label,
            frequency,
            shape: Some(shape),
        }
    }

    /// Check whether this point is an outlier.
    pub fn is_outlier(&self) -> bool {
        self.label == OUTLIER_LABEL
    }
}

/// One day of clustering output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Day the clustering ran for
    pub date: DateTime<Utc>,
    /// Sampled duration for the day
    pub total_time: f64,
    /// Sensor identifiers active that day, in channel order
    pub sensor_ordering: Vec<String>,
    /// Labelled points
    pub traces: Vec<TracePoint>,
    /// Raw peak frequencies, independent of labelling
    pub peak_frequencies: Vec<f64>,
    /// Raw mode shapes, one per peak
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_shapes: Option<Vec<Vec<f64>>>,
    /// Sample rate in Hz (shape-tracking sensor types only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,
}

impl DayRecord {
    /// Number of sensors active that day.
    pub fn sensor_count(&self) -> usize {
        self.sensor_ordering.len()
    }
}

/// Measurement axis for accelerometer sensor types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Uppercase form used in stored documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "X" => Ok(Axis::X),
            "Y" => Ok(Axis::Y),
            "Z" => Ok(Axis::Z),
            other => Err(format!("unknown axis '{other}'")),
        }
    }
}

/// Sensor families producing clustering output.
///
/// Capabilities are attached to the variant so call sites never branch on
/// raw codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    /// Deck-mounted vibration unit
    Deck,
    /// Accelerometer reporting frequencies only
    AccelerometerV2,
    /// Accelerometer reporting frequencies and mode shapes
    AccelerometerShape,
    /// Short-window deck unit
    DeckShort,
}

impl SensorType {
    /// Map a legacy integer code (1-4).
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(SensorType::Deck),
            2 => Some(SensorType::AccelerometerV2),
            3 => Some(SensorType::AccelerometerShape),
            4 => Some(SensorType::DeckShort),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            SensorType::Deck => 1,
            SensorType::AccelerometerV2 => 2,
            SensorType::AccelerometerShape => 3,
            SensorType::DeckShort => 4,
        }
    }

    /// Value of the `type` field in stored documents.
    pub fn document_type(&self) -> &'static str {
        match self {
            SensorType::Deck => "deck",
            SensorType::AccelerometerV2 | SensorType::AccelerometerShape => "accelerometerComplete",
            SensorType::DeckShort => "deckShort1600",
        }
    }

    /// Whether records are split by axis.
    pub fn has_axis(&self) -> bool {
        matches!(
            self,
            SensorType::AccelerometerV2 | SensorType::AccelerometerShape
        )
    }

    /// Whether mode shapes and sample rate are reported.
    pub fn tracks_shapes(&self) -> bool {
        matches!(self, SensorType::AccelerometerShape)
    }

    /// Document field holding the sensor ordering.
    pub fn ordering_field(&self) -> &'static str {
        if self.tracks_shapes() {
            "ShapeEUIorder"
        } else {
            "EUIorder"
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensorType::Deck => "deck",
            SensorType::AccelerometerV2 => "accelerometer_v2",
            SensorType::AccelerometerShape => "accelerometer_shape",
            SensorType::DeckShort => "deck_short",
        };
        f.write_str(name)
    }
}

impl FromStr for SensorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if let Ok(code) = s.parse::<i64>() {
            return SensorType::from_code(code).ok_or_else(|| format!("unknown sensor code {code}"));
        }
        match s.as_str() {
            "deck" => Ok(SensorType::Deck),
            "accelerometer_v2" | "accelerometer-v2" => Ok(SensorType::AccelerometerV2),
            "accelerometer_shape" | "accelerometer-shape" | "accelerometer_v3" => {
                Ok(SensorType::AccelerometerShape)
            }
            "deck_short" | "deck-short" => Ok(SensorType::DeckShort),
            other => Err(format!("unknown sensor type '{other}'")),
        }
    }
}

/// Selection of day records for one monitored channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecordQuery {
    pub structure_id: String,
    pub group_id: String,
    pub sensor_type: SensorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<Axis>,
}

impl DayRecordQuery {
    pub fn new(
        structure_id: impl Into<String>,
        group_id: impl Into<String>,
        sensor_type: SensorType,
    ) -> Self {
        Self {
            structure_id: structure_id.into(),
            group_id: group_id.into(),
            sensor_type,
            axis: None,
        }
    }

    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = Some(axis);
        self
    }

    /// Axis to filter on, if the sensor type is split by axis.
    ///
    /// Returns an error message when an axis-bearing type has no axis.
    pub fn effective_axis(&self) -> Result<Option<Axis>, String> {
        match (self.sensor_type.has_axis(), self.axis) {
            (true, Some(axis)) => Ok(Some(axis)),
            (true, None) => Err(format!(
                "sensor type {} requires an axis",
                self.sensor_type
            )),
            (false, Some(axis)) => {
                tracing::warn!(
                    "axis {} ignored for sensor type {}",
                    axis,
                    self.sensor_type
                );
                Ok(None)
            }
            (false, None) => Ok(None),
        }
    }
}

/// A raw temperature sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    pub date: DateTime<Utc>,
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eui: Option<String>,
}
