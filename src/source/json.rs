//! Record source reading exported clustering collections from disk.
//!
//! Layout under the source directory:
//! - `day_records.json` (JSON array) or `day_records.jsonl` (one document per line)
//! - `temperatures.json` (JSON array, optional)
//!
//! Identifiers and dates are accepted either as plain strings or in the
//! extended `{"$oid": ..}` / `{"$date": ..}` form produced by database exports.

use crate::source::types::{DayRecord, DayRecordQuery, SensorType, TemperatureReading, TracePoint};
use crate::source::{DayRecordSource, SourceError, TemperatureSource};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DAY_RECORDS_FILE: &str = "day_records.json";
const DAY_RECORDS_LINES_FILE: &str = "day_records.jsonl";
const TEMPERATURES_FILE: &str = "temperatures.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ObjectIdRepr {
    Extended {
        #[serde(rename = "$oid")]
        oid: String,
    },
    Plain(String),
}

impl ObjectIdRepr {
    fn as_str(&self) -> &str {
        match self {
            ObjectIdRepr::Extended { oid } => oid,
            ObjectIdRepr::Plain(s) => s,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DateRepr {
    Extended {
        #[serde(rename = "$date")]
        date: DateTime<Utc>,
    },
    Plain(DateTime<Utc>),
}

impl DateRepr {
    fn into_utc(self) -> DateTime<Utc> {
        match self {
            DateRepr::Extended { date } | DateRepr::Plain(date) => date,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StoredTrace {
    label: i32,
    freq_value: f64,
    #[serde(default)]
    shape_value: Option<Vec<f64>>,
}

/// Clustering document as stored by the upstream pipeline.
#[derive(Debug, Deserialize)]
struct StoredDay {
    #[serde(rename = "structureID")]
    structure_id: ObjectIdRepr,
    group: ObjectIdRepr,
    #[serde(rename = "type", default)]
    doc_type: Option<String>,
    #[serde(default)]
    axis: Option<String>,
    date: DateRepr,
    #[serde(rename = "TotalTime")]
    total_time: f64,
    #[serde(rename = "EUIorder", default)]
    eui_order: Option<Vec<String>>,
    #[serde(rename = "ShapeEUIorder", default)]
    shape_eui_order: Option<Vec<String>>,
    #[serde(rename = "freqVector", default)]
    freq_vector: Vec<f64>,
    #[serde(rename = "modalshapeVector", default)]
    modal_shape_vector: Option<Vec<Vec<f64>>>,
    #[serde(rename = "fSample", default)]
    f_sample: Option<f64>,
    #[serde(default)]
    traces: Vec<StoredTrace>,
}

impl StoredDay {
    fn matches(&self, query: &DayRecordQuery, axis: Option<&str>) -> bool {
        if self.structure_id.as_str() != query.structure_id
            || self.group.as_str() != query.group_id
        {
            return false;
        }
        if self.doc_type.as_deref() != Some(query.sensor_type.document_type()) {
            return false;
        }
        match axis {
            Some(axis) => self
                .axis
                .as_deref()
                .map(|a| a.eq_ignore_ascii_case(axis))
                .unwrap_or(false),
            None => true,
        }
    }

    fn into_day_record(self, sensor_type: SensorType) -> Result<DayRecord, String> {
        let date = self.date.into_utc();
        let sensor_ordering = if sensor_type.tracks_shapes() {
            self.shape_eui_order
        } else {
            self.eui_order
        }
        .ok_or_else(|| format!("{} missing on day {}", sensor_type.ordering_field(), date))?;

        let (mode_shapes, sample_rate) = if sensor_type.tracks_shapes() {
            (self.modal_shape_vector, self.f_sample)
        } else {
            (None, None)
        };

        let traces = self
            .traces
            .into_iter()
            .map(|t| TracePoint {
                label: t.label,
                frequency: t.freq_value,
                shape: if sensor_type.tracks_shapes() {
                    t.shape_value
                } else {
                    None
                },
            })
            .collect();

        Ok(DayRecord {
            date,
            total_time: self.total_time,
            sensor_ordering,
            traces,
            peak_frequencies: self.freq_vector,
            mode_shapes,
            sample_rate,
        })
    }
}

#[derive(Debug, Deserialize)]
struct StoredTemperature {
    #[serde(rename = "structureID", default)]
    structure_id: Option<ObjectIdRepr>,
    #[serde(default)]
    eui: Option<String>,
    date: DateRepr,
    temperature: f64,
}

/// Source reading exported collections from a directory.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    root: PathBuf,
}

impl JsonDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory this source reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load_day_documents(&self) -> Result<Vec<StoredDay>, SourceError> {
        let array_path = self.root.join(DAY_RECORDS_FILE);
        if array_path.exists() {
            return read_json_array(&array_path);
        }
        read_json_lines(&self.root.join(DAY_RECORDS_LINES_FILE))
    }
}

fn read_to_string(path: &Path) -> Result<String, SourceError> {
    std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SourceError> {
    let content = read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| SourceError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SourceError> {
    let content = read_to_string(path)?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| SourceError::Parse {
                path: path.to_path_buf(),
                message: format!("line {}: {e}", idx + 1),
            })
        })
        .collect()
}

impl DayRecordSource for JsonDirSource {
    fn fetch_day_records(&self, query: &DayRecordQuery) -> Result<Vec<DayRecord>, SourceError> {
        let axis = query.effective_axis().map_err(SourceError::InvalidQuery)?;
        let axis_str = axis.map(|a| a.as_str());

        let mut records = self
            .load_day_documents()?
            .into_iter()
            .filter(|doc| doc.matches(query, axis_str))
            .map(|doc| {
                doc.into_day_record(query.sensor_type)
                    .map_err(|message| SourceError::Parse {
                        path: self.root.clone(),
                        message,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        records.sort_by_key(|r| r.date);

        tracing::debug!(
            "Fetched {} day records for structure {} group {} ({}{})",
            records.len(),
            query.structure_id,
            query.group_id,
            query.sensor_type,
            axis.map(|a| format!(", axis {a}")).unwrap_or_default()
        );

        Ok(records)
    }
}

impl TemperatureSource for JsonDirSource {
    fn fetch_temperatures(
        &self,
        structure_id: &str,
    ) -> Result<Vec<TemperatureReading>, SourceError> {
        let path = self.root.join(TEMPERATURES_FILE);
        if !path.exists() {
            tracing::debug!("No temperature export at {:?}", path);
            return Ok(Vec::new());
        }

        let mut readings: Vec<TemperatureReading> = read_json_array::<StoredTemperature>(&path)?
            .into_iter()
            .filter(|t| {
                t.structure_id
                    .as_ref()
                    .map(|id| id.as_str() == structure_id)
                    .unwrap_or(true)
            })
            .map(|t| TemperatureReading {
                date: t.date.into_utc(),
                temperature: t.temperature,
                eui: t.eui,
            })
            .collect();

        readings.sort_by_key(|r| r.date);
        Ok(readings)
    }
}
