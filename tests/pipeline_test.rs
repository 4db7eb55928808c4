//! Integration tests running tracking over exported collections on disk

use serde_json::json;
use shm_trace_agent::core::{
    aggregate_full_series, run_all, run_tracking, summarize_daily, ExportFormat,
    InitializationDays, ReportBuilder, TrackingError, TrackingTarget,
};
use shm_trace_agent::source::{
    Axis, DayRecordQuery, DayRecordSource, JsonDirSource, SensorType, SourceError,
    TemperatureSource,
};
use std::path::{Path, PathBuf};

const STRUCTURE: &str = "6183ec3f5c580e131f45ac37";
const DECK_GROUP: &str = "63172499a46181b32d20d51d";
const ACCEL_GROUP: &str = "62e252a3b694b0ac5818c0e5";

struct TestDir(PathBuf);

impl TestDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("shm-trace-{name}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path).expect("Failed to create test dir");
        Self(path)
    }

    fn path(&self) -> &Path {
        &self.0
    }

    fn write_json(&self, file: &str, value: &serde_json::Value) {
        std::fs::write(self.0.join(file), serde_json::to_string_pretty(value).unwrap())
            .expect("Failed to write fixture");
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn deck_doc(day: u32, sensors: usize, traces: serde_json::Value) -> serde_json::Value {
    let order: Vec<String> = (0..sensors).map(|s| format!("EUI{s}")).collect();
    json!({
        "_id": {"$oid": format!("64a0000000000000000000{day:02}")},
        "structureID": {"$oid": STRUCTURE},
        "group": {"$oid": DECK_GROUP},
        "type": "deck",
        "date": {"$date": format!("2023-06-{day:02}T00:00:00Z")},
        "TotalTime": 86400.0,
        "EUIorder": order,
        "freqVector": [1.1, 2.4, 5.0],
        "traces": traces
    })
}

fn accel_doc(day: u32, axis: &str, freq: f64) -> serde_json::Value {
    json!({
        "structureID": STRUCTURE,
        "group": ACCEL_GROUP,
        "type": "accelerometerComplete",
        "axis": axis,
        "date": format!("2023-06-{day:02}T12:00:00Z"),
        "TotalTime": 3600.0,
        "ShapeEUIorder": ["A", "B", "C"],
        "EUIorder": ["A", "B", "C"],
        "freqVector": [freq],
        "modalshapeVector": [[0.2, 0.4, 0.6]],
        "fSample": 125.0 + day as f64,
        "traces": [
            {"label": 0, "freq_value": freq, "shape_value": [1.0 + day as f64, 2.0, 3.0]},
            {"label": -1, "freq_value": 9.9, "shape_value": [0.0, 0.0, 0.0]}
        ]
    })
}

/// Five deck days with sensor counts [4, 3, 4, 4, 4] and two accelerometer axes.
fn fixture(name: &str) -> TestDir {
    let dir = TestDir::new(name);
    let mut docs = vec![
        deck_doc(1, 4, json!([{"label": 0, "freq_value": 1.0}, {"label": 1, "freq_value": 2.0}])),
        deck_doc(2, 3, json!([{"label": 0, "freq_value": 100.0}])),
        deck_doc(3, 4, json!([{"label": 0, "freq_value": 3.0}, {"label": -1, "freq_value": 50.0}])),
        deck_doc(4, 4, json!([{"label": 0, "freq_value": 2.0}, {"label": 1, "freq_value": 4.0}])),
        deck_doc(5, 4, json!([{"label": 0, "freq_value": 6.0}])),
    ];
    docs.extend([
        accel_doc(3, "X", 1.5),
        accel_doc(1, "X", 1.3),
        accel_doc(2, "Y", 7.0),
    ]);
    dir.write_json("day_records.json", &json!(docs));
    dir
}

fn deck_target(initialization_days: InitializationDays) -> TrackingTarget {
    TrackingTarget {
        name: "deck".into(),
        structure_id: STRUCTURE.into(),
        group_id: DECK_GROUP.into(),
        sensor_type: SensorType::Deck,
        axis: None,
        expected_sensor_count: 4,
        initialization_days,
    }
}

fn accel_target(axis: Option<Axis>) -> TrackingTarget {
    TrackingTarget {
        name: "accel".into(),
        structure_id: STRUCTURE.into(),
        group_id: ACCEL_GROUP.into(),
        sensor_type: SensorType::AccelerometerShape,
        axis,
        expected_sensor_count: 3,
        initialization_days: InitializationDays::Days(1),
    }
}

#[test]
fn test_deck_window_skips_mismatched_day() {
    let dir = fixture("deck-window");
    let source = JsonDirSource::new(dir.path());

    let outcome = run_tracking(&source, &deck_target(InitializationDays::Days(3))).unwrap();

    assert_eq!(outcome.day_count, 5);
    assert_eq!(outcome.window.accepted_indices, vec![0, 2, 3]);
    assert_eq!(outcome.window.skipped_indices, vec![1]);
    assert_eq!(outcome.window.boundary, 4);

    // Day 2's 100 Hz point never reaches the window
    let trace0 = outcome.labels.get(0).unwrap();
    assert_eq!(trace0.len(), 3);
    assert!((trace0.mean_frequency - 2.0).abs() < 1e-12);

    let trace1 = outcome.labels.get(1).unwrap();
    assert!((trace1.mean_frequency - 3.0).abs() < 1e-12);
    assert!(outcome.labels.get(-1).is_none());
    assert_eq!(outcome.labels.outlier_count(), 1);

    let init: Vec<usize> = outcome.peaks.initialization.iter().map(|p| p.index).collect();
    let tracking: Vec<usize> = outcome.peaks.tracking.iter().map(|p| p.index).collect();
    assert_eq!(init, vec![0, 2, 3]);
    assert_eq!(tracking, vec![4]);
    assert_eq!(outcome.peaks.sample_rate(), None);
}

#[test]
fn test_disabled_initialization_aggregates_full_series() {
    let dir = fixture("deck-disabled");
    let source = JsonDirSource::new(dir.path());

    let outcome = run_tracking(&source, &deck_target(InitializationDays::Disabled)).unwrap();

    assert!(outcome.window.is_empty());
    assert_eq!(outcome.window.boundary, 0);
    assert_eq!(outcome.labels.get(0).unwrap().len(), 5);
    assert!(outcome.peaks.initialization.is_empty());
    assert_eq!(outcome.peaks.tracking.len(), 5);

    let direct = aggregate_full_series(&source, &deck_target(InitializationDays::Disabled).query())
        .unwrap();
    assert_eq!(direct, outcome.labels);
}

#[test]
fn test_insufficient_qualifying_days() {
    let dir = fixture("deck-short");
    let source = JsonDirSource::new(dir.path());

    let err = run_tracking(&source, &deck_target(InitializationDays::Days(5))).unwrap_err();
    assert!(matches!(
        err,
        TrackingError::InsufficientData {
            required: 5,
            found: 4,
            available: 5
        }
    ));
}

#[test]
fn test_accelerometer_axis_filter_and_shapes() {
    let dir = fixture("accel");
    let source = JsonDirSource::new(dir.path());

    let outcome = run_tracking(&source, &accel_target(Some(Axis::X))).unwrap();

    // Only the two X documents, sorted by date
    assert_eq!(outcome.day_count, 2);
    assert_eq!(outcome.window.boundary, 1);

    let trace0 = outcome.labels.get(0).unwrap();
    assert_eq!(trace0.mean_shape, Some(vec![2.0, 2.0, 3.0]));
    assert!((trace0.mean_frequency - 1.3).abs() < 1e-12);

    assert_eq!(outcome.peaks.initialization.len(), 1);
    assert_eq!(outcome.peaks.tracking.len(), 1);
    assert_eq!(outcome.peaks.tracking[0].frequencies, vec![1.5]);
    assert_eq!(outcome.peaks.sample_rate(), Some(128.0));
    assert!(outcome.peaks.tracking[0].mode_shapes.is_some());
}

#[test]
fn test_accelerometer_without_axis_is_rejected() {
    let dir = fixture("accel-no-axis");
    let source = JsonDirSource::new(dir.path());

    let err = run_tracking(&source, &accel_target(None)).unwrap_err();
    assert!(matches!(err, TrackingError::InvalidConfiguration(_)));

    let query = DayRecordQuery::new(STRUCTURE, ACCEL_GROUP, SensorType::AccelerometerShape);
    assert!(matches!(
        source.fetch_day_records(&query),
        Err(SourceError::InvalidQuery(_))
    ));
}

#[test]
fn test_json_lines_export() {
    let dir = TestDir::new("jsonl");
    let lines: Vec<String> = (1..=3)
        .map(|d| {
            deck_doc(d, 4, json!([{"label": 2, "freq_value": d as f64}])).to_string()
        })
        .collect();
    std::fs::write(dir.path().join("day_records.jsonl"), lines.join("\n")).unwrap();

    let source = JsonDirSource::new(dir.path());
    let labels =
        aggregate_full_series(&source, &deck_target(InitializationDays::Disabled).query()).unwrap();

    assert_eq!(labels.labels(), vec![2]);
    assert!((labels.get(2).unwrap().mean_frequency - 2.0).abs() < 1e-12);
}

#[test]
fn test_missing_export_reports_io_error() {
    let dir = TestDir::new("empty");
    let source = JsonDirSource::new(dir.path());

    let err = run_tracking(&source, &deck_target(InitializationDays::Days(1))).unwrap_err();
    assert!(matches!(err, TrackingError::Source(SourceError::Io { .. })));
}

#[test]
fn test_run_all_keeps_target_order() {
    let dir = fixture("run-all");
    let source = JsonDirSource::new(dir.path());
    let targets = vec![
        deck_target(InitializationDays::Days(3)),
        accel_target(None),
        accel_target(Some(Axis::Y)),
    ];

    let results = run_all(&source, &targets);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].target, targets[0]);
    assert!(results[0].result.is_ok());
    assert!(results[1].result.is_err());

    let y = results[2].result.as_ref().unwrap();
    assert_eq!(y.day_count, 1);
    assert!(y.peaks.tracking.is_empty());
}

#[test]
fn test_report_export_formats() {
    let dir = fixture("report");
    let source = JsonDirSource::new(dir.path());
    let outcome = run_tracking(&source, &deck_target(InitializationDays::Days(3))).unwrap();

    let builder = ReportBuilder::new();
    let reports = vec![builder.build(&outcome), builder.build(&outcome)];

    let json_body = ExportFormat::Json.render(&reports).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json_body).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
    assert_eq!(parsed[0]["window"]["boundary"], 4);
    assert_eq!(parsed[0]["target"]["initialization_days"], 3);

    let lines_body = ExportFormat::JsonLines.render(&reports).unwrap();
    assert_eq!(lines_body.lines().count(), 2);
    for line in lines_body.lines() {
        let report: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(report["traces"][0]["label"], 0);
    }
}

fn temperature_doc(structure: serde_json::Value, date: &str, value: f64) -> serde_json::Value {
    json!({
        "structureID": structure,
        "eui": "T1",
        "date": {"$date": date},
        "temperature": value
    })
}

#[test]
fn test_daily_temperatures() {
    let dir = TestDir::new("temperatures");
    dir.write_json(
        "temperatures.json",
        &json!([
            temperature_doc(json!({"$oid": STRUCTURE}), "2023-06-01T01:00:00Z", 12.0),
            temperature_doc(json!({"$oid": STRUCTURE}), "2023-06-01T13:00:00Z", 20.0),
            temperature_doc(json!({"$oid": STRUCTURE}), "2023-06-02T13:00:00Z", 18.5),
            {"structureID": "other-structure", "date": "2023-06-01T13:00:00Z", "temperature": 99.0}
        ]),
    );

    let source = JsonDirSource::new(dir.path());
    let readings = source.fetch_temperatures(STRUCTURE).unwrap();
    assert_eq!(readings.len(), 3);

    let daily = summarize_daily(&readings);
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0].samples, 2);
    assert!((daily[0].avg - 16.0).abs() < 1e-12);
    assert_eq!(daily[0].min, 12.0);
    assert_eq!(daily[0].max, 20.0);
    assert_eq!(daily[1].samples, 1);
}
