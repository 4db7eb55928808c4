//! Demonstration of a tracking run over synthetic accelerometer data.
//!
//! This example shows how to:
//! 1. Register day records in an in-memory source
//! 2. Select an initialization window and aggregate trace labels
//! 3. Split raw peak vectors into initialization and tracking segments
//! 4. Build a tracking report
//!
//! Run with: cargo run --example tracking_demo

use chrono::{Duration, TimeZone, Utc};

use shm_trace_agent::{
    core::{run_tracking, InitializationDays, ReportBuilder, TrackingTarget},
    runlog::RunLog,
    source::{Axis, DayRecord, DayRecordQuery, MemorySource, SensorType, TracePoint, OUTLIER_LABEL},
};

const SENSORS: usize = 4;

/// One synthetic day: two modes drifting slowly, plus an outlier point.
fn synthetic_day(offset: i64, sensors: usize) -> DayRecord {
    let date = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::days(offset);
    let drift = offset as f64 * 0.002;
    let shape = |scale: f64| -> Vec<f64> {
        (0..sensors)
            .map(|s| scale * (s as f64 + 1.0) / sensors as f64)
            .collect()
    };

    DayRecord {
        date,
        total_time: 86_400.0,
        sensor_ordering: (0..sensors).map(|s| format!("EUI-{s:02}")).collect(),
        traces: vec![
            TracePoint::with_shape(0, 1.25 + drift, shape(1.0)),
            TracePoint::with_shape(1, 3.80 - drift, shape(-0.5)),
            TracePoint::with_shape(OUTLIER_LABEL, 7.1, shape(0.1)),
        ],
        peak_frequencies: vec![1.25 + drift, 3.80 - drift],
        mode_shapes: Some(vec![shape(1.0), shape(-0.5)]),
        sample_rate: Some(100.0),
    }
}

fn main() {
    println!("SHM Trace Agent - Tracking Demo");
    println!("===============================");
    println!();

    // Day 2 lost a sensor, so it cannot join the initialization window
    let days: Vec<DayRecord> = (0..10)
        .map(|i| synthetic_day(i, if i == 2 { SENSORS - 1 } else { SENSORS }))
        .collect();

    let target = TrackingTarget {
        name: "demo-bridge".into(),
        structure_id: "demo-structure".into(),
        group_id: "demo-group".into(),
        sensor_type: SensorType::AccelerometerShape,
        axis: Some(Axis::Z),
        expected_sensor_count: SENSORS as i64,
        initialization_days: InitializationDays::Days(5),
    };

    let query = DayRecordQuery::new(&target.structure_id, &target.group_id, target.sensor_type)
        .with_axis(Axis::Z);
    let source = match MemorySource::new().with_records(&query, days) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error registering records: {e}");
            return;
        }
    };

    let outcome = match run_tracking(&source, &target) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error running tracking: {e}");
            return;
        }
    };

    let run_log = RunLog::new();
    run_log.record_outcome(&outcome);

    println!("Target: {}", outcome.target);
    println!("  Day records: {}", outcome.day_count);
    println!(
        "  Initialization window: {} days, skipped indices {:?}",
        outcome.window.accepted_count(),
        outcome.window.skipped_indices
    );
    println!("  Tracking starts at index {}", outcome.window.boundary);
    println!();

    println!("Traces:");
    for series in outcome.labels.series.values() {
        println!(
            "  Trace {}: {:.5} Hz over {} days",
            series.label,
            series.mean_frequency,
            series.len()
        );
        if let Some(shape) = &series.mean_shape {
            let formatted: Vec<String> = shape.iter().map(|v| format!("{v:.3}")).collect();
            println!("    Mean shape: [{}]", formatted.join(", "));
        }
    }
    println!("  Outlier points: {}", outcome.labels.outlier_count());
    println!();

    println!("Peak vectors:");
    println!("  Initialization: {}", outcome.peaks.initialization.len());
    println!("  Tracking: {}", outcome.peaks.tracking.len());
    if let Some(rate) = outcome.peaks.sample_rate() {
        println!("  Sample rate: {rate} Hz");
    }
    println!();

    let report = ReportBuilder::new().build(&outcome);
    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("Report (truncated):");
            for line in json.lines().take(20) {
                println!("    {line}");
            }
            println!("    ...");
        }
        Err(e) => eprintln!("Error serializing report: {e}"),
    }
    println!();

    println!("{}", run_log.summary());
}
