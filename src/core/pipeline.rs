//! End-to-end tracking run for a monitored channel.
//!
//! One fetch feeds two independent views over the same sequence and
//! window boundary: the label aggregation and the peak partition.

use crate::core::aggregate::{LabelAggregation, LabelAggregator};
use crate::core::error::TrackingError;
use crate::core::peaks::{PeakSegments, PeakVectorExtractor};
use crate::core::window::{InitializationDays, InitializationWindow, InitializationWindowSelector};
use crate::source::types::{Axis, DayRecord, DayRecordQuery, SensorType};
use crate::source::DayRecordSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A monitored structure/group/sensor-type/axis and its tracking settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingTarget {
    /// Human-readable name used in logs and export file names
    pub name: String,
    pub structure_id: String,
    pub group_id: String,
    pub sensor_type: SensorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<Axis>,
    /// Number of sensors a day must report to join the initialization window
    pub expected_sensor_count: i64,
    #[serde(default)]
    pub initialization_days: InitializationDays,
}

impl TrackingTarget {
    /// Record query for this target.
    pub fn query(&self) -> DayRecordQuery {
        DayRecordQuery {
            structure_id: self.structure_id.clone(),
            group_id: self.group_id.clone(),
            sensor_type: self.sensor_type,
            axis: self.axis,
        }
    }

    /// Window selector for this target's settings.
    pub fn selector(&self) -> Result<InitializationWindowSelector, TrackingError> {
        InitializationWindowSelector::new(self.expected_sensor_count, self.initialization_days)
    }

    /// Check the target's settings without fetching anything.
    pub fn validate(&self) -> Result<(), TrackingError> {
        self.selector()?;
        self.query()
            .effective_axis()
            .map_err(TrackingError::InvalidConfiguration)?;
        Ok(())
    }
}

impl fmt::Display for TrackingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}", self.name, self.sensor_type)?;
        if let Some(axis) = self.axis {
            write!(f, ", axis {axis}")?;
        }
        write!(f, ")")
    }
}

/// Everything computed for one target.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingOutcome {
    pub target: TrackingTarget,
    /// Number of fetched day records
    pub day_count: usize,
    pub window: InitializationWindow,
    /// Aggregation over the window, or the full series when initialization is disabled
    pub labels: LabelAggregation,
    pub peaks: PeakSegments,
}

/// Run window selection, aggregation and peak extraction over fetched days.
pub fn process_days(
    target: &TrackingTarget,
    days: &[DayRecord],
) -> Result<TrackingOutcome, TrackingError> {
    let window = target.selector()?.select(days)?;

    let aggregator = LabelAggregator::for_sensor(target.sensor_type);
    let labels = if target.initialization_days.is_disabled() {
        aggregator.aggregate(days)?
    } else {
        aggregator.aggregate(&window.days)?
    };

    let peaks = PeakVectorExtractor::for_sensor(target.sensor_type).extract(days, &window)?;

    Ok(TrackingOutcome {
        target: target.clone(),
        day_count: days.len(),
        window,
        labels,
        peaks,
    })
}

/// Fetch a target's records and process them.
pub fn run_tracking<S>(
    source: &S,
    target: &TrackingTarget,
) -> Result<TrackingOutcome, TrackingError>
where
    S: DayRecordSource + ?Sized,
{
    target.validate()?;
    let days = source.fetch_day_records(&target.query())?;
    tracing::info!("Processing {} day records for {}", days.len(), target);
    process_days(target, &days)
}

/// Aggregate every fetched day, without an initialization window.
pub fn aggregate_full_series<S>(
    source: &S,
    query: &DayRecordQuery,
) -> Result<LabelAggregation, TrackingError>
where
    S: DayRecordSource + ?Sized,
{
    let days = source.fetch_day_records(query)?;
    LabelAggregator::for_sensor(query.sensor_type).aggregate(&days)
}

/// Result of one target in a multi-target run.
#[derive(Debug)]
pub struct TargetResult {
    pub target: TrackingTarget,
    pub result: Result<TrackingOutcome, TrackingError>,
}

/// Run every target on its own worker thread.
///
/// Results come back in the order of `targets`; a failing target does not
/// affect the others.
pub fn run_all<S>(source: &S, targets: &[TrackingTarget]) -> Vec<TargetResult>
where
    S: DayRecordSource + Sync + ?Sized,
{
    let (sender, receiver) = crossbeam_channel::unbounded();

    std::thread::scope(|scope| {
        for (idx, target) in targets.iter().enumerate() {
            let sender = sender.clone();
            scope.spawn(move || {
                let result = run_tracking(source, target);
                if let Err(ref e) = result {
                    tracing::warn!("Tracking failed for {}: {}", target, e);
                }
                // Receiver outlives the scope
                let _ = sender.send((idx, result));
            });
        }
    });
    drop(sender);

    let mut results: Vec<(usize, Result<TrackingOutcome, TrackingError>)> =
        receiver.iter().collect();
    results.sort_by_key(|(idx, _)| *idx);

    results
        .into_iter()
        .map(|(idx, result)| TargetResult {
            target: targets[idx].clone(),
            result,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::types::{TracePoint, OUTLIER_LABEL};
    use crate::source::MemorySource;
    use chrono::{Duration, TimeZone, Utc};

    fn day(offset: i64, sensors: usize, traces: Vec<TracePoint>) -> DayRecord {
        DayRecord {
            date: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap() + Duration::days(offset),
            total_time: 86_400.0,
            sensor_ordering: (0..sensors).map(|i| format!("E{i}")).collect(),
            traces,
            peak_frequencies: vec![2.0, 4.0],
            mode_shapes: None,
            sample_rate: None,
        }
    }

    fn target(days: InitializationDays) -> TrackingTarget {
        TrackingTarget {
            name: "deck-north".into(),
            structure_id: "s1".into(),
            group_id: "g1".into(),
            sensor_type: SensorType::Deck,
            axis: None,
            expected_sensor_count: 4,
            initialization_days: days,
        }
    }

    fn sample_days() -> Vec<DayRecord> {
        vec![
            day(0, 4, vec![TracePoint::new(0, 2.0), TracePoint::new(OUTLIER_LABEL, 9.0)]),
            day(1, 3, vec![TracePoint::new(0, 50.0)]),
            day(2, 4, vec![TracePoint::new(0, 2.2)]),
            day(3, 4, vec![TracePoint::new(0, 1.8), TracePoint::new(1, 4.0)]),
            day(4, 4, vec![TracePoint::new(0, 60.0)]),
        ]
    }

    #[test]
    fn test_window_aggregation_ignores_skipped_and_tracking_days() {
        let outcome = process_days(&target(InitializationDays::Days(3)), &sample_days()).unwrap();

        assert_eq!(outcome.window.boundary, 4);
        assert_eq!(outcome.labels.labels(), vec![0, 1]);
        assert!((outcome.labels.get(0).unwrap().mean_frequency - 2.0).abs() < 1e-9);
        assert_eq!(outcome.peaks.initialization.len(), 3);
        assert_eq!(outcome.peaks.tracking.len(), 1);
    }

    #[test]
    fn test_disabled_initialization_aggregates_full_series() {
        let outcome = process_days(&target(InitializationDays::Disabled), &sample_days()).unwrap();

        assert!(outcome.window.is_empty());
        assert_eq!(outcome.labels.get(0).unwrap().len(), 5);
        assert_eq!(outcome.peaks.tracking.len(), 5);
    }

    #[test]
    fn test_zero_initialization_days_aggregates_full_series() {
        let disabled = process_days(&target(InitializationDays::Disabled), &sample_days()).unwrap();
        let zero = process_days(&target(InitializationDays::Days(0)), &sample_days()).unwrap();

        assert_eq!(zero.labels.labels(), vec![0, 1]);
        assert_eq!(zero.labels, disabled.labels);
        assert_eq!(zero.peaks, disabled.peaks);
    }

    #[test]
    fn test_run_all_preserves_order_and_isolates_failures() {
        let good = target(InitializationDays::Days(2));
        let mut short = target(InitializationDays::Days(10));
        short.name = "too-short".into();
        let mut invalid = target(InitializationDays::Days(2));
        invalid.name = "invalid".into();
        invalid.expected_sensor_count = 0;

        let source = MemorySource::new()
            .with_records(&good.query(), sample_days())
            .unwrap();

        let results = run_all(&source, &[good.clone(), short, invalid]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].target.name, "deck-north");
        assert!(results[0].result.is_ok());
        assert!(matches!(
            results[1].result,
            Err(TrackingError::InsufficientData { .. })
        ));
        assert!(matches!(
            results[2].result,
            Err(TrackingError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_aggregate_full_series() {
        let t = target(InitializationDays::Disabled);
        let source = MemorySource::new()
            .with_records(&t.query(), sample_days())
            .unwrap();

        let labels = aggregate_full_series(&source, &t.query()).unwrap();
        assert_eq!(labels.outlier_count(), 1);
        assert_eq!(labels.get(1).unwrap().len(), 1);
    }

    #[test]
    fn test_validate_requires_axis() {
        let mut t = target(InitializationDays::Days(3));
        t.sensor_type = SensorType::AccelerometerV2;
        assert!(matches!(
            t.validate(),
            Err(TrackingError::InvalidConfiguration(_))
        ));
        t.axis = Some(Axis::Z);
        assert!(t.validate().is_ok());
    }
}
