//! Initialization window selection.
//!
//! The first `N` days whose sensor count matches the expected count form the
//! initialization window. Days with a different sensor count are skipped and
//! never reconsidered. Tracking starts at the raw sequence position right
//! after the last accepted day.

use crate::core::error::TrackingError;
use crate::source::types::DayRecord;
use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Requested length of the initialization period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitializationDays {
    /// No initialization period; the whole sequence is tracking.
    #[default]
    Disabled,
    /// Number of qualifying days to collect.
    Days(usize),
}

impl InitializationDays {
    /// Build from a raw integer, rejecting negative values.
    pub fn from_raw(days: i64) -> Result<Self, TrackingError> {
        usize::try_from(days)
            .map(InitializationDays::Days)
            .map_err(|_| {
                TrackingError::InvalidConfiguration(format!(
                    "initialization days must be non-negative, got {days}"
                ))
            })
    }

    /// Number of days to collect (0 when disabled).
    pub fn target_len(&self) -> usize {
        match self {
            InitializationDays::Disabled => 0,
            InitializationDays::Days(n) => *n,
        }
    }

    /// Whether no initialization period applies; `Days(0)` counts as disabled.
    pub fn is_disabled(&self) -> bool {
        self.target_len() == 0
    }
}

impl fmt::Display for InitializationDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitializationDays::Disabled => f.write_str("disabled"),
            InitializationDays::Days(n) => write!(f, "{n} days"),
        }
    }
}

// Stored as `false` when disabled, otherwise as the day count.
impl Serialize for InitializationDays {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            InitializationDays::Disabled => serializer.serialize_bool(false),
            InitializationDays::Days(n) => serializer.serialize_u64(*n as u64),
        }
    }
}

impl<'de> Deserialize<'de> for InitializationDays {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DaysVisitor;

        impl<'de> Visitor<'de> for DaysVisitor {
            type Value = InitializationDays;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a non-negative day count, false or null")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                if v {
                    Err(E::custom("initialization days cannot be `true`"))
                } else {
                    Ok(InitializationDays::Disabled)
                }
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                usize::try_from(v)
                    .map(InitializationDays::Days)
                    .map_err(|_| E::custom("initialization days out of range"))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                InitializationDays::from_raw(v).map_err(E::custom)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(InitializationDays::Disabled)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(InitializationDays::Disabled)
            }
        }

        deserializer.deserialize_any(DaysVisitor)
    }
}

/// Days selected for initialization and the start of tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct InitializationWindow {
    /// Requested number of qualifying days
    pub target_len: usize,
    /// Accepted days in chronological order
    pub days: Vec<DayRecord>,
    /// Raw sequence positions of the accepted days
    pub accepted_indices: Vec<usize>,
    /// Raw sequence positions skipped before the boundary
    pub skipped_indices: Vec<usize>,
    /// Dates of the skipped days
    pub skipped_dates: Vec<DateTime<Utc>>,
    /// Raw sequence position where tracking begins
    pub boundary: usize,
}

impl InitializationWindow {
    /// A window with no days; tracking covers the full sequence.
    pub fn empty() -> Self {
        Self {
            target_len: 0,
            days: Vec::new(),
            accepted_indices: Vec::new(),
            skipped_indices: Vec::new(),
            skipped_dates: Vec::new(),
            boundary: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn accepted_count(&self) -> usize {
        self.days.len()
    }

    pub fn accepted_dates(&self) -> Vec<DateTime<Utc>> {
        self.days.iter().map(|d| d.date).collect()
    }
}

/// Picks the initialization window for a day sequence.
#[derive(Debug, Clone, Copy)]
pub struct InitializationWindowSelector {
    expected_sensor_count: usize,
    initialization_days: InitializationDays,
}

impl InitializationWindowSelector {
    /// Create a selector, validating the expected sensor count.
    pub fn new(
        expected_sensor_count: i64,
        initialization_days: InitializationDays,
    ) -> Result<Self, TrackingError> {
        if expected_sensor_count <= 0 {
            return Err(TrackingError::InvalidConfiguration(format!(
                "expected sensor count must be positive, got {expected_sensor_count}"
            )));
        }

        Ok(Self {
            expected_sensor_count: expected_sensor_count as usize,
            initialization_days,
        })
    }

    pub fn expected_sensor_count(&self) -> usize {
        self.expected_sensor_count
    }

    pub fn initialization_days(&self) -> InitializationDays {
        self.initialization_days
    }

    /// Whether a day has the expected sensor composition.
    pub fn qualifies(&self, day: &DayRecord) -> bool {
        day.sensor_count() == self.expected_sensor_count
    }

    /// Walk `days` in order and collect the first qualifying days.
    pub fn select(&self, days: &[DayRecord]) -> Result<InitializationWindow, TrackingError> {
        let target_len = self.initialization_days.target_len();
        if target_len == 0 {
            return Ok(InitializationWindow::empty());
        }

        let mut window = InitializationWindow {
            target_len,
            days: Vec::with_capacity(target_len),
            accepted_indices: Vec::with_capacity(target_len),
            skipped_indices: Vec::new(),
            skipped_dates: Vec::new(),
            boundary: 0,
        };

        for (idx, day) in days.iter().enumerate() {
            if self.qualifies(day) {
                window.days.push(day.clone());
                window.accepted_indices.push(idx);
            } else {
                tracing::debug!(
                    "Skipping {} for initialization: {} sensors, expected {}",
                    day.date.format("%Y-%m-%d"),
                    day.sensor_count(),
                    self.expected_sensor_count
                );
                window.skipped_indices.push(idx);
                window.skipped_dates.push(day.date);
            }

            if window.days.len() == target_len {
                window.boundary = idx + 1;
                tracing::info!(
                    "Initialization window satisfied: {} days accepted, {} skipped, tracking from index {}",
                    window.days.len(),
                    window.skipped_indices.len(),
                    window.boundary
                );
                return Ok(window);
            }
        }

        Err(TrackingError::InsufficientData {
            required: target_len,
            found: window.days.len(),
            available: days.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day_with_sensors(offset: i64, sensors: usize) -> DayRecord {
        DayRecord {
            date: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + Duration::days(offset),
            total_time: 86_400.0,
            sensor_ordering: (0..sensors).map(|i| format!("EUI{i}")).collect(),
            traces: Vec::new(),
            peak_frequencies: Vec::new(),
            mode_shapes: None,
            sample_rate: None,
        }
    }

    fn sequence(counts: &[usize]) -> Vec<DayRecord> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &c)| day_with_sensors(i as i64, c))
            .collect()
    }

    #[test]
    fn test_skipped_day_moves_boundary() {
        let days = sequence(&[4, 3, 4, 4, 4]);
        let selector = InitializationWindowSelector::new(4, InitializationDays::Days(3)).unwrap();

        let window = selector.select(&days).unwrap();
        assert_eq!(window.accepted_indices, vec![0, 2, 3]);
        assert_eq!(window.skipped_indices, vec![1]);
        assert_eq!(window.skipped_dates, vec![days[1].date]);
        assert_eq!(window.boundary, 4);
        assert_eq!(
            window.accepted_dates(),
            vec![days[0].date, days[2].date, days[3].date]
        );
    }

    #[test]
    fn test_window_never_contains_mismatched_days() {
        let days = sequence(&[2, 4, 5, 4, 1, 4, 4, 3]);
        let selector = InitializationWindowSelector::new(4, InitializationDays::Days(4)).unwrap();

        let window = selector.select(&days).unwrap();
        assert_eq!(window.accepted_count(), 4);
        assert!(window.days.iter().all(|d| d.sensor_count() == 4));
        assert_eq!(window.boundary, 7);
    }

    #[test]
    fn test_insufficient_data() {
        let days = sequence(&[4, 3, 4, 4]);
        let selector = InitializationWindowSelector::new(4, InitializationDays::Days(4)).unwrap();

        match selector.select(&days) {
            Err(TrackingError::InsufficientData {
                required,
                found,
                available,
            }) => {
                assert_eq!(required, 4);
                assert_eq!(found, 3);
                assert_eq!(available, 4);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_disabled_and_zero_are_empty() {
        let days = sequence(&[4, 4]);

        for init in [InitializationDays::Disabled, InitializationDays::Days(0)] {
            let selector = InitializationWindowSelector::new(4, init).unwrap();
            let window = selector.select(&days).unwrap();
            assert!(window.is_empty());
            assert_eq!(window.boundary, 0);
        }
    }

    #[test]
    fn test_invalid_sensor_count() {
        assert!(matches!(
            InitializationWindowSelector::new(0, InitializationDays::Days(3)),
            Err(TrackingError::InvalidConfiguration(_))
        ));
        assert!(InitializationWindowSelector::new(-2, InitializationDays::Disabled).is_err());
    }

    #[test]
    fn test_initialization_days_serde() {
        let days: InitializationDays = serde_json::from_str("14").unwrap();
        assert_eq!(days, InitializationDays::Days(14));

        let disabled: InitializationDays = serde_json::from_str("false").unwrap();
        assert!(disabled.is_disabled());

        let null: InitializationDays = serde_json::from_str("null").unwrap();
        assert!(null.is_disabled());

        let zero: InitializationDays = serde_json::from_str("0").unwrap();
        assert!(zero.is_disabled());
        assert!(!InitializationDays::Days(1).is_disabled());

        assert!(serde_json::from_str::<InitializationDays>("-3").is_err());
        assert!(serde_json::from_str::<InitializationDays>("true").is_err());

        assert_eq!(serde_json::to_string(&InitializationDays::Days(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&InitializationDays::Disabled).unwrap(),
            "false"
        );
    }

    #[test]
    fn test_from_raw() {
        assert_eq!(InitializationDays::from_raw(5).unwrap(), InitializationDays::Days(5));
        assert!(InitializationDays::from_raw(-1).is_err());
    }
}
