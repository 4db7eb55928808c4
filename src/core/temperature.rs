//! Daily temperature summary.

use crate::source::types::TemperatureReading;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Temperature statistics for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTemperature {
    pub day: NaiveDate,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub samples: usize,
}

/// Group readings by UTC day, ascending.
pub fn summarize_daily(readings: &[TemperatureReading]) -> Vec<DailyTemperature> {
    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();

    for reading in readings {
        if !reading.temperature.is_finite() {
            tracing::warn!(
                "Ignoring non-finite temperature at {}",
                reading.date.to_rfc3339()
            );
            continue;
        }
        by_day
            .entry(reading.date.date_naive())
            .or_default()
            .push(reading.temperature);
    }

    by_day
        .into_iter()
        .map(|(day, values)| DailyTemperature {
            day,
            avg: values.iter().mean(),
            min: Statistics::min(values.iter()),
            max: Statistics::max(values.iter()),
            samples: values.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn reading(day: u32, hour: u32, temperature: f64) -> TemperatureReading {
        TemperatureReading {
            date: Utc.with_ymd_and_hms(2023, 7, day, hour, 0, 0).unwrap(),
            temperature,
            eui: None,
        }
    }

    #[test]
    fn test_daily_grouping() {
        let readings = vec![
            reading(2, 6, 18.0),
            reading(1, 3, 10.0),
            reading(1, 15, 20.0),
            reading(2, 18, f64::NAN),
        ];

        let summary = summarize_daily(&readings);
        assert_eq!(summary.len(), 2);

        assert_eq!(summary[0].day, NaiveDate::from_ymd_opt(2023, 7, 1).unwrap());
        assert_eq!(summary[0].samples, 2);
        assert!((summary[0].avg - 15.0).abs() < 1e-12);
        assert_eq!(summary[0].min, 10.0);
        assert_eq!(summary[0].max, 20.0);

        assert_eq!(summary[1].samples, 1);
        assert_eq!(summary[1].max, 18.0);
    }

    #[test]
    fn test_empty_readings() {
        assert!(summarize_daily(&[]).is_empty());
    }
}
