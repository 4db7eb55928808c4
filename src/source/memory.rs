//! In-memory record source.

use crate::source::types::{Axis, DayRecord, DayRecordQuery, SensorType, TemperatureReading};
use crate::source::{DayRecordSource, SourceError, TemperatureSource};
use std::collections::HashMap;

type ChannelKey = (String, String, SensorType, Option<Axis>);

/// A source backed by records already held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    channels: HashMap<ChannelKey, Vec<DayRecord>>,
    temperatures: HashMap<String, Vec<TemperatureReading>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the records for a query, replacing any previous ones.
    pub fn insert(
        &mut self,
        query: &DayRecordQuery,
        records: Vec<DayRecord>,
    ) -> Result<(), SourceError> {
        let key = channel_key(query)?;
        self.channels.insert(key, records);
        Ok(())
    }

    /// Builder-style variant of [`MemorySource::insert`].
    pub fn with_records(
        mut self,
        query: &DayRecordQuery,
        records: Vec<DayRecord>,
    ) -> Result<Self, SourceError> {
        self.insert(query, records)?;
        Ok(self)
    }

    /// Register temperature samples for a structure.
    pub fn insert_temperatures(&mut self, structure_id: &str, readings: Vec<TemperatureReading>) {
        self.temperatures
            .entry(structure_id.to_string())
            .or_default()
            .extend(readings);
    }

    /// Number of registered channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

fn channel_key(query: &DayRecordQuery) -> Result<ChannelKey, SourceError> {
    let axis = query.effective_axis().map_err(SourceError::InvalidQuery)?;
    Ok((
        query.structure_id.clone(),
        query.group_id.clone(),
        query.sensor_type,
        axis,
    ))
}

impl DayRecordSource for MemorySource {
    fn fetch_day_records(&self, query: &DayRecordQuery) -> Result<Vec<DayRecord>, SourceError> {
        let key = channel_key(query)?;
        let mut records = self.channels.get(&key).cloned().unwrap_or_default();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }
}

impl TemperatureSource for MemorySource {
    fn fetch_temperatures(
        &self,
        structure_id: &str,
    ) -> Result<Vec<TemperatureReading>, SourceError> {
        let mut readings = self
            .temperatures
            .get(structure_id)
            .cloned()
            .unwrap_or_default();
        readings.sort_by_key(|r| r.date);
        Ok(readings)
    }
}
