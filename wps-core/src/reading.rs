use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeMap};

/// A single pressure reading from a station, in kg/cm².
///
/// A reading is identified by `(station_id, timestamp)`; equality and
/// ordering ignore the pressure value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StationReading {
    pub station_id: i64,
    pub timestamp: NaiveDateTime,
    pub pressure: f64,
}

impl StationReading {
    pub fn new(station_id: i64, timestamp: NaiveDateTime, pressure: f64) -> Self {
        Self {
            station_id,
            timestamp,
            pressure,
        }
    }

    /// (day of month, hour of day) of the reading.
    pub fn day_hour(&self) -> (u32, u32) {
        (self.timestamp.day(), self.timestamp.hour())
    }

    /// Group a vector of readings by station id, each group sorted by timestamp.
    pub fn group_by_station(readings: Vec<StationReading>) -> BTreeMap<i64, Vec<StationReading>> {
        let mut result: BTreeMap<i64, Vec<StationReading>> = BTreeMap::new();
        for reading in readings {
            result.entry(reading.station_id).or_default().push(reading);
        }
        for series in result.values_mut() {
            series.sort();
        }
        result
    }
}

impl Ord for StationReading {
    fn cmp(&self, other: &Self) -> Ordering {
        self.station_id
            .cmp(&other.station_id)
            .then(self.timestamp.cmp(&other.timestamp))
    }
}

impl Eq for StationReading {}

impl PartialEq for StationReading {
    fn eq(&self, other: &Self) -> bool {
        self.station_id == other.station_id && self.timestamp == other.timestamp
    }
}

impl PartialOrd for StationReading {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
