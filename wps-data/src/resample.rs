//! Hourly resampling of raw station readings.

use chrono::{NaiveDateTime, Timelike};
use std::collections::BTreeMap;
use wps_core::reading::StationReading;

/// Truncate a timestamp to the start of its hour.
pub fn floor_hour(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(timestamp)
}

/// Average readings into one value per station and hour.
///
/// Non-finite pressures are dropped before averaging and hours without any
/// reading are not produced. The result is ordered by station, then time.
pub fn hourly_means(readings: &[StationReading]) -> Vec<StationReading> {
    let mut buckets: BTreeMap<(i64, NaiveDateTime), (f64, usize)> = BTreeMap::new();
    for reading in readings.iter().filter(|r| r.pressure.is_finite()) {
        let slot = buckets
            .entry((reading.station_id, floor_hour(reading.timestamp)))
            .or_insert((0.0, 0));
        slot.0 += reading.pressure;
        slot.1 += 1;
    }
    buckets
        .into_iter()
        .map(|((station_id, hour), (sum, n))| StationReading::new(station_id, hour, sum / n as f64))
        .collect()
}
