//! Indexed lookup over a variable calibration table.
//!
//! The table is bucketed once by station and by calendar month, so that
//! selecting the regimes valid for `(station, month)` does not rescan the
//! whole table on every query.

use crate::regime::ThresholdRegime;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
struct StationRegimes {
    rows: Vec<ThresholdRegime>,
    /// Row positions per month (index 0 = January), in table order.
    by_month: [Vec<usize>; 12],
}

/// Calibration table indexed by station id and month.
#[derive(Debug, Default, Clone)]
pub struct CalibrationIndex {
    stations: HashMap<i64, StationRegimes>,
}

impl CalibrationIndex {
    pub fn from_regimes(regimes: Vec<ThresholdRegime>) -> Self {
        let mut stations: HashMap<i64, StationRegimes> = HashMap::new();
        for regime in regimes {
            let entry = stations.entry(regime.station_id).or_default();
            let pos = entry.rows.len();
            for month in 1..=12u32 {
                if regime.covers_month(month) {
                    entry.by_month[(month - 1) as usize].push(pos);
                }
            }
            entry.rows.push(regime);
        }
        log::debug!(
            "[WPS] calibration: indexed regimes for {} stations",
            stations.len()
        );
        Self { stations }
    }

    /// Regimes of `station_id` whose month window contains `month`, in table order.
    ///
    /// Empty when the station is unknown or the month is outside 1..=12.
    pub fn regimes_for(&self, station_id: i64, month: u32) -> Vec<&ThresholdRegime> {
        if !(1..=12).contains(&month) {
            return Vec::new();
        }
        match self.stations.get(&station_id) {
            Some(entry) => entry.by_month[(month - 1) as usize]
                .iter()
                .map(|&pos| &entry.rows[pos])
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn contains_station(&self, station_id: i64) -> bool {
        self.stations.contains_key(&station_id)
    }

    /// Station ids present in the table, ascending.
    pub fn station_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.stations.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}
