//! Store seams consumed by the classification and aggregation engine.
//!
//! The engine never talks to a database directly; it asks these traits for
//! immutable snapshots (readings, station rows, calibration tables) once per
//! request.

use crate::{
    reading::StationReading,
    regime::{ConstantThresholds, ThresholdRegime},
    station::StationMeta,
};
use chrono::NaiveDateTime;

/// Key of the built-in constant range table.
pub const CONSTANT_POLICY_KEY: &str = "constant";

/// Key under which the variable (month/hour) regimes are kept.
pub const VARIABLE_POLICY_KEY: &str = "variable";

/// Which stations a reading query covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StationSelector {
    #[default]
    All,
    One(i64),
    Many(Vec<i64>),
}

impl StationSelector {
    /// A selection from an optional list; an empty list selects every station.
    pub fn from_ids(ids: &[i64]) -> Self {
        match ids {
            [] => StationSelector::All,
            [one] => StationSelector::One(*one),
            many => StationSelector::Many(many.to_vec()),
        }
    }
}

/// Filter for [`PressureStore::readings`]. Unset calendar fields do not filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadingQuery {
    pub stations: StationSelector,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    /// Inclusive timestamp window.
    pub period: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl ReadingQuery {
    /// Every reading of a calendar month.
    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            ..Default::default()
        }
    }

    /// Readings taken at one date and hour.
    pub fn instant(year: i32, month: u32, day: u32, hour: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            day: Some(day),
            hour: Some(hour),
            ..Default::default()
        }
    }

    pub fn with_stations(mut self, stations: StationSelector) -> Self {
        self.stations = stations;
        self
    }
}

/// The time-series store: pressure readings and station attributes.
pub trait PressureStore {
    fn readings(&self, query: &ReadingQuery) -> anyhow::Result<Vec<StationReading>>;

    fn stations(&self) -> anyhow::Result<Vec<StationMeta>>;

    fn station(&self, id: i64) -> anyhow::Result<Option<StationMeta>>;

    /// Earliest and latest reading timestamps, `None` when the store is empty.
    fn available_period(&self) -> anyhow::Result<Option<(NaiveDateTime, NaiveDateTime)>>;
}

/// The threshold-table store: named calibration sets.
pub trait CalibrationStore {
    fn policy_keys(&self) -> anyhow::Result<Vec<String>>;

    /// Variable regimes stored under `key`.
    fn regimes(&self, key: &str) -> anyhow::Result<Vec<ThresholdRegime>>;

    /// Constant ranges stored under `key`.
    fn constant_thresholds(&self, key: &str) -> anyhow::Result<Vec<ConstantThresholds>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_from_ids() {
        assert_eq!(StationSelector::from_ids(&[]), StationSelector::All);
        assert_eq!(StationSelector::from_ids(&[4]), StationSelector::One(4));
        assert_eq!(
            StationSelector::from_ids(&[4, 5]),
            StationSelector::Many(vec![4, 5])
        );
    }

    #[test]
    fn test_month_query() {
        let q = ReadingQuery::month(2022, 7);
        assert_eq!(q.year, Some(2022));
        assert_eq!(q.month, Some(7));
        assert_eq!(q.day, None);
        assert_eq!(q.stations, StationSelector::All);
    }
}
