//! Store trait implementations over [`Database`].

use crate::Database;
use chrono::NaiveDateTime;
use wps_core::{
    reading::StationReading,
    regime::{ConstantThresholds, ThresholdRegime},
    station::StationMeta,
    store::{CalibrationStore, PressureStore, ReadingQuery},
};

impl PressureStore for Database {
    fn readings(&self, query: &ReadingQuery) -> anyhow::Result<Vec<StationReading>> {
        self.query_readings(query)
    }

    fn stations(&self) -> anyhow::Result<Vec<StationMeta>> {
        self.query_stations()
    }

    fn station(&self, id: i64) -> anyhow::Result<Option<StationMeta>> {
        self.query_station(id)
    }

    fn available_period(&self) -> anyhow::Result<Option<(NaiveDateTime, NaiveDateTime)>> {
        self.query_available_period()
    }
}

impl CalibrationStore for Database {
    fn policy_keys(&self) -> anyhow::Result<Vec<String>> {
        self.query_policy_keys()
    }

    fn regimes(&self, key: &str) -> anyhow::Result<Vec<ThresholdRegime>> {
        self.query_regimes(key)
    }

    fn constant_thresholds(&self, key: &str) -> anyhow::Result<Vec<ConstantThresholds>> {
        self.query_constant_ranges(key, None)
    }
}
