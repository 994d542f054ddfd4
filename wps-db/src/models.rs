//! Query result model structs.

use chrono::NaiveDateTime;
use serde::Serialize;

/// First and last reading timestamps of a station.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StationPeriod {
    pub station_id: i64,
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
}

/// Calendar unit a pressure profile is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAxis {
    Hour,
    Day,
    Month,
}

impl ProfileAxis {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            ProfileAxis::Hour => "hour",
            ProfileAxis::Day => "day",
            ProfileAxis::Month => "month",
        }
    }
}

/// Minimum, mean and maximum pressure of one profile bucket.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PressureStats {
    /// Hour, day or month, depending on the profile axis.
    pub key: u32,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    pub count: u32,
}

/// Mean pressure of a station in one profile bucket.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StationMean {
    pub station_id: i64,
    pub key: u32,
    pub mean: f64,
}

/// Number of readings a station has in one month.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecordCount {
    pub station_id: i64,
    pub month: u32,
    pub count: u32,
}
