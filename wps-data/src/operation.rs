//! Monthly operation report: how often, when and where stations left the
//! good-operation band.
//!
//! Each station is tallied on its own (map) and the tallies are summed into
//! the network grids in station order (reduce), so the result does not
//! depend on how the per-station work was scheduled.

use crate::{resample::hourly_means, threshold::month_curve};
use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use wps_core::{
    calibration::CalibrationIndex,
    error::{Result, WpsError},
    hour_range::HourRange,
    reading::StationReading,
    regime::BandLimits,
};

const HOURS: usize = 24;

/// Fault category tallied by the monthly report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    OverPressure,
    UnderPressure,
}

impl FaultKind {
    pub const ALL: [FaultKind; 2] = [FaultKind::OverPressure, FaultKind::UnderPressure];

    /// Fault test for one aligned hour.
    ///
    /// Over-pressure is `p >= min2` with no upper bound; under-pressure is
    /// `p < max3` with no lower bound.
    pub fn is_fault(&self, pressure: f64, limits: &BandLimits) -> bool {
        match self {
            FaultKind::OverPressure => pressure >= limits.over_pressure.min,
            FaultKind::UnderPressure => pressure < limits.under_pressure.max,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            FaultKind::OverPressure => "over_pressure",
            FaultKind::UnderPressure => "under_pressure",
        }
    }
}

/// Hour-of-day by day-of-month counts of faulted stations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourDayGrid {
    days: usize,
    /// Row-major, one row per hour.
    cells: Vec<u32>,
}

impl HourDayGrid {
    pub fn new(days: usize) -> Self {
        Self {
            days,
            cells: vec![0; HOURS * days],
        }
    }

    pub fn days(&self) -> usize {
        self.days
    }

    /// Cell for `hour` (0..24) and day of month `day` (1-based).
    pub fn get(&self, hour: usize, day: usize) -> Option<u32> {
        if hour >= HOURS || day == 0 || day > self.days {
            return None;
        }
        self.cells.get(hour * self.days + day - 1).copied()
    }

    /// The `days` counts of one hour of the day.
    pub fn hour_row(&self, hour: usize) -> &[u32] {
        &self.cells[hour * self.days..(hour + 1) * self.days]
    }

    fn bump(&mut self, hour: usize, day: usize) {
        self.cells[hour * self.days + day - 1] += 1;
    }

    fn merge(&mut self, other: &HourDayGrid) {
        for (cell, add) in self.cells.iter_mut().zip(other.cells.iter()) {
            *cell += add;
        }
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().map(|&c| u64::from(c)).sum()
    }
}

/// Day-of-month by station counts of fault hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayStationGrid {
    station_ids: Vec<i64>,
    /// Row-major, one row per day.
    cells: Vec<u32>,
}

impl DayStationGrid {
    pub fn new(days: usize, station_ids: Vec<i64>) -> Self {
        let cells = vec![0; days * station_ids.len()];
        Self { station_ids, cells }
    }

    /// Station ids, in column order.
    pub fn station_ids(&self) -> &[i64] {
        &self.station_ids
    }

    pub fn days(&self) -> usize {
        if self.station_ids.is_empty() {
            0
        } else {
            self.cells.len() / self.station_ids.len()
        }
    }

    /// Fault hours of `station_id` on day of month `day` (1-based).
    pub fn get(&self, day: usize, station_id: i64) -> Option<u32> {
        let col = self.station_ids.iter().position(|&id| id == station_id)?;
        if day == 0 || day > self.days() {
            return None;
        }
        self.cells
            .get((day - 1) * self.station_ids.len() + col)
            .copied()
    }

    /// Counts of one day, one per station.
    pub fn day_row(&self, day: usize) -> &[u32] {
        let width = self.station_ids.len();
        &self.cells[(day - 1) * width..day * width]
    }

    fn set_column(&mut self, col: usize, hours_by_day: &[u32]) {
        let width = self.station_ids.len();
        for (day, hours) in hours_by_day.iter().enumerate() {
            self.cells[day * width + col] = *hours;
        }
    }
}

/// The three reductions of one fault category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultSummary {
    pub kind: FaultKind,
    /// Stations with at least one fault hour in the month.
    pub faulted_stations: usize,
    /// 1 when the station had a fault hour in the month, else 0.
    pub station_flags: BTreeMap<i64, u32>,
    pub hourly: HourDayGrid,
    pub daily: DayStationGrid,
}

impl FaultSummary {
    fn new(kind: FaultKind, days: usize, station_ids: Vec<i64>) -> Self {
        Self {
            kind,
            faulted_stations: 0,
            station_flags: BTreeMap::new(),
            hourly: HourDayGrid::new(days),
            daily: DayStationGrid::new(days, station_ids),
        }
    }
}

/// Monthly operation report of the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    pub year: i32,
    pub month: u32,
    pub days: usize,
    /// Stations with pressure data in the input, ascending.
    pub stations: Vec<i64>,
    pub over: FaultSummary,
    pub under: FaultSummary,
}

impl OperationReport {
    pub fn summary(&self, kind: FaultKind) -> &FaultSummary {
        match kind {
            FaultKind::OverPressure => &self.over,
            FaultKind::UnderPressure => &self.under,
        }
    }
}

/// One station's contribution to one fault category.
#[derive(Debug, Clone)]
struct KindTally {
    hour_day: HourDayGrid,
    hours_by_day: Vec<u32>,
}

impl KindTally {
    fn new(days: usize) -> Self {
        Self {
            hour_day: HourDayGrid::new(days),
            hours_by_day: vec![0; days],
        }
    }

    fn flagged(&self) -> bool {
        self.hours_by_day.iter().any(|&h| h > 0)
    }
}

#[derive(Debug, Clone)]
struct StationTally {
    station_id: i64,
    over: KindTally,
    under: KindTally,
}

fn tally_station(
    station_id: i64,
    readings: &[StationReading],
    year: i32,
    month: u32,
    days: usize,
    calibration: &CalibrationIndex,
) -> StationTally {
    let mut tally = StationTally {
        station_id,
        over: KindTally::new(days),
        under: KindTally::new(days),
    };
    let curve: BTreeMap<NaiveDateTime, BandLimits> = match month_curve(calibration, station_id, year, month) {
        Some(curve) => curve.into_iter().map(|t| (t.timestamp, t.limits)).collect(),
        None => {
            log::warn!(
                "[WPS] operation: station {} has no calibration for month {}",
                station_id,
                month
            );
            return tally;
        }
    };
    // inner join of hourly pressures with the hourly threshold axis
    for reading in hourly_means(readings) {
        let Some(limits) = curve.get(&reading.timestamp) else {
            continue;
        };
        let (day, hour) = reading.day_hour();
        let (day, hour) = (day as usize, hour as usize);
        for (kind, kind_tally) in [
            (FaultKind::OverPressure, &mut tally.over),
            (FaultKind::UnderPressure, &mut tally.under),
        ] {
            if kind.is_fault(reading.pressure, limits) {
                kind_tally.hour_day.bump(hour, day);
                kind_tally.hours_by_day[day - 1] += 1;
            }
        }
    }
    tally
}

fn merge_kind(summary: &mut FaultSummary, col: usize, station_id: i64, tally: &KindTally) {
    let flag = u32::from(tally.flagged());
    summary.faulted_stations += flag as usize;
    summary.station_flags.insert(station_id, flag);
    summary.hourly.merge(&tally.hour_day);
    summary.daily.set_column(col, &tally.hours_by_day);
}

/// Aggregate one calendar month of pressures against the calibration table.
///
/// Readings outside `year`/`month` are ignored. A station with no
/// calibration for the month contributes zeros. An empty input yields
/// all-zero grids sized for the month.
pub fn aggregate_month(
    year: i32,
    month: u32,
    pressures_by_station: &BTreeMap<i64, Vec<StationReading>>,
    calibration: &CalibrationIndex,
) -> Result<OperationReport> {
    let axis = HourRange::month(year, month).ok_or(WpsError::InvalidMonth(month))?;
    let days = axis.days() as usize;
    let stations: Vec<(i64, &Vec<StationReading>)> =
        pressures_by_station.iter().map(|(id, r)| (*id, r)).collect();
    let station_ids: Vec<i64> = stations.iter().map(|(id, _)| *id).collect();

    let tallies: Vec<StationTally> = stations
        .par_iter()
        .map(|(id, readings)| tally_station(*id, readings, year, month, days, calibration))
        .collect();

    let mut over = FaultSummary::new(FaultKind::OverPressure, days, station_ids.clone());
    let mut under = FaultSummary::new(FaultKind::UnderPressure, days, station_ids.clone());
    for (col, tally) in tallies.iter().enumerate() {
        merge_kind(&mut over, col, tally.station_id, &tally.over);
        merge_kind(&mut under, col, tally.station_id, &tally.under);
    }
    log::info!(
        "[WPS] operation: {}-{:02} over {} stations, {} over-pressured, {} under-pressured",
        year,
        month,
        station_ids.len(),
        over.faulted_stations,
        under.faulted_stations
    );
    Ok(OperationReport {
        year,
        month,
        days,
        stations: station_ids,
        over,
        under,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wps_core::regime::ThresholdRegime;

    fn calibration() -> CalibrationIndex {
        // good [2,4), over from 4, under below 2
        let limits = BandLimits::from_columns([2.0, 4.0, 4.0, 9.0, 0.5, 2.0, 0.0, 0.5]);
        CalibrationIndex::from_regimes(
            [1, 2]
                .into_iter()
                .map(|station_id| ThresholdRegime {
                    station_id,
                    month_start: 1,
                    month_end: 12,
                    hour_start: 0,
                    hour_end: 24,
                    limits,
                })
                .collect(),
        )
    }

    fn reading(station_id: i64, day: u32, hour: u32, pressure: f64) -> StationReading {
        let ts = NaiveDate::from_ymd_opt(2023, 2, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        StationReading::new(station_id, ts, pressure)
    }

    #[test]
    fn test_empty_input_gives_zero_grids() {
        let report = aggregate_month(2023, 2, &BTreeMap::new(), &calibration()).unwrap();
        assert_eq!(report.days, 28);
        for kind in FaultKind::ALL {
            let summary = report.summary(kind);
            assert_eq!(summary.faulted_stations, 0);
            assert_eq!(summary.hourly.days(), 28);
            assert_eq!(summary.hourly.total(), 0);
            assert_eq!(summary.hourly.get(23, 28), Some(0));
            assert!(summary.daily.station_ids().is_empty());
        }
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        assert!(matches!(
            aggregate_month(2023, 13, &BTreeMap::new(), &calibration()),
            Err(WpsError::InvalidMonth(13))
        ));
    }

    #[test]
    fn test_fault_tallies() {
        let readings = vec![
            reading(1, 1, 8, 4.5),
            reading(1, 1, 9, 5.0),
            reading(1, 2, 8, 3.0),
            reading(2, 1, 8, 4.0),
            reading(2, 3, 2, 1.0),
            // no calibration: contributes zeros
            reading(7, 1, 8, 9.0),
        ];
        let by_station = StationReading::group_by_station(readings);
        let report = aggregate_month(2023, 2, &by_station, &calibration()).unwrap();
        assert_eq!(report.stations, vec![1, 2, 7]);

        let over = &report.over;
        assert_eq!(over.faulted_stations, 2);
        assert_eq!(over.station_flags[&7], 0);
        assert_eq!(over.hourly.get(8, 1), Some(2));
        assert_eq!(over.hourly.get(9, 1), Some(1));
        assert_eq!(over.hourly.get(8, 2), Some(0));
        assert_eq!(over.daily.get(1, 1), Some(2));
        assert_eq!(over.daily.get(1, 2), Some(1));
        assert_eq!(over.daily.get(1, 7), Some(0));

        let under = &report.under;
        assert_eq!(under.faulted_stations, 1);
        assert_eq!(under.station_flags[&2], 1);
        assert_eq!(under.hourly.get(2, 3), Some(1));
        assert_eq!(under.daily.day_row(3), &[0, 1, 0]);
    }

    #[test]
    fn test_sub_hourly_readings_are_averaged_first() {
        let ts = |minute| {
            NaiveDate::from_ymd_opt(2023, 2, 5)
                .unwrap()
                .and_hms_opt(10, minute, 0)
                .unwrap()
        };
        // mean 3.5 stays in the good band although one sample is over
        let readings = vec![
            StationReading::new(1, ts(0), 2.5),
            StationReading::new(1, ts(30), 4.5),
        ];
        let by_station = StationReading::group_by_station(readings);
        let report = aggregate_month(2023, 2, &by_station, &calibration()).unwrap();
        assert_eq!(report.over.faulted_stations, 0);
        assert_eq!(report.under.faulted_stations, 0);
    }

    #[test]
    fn test_readings_outside_month_are_ignored() {
        let march = NaiveDate::from_ymd_opt(2023, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let by_station = StationReading::group_by_station(vec![StationReading::new(1, march, 9.0)]);
        let report = aggregate_month(2023, 2, &by_station, &calibration()).unwrap();
        assert_eq!(report.over.faulted_stations, 0);
        assert_eq!(report.over.daily.days(), 28);
    }
}
