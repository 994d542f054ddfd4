//! Step ("previous value") interpolation of calibration regimes.
//!
//! A station's regimes for a month are sparse rows keyed by `hour_start`.
//! Each of the eight band boundaries is interpolated on its own: the value
//! at a query point is the value of the last breakpoint at or below it.
//! Points before the first breakpoint take the first breakpoint's value and
//! points past the last take the last one's, so the curve is never empty
//! once a station has calibration rows.

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use wps_core::{
    calibration::CalibrationIndex,
    hour_range::HourRange,
    regime::{BandLimits, ThresholdRegime},
};

/// Default spacing of the hour-of-day grid, in hours.
pub const DEFAULT_HOUR_STEP: f64 = 0.2;

/// Smallest accepted spacing of the hour-of-day grid, in hours.
pub const MIN_HOUR_STEP: f64 = 1e-3;

/// Last hour of the day covered by the hour-of-day grid.
const LAST_HOUR: f64 = 23.0;

/// One boundary column as a sorted step function.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSeries {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl StepSeries {
    /// Build from `(breakpoint, value)` pairs in table order.
    ///
    /// Non-finite values are skipped. When a breakpoint repeats, the first
    /// pair wins. Returns `None` if no finite pair is left.
    pub fn new(pairs: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut points: Vec<(f64, f64)> = pairs
            .into_iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        // stable: equal breakpoints keep table order
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        points.dedup_by(|later, earlier| later.0 == earlier.0);
        if points.is_empty() {
            return None;
        }
        let (xs, ys) = points.into_iter().unzip();
        Some(Self { xs, ys })
    }

    /// Value held from the last breakpoint `<= x`, flat outside the breakpoints.
    pub fn value_at(&self, x: f64) -> f64 {
        // number of breakpoints <= x
        let held = self.xs.partition_point(|&bp| bp <= x);
        if held == 0 {
            self.ys[0]
        } else {
            self.ys[held - 1]
        }
    }
}

/// The eight boundary columns of a station-month as step functions.
#[derive(Debug, Clone, PartialEq)]
pub struct StepCurve {
    columns: [StepSeries; 8],
}

impl StepCurve {
    /// Build a curve over the `hour_start` breakpoints of `regimes`.
    ///
    /// `None` when there are no regimes or a boundary column has no finite value.
    pub fn from_regimes(regimes: &[&ThresholdRegime]) -> Option<Self> {
        if regimes.is_empty() {
            return None;
        }
        let mut columns = Vec::with_capacity(8);
        for col in 0..8 {
            let pairs = regimes
                .iter()
                .map(|r| (f64::from(r.hour_start), r.limits.to_columns()[col]));
            columns.push(StepSeries::new(pairs)?);
        }
        let columns: [StepSeries; 8] = columns.try_into().ok()?;
        Some(Self { columns })
    }

    pub fn limits_at(&self, x: f64) -> BandLimits {
        let mut values = [0.0; 8];
        for (value, series) in values.iter_mut().zip(self.columns.iter()) {
            *value = series.value_at(x);
        }
        BandLimits::from_columns(values)
    }
}

/// Interpolated band limits at one query point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdPoint {
    pub point: f64,
    pub limits: BandLimits,
}

/// Interpolated band limits at one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimedThresholds {
    pub timestamp: NaiveDateTime,
    pub limits: BandLimits,
}

/// Hour-of-day query points `0, step, 2*step, ...` up to 23 inclusive.
///
/// Empty for a step below [`MIN_HOUR_STEP`] or a non-finite one.
pub fn hour_grid(step: f64) -> Vec<f64> {
    if !(step.is_finite() && step >= MIN_HOUR_STEP) {
        return Vec::new();
    }
    let count = (LAST_HOUR / step + 1e-9).floor() as usize;
    (0..=count).map(|k| k as f64 * step).collect()
}

/// Step curve for a station in a month, `None` when it has no calibration.
pub fn station_curve(index: &CalibrationIndex, station_id: i64, month: u32) -> Option<StepCurve> {
    StepCurve::from_regimes(&index.regimes_for(station_id, month))
}

/// Interpolate a station's band limits for `month` at every query point.
///
/// Returns `None` when no calibration row matches the station and month;
/// callers report that as "classification unavailable".
pub fn interpolate(
    index: &CalibrationIndex,
    station_id: i64,
    month: u32,
    query_points: &[f64],
) -> Option<Vec<ThresholdPoint>> {
    let curve = station_curve(index, station_id, month)?;
    Some(
        query_points
            .iter()
            .map(|&point| ThresholdPoint {
                point,
                limits: curve.limits_at(point),
            })
            .collect(),
    )
}

/// Band limits for one station at a given month and hour of day.
pub fn thresholds_at(
    index: &CalibrationIndex,
    station_id: i64,
    month: u32,
    hour: u32,
) -> Option<BandLimits> {
    station_curve(index, station_id, month).map(|curve| curve.limits_at(f64::from(hour)))
}

/// Band limits for every hour of a calendar month.
///
/// The hour-of-day curve is evaluated once for hours 0..=23 and repeated
/// on every day of the month.
pub fn month_curve(
    index: &CalibrationIndex,
    station_id: i64,
    year: i32,
    month: u32,
) -> Option<Vec<TimedThresholds>> {
    let axis = HourRange::month(year, month)?;
    let curve = station_curve(index, station_id, month)?;
    let by_hour: Vec<BandLimits> = (0..24).map(|h| curve.limits_at(f64::from(h))).collect();
    Some(
        axis.map(|timestamp| TimedThresholds {
            timestamp,
            limits: by_hour[timestamp.hour() as usize],
        })
        .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wps_core::regime::ThresholdRegime;

    fn regime(hour_start: u32, min1: f64) -> ThresholdRegime {
        ThresholdRegime {
            station_id: 1,
            month_start: 1,
            month_end: 12,
            hour_start,
            hour_end: 24,
            limits: BandLimits::from_columns([min1, 4.0, 4.0, 9.0, 0.5, min1, 0.0, 0.5]),
        }
    }

    fn sample_index() -> CalibrationIndex {
        CalibrationIndex::from_regimes(vec![regime(0, 1.0), regime(6, 2.0), regime(18, 1.0)])
    }

    #[test]
    fn test_step_hold_between_breakpoints() {
        let points = interpolate(&sample_index(), 1, 5, &[10.0, 23.0]).unwrap();
        assert_eq!(points[0].limits.good.min, 2.0);
        assert_eq!(points[1].limits.good.min, 1.0);
    }

    #[test]
    fn test_value_at_breakpoint_is_its_own() {
        let curve = station_curve(&sample_index(), 1, 5).unwrap();
        assert_eq!(curve.limits_at(6.0).good.min, 2.0);
        assert_eq!(curve.limits_at(5.999).good.min, 1.0);
        assert_eq!(curve.limits_at(18.0).good.min, 1.0);
    }

    #[test]
    fn test_flat_extrapolation() {
        let index = CalibrationIndex::from_regimes(vec![regime(4, 3.0), regime(12, 2.5)]);
        let curve = station_curve(&index, 1, 1).unwrap();
        assert_eq!(curve.limits_at(0.0).good.min, 3.0);
        assert_eq!(curve.limits_at(-5.0).good.min, 3.0);
        assert_eq!(curve.limits_at(30.0).good.min, 2.5);
    }

    #[test]
    fn test_unsorted_rows_and_repeated_breakpoint() {
        let index = CalibrationIndex::from_regimes(vec![
            regime(18, 1.0),
            regime(6, 2.0),
            regime(6, 7.0),
            regime(0, 1.0),
        ]);
        let curve = station_curve(&index, 1, 1).unwrap();
        assert_eq!(curve.limits_at(7.0).good.min, 2.0);
    }

    #[test]
    fn test_non_finite_value_skipped_per_column() {
        let mut noisy = regime(6, 2.0);
        noisy.limits.over_pressure.max = f64::NAN;
        let index = CalibrationIndex::from_regimes(vec![regime(0, 1.0), noisy]);
        let limits = thresholds_at(&index, 1, 1, 10).unwrap();
        assert_eq!(limits.good.min, 2.0);
        assert_eq!(limits.over_pressure.max, 9.0);
    }

    #[test]
    fn test_missing_station_is_unavailable() {
        assert!(interpolate(&sample_index(), 42, 1, &[0.0]).is_none());
        assert!(thresholds_at(&sample_index(), 42, 1, 3).is_none());
        assert!(month_curve(&sample_index(), 42, 2022, 1).is_none());
    }

    #[test]
    fn test_hour_grid() {
        let grid = hour_grid(DEFAULT_HOUR_STEP);
        assert_eq!(grid.len(), 116);
        assert_eq!(grid[0], 0.0);
        assert!((grid[115] - 23.0).abs() < 1e-9);
        assert_eq!(hour_grid(1.0).len(), 24);
        assert!(hour_grid(0.0).is_empty());
        assert!(hour_grid(f64::NAN).is_empty());
        assert!(hour_grid(1e-15).is_empty());
        assert!(hour_grid(MIN_HOUR_STEP / 2.0).is_empty());
        assert_eq!(hour_grid(MIN_HOUR_STEP).len(), 23_001);
    }

    #[test]
    fn test_month_curve_broadcasts_hours() {
        let curve = month_curve(&sample_index(), 1, 2023, 2).unwrap();
        assert_eq!(curve.len(), 28 * 24);
        // day 1 hour 10 and day 15 hour 10 share the hour-of-day value
        assert_eq!(curve[10].limits, curve[14 * 24 + 10].limits);
        assert_eq!(curve[10].limits.good.min, 2.0);
        assert_eq!(curve[23].limits.good.min, 1.0);
        assert_eq!(curve[24].timestamp.hour(), 0);
    }
}
