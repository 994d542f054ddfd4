//! Hour-of-day band curve of one station for a month.

use crate::report::{create_file, write_threshold_curve};
use std::path::Path;
use wps_core::{
    calibration::CalibrationIndex,
    error::WpsError,
    store::{CalibrationStore, PressureStore},
};
use wps_data::threshold::{hour_grid, interpolate, ThresholdPoint, MIN_HOUR_STEP};

pub fn threshold_curve<S: PressureStore + CalibrationStore>(
    store: &S,
    station_id: i64,
    month: u32,
    step: f64,
    key: &str,
) -> anyhow::Result<Vec<ThresholdPoint>> {
    if !(1..=12).contains(&month) {
        return Err(WpsError::InvalidMonth(month).into());
    }
    let grid = hour_grid(step);
    if grid.is_empty() {
        anyhow::bail!("hour step must be at least {}, got {}", MIN_HOUR_STEP, step);
    }
    if store.station(station_id)?.is_none() {
        anyhow::bail!("station {} not found", station_id);
    }
    let index = CalibrationIndex::from_regimes(store.regimes(key)?);
    interpolate(&index, station_id, month, &grid).ok_or_else(|| {
        anyhow::anyhow!(
            "classification unavailable: station {} has no '{}' calibration for month {}",
            station_id,
            key,
            month
        )
    })
}

pub fn run_threshold_curve<S: PressureStore + CalibrationStore>(
    store: &S,
    station_id: i64,
    month: u32,
    step: f64,
    key: &str,
    output: &Path,
) -> anyhow::Result<()> {
    let points = threshold_curve(store, station_id, month, step, key)?;
    write_threshold_curve(create_file(output)?, &points)?;
    log::info!(
        "[WPS] threshold_curve: station {} month {}: {} points written to {}",
        station_id,
        month,
        points.len(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fixtures;

    #[test]
    fn hourly_curve_steps_at_regime_start() {
        let db = fixtures::source().open().unwrap();
        let points = threshold_curve(&db, 1, 3, 1.0, "variable").unwrap();
        assert_eq!(points.len(), 24);
        assert_eq!(points[5].limits.to_columns()[1], 4.0);
        assert_eq!(points[6].limits.to_columns()[1], 4.5);
        assert_eq!(points[23].limits.to_columns()[1], 4.5);
    }

    #[test]
    fn uncalibrated_station_is_an_error() {
        let db = fixtures::source().open().unwrap();
        let err = threshold_curve(&db, 4, 3, 1.0, "variable").unwrap_err();
        assert!(err.to_string().contains("classification unavailable"));
    }

    #[test]
    fn bad_step_is_rejected() {
        let db = fixtures::source().open().unwrap();
        assert!(threshold_curve(&db, 1, 3, 0.0, "variable").is_err());
        let err = threshold_curve(&db, 1, 3, 1e-15, "variable").unwrap_err();
        assert!(err.to_string().contains("hour step"));
        assert!(threshold_curve(&db, 1, 3, f64::INFINITY, "variable").is_err());
    }

    #[test]
    fn unknown_station_is_an_error() {
        let db = fixtures::source().open().unwrap();
        let err = threshold_curve(&db, 99, 3, 1.0, "variable").unwrap_err();
        assert!(err.to_string().contains("station 99 not found"));
    }

    #[test]
    fn run_writes_curve() {
        let db = fixtures::source().open().unwrap();
        let dir = fixtures::scratch_dir("threshold-curve");
        let output = dir.join("curve.csv");
        run_threshold_curve(&db, 2, 8, 0.5, "variable", &output).unwrap();
        let text = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 48);
        assert_eq!(lines[0], "hour,min1,max1,min2,max2,min3,max3,min4,max4");
        assert_eq!(lines[1], "0.00,2.0,5.0,5.0,10.0,0.5,2.0,0.0,0.5");
        let _ = std::fs::remove_dir_all(dir);
    }
}
