//! IDW pressure surface over a target grid at one instant.

use crate::{
    report::{create_file, write_estimates},
    source::read_csv_file,
};
use chrono::{Datelike, NaiveDate};
use std::{collections::HashMap, path::Path};
use wps_core::{
    error::{Result as WpsResult, WpsError},
    store::{PressureStore, ReadingQuery},
};
use wps_data::idw::{interpolate, EstimatedPoint, GridPoint, ObservedPoint};

/// Parse a target grid table (`id,x,y`).
pub fn parse_grid_csv(csv_object: &str) -> WpsResult<Vec<GridPoint>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(csv_object.as_bytes());
    let mut points = Vec::new();
    for row in rdr.deserialize::<GridPoint>() {
        points.push(row?);
    }
    Ok(points)
}

/// Every station at its coordinates with the pressure it reported at
/// `date`/`hour`, or no value when it did not report.
pub fn observations_at<S: PressureStore>(store: &S, date: NaiveDate, hour: u32) -> anyhow::Result<Vec<ObservedPoint>> {
    if hour > 23 {
        return Err(WpsError::InvalidHour(hour).into());
    }
    let readings: HashMap<i64, f64> = store
        .readings(&ReadingQuery::instant(date.year(), date.month(), date.day(), hour))?
        .into_iter()
        .map(|r| (r.station_id, r.pressure))
        .collect();
    Ok(store
        .stations()?
        .into_iter()
        .map(|s| ObservedPoint {
            x: s.x,
            y: s.y,
            value: readings.get(&s.id).copied(),
        })
        .collect())
}

pub fn pressure_map<S: PressureStore>(
    store: &S,
    date: NaiveDate,
    hour: u32,
    grid: &[GridPoint],
    power: f64,
) -> anyhow::Result<Vec<EstimatedPoint>> {
    let observed = observations_at(store, date, hour)?;
    Ok(interpolate(&observed, grid, power))
}

pub fn run_pressure_map<S: PressureStore>(
    store: &S,
    date: NaiveDate,
    hour: u32,
    grid_csv: &Path,
    power: f64,
    output: &Path,
) -> anyhow::Result<()> {
    let grid = parse_grid_csv(&read_csv_file(grid_csv)?)?;
    let estimates = pressure_map(store, date, hour, &grid, power)?;
    write_estimates(create_file(output)?, &estimates)?;
    log::info!(
        "[WPS] pressure_map: {} grid points written to {}",
        estimates.len(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fixtures;
    use wps_data::idw::DEFAULT_POWER;

    fn grid() -> Vec<GridPoint> {
        parse_grid_csv(&std::fs::read_to_string(fixtures::path("grid.csv")).unwrap()).unwrap()
    }

    fn march_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 3, 1).unwrap()
    }

    #[test]
    fn grid_point_on_station_takes_its_pressure() {
        let db = fixtures::source().open().unwrap();
        let estimates = pressure_map(&db, march_first(), 4, &grid(), DEFAULT_POWER).unwrap();
        assert_eq!(estimates.len(), 3);
        assert_eq!(estimates[0].id, 1);
        assert_eq!(estimates[0].value, Some(4.8));
        let mixed = estimates[1].value.unwrap();
        assert!(mixed > 0.9 && mixed < 5.9);
    }

    #[test]
    fn missing_readings_become_empty_observations() {
        let db = fixtures::source().open().unwrap();
        let observed = observations_at(&db, march_first(), 1).unwrap();
        assert_eq!(observed.len(), 4);
        assert_eq!(observed.iter().filter(|p| p.value.is_some()).count(), 2);
    }

    #[test]
    fn no_readings_leaves_estimates_empty() {
        let db = fixtures::source().open().unwrap();
        let day = NaiveDate::from_ymd_opt(2022, 5, 1).unwrap();
        let estimates = pressure_map(&db, day, 0, &grid(), DEFAULT_POWER).unwrap();
        assert!(estimates.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn grid_table_requires_coordinates() {
        let err = parse_grid_csv("id,x\n1,2.0\n").unwrap_err();
        assert!(matches!(err, WpsError::CsvParse(_)));
    }

    #[test]
    fn run_writes_estimates() {
        let db = fixtures::source().open().unwrap();
        let dir = fixtures::scratch_dir("pressure-map");
        let output = dir.join("map.csv");
        run_pressure_map(&db, march_first(), 4, &fixtures::path("grid.csv"), 2.0, &output).unwrap();
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text.lines().next(), Some("id,x,y,pressure"));
        assert_eq!(text.lines().nth(1), Some("1,500100.0,2100200.0,4.8"));
        let _ = std::fs::remove_dir_all(dir);
    }
}
