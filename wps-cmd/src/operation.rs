//! Monthly operation report written as a directory of CSV tables.

use crate::report::{create_file, write_day_station_grid, write_fault_summary, write_hour_day_grid, write_station_flags};
use anyhow::Context;
use std::path::Path;
use wps_core::{
    calibration::CalibrationIndex,
    error::WpsError,
    reading::StationReading,
    store::{CalibrationStore, PressureStore, ReadingQuery},
};
use wps_data::operation::{aggregate_month, FaultKind, OperationReport};
use wps_utils::dates::{format_timestamp, month_within_period};

/// Aggregate `year`/`month` against the regimes stored under `key`.
///
/// Fails with [`WpsError::MonthOutOfRange`] when the month lies outside
/// the store's available period.
pub fn build_operation_report<S>(store: &S, year: i32, month: u32, key: &str) -> anyhow::Result<OperationReport>
where
    S: PressureStore + CalibrationStore,
{
    let period = store.available_period()?;
    let in_range = period
        .as_ref()
        .is_some_and(|(first, last)| month_within_period(year, month, first, last));
    if !in_range {
        let (first, last) = period
            .map(|(f, l)| (format_timestamp(&f), format_timestamp(&l)))
            .unwrap_or_default();
        return Err(WpsError::MonthOutOfRange {
            year,
            month,
            first,
            last,
        }
        .into());
    }

    let regimes = store.regimes(key)?;
    if regimes.is_empty() {
        log::warn!("[WPS] operation: No regimes under '{}'; every station tallies zero", key);
    }
    let calibration = CalibrationIndex::from_regimes(regimes);
    let readings = StationReading::group_by_station(store.readings(&ReadingQuery::month(year, month))?);
    Ok(aggregate_month(year, month, &readings, &calibration)?)
}

pub fn run_operation_report<S>(store: &S, year: i32, month: u32, key: &str, output_dir: &Path) -> anyhow::Result<()>
where
    S: PressureStore + CalibrationStore,
{
    let report = build_operation_report(store, year, month, key)?;
    write_report(&report, output_dir)
}

/// Write every table of `report` into `output_dir`, creating it if needed.
pub fn write_report(report: &OperationReport, output_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    for kind in FaultKind::ALL {
        let summary = report.summary(kind);
        let hourly = output_dir.join(format!("{}_hourly.csv", kind.key()));
        write_hour_day_grid(create_file(&hourly)?, &summary.hourly)?;
        let daily = output_dir.join(format!("{}_daily.csv", kind.key()));
        write_day_station_grid(create_file(&daily)?, &summary.daily, report.days)?;
    }
    write_fault_summary(create_file(&output_dir.join("summary.csv"))?, report)?;
    write_station_flags(create_file(&output_dir.join("station_flags.csv"))?, report)?;
    log::info!("[WPS] operation: Wrote report to {}", output_dir.display());
    Ok(())
}
