//! CSV writers for every output table.
//!
//! All tables carry a header row; timestamps are written as ISO-8601.

use anyhow::Context;
use serde::Serialize;
use std::{collections::BTreeMap, fs::File, io, path::Path};
use wps_core::{band::Band, station::StationMeta};
use wps_data::{
    classify::ClassificationReport,
    idw::EstimatedPoint,
    operation::{DayStationGrid, FaultKind, HourDayGrid, OperationReport},
    threshold::ThresholdPoint,
};
use wps_utils::dates::format_timestamp;

/// Create `path` for writing, with the path in the error.
pub fn create_file(path: &Path) -> anyhow::Result<File> {
    File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

/// CSV writer that has already written `header`, so empty tables keep it.
fn headed_writer<W: io::Write>(writer: W, header: &[&str]) -> anyhow::Result<csv::Writer<W>> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(header)?;
    Ok(wtr)
}

const CLASSIFIED_HEADER: [&str; 12] = [
    "id",
    "name",
    "x",
    "y",
    "diameter",
    "head_pressure",
    "install_year",
    "timestamp",
    "pressure",
    "band",
    "label",
    "color",
];

#[derive(Serialize)]
struct ClassifiedRow<'a> {
    id: i64,
    name: &'a str,
    x: f64,
    y: f64,
    diameter: i64,
    head_pressure: f64,
    install_year: i32,
    timestamp: String,
    pressure: f64,
    band: &'a str,
    label: &'a str,
    color: &'a str,
}

/// Station table with the band of each classified reading.
///
/// Readings of stations missing from `stations` are left out.
pub fn write_classification<W: io::Write>(
    writer: W,
    stations: &[StationMeta],
    report: &ClassificationReport,
) -> anyhow::Result<()> {
    let by_id: BTreeMap<i64, &StationMeta> = stations.iter().map(|s| (s.id, s)).collect();
    let mut wtr = headed_writer(writer, &CLASSIFIED_HEADER)?;
    let mut skipped = 0usize;
    for row in &report.rows {
        let Some(station) = by_id.get(&row.reading.station_id) else {
            skipped += 1;
            continue;
        };
        let band = row.verdict.band();
        wtr.serialize(ClassifiedRow {
            id: station.id,
            name: &station.name,
            x: station.x,
            y: station.y,
            diameter: station.diameter,
            head_pressure: station.head_pressure,
            install_year: station.install_year,
            timestamp: format_timestamp(&row.reading.timestamp),
            pressure: row.reading.pressure,
            band: band.map_or("", |b| b.key()),
            label: row.verdict.label(),
            color: band.map_or("", |b| b.color()),
        })?;
    }
    if skipped > 0 {
        log::warn!("[WPS] report: Left out {} readings of unknown stations", skipped);
    }
    wtr.flush()?;
    Ok(())
}

/// One row per hour of day, one column per day of month.
pub fn write_hour_day_grid<W: io::Write>(writer: W, grid: &HourDayGrid) -> anyhow::Result<()> {
    let mut header = vec!["hour".to_string()];
    header.extend((1..=grid.days()).map(|d| d.to_string()));
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(&header)?;
    for hour in 0..24 {
        let mut record = vec![hour.to_string()];
        record.extend(grid.hour_row(hour).iter().map(|c| c.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// One row per day of month, one column per station.
pub fn write_day_station_grid<W: io::Write>(writer: W, grid: &DayStationGrid, days: usize) -> anyhow::Result<()> {
    let mut header = vec!["day".to_string()];
    header.extend(grid.station_ids().iter().map(|id| id.to_string()));
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(&header)?;
    for day in 1..=days {
        let mut record = vec![day.to_string()];
        if !grid.station_ids().is_empty() {
            record.extend(grid.day_row(day).iter().map(|c| c.to_string()));
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct SummaryRow {
    year: i32,
    month: u32,
    kind: &'static str,
    stations: usize,
    faulted_stations: usize,
}

/// Station counts per fault category.
pub fn write_fault_summary<W: io::Write>(writer: W, report: &OperationReport) -> anyhow::Result<()> {
    let mut wtr = headed_writer(writer, &["year", "month", "kind", "stations", "faulted_stations"])?;
    for kind in FaultKind::ALL {
        wtr.serialize(SummaryRow {
            year: report.year,
            month: report.month,
            kind: kind.key(),
            stations: report.stations.len(),
            faulted_stations: report.summary(kind).faulted_stations,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct FlagRow {
    station_id: i64,
    over_pressure: u32,
    under_pressure: u32,
}

/// Monthly 0/1 fault flag of every station.
pub fn write_station_flags<W: io::Write>(writer: W, report: &OperationReport) -> anyhow::Result<()> {
    let mut wtr = headed_writer(writer, &["station_id", "over_pressure", "under_pressure"])?;
    for id in &report.stations {
        wtr.serialize(FlagRow {
            station_id: *id,
            over_pressure: report.over.station_flags.get(id).copied().unwrap_or(0),
            under_pressure: report.under.station_flags.get(id).copied().unwrap_or(0),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct EstimateRow {
    id: i64,
    x: f64,
    y: f64,
    pressure: Option<f64>,
}

/// `id,x,y,pressure`; the pressure cell is empty when nothing was estimated.
pub fn write_estimates<W: io::Write>(writer: W, points: &[EstimatedPoint]) -> anyhow::Result<()> {
    let mut wtr = headed_writer(writer, &["id", "x", "y", "pressure"])?;
    for p in points {
        wtr.serialize(EstimateRow {
            id: p.id,
            x: p.x,
            y: p.y,
            pressure: p.value,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct CurveRow {
    hour: String,
    min1: f64,
    max1: f64,
    min2: f64,
    max2: f64,
    min3: f64,
    max3: f64,
    min4: f64,
    max4: f64,
}

/// One row per query hour with the eight band boundaries.
pub fn write_threshold_curve<W: io::Write>(writer: W, points: &[ThresholdPoint]) -> anyhow::Result<()> {
    let mut wtr = headed_writer(
        writer,
        &["hour", "min1", "max1", "min2", "max2", "min3", "max3", "min4", "max4"],
    )?;
    for p in points {
        let [min1, max1, min2, max2, min3, max3, min4, max4] = p.limits.to_columns();
        wtr.serialize(CurveRow {
            hour: format!("{:.2}", p.point),
            min1,
            max1,
            min2,
            max2,
            min3,
            max3,
            min4,
            max4,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Band counts with their display colors, for JSON output.
#[derive(Serialize)]
pub struct BandCount {
    pub band: Band,
    pub label: &'static str,
    pub color: &'static str,
    pub count: usize,
}

pub fn band_counts(report: &ClassificationReport) -> Vec<BandCount> {
    let palette = report.palette();
    Band::ALL
        .into_iter()
        .map(|band| BandCount {
            band,
            label: band.label(),
            color: palette.get(&band).copied().unwrap_or_else(|| band.color()),
            count: report.count(band),
        })
        .collect()
}
