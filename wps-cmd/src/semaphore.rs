//! Network classification at one date and hour.

use crate::{
    report::{band_counts, create_file, write_classification, BandCount},
    PolicyKind,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::{collections::HashSet, path::Path};
use wps_core::{
    calibration::CalibrationIndex,
    error::WpsError,
    reading::StationReading,
    station::StationMeta,
    store::{
        CalibrationStore, PressureStore, ReadingQuery, StationSelector, CONSTANT_POLICY_KEY,
        VARIABLE_POLICY_KEY,
    },
};
use wps_data::classify::{classify_readings, network_status, ClassificationReport, NetworkStatus, ThresholdPolicy};
use wps_utils::dates::format_timestamp;

#[derive(Debug, Clone, PartialEq)]
pub struct SemaphoreRequest {
    pub date: NaiveDate,
    pub hour: u32,
    pub policy: PolicyKind,
    /// Calibration key; `None` picks the policy's built-in key.
    pub key: Option<String>,
    /// Stations to classify; empty means the whole network.
    pub stations: Vec<i64>,
}

impl SemaphoreRequest {
    fn timestamp(&self) -> anyhow::Result<NaiveDateTime> {
        self.date
            .and_hms_opt(self.hour, 0, 0)
            .ok_or_else(|| WpsError::InvalidHour(self.hour).into())
    }
}

/// Classified readings at an instant together with the station table.
#[derive(Debug)]
pub struct Semaphore {
    pub timestamp: NaiveDateTime,
    pub stations: Vec<StationMeta>,
    pub report: ClassificationReport,
    pub status: NetworkStatus,
}

#[derive(Serialize)]
struct SemaphoreSummary<'a> {
    timestamp: String,
    network: NetworkStatus,
    unassigned: usize,
    counts: Vec<BandCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

fn load_policy<S>(store: &S, request: &SemaphoreRequest, stations: &[StationMeta]) -> anyhow::Result<ThresholdPolicy>
where
    S: CalibrationStore,
{
    match request.policy {
        PolicyKind::Recommended => {
            let key = request.key.as_deref().unwrap_or(CONSTANT_POLICY_KEY);
            let table = store.constant_thresholds(key)?;
            if !table.is_empty() {
                return Ok(ThresholdPolicy::constant(table));
            }
            if request.key.is_some() {
                return Err(WpsError::PolicyNotFound(key.to_string()).into());
            }
            log::debug!("[WPS] semaphore: No stored '{}' ranges, deriving from stations", key);
            Ok(ThresholdPolicy::recommended(stations))
        }
        PolicyKind::Variable => {
            let key = request.key.as_deref().unwrap_or(VARIABLE_POLICY_KEY);
            let regimes = store.regimes(key)?;
            if regimes.is_empty() {
                return Err(WpsError::PolicyNotFound(key.to_string()).into());
            }
            Ok(ThresholdPolicy::variable(CalibrationIndex::from_regimes(regimes)))
        }
    }
}

/// Classify the requested stations at the request's date and hour.
pub fn classify_instant<S>(store: &S, request: &SemaphoreRequest) -> anyhow::Result<Semaphore>
where
    S: PressureStore + CalibrationStore,
{
    let timestamp = request.timestamp()?;
    let query = ReadingQuery::instant(timestamp.year(), timestamp.month(), timestamp.day(), request.hour)
        .with_stations(StationSelector::from_ids(&request.stations));
    let stations = store.stations()?;
    let known: HashSet<i64> = stations.iter().map(|s| s.id).collect();
    let (readings, orphans): (Vec<StationReading>, Vec<StationReading>) = store
        .readings(&query)?
        .into_iter()
        .partition(|r| known.contains(&r.station_id));
    if !orphans.is_empty() {
        log::warn!(
            "[WPS] semaphore: Skipped {} readings of stations missing from the station table",
            orphans.len()
        );
    }
    let policy = load_policy(store, request, &stations)?;

    let report = classify_readings(&readings, &policy);
    let status = network_status(&stations, &readings, timestamp.year(), &request.stations);
    log::info!(
        "[WPS] semaphore: {} readings at {}, {} of {} stations without data",
        report.rows.len(),
        timestamp,
        status.without_data,
        status.stations
    );
    Ok(Semaphore {
        timestamp,
        stations,
        report,
        status,
    })
}

pub fn run_semaphore<S>(store: &S, request: &SemaphoreRequest, output: &Path, json: bool) -> anyhow::Result<()>
where
    S: PressureStore + CalibrationStore,
{
    let semaphore = classify_instant(store, request)?;
    write_classification(create_file(output)?, &semaphore.stations, &semaphore.report)?;
    log::info!("[WPS] semaphore: Wrote {}", output.display());

    if json {
        let summary = SemaphoreSummary {
            timestamp: format_timestamp(&semaphore.timestamp),
            network: semaphore.status,
            unassigned: semaphore.report.unassigned(),
            counts: band_counts(&semaphore.report),
            note: semaphore.report.rows.is_empty().then_some("no readings at this instant"),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
