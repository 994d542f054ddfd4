//! Station classification into operating bands.
//!
//! Two policies are supported. The constant ("recommended range") policy
//! compares a pressure against a per-station `[min, max]` pair and never
//! yields [`Band::OutOfService`]. The variable policy tests the four
//! month/hour dependent bands in priority order with `min <= p < max`;
//! a pressure that fits none of them is left unclassified.

use crate::threshold::thresholds_at;
use chrono::{Datelike, Timelike};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use wps_core::{
    band::Band,
    calibration::CalibrationIndex,
    reading::StationReading,
    regime::{BandLimits, ConstantThresholds},
    station::StationMeta,
};

/// Outcome of classifying one station reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "band")]
pub enum Verdict {
    Classified(Band),
    /// Thresholds exist but the pressure fits no band.
    Unclassified,
    /// No thresholds for the station at that time.
    Unavailable,
}

impl Verdict {
    pub fn band(&self) -> Option<Band> {
        match self {
            Verdict::Classified(band) => Some(*band),
            _ => None,
        }
    }

    /// Report label; empty when no band applies.
    pub fn label(&self) -> &'static str {
        self.band().map_or("", |b| b.label())
    }
}

/// Constant policy: inside `[min, max]` is good, above is over-pressure,
/// below is under-pressure. `None` for a non-finite pressure.
pub fn classify_constant(pressure: f64, thresholds: &ConstantThresholds) -> Option<Band> {
    if !pressure.is_finite() {
        None
    } else if pressure > thresholds.max {
        Some(Band::OverPressure)
    } else if pressure < thresholds.min {
        Some(Band::UnderPressure)
    } else {
        Some(Band::Good)
    }
}

/// Variable policy: first band in priority order whose interval holds the pressure.
pub fn classify_variable(pressure: f64, limits: &BandLimits) -> Option<Band> {
    Band::ALL
        .into_iter()
        .find(|band| limits.interval(*band).contains(pressure))
}

/// Threshold source used for a classification run.
#[derive(Debug, Clone)]
pub enum ThresholdPolicy {
    Constant(HashMap<i64, ConstantThresholds>),
    Variable(CalibrationIndex),
}

impl ThresholdPolicy {
    pub fn constant(table: Vec<ConstantThresholds>) -> Self {
        ThresholdPolicy::Constant(table.into_iter().map(|t| (t.station_id, t)).collect())
    }

    /// Recommended ranges derived from each station's head pressure.
    pub fn recommended(stations: &[StationMeta]) -> Self {
        Self::constant(stations.iter().map(ConstantThresholds::recommended).collect())
    }

    pub fn variable(index: CalibrationIndex) -> Self {
        ThresholdPolicy::Variable(index)
    }

    /// Classify one reading; month and hour come from its timestamp.
    pub fn verdict(&self, reading: &StationReading) -> Verdict {
        if !reading.pressure.is_finite() {
            return Verdict::Unclassified;
        }
        match self {
            ThresholdPolicy::Constant(table) => match table.get(&reading.station_id) {
                Some(thresholds) => classify_constant(reading.pressure, thresholds)
                    .map_or(Verdict::Unclassified, Verdict::Classified),
                None => Verdict::Unavailable,
            },
            ThresholdPolicy::Variable(index) => {
                let month = reading.timestamp.month();
                let hour = reading.timestamp.hour();
                match thresholds_at(index, reading.station_id, month, hour) {
                    Some(limits) => classify_variable(reading.pressure, &limits)
                        .map_or(Verdict::Unclassified, Verdict::Classified),
                    None => Verdict::Unavailable,
                }
            }
        }
    }
}

/// A reading together with its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassifiedReading {
    pub reading: StationReading,
    pub verdict: Verdict,
}

/// Batch classification result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub rows: Vec<ClassifiedReading>,
    /// Count per band over `rows`; every band is present, possibly with zero.
    pub counts: BTreeMap<Band, usize>,
}

impl ClassificationReport {
    /// Display color of every band.
    pub fn palette(&self) -> BTreeMap<Band, &'static str> {
        Band::ALL.into_iter().map(|b| (b, b.color())).collect()
    }

    pub fn count(&self, band: Band) -> usize {
        self.counts.get(&band).copied().unwrap_or(0)
    }

    /// Rows for which no band could be assigned.
    pub fn unassigned(&self) -> usize {
        self.rows.iter().filter(|r| r.verdict.band().is_none()).count()
    }
}

/// Classify a table of station readings under `policy`.
pub fn classify_readings(readings: &[StationReading], policy: &ThresholdPolicy) -> ClassificationReport {
    let mut counts: BTreeMap<Band, usize> = Band::ALL.into_iter().map(|b| (b, 0)).collect();
    let rows: Vec<ClassifiedReading> = readings
        .iter()
        .map(|reading| {
            let verdict = policy.verdict(reading);
            if let Some(band) = verdict.band() {
                *counts.entry(band).or_insert(0) += 1;
            }
            ClassifiedReading {
                reading: *reading,
                verdict,
            }
        })
        .collect();
    let unavailable = rows
        .iter()
        .filter(|r| r.verdict == Verdict::Unavailable)
        .count();
    if unavailable > 0 {
        log::warn!(
            "[WPS] classify: {} of {} readings have no thresholds",
            unavailable,
            rows.len()
        );
    }
    ClassificationReport { rows, counts }
}

/// How many stations the network has at an instant and how many of them
/// reported no reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkStatus {
    pub stations: usize,
    pub without_data: usize,
}

/// Network status for `year`.
///
/// With an empty `selection` the network is every station installed by
/// `year`; otherwise it is the selection itself.
pub fn network_status(
    stations: &[StationMeta],
    readings: &[StationReading],
    year: i32,
    selection: &[i64],
) -> NetworkStatus {
    let reporting: HashSet<i64> = readings
        .iter()
        .filter(|r| r.pressure.is_finite())
        .map(|r| r.station_id)
        .collect();
    let network: Vec<i64> = if selection.is_empty() {
        stations
            .iter()
            .filter(|s| s.is_active_in(year))
            .map(|s| s.id)
            .collect()
    } else {
        selection.to_vec()
    };
    let without_data = network.iter().filter(|id| !reporting.contains(id)).count();
    NetworkStatus {
        stations: network.len(),
        without_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wps_core::regime::ThresholdRegime;

    fn reading(station_id: i64, month: u32, hour: u32, pressure: f64) -> StationReading {
        let ts = NaiveDate::from_ymd_opt(2022, month, 10)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        StationReading::new(station_id, ts, pressure)
    }

    fn limits() -> BandLimits {
        BandLimits::from_columns([2.0, 4.0, 4.0, 8.0, 0.5, 2.0, 0.0, 0.5])
    }

    #[test]
    fn test_constant_policy_scenario() {
        let t = ConstantThresholds {
            station_id: 1,
            min: 2.0,
            max: 4.0,
        };
        assert_eq!(classify_constant(4.5, &t), Some(Band::OverPressure));
        assert_eq!(classify_constant(1.5, &t), Some(Band::UnderPressure));
        assert_eq!(classify_constant(3.0, &t), Some(Band::Good));
        // both bounds are inside the good band
        assert_eq!(classify_constant(2.0, &t), Some(Band::Good));
        assert_eq!(classify_constant(4.0, &t), Some(Band::Good));
    }

    #[test]
    fn test_constant_policy_rejects_non_finite() {
        let t = ConstantThresholds {
            station_id: 1,
            min: 2.0,
            max: 4.0,
        };
        assert_eq!(classify_constant(f64::NAN, &t), None);
        assert_eq!(classify_constant(f64::INFINITY, &t), None);
        assert_eq!(classify_constant(f64::NEG_INFINITY, &t), None);
    }

    #[test]
    fn test_variable_policy_bands() {
        let l = limits();
        assert_eq!(classify_variable(3.0, &l), Some(Band::Good));
        assert_eq!(classify_variable(4.0, &l), Some(Band::OverPressure));
        assert_eq!(classify_variable(1.0, &l), Some(Band::UnderPressure));
        assert_eq!(classify_variable(0.1, &l), Some(Band::OutOfService));
        assert_eq!(classify_variable(8.0, &l), None);
        assert_eq!(classify_variable(-1.0, &l), None);
    }

    #[test]
    fn test_overlapping_bands_take_priority_order() {
        let overlapping = BandLimits::from_columns([1.0, 5.0, 3.0, 9.0, 0.0, 4.0, 0.0, 9.0]);
        assert_eq!(classify_variable(3.5, &overlapping), Some(Band::Good));
        assert_eq!(classify_variable(6.0, &overlapping), Some(Band::OverPressure));
        assert_eq!(classify_variable(0.5, &overlapping), Some(Band::UnderPressure));
    }

    #[test]
    fn test_batch_counts_and_unavailable() {
        let policy = ThresholdPolicy::constant(vec![
            ConstantThresholds { station_id: 1, min: 2.0, max: 4.0 },
            ConstantThresholds { station_id: 2, min: 2.0, max: 4.0 },
            ConstantThresholds { station_id: 3, min: 2.0, max: 4.0 },
        ]);
        let readings = vec![
            reading(1, 3, 8, 3.0),
            reading(2, 3, 8, 5.0),
            reading(3, 3, 8, 2.5),
            reading(4, 3, 8, 2.5),
        ];
        let report = classify_readings(&readings, &policy);
        assert_eq!(report.count(Band::Good), 2);
        assert_eq!(report.count(Band::OverPressure), 1);
        assert_eq!(report.count(Band::UnderPressure), 0);
        assert_eq!(report.count(Band::OutOfService), 0);
        assert_eq!(report.counts.len(), 4);
        assert_eq!(report.rows[3].verdict, Verdict::Unavailable);
        assert_eq!(report.unassigned(), 1);
        assert_eq!(report.palette()[&Band::OutOfService], "#8e44ad");
    }

    #[test]
    fn test_variable_policy_uses_reading_time() {
        let index = CalibrationIndex::from_regimes(vec![
            ThresholdRegime {
                station_id: 1,
                month_start: 1,
                month_end: 6,
                hour_start: 0,
                hour_end: 12,
                limits: limits(),
            },
            ThresholdRegime {
                station_id: 1,
                month_start: 1,
                month_end: 6,
                hour_start: 12,
                hour_end: 24,
                limits: BandLimits::from_columns([3.0, 5.0, 5.0, 8.0, 0.5, 3.0, 0.0, 0.5]),
            },
        ]);
        let policy = ThresholdPolicy::variable(index);
        assert_eq!(
            policy.verdict(&reading(1, 2, 6, 2.5)),
            Verdict::Classified(Band::Good)
        );
        assert_eq!(
            policy.verdict(&reading(1, 2, 14, 2.5)),
            Verdict::Classified(Band::UnderPressure)
        );
        assert_eq!(policy.verdict(&reading(1, 2, 14, 9.0)), Verdict::Unclassified);
        // no regime covers July
        assert_eq!(policy.verdict(&reading(1, 7, 14, 2.5)), Verdict::Unavailable);
    }

    #[test]
    fn test_recommended_policy() {
        let stations = vec![StationMeta {
            id: 5,
            name: "Norte".into(),
            x: 0.0,
            y: 0.0,
            head_pressure: 0.5,
            diameter: 12,
            install_year: 2015,
            location: None,
        }];
        let policy = ThresholdPolicy::recommended(&stations);
        assert_eq!(
            policy.verdict(&reading(5, 1, 1, 1.9)),
            Verdict::Classified(Band::UnderPressure)
        );
        assert_eq!(
            policy.verdict(&reading(5, 1, 1, 5.5)),
            Verdict::Classified(Band::Good)
        );
        assert_eq!(
            policy.verdict(&reading(5, 1, 1, 5.6)),
            Verdict::Classified(Band::OverPressure)
        );
    }

    #[test]
    fn test_network_status() {
        let station = |id, install_year| StationMeta {
            id,
            name: format!("S{}", id),
            x: 0.0,
            y: 0.0,
            head_pressure: 0.0,
            diameter: 8,
            install_year,
            location: None,
        };
        let stations = vec![station(1, 2010), station(2, 2015), station(3, 2030)];
        let readings = vec![reading(1, 1, 0, 2.0)];
        let status = network_status(&stations, &readings, 2022, &[]);
        assert_eq!(status, NetworkStatus { stations: 2, without_data: 1 });
        let selected = network_status(&stations, &readings, 2022, &[1, 3]);
        assert_eq!(selected, NetworkStatus { stations: 2, without_data: 1 });
    }
}
