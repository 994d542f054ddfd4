use crate::{
    classify::classify_variable,
    idw::{idw_weights, interpolate, GridPoint, ObservedPoint},
    operation::{aggregate_month, FaultKind},
    threshold::StepSeries,
};
use chrono::{Datelike, NaiveDate, Timelike};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use wps_core::{
    band::Band,
    calibration::CalibrationIndex,
    reading::StationReading,
    regime::{BandLimits, ThresholdRegime},
};

fn point() -> impl Strategy<Value = (f64, f64, f64)> {
    (-100.0f64..100.0, -100.0f64..100.0, 0.0f64..10.0)
}

proptest! {
    #[test]
    fn at_most_one_band_without_overlap(
        mut cuts in proptest::collection::vec(-10.0f64..20.0, 5),
        pressure in -15.0f64..25.0,
    ) {
        cuts.sort_by(f64::total_cmp);
        let limits = BandLimits::from_columns([
            cuts[2], cuts[3], cuts[3], cuts[4], cuts[1], cuts[2], cuts[0], cuts[1],
        ]);
        let matching = Band::ALL
            .into_iter()
            .filter(|b| limits.interval(*b).contains(pressure))
            .count();
        prop_assert!(matching <= 1);
        prop_assert_eq!(classify_variable(pressure, &limits).is_some(), matching == 1);
    }

    #[test]
    fn step_holds_lower_breakpoint(
        (a, b) in (0u32..22).prop_flat_map(|a| (Just(a), (a + 1)..24u32)),
        frac in 0.01f64..0.99,
        va in 0.0f64..10.0,
        vb in 0.0f64..10.0,
    ) {
        let series = StepSeries::new([(f64::from(a), va), (f64::from(b), vb)]).unwrap();
        let x = f64::from(a) + frac * f64::from(b - a);
        prop_assert_eq!(series.value_at(x), va);
        prop_assert_eq!(series.value_at(f64::from(b)), vb);
    }

    #[test]
    fn extrapolation_is_flat(
        breakpoints in proptest::collection::btree_set(0u32..24, 1..6),
        values in proptest::collection::vec(0.0f64..10.0, 6),
        offset in 0.5f64..48.0,
    ) {
        let xs: Vec<u32> = breakpoints.into_iter().collect();
        let pairs: Vec<(f64, f64)> = xs.iter().zip(&values).map(|(x, v)| (f64::from(*x), *v)).collect();
        let series = StepSeries::new(pairs.clone()).unwrap();
        let (first, last) = (pairs[0], pairs[pairs.len() - 1]);
        prop_assert_eq!(series.value_at(first.0 - offset), first.1);
        prop_assert_eq!(series.value_at(last.0 + offset), last.1);
    }

    #[test]
    fn idw_is_exact_at_observations(
        points in proptest::collection::vec(point(), 1..8),
        pick in any::<prop::sample::Index>(),
        power in 0.5f64..4.0,
    ) {
        let observed: Vec<ObservedPoint> = points
            .iter()
            .map(|&(x, y, v)| ObservedPoint { x, y, value: Some(v) })
            .collect();
        let chosen = observed[pick.index(observed.len())];
        // first observation at the same spot wins
        let expected = observed
            .iter()
            .find(|o| o.x == chosen.x && o.y == chosen.y)
            .and_then(|o| o.value);
        let target = GridPoint { id: 0, x: chosen.x, y: chosen.y };
        let result = interpolate(&observed, &[target], power);
        prop_assert_eq!(result[0].value, expected);
    }

    #[test]
    fn idw_weights_sum_to_one(
        points in proptest::collection::vec(point(), 1..8),
        tx in -100.0f64..100.0,
        ty in -100.0f64..100.0,
        power in 0.5f64..4.0,
    ) {
        prop_assume!(points.iter().all(|&(x, y, _)| (x - tx).hypot(y - ty) > 1e-3));
        let observed: Vec<ObservedPoint> = points
            .iter()
            .map(|&(x, y, v)| ObservedPoint { x, y, value: Some(v) })
            .collect();
        let weights = idw_weights(&GridPoint { id: 0, x: tx, y: ty }, &observed, power);
        prop_assert_eq!(weights.len(), observed.len());
        prop_assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn aggregation_cells_are_bounded(
        samples in proptest::collection::vec((1i64..5, 1u32..29, 0u32..24, 0.0f64..8.0), 0..200),
    ) {
        let limits = BandLimits::from_columns([2.0, 4.0, 4.0, 9.0, 0.5, 2.0, 0.0, 0.5]);
        let calibration = CalibrationIndex::from_regimes(
            (1..5)
                .map(|station_id| ThresholdRegime {
                    station_id,
                    month_start: 1,
                    month_end: 12,
                    hour_start: 0,
                    hour_end: 24,
                    limits,
                })
                .collect(),
        );
        let readings: Vec<StationReading> = samples
            .iter()
            .map(|&(id, day, hour, p)| {
                let ts = NaiveDate::from_ymd_opt(2023, 2, day)
                    .unwrap()
                    .and_hms_opt(hour, 0, 0)
                    .unwrap();
                StationReading::new(id, ts, p)
            })
            .collect();
        let mut reporting: BTreeMap<(u32, u32), BTreeSet<i64>> = BTreeMap::new();
        for r in &readings {
            reporting
                .entry((r.timestamp.day(), r.timestamp.hour()))
                .or_default()
                .insert(r.station_id);
        }
        let by_station = StationReading::group_by_station(readings);
        let report = aggregate_month(2023, 2, &by_station, &calibration).unwrap();
        for kind in FaultKind::ALL {
            let summary = report.summary(kind);
            for day in 1..=28usize {
                for hour in 0..24usize {
                    let bound = reporting
                        .get(&(day as u32, hour as u32))
                        .map_or(0, |s| s.len()) as u32;
                    prop_assert!(summary.hourly.get(hour, day).unwrap() <= bound);
                }
                for station in report.stations.iter() {
                    prop_assert!(summary.daily.get(day, *station).unwrap() <= 24);
                }
            }
            prop_assert!(summary.faulted_stations <= report.stations.len());
        }
    }

    #[test]
    fn empty_month_is_all_zero(year in 1990i32..2100, month in 1u32..=12) {
        let report = aggregate_month(year, month, &BTreeMap::new(), &CalibrationIndex::default()).unwrap();
        let expected_days = wps_core::hour_range::HourRange::month(year, month).unwrap().days() as usize;
        prop_assert_eq!(report.days, expected_days);
        for kind in FaultKind::ALL {
            let summary = report.summary(kind);
            prop_assert_eq!(summary.hourly.days(), expected_days);
            prop_assert_eq!(summary.hourly.total(), 0);
            prop_assert_eq!(summary.faulted_stations, 0);
        }
    }
}
