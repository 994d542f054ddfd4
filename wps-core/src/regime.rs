use crate::{
    band::Band,
    error::{Result, WpsError},
    station::{ColumnIndex, StationMeta},
};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lower bound of the recommended operating range above head pressure, kg/cm².
pub const RECOMMENDED_MIN_PRESSURE: f64 = 1.5;

/// Upper bound of the recommended operating range above head pressure, kg/cm².
pub const RECOMMENDED_MAX_PRESSURE: f64 = 5.0;

/// Columns of a variable calibration table.
pub const REGIME_COLUMNS: [&str; 13] = [
    "station_id",
    "month_start",
    "month_end",
    "hour_start",
    "hour_end",
    "min1",
    "max1",
    "min2",
    "max2",
    "min3",
    "max3",
    "min4",
    "max4",
];

/// Columns of a constant (recommended) range table.
pub const CONSTANT_COLUMNS: [&str; 3] = ["id", "min_pressure", "max_pressure"];

/// Half-open pressure interval `[min, max)`.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, pressure: f64) -> bool {
        self.min <= pressure && pressure < self.max
    }
}

/// The four band boundary pairs of one calibration cell.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct BandLimits {
    pub good: Interval,
    pub over_pressure: Interval,
    pub under_pressure: Interval,
    pub out_of_service: Interval,
}

impl BandLimits {
    pub fn interval(&self, band: Band) -> &Interval {
        match band {
            Band::Good => &self.good,
            Band::OverPressure => &self.over_pressure,
            Band::UnderPressure => &self.under_pressure,
            Band::OutOfService => &self.out_of_service,
        }
    }

    /// Boundaries as `[min1, max1, min2, max2, min3, max3, min4, max4]`.
    pub fn to_columns(&self) -> [f64; 8] {
        [
            self.good.min,
            self.good.max,
            self.over_pressure.min,
            self.over_pressure.max,
            self.under_pressure.min,
            self.under_pressure.max,
            self.out_of_service.min,
            self.out_of_service.max,
        ]
    }

    /// Inverse of [`BandLimits::to_columns`].
    pub fn from_columns(c: [f64; 8]) -> Self {
        Self {
            good: Interval::new(c[0], c[1]),
            over_pressure: Interval::new(c[2], c[3]),
            under_pressure: Interval::new(c[4], c[5]),
            out_of_service: Interval::new(c[6], c[7]),
        }
    }
}

/// One row of a variable calibration table: the band limits of a station
/// for a month-range by hour-range window.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ThresholdRegime {
    pub station_id: i64,
    pub month_start: u32,
    pub month_end: u32,
    pub hour_start: u32,
    pub hour_end: u32,
    pub limits: BandLimits,
}

#[derive(Debug, Deserialize)]
struct RegimeRow {
    station_id: i64,
    month_start: u32,
    month_end: u32,
    hour_start: u32,
    hour_end: u32,
    min1: f64,
    max1: f64,
    min2: f64,
    max2: f64,
    min3: f64,
    max3: f64,
    min4: f64,
    max4: f64,
}

impl From<RegimeRow> for ThresholdRegime {
    fn from(r: RegimeRow) -> Self {
        ThresholdRegime {
            station_id: r.station_id,
            month_start: r.month_start,
            month_end: r.month_end,
            hour_start: r.hour_start,
            hour_end: r.hour_end,
            limits: BandLimits::from_columns([
                r.min1, r.max1, r.min2, r.max2, r.min3, r.max3, r.min4, r.max4,
            ]),
        }
    }
}

impl ThresholdRegime {
    /// Month window test, inclusive on both ends.
    pub fn covers_month(&self, month: u32) -> bool {
        self.month_start <= month && month <= self.month_end
    }

    /// Parse a variable calibration CSV (see [`REGIME_COLUMNS`]).
    ///
    /// Rows keep their file order; when regimes overlap, earlier rows take
    /// precedence downstream.
    pub fn parse_regime_csv(csv_object: &str) -> Result<Vec<ThresholdRegime>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_object.as_bytes());
        ColumnIndex::new(rdr.headers()?, &REGIME_COLUMNS)?;
        let mut regimes = Vec::new();
        for row in rdr.deserialize::<RegimeRow>() {
            let regime: ThresholdRegime = row?.into();
            if !(1..=12).contains(&regime.month_start) || !(1..=12).contains(&regime.month_end) {
                return Err(WpsError::InvalidMonth(regime.month_start.max(regime.month_end)));
            }
            if regime.hour_start > 23 {
                return Err(WpsError::InvalidHour(regime.hour_start));
            }
            regimes.push(regime);
        }
        Ok(regimes)
    }
}

/// Per-station constant `[min, max]` pair of the recommended-range policy.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct ConstantThresholds {
    pub station_id: i64,
    pub min: f64,
    pub max: f64,
}

impl ConstantThresholds {
    /// Recommended operating range: 1.5 to 5.0 kg/cm² over the station's head.
    pub fn recommended(station: &StationMeta) -> Self {
        Self {
            station_id: station.id,
            min: RECOMMENDED_MIN_PRESSURE + station.head_pressure,
            max: RECOMMENDED_MAX_PRESSURE + station.head_pressure,
        }
    }

    /// Parse a constant range table (`id,min_pressure,max_pressure`).
    ///
    /// The table must be non-empty and list each station at most once.
    pub fn parse_constant_csv(csv_object: &str) -> Result<Vec<ConstantThresholds>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_object.as_bytes());
        let columns = ColumnIndex::new(rdr.headers()?, &CONSTANT_COLUMNS)?;
        let mut seen = HashSet::new();
        let mut table = Vec::new();
        for row in rdr.records() {
            let record = row?;
            let station_id: i64 = columns.parse(&record, "id")?;
            if !seen.insert(station_id) {
                return Err(WpsError::DuplicateStation(station_id));
            }
            table.push(ConstantThresholds {
                station_id,
                min: columns.parse(&record, "min_pressure")?,
                max: columns.parse(&record, "max_pressure")?,
            });
        }
        if table.is_empty() {
            return Err(WpsError::EmptyTable);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::StationMeta;

    const REGIMES: &str = "\
station_id,month_start,month_end,hour_start,hour_end,min1,max1,min2,max2,min3,max3,min4,max4
1,1,6,0,6,1.0,3.0,3.0,9.0,0.2,1.0,0.0,0.2
1,1,6,6,18,2.0,4.0,4.0,9.0,0.2,2.0,0.0,0.2
1,7,12,0,24,1.5,3.5,3.5,9.0,0.2,1.5,0.0,0.2
";

    #[test]
    fn test_parse_regime_csv() {
        let regimes = ThresholdRegime::parse_regime_csv(REGIMES).unwrap();
        assert_eq!(regimes.len(), 3);
        assert_eq!(regimes[1].hour_start, 6);
        assert_eq!(regimes[1].limits.good, Interval::new(2.0, 4.0));
        assert_eq!(regimes[2].limits.to_columns()[2], 3.5);
        assert!(regimes[0].covers_month(1));
        assert!(regimes[0].covers_month(6));
        assert!(!regimes[0].covers_month(7));
    }

    #[test]
    fn test_regime_missing_column() {
        let csv = "station_id,month_start,month_end,hour_start,min1\n1,1,12,0,1.0\n";
        assert!(matches!(
            ThresholdRegime::parse_regime_csv(csv),
            Err(WpsError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_regime_invalid_month() {
        let csv = "\
station_id,month_start,month_end,hour_start,hour_end,min1,max1,min2,max2,min3,max3,min4,max4
1,1,13,0,24,1,2,2,3,0,1,0,0
";
        assert!(matches!(
            ThresholdRegime::parse_regime_csv(csv),
            Err(WpsError::InvalidMonth(13))
        ));
    }

    #[test]
    fn test_interval_is_half_open() {
        let interval = Interval::new(2.0, 4.0);
        assert!(interval.contains(2.0));
        assert!(interval.contains(3.999));
        assert!(!interval.contains(4.0));
        assert!(!interval.contains(1.999));
    }

    #[test]
    fn test_recommended_range_adds_head() {
        let station = StationMeta {
            id: 9,
            name: "Test".into(),
            x: 0.0,
            y: 0.0,
            head_pressure: 0.75,
            diameter: 8,
            install_year: 2010,
            location: None,
        };
        let range = ConstantThresholds::recommended(&station);
        assert_eq!(range.station_id, 9);
        assert!((range.min - 2.25).abs() < 1e-12);
        assert!((range.max - 5.75).abs() < 1e-12);
    }

    #[test]
    fn test_parse_constant_csv() {
        let csv = "id,min_pressure,max_pressure\n1,1.5,5.0\n2,2.0,6.0\n";
        let table = ConstantThresholds::parse_constant_csv(csv).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[1], ConstantThresholds { station_id: 2, min: 2.0, max: 6.0 });
    }

    #[test]
    fn test_constant_csv_validation() {
        let duplicated = "id,min_pressure,max_pressure\n1,1.5,5.0\n1,2.0,6.0\n";
        assert!(matches!(
            ConstantThresholds::parse_constant_csv(duplicated),
            Err(WpsError::DuplicateStation(1))
        ));
        let empty = "id,min_pressure,max_pressure\n";
        assert!(matches!(
            ConstantThresholds::parse_constant_csv(empty),
            Err(WpsError::EmptyTable)
        ));
        let missing = "id,min_pressure\n1,1.5\n";
        assert!(matches!(
            ConstantThresholds::parse_constant_csv(missing),
            Err(WpsError::MissingColumn(_))
        ));
    }
}
