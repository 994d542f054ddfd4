use crate::error::{Result, WpsError};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Columns every station table must carry.
pub const STATION_COLUMNS: [&str; 7] = [
    "id",
    "name",
    "x",
    "y",
    "head_pressure",
    "diameter",
    "install_year",
];

/// A pressure monitoring station in the distribution network.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct StationMeta {
    /// Station identifier
    pub id: i64,
    /// Human-readable name of the station
    pub name: String,
    /// Projected easting
    pub x: f64,
    /// Projected northing
    pub y: f64,
    /// Positional head pressure in kg/cm²
    pub head_pressure: f64,
    /// Pipe diameter in inches
    pub diameter: i64,
    /// Year the sensor was installed
    pub install_year: i32,
    /// Free-text location (street, sector)
    pub location: Option<String>,
}

impl StationMeta {
    /// A station counts as part of the network from its install year on.
    pub fn is_active_in(&self, year: i32) -> bool {
        self.install_year <= year
    }

    /// Parse a CSV string of station metadata into a vector of StationMeta.
    ///
    /// The header must name every column in [`STATION_COLUMNS`]; an optional
    /// `location` column is read when present. Station ids must be unique.
    pub fn parse_station_csv(csv_object: &str) -> Result<Vec<StationMeta>> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_object.as_bytes());
        let headers = rdr.headers()?.clone();
        let columns = ColumnIndex::new(&headers, &STATION_COLUMNS)?;
        let location_col = headers.iter().position(|h| h.eq_ignore_ascii_case("location"));

        let mut seen = HashSet::new();
        let mut station_list: Vec<StationMeta> = Vec::new();
        for row in rdr.records() {
            let record = row?;
            let id: i64 = columns.parse(&record, "id")?;
            if !seen.insert(id) {
                return Err(WpsError::DuplicateStation(id));
            }
            let location = location_col
                .and_then(|i| record.get(i))
                .filter(|s| !s.is_empty())
                .map(String::from);
            station_list.push(StationMeta {
                id,
                name: columns.text(&record, "name").to_string(),
                x: columns.parse(&record, "x")?,
                y: columns.parse(&record, "y")?,
                head_pressure: columns.parse(&record, "head_pressure")?,
                diameter: columns.parse(&record, "diameter")?,
                install_year: columns.parse(&record, "install_year")?,
                location,
            });
        }
        Ok(station_list)
    }
}

/// Maps required column names to their positions in a header row.
pub(crate) struct ColumnIndex {
    positions: Vec<(&'static str, usize)>,
}

impl ColumnIndex {
    pub(crate) fn new(headers: &StringRecord, required: &[&'static str]) -> Result<Self> {
        let mut positions = Vec::with_capacity(required.len());
        for name in required {
            let pos = headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| WpsError::MissingColumn(name.to_string()))?;
            positions.push((*name, pos));
        }
        Ok(Self { positions })
    }

    fn position(&self, name: &str) -> usize {
        self.positions
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| *p)
            .unwrap_or(usize::MAX)
    }

    pub(crate) fn text<'r>(&self, record: &'r StringRecord, name: &str) -> &'r str {
        record.get(self.position(name)).unwrap_or("")
    }

    pub(crate) fn parse<T: std::str::FromStr>(&self, record: &StringRecord, name: &str) -> Result<T> {
        let raw = self.text(record, name);
        raw.parse::<T>().map_err(|_| {
            WpsError::InvalidFormat(format!("column '{}' has unparseable value '{}'", name, raw))
        })
    }
}
