//! CSV data loading functions for populating the database.
//!
//! # CSV Formats
//!
//! - **Stations** (has headers): `id,name,x,y,head_pressure,diameter,install_year[,location]`
//! - **Pressures** (has headers, wide): `timestamp,<station id>,<station id>,...`
//! - **Constant ranges** (has headers): `id,min_pressure,max_pressure`
//! - **Variable regimes** (has headers): `station_id,month_start,month_end,hour_start,hour_end,min1,max1,...,min4,max4`

use crate::Database;
use anyhow::Context;
use chrono::{Datelike, Timelike};
use rusqlite::{params, Connection};
use wps_core::{
    error::WpsError,
    regime::{ConstantThresholds, ThresholdRegime, RECOMMENDED_MAX_PRESSURE, RECOMMENDED_MIN_PRESSURE},
    station::StationMeta,
    store::CONSTANT_POLICY_KEY,
};
use wps_utils::dates::{format_store_timestamp, parse_timestamp};

fn insert_stations(conn: &Connection, stations: &[StationMeta]) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO stations (id, name, x, y, head_pressure, diameter, install_year, location)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for s in stations {
        stmt.execute(params![
            s.id,
            s.name,
            s.x,
            s.y,
            s.head_pressure,
            s.diameter,
            s.install_year,
            s.location
        ])?;
    }
    Ok(())
}

/// Rebuild the default constant table from the current station table.
///
/// Each station gets its recommended range above its head pressure.
fn rebuild_default_ranges(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM ranges WHERE policy_key = ?1", params![CONSTANT_POLICY_KEY])?;
    conn.execute(
        "INSERT INTO ranges (policy_key, station_id, min_pressure, max_pressure)
         SELECT ?1, id, ?2 + head_pressure, ?3 + head_pressure FROM stations",
        params![CONSTANT_POLICY_KEY, RECOMMENDED_MIN_PRESSURE, RECOMMENDED_MAX_PRESSURE],
    )
}

impl Database {
    /// Load station metadata, replacing rows with the same id.
    ///
    /// The default constant table is rebuilt for the merged station table.
    pub fn load_stations(&self, csv_data: &str) -> anyhow::Result<usize> {
        let stations = StationMeta::parse_station_csv(csv_data)?;
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;
        insert_stations(&tx, &stations)?;
        rebuild_default_ranges(&tx)?;
        tx.commit()?;
        log::info!("[WPS] loader: Loaded {} stations", stations.len());
        Ok(stations.len())
    }

    /// Replace the whole station table and rebuild the default constant table.
    ///
    /// The new table must carry every required column, list each station
    /// once and have at least one row; otherwise the current table is kept.
    pub fn replace_stations(&self, csv_data: &str) -> anyhow::Result<usize> {
        let stations = StationMeta::parse_station_csv(csv_data)?;
        if stations.is_empty() {
            return Err(WpsError::EmptyTable.into());
        }
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM stations", [])?;
        insert_stations(&tx, &stations)?;
        rebuild_default_ranges(&tx)?;
        tx.commit()?;
        log::info!("[WPS] loader: Replaced station table with {} stations", stations.len());
        Ok(stations.len())
    }

    /// Load pressures from a wide table: a timestamp column followed by one
    /// column per station id.
    ///
    /// Empty or non-numeric cells are skipped. Returns the number of readings stored.
    pub fn load_pressures_wide(&self, csv_data: &str) -> anyhow::Result<usize> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(csv_data.as_bytes());
        let headers = rdr.headers()?.clone();
        let station_ids = headers
            .iter()
            .skip(1)
            .map(|h| {
                h.parse::<i64>().map_err(|_| {
                    WpsError::InvalidFormat(format!("pressure column '{}' is not a station id", h))
                })
            })
            .collect::<Result<Vec<i64>, _>>()?;
        if station_ids.is_empty() {
            return Err(WpsError::InvalidFormat("pressure table has no station columns".into()).into());
        }

        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;
        let mut count = 0usize;
        let mut skipped = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO pressures (station_id, timestamp, year, month, day, hour, value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (line, result) in rdr.records().enumerate() {
                let r = result?;
                let raw = r.get(0).unwrap_or("");
                let ts = parse_timestamp(raw)
                    .with_context(|| format!("pressure row {} has a bad timestamp", line + 1))?;
                let stamp = format_store_timestamp(&ts);
                for (col, station_id) in station_ids.iter().enumerate() {
                    let value = r
                        .get(col + 1)
                        .and_then(|s| s.parse::<f64>().ok())
                        .filter(|v| v.is_finite());
                    let Some(value) = value else {
                        skipped += 1;
                        continue;
                    };
                    stmt.execute(params![
                        station_id,
                        stamp,
                        ts.year(),
                        ts.month(),
                        ts.day(),
                        ts.hour(),
                        value
                    ])?;
                    count += 1;
                }
            }
        }
        tx.commit()?;
        log::info!(
            "[WPS] loader: Loaded {} pressures for {} stations, skipped {} missing",
            count,
            station_ids.len(),
            skipped
        );
        Ok(count)
    }

    /// Whether any constant or variable table is stored under `key`.
    pub fn policy_exists(&self, key: &str) -> anyhow::Result<bool> {
        let conn = self.conn.borrow();
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM ranges WHERE policy_key = ?1)
                 OR EXISTS(SELECT 1 FROM regimes WHERE policy_key = ?1)",
            params![key],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Store a validated constant range table under a new key.
    ///
    /// The default key is derived from the station table and cannot be written.
    pub fn insert_constant_ranges(&self, key: &str, table: &[ConstantThresholds]) -> anyhow::Result<usize> {
        if key == CONSTANT_POLICY_KEY {
            return Err(WpsError::ProtectedPolicy(key.to_string()).into());
        }
        if self.policy_exists(key)? {
            return Err(WpsError::PolicyExists(key.to_string()).into());
        }
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO ranges (policy_key, station_id, min_pressure, max_pressure)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for t in table {
                stmt.execute(params![key, t.station_id, t.min, t.max])?;
            }
        }
        tx.commit()?;
        log::info!("[WPS] loader: Stored {} ranges under '{}'", table.len(), key);
        Ok(table.len())
    }

    /// Parse and store a constant range table (`id,min_pressure,max_pressure`).
    ///
    /// Rejects the default key, an existing key, missing columns and repeated
    /// station ids.
    pub fn add_constant_ranges(&self, key: &str, csv_data: &str) -> anyhow::Result<usize> {
        let table = ConstantThresholds::parse_constant_csv(csv_data)?;
        self.insert_constant_ranges(key, &table)
    }

    /// Parse and store a variable regime table under a new key.
    ///
    /// Row order is kept; it decides precedence between overlapping regimes.
    pub fn add_regimes(&self, key: &str, csv_data: &str) -> anyhow::Result<usize> {
        if key == CONSTANT_POLICY_KEY {
            return Err(WpsError::ProtectedPolicy(key.to_string()).into());
        }
        if self.policy_exists(key)? {
            return Err(WpsError::PolicyExists(key.to_string()).into());
        }
        let regimes = ThresholdRegime::parse_regime_csv(csv_data)?;
        if regimes.is_empty() {
            return Err(WpsError::EmptyTable.into());
        }
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO regimes (policy_key, position, station_id, month_start, month_end,
                    hour_start, hour_end, min1, max1, min2, max2, min3, max3, min4, max4)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            )?;
            for (position, r) in regimes.iter().enumerate() {
                let c = r.limits.to_columns();
                stmt.execute(params![
                    key,
                    position as i64,
                    r.station_id,
                    r.month_start,
                    r.month_end,
                    r.hour_start,
                    r.hour_end,
                    c[0],
                    c[1],
                    c[2],
                    c[3],
                    c[4],
                    c[5],
                    c[6],
                    c[7]
                ])?;
            }
        }
        tx.commit()?;
        log::info!("[WPS] loader: Stored {} regimes under '{}'", regimes.len(), key);
        Ok(regimes.len())
    }

    /// Delete every table stored under `key`. The default constant table is protected.
    pub fn delete_policy(&self, key: &str) -> anyhow::Result<usize> {
        if key == CONSTANT_POLICY_KEY {
            return Err(WpsError::ProtectedPolicy(key.to_string()).into());
        }
        if !self.policy_exists(key)? {
            return Err(WpsError::PolicyNotFound(key.to_string()).into());
        }
        let conn = self.conn.borrow();
        let removed = conn.execute("DELETE FROM ranges WHERE policy_key = ?1", params![key])?
            + conn.execute("DELETE FROM regimes WHERE policy_key = ?1", params![key])?;
        log::info!("[WPS] loader: Deleted {} rows under '{}'", removed, key);
        Ok(removed)
    }
}
