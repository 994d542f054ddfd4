//! Typed query methods for retrieving stations, pressures and calibration
//! tables from the database.
//!
//! Pressure timestamps are returned as [`chrono::NaiveDateTime`]; the text
//! layout used for storage never leaves this module.

use crate::models::{PressureStats, ProfileAxis, RecordCount, StationMean, StationPeriod};
use crate::Database;
use chrono::NaiveDateTime;
use rusqlite::{params, params_from_iter, types::Type, types::Value, Row};
use wps_core::{
    reading::StationReading,
    regime::{BandLimits, ConstantThresholds, ThresholdRegime},
    station::StationMeta,
    store::{ReadingQuery, StationSelector},
};
use wps_utils::dates::{format_store_timestamp, STORE_TIMESTAMP_FORMAT};

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, STORE_TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn station_from_row(row: &Row<'_>) -> rusqlite::Result<StationMeta> {
    Ok(StationMeta {
        id: row.get(0)?,
        name: row.get(1)?,
        x: row.get(2)?,
        y: row.get(3)?,
        head_pressure: row.get(4)?,
        diameter: row.get(5)?,
        install_year: row.get(6)?,
        location: row.get(7)?,
    })
}

const STATION_FIELDS: &str = "id, name, x, y, head_pressure, diameter, install_year, location";

/// Append a station filter on `column` to `clauses`/`values`.
fn push_selector(column: &str, selector: &StationSelector, clauses: &mut Vec<String>, values: &mut Vec<Value>) {
    match selector {
        StationSelector::All => {}
        StationSelector::One(id) => {
            clauses.push(format!("{} = ?", column));
            values.push(Value::Integer(*id));
        }
        StationSelector::Many(ids) => {
            if ids.is_empty() {
                clauses.push("0".to_string());
                return;
            }
            let marks = vec!["?"; ids.len()].join(", ");
            clauses.push(format!("{} IN ({})", column, marks));
            values.extend(ids.iter().map(|id| Value::Integer(*id)));
        }
    }
}

fn where_sql(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

impl Database {
    // ───────────────────── Stations ─────────────────────

    /// All stations, ordered by id.
    pub fn query_stations(&self) -> anyhow::Result<Vec<StationMeta>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM stations ORDER BY id", STATION_FIELDS))?;
        let rows = stmt
            .query_map([], station_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("[WPS] query: query_stations returned {} records", rows.len());
        Ok(rows)
    }

    pub fn query_station(&self, id: i64) -> anyhow::Result<Option<StationMeta>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM stations WHERE id = ?1", STATION_FIELDS))?;
        let mut rows = stmt.query_map(params![id], station_from_row)?;
        let station = rows.next().transpose()?;
        Ok(station)
    }

    // ───────────────────── Pressures ─────────────────────

    /// Readings matching `query`, ordered by station then time.
    pub fn query_readings(&self, query: &ReadingQuery) -> anyhow::Result<Vec<StationReading>> {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        push_selector("station_id", &query.stations, &mut clauses, &mut values);
        for (column, part) in [
            ("year", query.year.map(i64::from)),
            ("month", query.month.map(i64::from)),
            ("day", query.day.map(i64::from)),
            ("hour", query.hour.map(i64::from)),
        ] {
            if let Some(v) = part {
                clauses.push(format!("{} = ?", column));
                values.push(Value::Integer(v));
            }
        }
        if let Some((start, end)) = &query.period {
            clauses.push("timestamp BETWEEN ? AND ?".to_string());
            values.push(Value::Text(format_store_timestamp(start)));
            values.push(Value::Text(format_store_timestamp(end)));
        }
        let sql = format!(
            "SELECT station_id, timestamp, value FROM pressures{} ORDER BY station_id, timestamp",
            where_sql(&clauses)
        );

        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok(StationReading::new(row.get(0)?, timestamp_at(row, 1)?, row.get(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("[WPS] query: query_readings returned {} records", rows.len());
        Ok(rows)
    }

    /// Timestamps of the earliest and latest stored readings.
    pub fn query_available_period(&self) -> anyhow::Result<Option<(NaiveDateTime, NaiveDateTime)>> {
        let conn = self.conn.borrow();
        let bounds: (Option<String>, Option<String>) = conn.query_row(
            "SELECT MIN(timestamp), MAX(timestamp) FROM pressures",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        match bounds {
            (Some(first), Some(last)) => Ok(Some((
                NaiveDateTime::parse_from_str(&first, STORE_TIMESTAMP_FORMAT)?,
                NaiveDateTime::parse_from_str(&last, STORE_TIMESTAMP_FORMAT)?,
            ))),
            _ => Ok(None),
        }
    }

    /// First and last reading of each selected station that has data.
    pub fn query_station_periods(&self, selector: &StationSelector) -> anyhow::Result<Vec<StationPeriod>> {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        push_selector("station_id", selector, &mut clauses, &mut values);
        let sql = format!(
            "SELECT station_id, MIN(timestamp), MAX(timestamp) FROM pressures{}
             GROUP BY station_id ORDER BY station_id",
            where_sql(&clauses)
        );
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok(StationPeriod {
                    station_id: row.get(0)?,
                    first: timestamp_at(row, 1)?,
                    last: timestamp_at(row, 2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Min/mean/max profile of one station.
    ///
    /// `Hour` and `Day` profiles need a month; a `Month` profile covers the year.
    pub fn query_profile(
        &self,
        station_id: i64,
        axis: ProfileAxis,
        year: i32,
        month: Option<u32>,
    ) -> anyhow::Result<Vec<PressureStats>> {
        let mut clauses = vec!["station_id = ?".to_string(), "year = ?".to_string()];
        let mut values = vec![Value::Integer(station_id), Value::Integer(i64::from(year))];
        if let Some(m) = month {
            clauses.push("month = ?".to_string());
            values.push(Value::Integer(i64::from(m)));
        }
        let column = axis.column();
        let sql = format!(
            "SELECT {col}, MIN(value), AVG(value), MAX(value), COUNT(value) FROM pressures{}
             GROUP BY {col} ORDER BY {col}",
            where_sql(&clauses),
            col = column
        );
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok(PressureStats {
                    key: row.get(0)?,
                    min: row.get(1)?,
                    mean: row.get(2)?,
                    max: row.get(3)?,
                    count: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "[WPS] query: query_profile({}, {}) returned {} records",
            station_id,
            column,
            rows.len()
        );
        Ok(rows)
    }

    /// Mean pressure per station and profile bucket.
    pub fn query_mean_profile(
        &self,
        selector: &StationSelector,
        axis: ProfileAxis,
        year: i32,
        month: Option<u32>,
    ) -> anyhow::Result<Vec<StationMean>> {
        let mut clauses = vec!["year = ?".to_string()];
        let mut values = vec![Value::Integer(i64::from(year))];
        if let Some(m) = month {
            clauses.push("month = ?".to_string());
            values.push(Value::Integer(i64::from(m)));
        }
        push_selector("station_id", selector, &mut clauses, &mut values);
        let sql = format!(
            "SELECT station_id, {col}, AVG(value) FROM pressures{}
             GROUP BY station_id, {col} ORDER BY station_id, {col}",
            where_sql(&clauses),
            col = axis.column()
        );
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok(StationMean {
                    station_id: row.get(0)?,
                    key: row.get(1)?,
                    mean: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Number of readings per station and month of `year`.
    pub fn query_monthly_record_counts(
        &self,
        selector: &StationSelector,
        year: i32,
    ) -> anyhow::Result<Vec<RecordCount>> {
        let mut clauses = vec!["year = ?".to_string()];
        let mut values = vec![Value::Integer(i64::from(year))];
        push_selector("station_id", selector, &mut clauses, &mut values);
        let sql = format!(
            "SELECT station_id, month, COUNT(value) FROM pressures{}
             GROUP BY station_id, month ORDER BY station_id, month",
            where_sql(&clauses)
        );
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok(RecordCount {
                    station_id: row.get(0)?,
                    month: row.get(1)?,
                    count: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ───────────────────── Calibration ─────────────────────

    /// Every stored policy key, constant and variable, sorted.
    pub fn query_policy_keys(&self) -> anyhow::Result<Vec<String>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT policy_key FROM ranges
             UNION
             SELECT policy_key FROM regimes
             ORDER BY 1",
        )?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rows)
    }

    /// Constant ranges under `key`, for one station or all of them.
    pub fn query_constant_ranges(
        &self,
        key: &str,
        station_id: Option<i64>,
    ) -> anyhow::Result<Vec<ConstantThresholds>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT station_id, min_pressure, max_pressure FROM ranges
             WHERE policy_key = ?1 AND (?2 IS NULL OR station_id = ?2)
             ORDER BY station_id",
        )?;
        let rows = stmt
            .query_map(params![key, station_id], |row| {
                Ok(ConstantThresholds {
                    station_id: row.get(0)?,
                    min: row.get(1)?,
                    max: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Variable regimes under `key`, in stored table order.
    pub fn query_regimes(&self, key: &str) -> anyhow::Result<Vec<ThresholdRegime>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT station_id, month_start, month_end, hour_start, hour_end,
                    min1, max1, min2, max2, min3, max3, min4, max4
             FROM regimes WHERE policy_key = ?1 ORDER BY position",
        )?;
        let rows = stmt
            .query_map(params![key], |row| {
                let mut c = [0.0; 8];
                for (i, v) in c.iter_mut().enumerate() {
                    *v = row.get(5 + i)?;
                }
                Ok(ThresholdRegime {
                    station_id: row.get(0)?,
                    month_start: row.get(1)?,
                    month_end: row.get(2)?,
                    hour_start: row.get(3)?,
                    hour_end: row.get(4)?,
                    limits: BandLimits::from_columns(c),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("[WPS] query: query_regimes('{}') returned {} records", key, rows.len());
        Ok(rows)
    }
}
