//! SQLite database layer for station pressures and calibration tables.
//!
//! This crate backs the time-series store and the calibration store with a
//! single SQLite connection, either in memory or in a file, and exposes
//! CSV loaders plus typed query methods.
//!
//! # Usage
//!
//! ```rust
//! use wps_db::Database;
//!
//! let db = Database::new().unwrap();
//! db.load_stations("id,name,x,y,head_pressure,diameter,install_year\n1,Centro,0,0,0.5,12,2015\n").unwrap();
//! db.load_pressures_wide("timestamp,1\n2022-03-01 00:00:00,2.5\n").unwrap();
//!
//! let stations = db.query_stations().unwrap();
//! assert_eq!(stations.len(), 1);
//! ```
//!
//! # Tables
//!
//! See [`schema::create_schema`] for the full SQL schema.

pub mod schema;
mod loader;
mod queries;
mod store;
pub mod models;

use anyhow::Context;
use rusqlite::Connection;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// SQLite database holding stations, pressures and calibration tables.
///
/// This struct is cheaply cloneable (via `Rc`); clones share one connection.
#[derive(Clone, Debug)]
pub struct Database {
    conn: Rc<RefCell<Connection>>,
}

impl Database {
    /// Create a new in-memory database with the full schema applied.
    pub fn new() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    /// Open (or create) a database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))?;
        log::info!("[WPS] db: opened {}", path.display());
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Rc::new(RefCell::new(conn)),
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::Database;

    pub const STATIONS: &str = include_str!("../../fixtures/stations.csv");
    pub const PRESSURES: &str = include_str!("../../fixtures/pressures.csv");
    pub const CONSTANT_RANGES: &str = include_str!("../../fixtures/constant_ranges.csv");
    pub const VARIABLE_RANGES: &str = include_str!("../../fixtures/variable_ranges.csv");

    /// In-memory database with the fixture stations and pressures.
    pub fn loaded() -> Database {
        let db = Database::new().unwrap();
        db.load_stations(STATIONS).unwrap();
        db.load_pressures_wide(PRESSURES).unwrap();
        db
    }
}
