//! Where a command reads its stations, pressures and calibration tables from.

use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use wps_core::store::VARIABLE_POLICY_KEY;
use wps_db::Database;

#[derive(Args, Debug, Clone, Default)]
pub struct DataSource {
    /// SQLite database file; an in-memory database is used when omitted
    #[arg(short = 'd', long, env = "WPS_DATABASE")]
    pub database: Option<PathBuf>,

    /// Station table CSV to load before running
    #[arg(long, env = "WPS_STATIONS_CSV")]
    pub stations_csv: Option<PathBuf>,

    /// Wide pressure CSV to load before running
    #[arg(long, env = "WPS_PRESSURES_CSV")]
    pub pressures_csv: Option<PathBuf>,

    /// Variable regime CSV to load under the default variable key, if that key is free
    #[arg(long)]
    pub regimes_csv: Option<PathBuf>,
}

pub(crate) fn read_csv_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

impl DataSource {
    /// Open the database and load any CSV tables given on the command line.
    pub fn open(&self) -> anyhow::Result<Database> {
        let db = match &self.database {
            Some(path) => Database::open(path)?,
            None => Database::new()?,
        };
        if let Some(path) = &self.stations_csv {
            db.load_stations(&read_csv_file(path)?)
                .with_context(|| format!("failed to load stations from {}", path.display()))?;
        }
        if let Some(path) = &self.pressures_csv {
            db.load_pressures_wide(&read_csv_file(path)?)
                .with_context(|| format!("failed to load pressures from {}", path.display()))?;
        }
        if let Some(path) = &self.regimes_csv {
            if db.policy_exists(VARIABLE_POLICY_KEY)? {
                log::warn!(
                    "[WPS] source: '{}' already stored, ignoring {}",
                    VARIABLE_POLICY_KEY,
                    path.display()
                );
            } else {
                db.add_regimes(VARIABLE_POLICY_KEY, &read_csv_file(path)?)
                    .with_context(|| format!("failed to load regimes from {}", path.display()))?;
            }
        }
        Ok(db)
    }
}
