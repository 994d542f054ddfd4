//! Loading CSV tables into a database file.

use crate::source::read_csv_file;
use anyhow::Context;
use log::info;
use std::path::PathBuf;
use wps_db::Database;

/// What `import` loads, deletes and where.
#[derive(Debug, Clone, Default)]
pub struct ImportArgs {
    pub database: PathBuf,
    pub stations_csv: Option<PathBuf>,
    pub replace_stations: bool,
    pub pressures_csv: Option<PathBuf>,
    /// Constant range table with its policy key.
    pub ranges: Option<(String, PathBuf)>,
    /// Variable regime table with its policy key.
    pub regimes: Option<(String, PathBuf)>,
    pub delete_policy: Option<String>,
}

pub fn run_import(args: ImportArgs) -> anyhow::Result<()> {
    let db = Database::open(&args.database)?;
    import_into(&db, &args)?;
    info!("[WPS] import: Complete. Database: {}", args.database.display());
    Ok(())
}

/// Apply every step of `args` to an open database.
pub fn import_into(db: &Database, args: &ImportArgs) -> anyhow::Result<()> {
    if let Some(path) = &args.stations_csv {
        let data = read_csv_file(path)?;
        let n = if args.replace_stations {
            db.replace_stations(&data)
        } else {
            db.load_stations(&data)
        }
        .with_context(|| format!("failed to load stations from {}", path.display()))?;
        info!("[WPS] import: Stations: {} rows from {}", n, path.display());
    }
    if let Some(path) = &args.pressures_csv {
        let n = db
            .load_pressures_wide(&read_csv_file(path)?)
            .with_context(|| format!("failed to load pressures from {}", path.display()))?;
        info!("[WPS] import: Pressures: {} readings from {}", n, path.display());
    }
    if let Some((key, path)) = &args.ranges {
        db.add_constant_ranges(key, &read_csv_file(path)?)
            .with_context(|| format!("failed to store ranges '{}'", key))?;
    }
    if let Some((key, path)) = &args.regimes {
        db.add_regimes(key, &read_csv_file(path)?)
            .with_context(|| format!("failed to store regimes '{}'", key))?;
    }
    if let Some(key) = &args.delete_policy {
        db.delete_policy(key)
            .with_context(|| format!("failed to delete '{}'", key))?;
    }
    Ok(())
}
