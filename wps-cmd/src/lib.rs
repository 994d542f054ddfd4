//! Command implementations for the WPS CLI.
//!
//! Provides subcommands for loading station pressures into a SQLite store,
//! classifying the network at an instant, building monthly operation
//! reports, interpolating pressure maps and exporting threshold curves.

use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;
use wps_core::store::VARIABLE_POLICY_KEY;

pub mod import;
pub mod operation;
pub mod pressure_map;
pub mod report;
pub mod semaphore;
pub mod source;
pub mod threshold_curve;

pub use source::DataSource;

/// Threshold policy used by `semaphore`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyKind {
    /// Constant per-station range
    Recommended,
    /// Month and hour dependent bands
    Variable,
}

fn parse_date_arg(s: &str) -> anyhow::Result<NaiveDate> {
    wps_utils::dates::parse_date(s)
}

#[derive(Subcommand)]
pub enum Command {
    /// Load station and pressure tables into a SQLite database
    Import {
        /// Database file to create or update
        #[arg(short = 'd', long, env = "WPS_DATABASE")]
        database: PathBuf,

        /// Station table CSV
        #[arg(short = 's', long, env = "WPS_STATIONS_CSV")]
        stations_csv: Option<PathBuf>,

        /// Replace the whole station table instead of merging by id
        #[arg(long)]
        replace_stations: bool,

        /// Wide pressure CSV (timestamp column, then one column per station id)
        #[arg(short = 'p', long, env = "WPS_PRESSURES_CSV")]
        pressures_csv: Option<PathBuf>,

        /// Constant range table CSV (id,min_pressure,max_pressure)
        #[arg(long, requires = "ranges_key")]
        ranges_csv: Option<PathBuf>,

        /// Key to store the constant range table under; the default key is
        /// derived from the station table
        #[arg(long, requires = "ranges_csv")]
        ranges_key: Option<String>,

        /// Variable regime table CSV
        #[arg(long)]
        regimes_csv: Option<PathBuf>,

        /// Key to store the regime table under
        #[arg(long, default_value = VARIABLE_POLICY_KEY)]
        regimes_key: String,

        /// Delete a stored calibration table by key
        #[arg(long)]
        delete_policy: Option<String>,
    },

    /// Classify every station at one date and hour
    Semaphore {
        #[command(flatten)]
        source: DataSource,

        /// Date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        date: NaiveDate,

        /// Hour of day
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
        hour: u32,

        #[arg(long, value_enum, default_value_t = PolicyKind::Recommended)]
        policy: PolicyKind,

        /// Calibration table key; defaults to the policy's built-in key
        #[arg(long)]
        key: Option<String>,

        /// Restrict the network to these station ids
        #[arg(long, value_delimiter = ',')]
        stations: Vec<i64>,

        /// Output path for the classified station table
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Print band counts, palette and network status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Monthly over- and under-pressure tallies for the network
    OperationReport {
        #[command(flatten)]
        source: DataSource,

        #[arg(long)]
        year: i32,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,

        /// Variable regime table key
        #[arg(long, default_value = VARIABLE_POLICY_KEY)]
        key: String,

        /// Directory for the report CSV files
        #[arg(short = 'o', long)]
        output_dir: PathBuf,
    },

    /// Interpolate station pressures onto a grid of points
    PressureMap {
        #[command(flatten)]
        source: DataSource,

        /// Date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        date: NaiveDate,

        /// Hour of day
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
        hour: u32,

        /// Target grid CSV (id,x,y)
        #[arg(short = 'g', long)]
        grid_csv: PathBuf,

        /// IDW power parameter
        #[arg(long, default_value_t = wps_data::idw::DEFAULT_POWER)]
        power: f64,

        /// Output path for the interpolated grid
        #[arg(short = 'o', long)]
        output: PathBuf,
    },

    /// Export a station's hour-of-day band curve for a month
    ThresholdCurve {
        #[command(flatten)]
        source: DataSource,

        #[arg(long)]
        station: i64,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,

        /// Grid spacing in hours
        #[arg(long, default_value_t = wps_data::threshold::DEFAULT_HOUR_STEP)]
        step: f64,

        /// Variable regime table key
        #[arg(long, default_value = VARIABLE_POLICY_KEY)]
        key: String,

        /// Output path for the curve
        #[arg(short = 'o', long)]
        output: PathBuf,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Import {
            database,
            stations_csv,
            replace_stations,
            pressures_csv,
            ranges_csv,
            ranges_key,
            regimes_csv,
            regimes_key,
            delete_policy,
        } => import::run_import(import::ImportArgs {
            database,
            stations_csv,
            replace_stations,
            pressures_csv,
            ranges: ranges_key.zip(ranges_csv),
            regimes: regimes_csv.map(|path| (regimes_key, path)),
            delete_policy,
        }),
        Command::Semaphore {
            source,
            date,
            hour,
            policy,
            key,
            stations,
            output,
            json,
        } => {
            let db = source.open()?;
            let request = semaphore::SemaphoreRequest {
                date,
                hour,
                policy,
                key,
                stations,
            };
            semaphore::run_semaphore(&db, &request, &output, json)
        }
        Command::OperationReport {
            source,
            year,
            month,
            key,
            output_dir,
        } => {
            let db = source.open()?;
            operation::run_operation_report(&db, year, month, &key, &output_dir)
        }
        Command::PressureMap {
            source,
            date,
            hour,
            grid_csv,
            power,
            output,
        } => {
            let db = source.open()?;
            pressure_map::run_pressure_map(&db, date, hour, &grid_csv, power, &output)
        }
        Command::ThresholdCurve {
            source,
            station,
            month,
            step,
            key,
            output,
        } => {
            let db = source.open()?;
            threshold_curve::run_threshold_curve(&db, station, month, step, &key, &output)
        }
    }
}
