//! SQL schema for the pressure and calibration tables.
//!
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` text so that range
//! filters and `MIN`/`MAX` compare lexically in time order. The calendar
//! parts are denormalised into their own columns for grouping.

/// Returns the full SQL schema as a single batch string.
///
/// - `stations` - station metadata (id, name, coordinates, head pressure, diameter, install year)
/// - `pressures` - one reading per station and timestamp, in kg/cm²
/// - `ranges` - constant `[min, max]` pairs per policy key and station
/// - `regimes` - variable month/hour band limits per policy key
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS stations (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        x REAL NOT NULL,
        y REAL NOT NULL,
        head_pressure REAL NOT NULL,
        diameter INTEGER NOT NULL,
        install_year INTEGER NOT NULL,
        location TEXT
    );

    CREATE TABLE IF NOT EXISTS pressures (
        station_id INTEGER NOT NULL,
        timestamp TEXT NOT NULL,
        year INTEGER NOT NULL,
        month INTEGER NOT NULL,
        day INTEGER NOT NULL,
        hour INTEGER NOT NULL,
        value REAL NOT NULL,
        PRIMARY KEY (station_id, timestamp)
    );
    CREATE INDEX IF NOT EXISTS idx_pressures_timestamp ON pressures(timestamp);
    CREATE INDEX IF NOT EXISTS idx_pressures_calendar ON pressures(year, month, day, hour);

    CREATE TABLE IF NOT EXISTS ranges (
        policy_key TEXT NOT NULL,
        station_id INTEGER NOT NULL,
        min_pressure REAL NOT NULL,
        max_pressure REAL NOT NULL,
        PRIMARY KEY (policy_key, station_id)
    );

    CREATE TABLE IF NOT EXISTS regimes (
        policy_key TEXT NOT NULL,
        position INTEGER NOT NULL,
        station_id INTEGER NOT NULL,
        month_start INTEGER NOT NULL,
        month_end INTEGER NOT NULL,
        hour_start INTEGER NOT NULL,
        hour_end INTEGER NOT NULL,
        min1 REAL NOT NULL,
        max1 REAL NOT NULL,
        min2 REAL NOT NULL,
        max2 REAL NOT NULL,
        min3 REAL NOT NULL,
        max3 REAL NOT NULL,
        min4 REAL NOT NULL,
        max4 REAL NOT NULL,
        PRIMARY KEY (policy_key, position)
    );
    CREATE INDEX IF NOT EXISTS idx_regimes_station ON regimes(policy_key, station_id);
    "#
}
