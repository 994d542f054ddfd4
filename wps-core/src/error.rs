/// Error types for the WPS core library
use thiserror::Error;

/// Main error type for WPS domain operations
#[derive(Error, Debug)]
pub enum WpsError {
    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// A table is missing a required column
    #[error("Table is missing required column '{0}'")]
    MissingColumn(String),

    /// A table repeats a station identifier that must be unique
    #[error("Table repeats station id {0}")]
    DuplicateStation(i64),

    /// A table has no rows
    #[error("Table has no rows")]
    EmptyTable,

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Month outside 1..=12
    #[error("Invalid month: {0}")]
    InvalidMonth(u32),

    /// Hour outside 0..=23
    #[error("Invalid hour: {0}")]
    InvalidHour(u32),

    /// Requested month has no records in the store
    #[error("No records for {year}-{month:02} (available {first} to {last})")]
    MonthOutOfRange {
        year: i32,
        month: u32,
        first: String,
        last: String,
    },

    /// Calibration policy key not found
    #[error("Calibration policy not found: {0}")]
    PolicyNotFound(String),

    /// Calibration policy key already present
    #[error("Calibration policy already exists: {0}")]
    PolicyExists(String),

    /// The default calibration policy cannot be removed
    #[error("Calibration policy '{0}' is the default and cannot be deleted")]
    ProtectedPolicy(String),
}

/// Type alias for Results using WpsError
pub type Result<T> = std::result::Result<T, WpsError>;
