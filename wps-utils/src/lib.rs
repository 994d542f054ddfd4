//! Shared utility functions for WPS crates.

/// Date utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDate, NaiveDateTime};

    /// ISO-8601 timestamp format used for every CSV output table.
    pub const ISO_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    /// Timestamp format used by the SQLite store ("YYYY-MM-DD HH:MM:SS").
    pub const STORE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Timestamp layouts accepted on input, tried in order.
    const ACCEPTED_TIMESTAMP_FORMATS: [&str; 4] = [
        ISO_TIMESTAMP_FORMAT,
        STORE_TIMESTAMP_FORMAT,
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Format a timestamp as ISO-8601 ("YYYY-MM-DDTHH:MM:SS").
    pub fn format_timestamp(ts: &NaiveDateTime) -> String {
        ts.format(ISO_TIMESTAMP_FORMAT).to_string()
    }

    /// Format a timestamp in the store layout ("YYYY-MM-DD HH:MM:SS").
    pub fn format_store_timestamp(ts: &NaiveDateTime) -> String {
        ts.format(STORE_TIMESTAMP_FORMAT).to_string()
    }

    /// Parse a timestamp written either in ISO-8601 or in the store layout.
    /// Seconds are optional.
    pub fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
        let s = s.trim();
        for fmt in ACCEPTED_TIMESTAMP_FORMATS {
            if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(ts);
            }
        }
        anyhow::bail!("unrecognised timestamp '{}'", s)
    }

    /// Number of days in the given calendar month, or `None` for an invalid month.
    pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some((next - first).num_days() as u32)
    }

    /// Midnight on the first day of the given month.
    pub fn month_start(year: i32, month: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
    }

    /// Whether `(year, month)` falls between the months of `first` and `last`
    /// (both inclusive). Day and time of the bounds are ignored.
    pub fn month_within_period(
        year: i32,
        month: u32,
        first: &NaiveDateTime,
        last: &NaiveDateTime,
    ) -> bool {
        let key = (year, month);
        let lower = (first.year(), first.month());
        let upper = (last.year(), last.month());
        (1..=12).contains(&month) && key >= lower && key <= upper
    }

}
