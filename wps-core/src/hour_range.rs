use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::mem::replace;

/// An hourly timestamp iterator that yields each hour from the start
/// through the end (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct HourRange(pub NaiveDateTime, pub NaiveDateTime);

impl HourRange {
    /// Every hour of a calendar month, from day 1 00:00 to the last day 23:00.
    pub fn month(year: i32, month: u32) -> Option<HourRange> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let last = next_month.pred_opt()?;
        Some(HourRange(first.and_hms_opt(0, 0, 0)?, last.and_hms_opt(23, 0, 0)?))
    }

    /// Number of calendar days spanned by the range.
    pub fn days(&self) -> u32 {
        if self.0 > self.1 {
            return 0;
        }
        (self.1.date() - self.0.date()).num_days() as u32 + 1
    }
}

impl Iterator for HourRange {
    type Item = NaiveDateTime;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            let next = self.0 + TimeDelta::hours(1);
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}
