//! Run-cycle identity parsed from `YYYYMMDDHH[MM[SS]]`.

use crate::error::Error;
use anyhow::Result;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// One forecast initialization, identified by its start timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    start: NaiveDateTime,
}

impl Cycle {
    /// Parse a start-date argument. Length must be exactly 10, 12, or 14
    /// characters; omitted minutes and seconds are zero. Validation happens
    /// here, before any file I/O.
    pub fn parse(arg: &str) -> Result<Self> {
        if !matches!(arg.len(), 10 | 12 | 14) || !arg.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::DateFormat(arg.to_string()).into());
        }

        let field = |range: std::ops::Range<usize>| -> u32 {
            // All-digit input of checked length; the slice parse cannot fail.
            arg[range].parse().unwrap_or_default()
        };

        let date = NaiveDate::from_ymd_opt(
            arg[0..4].parse().unwrap_or_default(),
            field(4..6),
            field(6..8),
        )
        .ok_or_else(|| Error::DateFormat(arg.to_string()))?;

        let minute = if arg.len() >= 12 { field(10..12) } else { 0 };
        let second = if arg.len() == 14 { field(12..14) } else { 0 };

        let start = date
            .and_hms_opt(field(8..10), minute, second)
            .ok_or_else(|| Error::DateFormat(arg.to_string()))?;

        Ok(Self { start })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Fixed-width directory-name token, `YYYYMMDDHH`.
    pub fn token(&self) -> String {
        self.start.format("%Y%m%d%H").to_string()
    }

    /// Zero-padded start-time components, in emission order.
    pub fn start_times(&self) -> Vec<(&'static str, String)> {
        vec![
            ("start_year", format!("{:04}", self.start.year())),
            ("start_month", format!("{:02}", self.start.month())),
            ("start_day", format!("{:02}", self.start.day())),
            ("start_hour", format!("{:02}", self.start.hour())),
            ("start_minute", format!("{:02}", self.start.minute())),
            ("start_second", format!("{:02}", self.start.second())),
        ]
    }
}
