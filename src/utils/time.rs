use crate::error::AppError;
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Wall-clock time of day stored as minutes since midnight.
///
/// Comparisons are numeric, so `9:30` and `09:30` are the same instant.
/// Rendered as zero-padded `HH:MM` on the wire and in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(ClockTime((hour * 60 + minute) as u16))
        } else {
            None
        }
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes() / 60, self.minutes() % 60)
    }
}

impl FromStr for ClockTime {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time_string(s)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Only ASCII digits and `separator`.
fn is_plain(raw: &str, separator: u8) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit() || b == separator)
}

pub fn parse_time_string(time_str: &str) -> Result<ClockTime, AppError> {
    let parsed = NaiveTime::parse_from_str(time_str, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time_str, "%H:%M:%S"));

    parsed
        .ok()
        .filter(|_| is_plain(time_str, b':'))
        .and_then(|time| ClockTime::from_hm(time.hour(), time.minute()))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Invalid time '{}'. Use HH:MM or HH:MM:SS",
                time_str
            ))
        })
}

pub fn parse_date_string(date_str: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .ok()
        .filter(|_| is_plain(date_str, b'-'))
        .ok_or_else(|| {
            AppError::Validation(format!("Invalid date '{}'. Use YYYY-MM-DD", date_str))
        })
}

/// Half-open `[start, end)` interval within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeSlot {
    pub fn new(start: ClockTime, end: ClockTime) -> Result<Self, AppError> {
        if end <= start {
            return Err(AppError::Validation(
                "End time must be after start time".to_string(),
            ));
        }
        Ok(TimeSlot { start, end })
    }

    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}
