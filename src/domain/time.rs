//! Wall-clock and interval helpers shared by the grid and dial views.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::{DomainError, DomainResult};

pub const MINUTES_PER_DAY: u16 = 24 * 60;
pub const NOON: u16 = 12 * 60;

/// Minute of the day, `00:00` through `23:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn from_hm(hour: u16, minute: u16) -> DomainResult<Self> {
        if hour > 23 || minute > 59 {
            return Err(DomainError::InvalidTime(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self(hour * 60 + minute))
    }

    /// Accepts `HH:mm` and the `HH:mm:ss` form some backends return for
    /// TIME columns. Seconds are dropped.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let trimmed = input.trim();
        let invalid = || DomainError::InvalidTime(input.to_string());

        let fields: Vec<&str> = trimmed.split(':').collect();
        let digits = |field: &str| field.bytes().all(|b| b.is_ascii_digit());
        let (hour, minute) = match fields.as_slice() {
            [hour, minute] | [hour, minute, _] => (*hour, *minute),
            _ => return Err(invalid()),
        };
        if !fields.iter().all(|field| digits(field)) {
            return Err(invalid());
        }
        if let Some(seconds) = fields.get(2) {
            if seconds.len() != 2 || seconds.parse::<u16>().map_or(true, |s| s > 59) {
                return Err(invalid());
            }
        }
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }

        let hour: u16 = hour.parse().map_err(|_| invalid())?;
        let minute: u16 = minute.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).map_err(|_| invalid())
    }

    pub fn from_naive(time: NaiveTime) -> Self {
        Self((time.hour() * 60 + time.minute()) as u16)
    }

    pub fn minutes(&self) -> u16 {
        self.0
    }

    pub fn hour(&self) -> u16 {
        self.0 / 60
    }

    pub fn minute(&self) -> u16 {
        self.0 % 60
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
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
        ClockTime::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Position of a minute-of-day on a 12-hour analog dial, in degrees.
///
/// 0° is the 12 o'clock position and angles grow clockwise, so both
/// midnight and noon map to 0°.
pub fn minute_to_angle(minute_of_day: u16) -> f64 {
    let hour = (minute_of_day / 60) % 12;
    let minute = minute_of_day % 60;
    hour as f64 * 30.0 + minute as f64 * 0.5
}

/// Half-open `[start, end)` interval within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    start: u16,
    end: u16,
}

impl TimeInterval {
    /// Rejects empty and inverted intervals.
    pub fn new(start: ClockTime, end: ClockTime) -> DomainResult<Self> {
        if start >= end {
            return Err(DomainError::InvalidInterval {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self {
            start: start.minutes(),
            end: end.minutes(),
        })
    }

    /// Builds an interval from raw minute offsets. `end` may be 1440 so a
    /// split segment can run to the end of the day.
    pub(crate) fn from_minutes(start: u16, end: u16) -> Option<Self> {
        (start < end && end <= MINUTES_PER_DAY).then_some(Self { start, end })
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end - self.start
    }

    pub fn contains(&self, time: ClockTime) -> bool {
        (self.start..self.end).contains(&time.minutes())
    }

    pub fn ends_by_noon(&self) -> bool {
        self.end <= NOON
    }

    pub fn starts_after_noon(&self) -> bool {
        self.start >= NOON
    }

    pub fn spans_noon(&self) -> bool {
        self.start < NOON && NOON < self.end
    }
}

/// Parses a task date as sent by the persistence backend.
///
/// Depending on the integration the date arrives as a plain `YYYY-MM-DD`,
/// an RFC 3339 timestamp or a naive `YYYY-MM-DDTHH:MM:SS[.fff]`. The
/// calendar date written in the string is kept; no timezone shift is
/// applied.
pub fn parse_task_date(input: &str) -> DomainResult<NaiveDate> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt.date());
        }
    }
    Err(DomainError::InvalidDate(input.to_string()))
}
