//! Time-of-day and date handling for the 30-minute booking grid.
//!
//! Times travel as `HH:MM` (24-hour, zero-padded) and dates as `YYYY-MM-DD`.
//! [`SlotTime`] stores minutes since midnight so neighbor arithmetic is a
//! plain integer offset that reports leaving the day as `None`.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TimeError;

/// Width of one grid cell in minutes.
pub const SLOT_MINUTES: i32 = 30;

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// A time of day on the booking grid, minutes since midnight in `[0, 1440)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime(u16);

impl SlotTime {
    /// Build from hour and minute; `None` if either is out of range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self((hour * 60 + minute) as u16))
        } else {
            None
        }
    }

    /// Build from minutes since midnight; `None` outside the day.
    pub fn from_minutes(minutes: i32) -> Option<Self> {
        if (0..MINUTES_PER_DAY).contains(&minutes) {
            Some(Self(minutes as u16))
        } else {
            None
        }
    }

    pub fn minutes(self) -> i32 {
        i32::from(self.0)
    }

    pub fn hour(self) -> u32 {
        u32::from(self.0 / 60)
    }

    pub fn minute(self) -> u32 {
        u32::from(self.0 % 60)
    }

    /// Shift by a signed number of minutes, staying within the same day.
    pub fn offset(self, minutes: i32) -> Option<Self> {
        Self::from_minutes(self.minutes() + minutes)
    }

    /// Whether the time falls on a half-hour boundary.
    pub fn is_on_grid(self) -> bool {
        self.minutes() % SLOT_MINUTES == 0
    }

    /// The next grid cell after this one.
    pub fn next_slot(self) -> Option<Self> {
        self.offset(SLOT_MINUTES)
    }

    /// The grid cell before this one.
    pub fn prev_slot(self) -> Option<Self> {
        self.offset(-SLOT_MINUTES)
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for SlotTime {
    type Err = TimeError;

    /// Accepts `HH:MM` and the unpadded `H:MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let malformed = || TimeError::Malformed(s.to_string());

        let (h, m) = trimmed.split_once(':').ok_or_else(malformed)?;
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(h) || h.len() > 2 || !digits(m) || m.len() != 2 {
            return Err(malformed());
        }

        let hour: u32 = h.parse().map_err(|_| malformed())?;
        let minute: u32 = m.parse().map_err(|_| malformed())?;
        Self::from_hm(hour, minute).ok_or_else(|| TimeError::OutOfRange(s.to_string()))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Parse a `YYYY-MM-DD` date string.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}
