//! Calendar cell records as produced by the page-extraction layer.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::time::SlotTime;

/// Availability state of one observed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellState {
    Free,
    Booked,
    Unavailable,
    /// The source could not classify the cell. Never treated as free.
    #[default]
    Unknown,
}

impl CellState {
    pub fn is_free(self) -> bool {
        self == CellState::Free
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CellState::Free => "free",
            CellState::Booked => "booked",
            CellState::Unavailable => "unavailable",
            CellState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CellState {
    type Err = Infallible;

    /// Case-insensitive; anything unrecognised degrades to `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "free" => CellState::Free,
            "booked" => CellState::Booked,
            "unavailable" => CellState::Unavailable,
            _ => CellState::Unknown,
        })
    }
}

impl Serialize for CellState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CellState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let Ok(state) = raw.parse::<CellState>();
        Ok(state)
    }
}

/// Position of a cell within one resource's column: date plus start time.
///
/// Renders as `YYYY-MM-DDTHH:MM`, the inspection format of the matrix index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub start: SlotTime,
}

impl SlotKey {
    pub fn new(date: NaiveDate, start: SlotTime) -> Self {
        Self { date, start }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}", self.date.format("%Y-%m-%d"), self.start)
    }
}

impl Serialize for SlotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One (resource, date, time) observation from the calendar grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub resource: String,
    pub date: NaiveDate,
    pub start: SlotTime,
    pub state: CellState,
    /// Opaque locator for acting on the cell later. Not interpreted here.
    #[serde(default, alias = "sourceSelector")]
    pub source_selector: String,
}

impl Cell {
    pub fn new(
        resource: impl Into<String>,
        date: NaiveDate,
        start: SlotTime,
        state: CellState,
    ) -> Self {
        Self {
            resource: resource.into(),
            date,
            start,
            state,
            source_selector: String::new(),
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.source_selector = selector.into();
        self
    }

    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.date, self.start)
    }

    pub fn is_free(&self) -> bool {
        self.state.is_free()
    }
}

/// A reference to one slot, used to report stranded cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    pub resource: String,
    pub date: NaiveDate,
    pub start: SlotTime,
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.resource, SlotKey::new(self.date, self.start))
    }
}
