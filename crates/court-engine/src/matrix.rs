//! Availability matrix -- a dense, immutable index over one extraction pass.
//!
//! The builder consumes the flat cell sequence exactly once and files every
//! cell under `resource → (date, start)`. Lookups by resource and time are two
//! hash probes regardless of grid size. Quality metrics are accumulated during
//! the same pass.
//!
//! A matrix is never updated in place. To reflect a new snapshot (another
//! date, or the same page later in the day) build a new one.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cell::{Cell, CellState, SlotKey};
use crate::config::MatrixConfig;
use crate::error::{MatrixError, Result};
use crate::time::SlotTime;

/// Number of cells observed in each state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub free: usize,
    pub booked: usize,
    pub unavailable: usize,
    pub unknown: usize,
}

impl StateCounts {
    fn slot(&mut self, state: CellState) -> &mut usize {
        match state {
            CellState::Free => &mut self.free,
            CellState::Booked => &mut self.booked,
            CellState::Unavailable => &mut self.unavailable,
            CellState::Unknown => &mut self.unknown,
        }
    }

    fn record(&mut self, state: CellState) {
        *self.slot(state) += 1;
    }

    fn forget(&mut self, state: CellState) {
        let count = self.slot(state);
        *count = count.saturating_sub(1);
    }

    pub fn get(&self, state: CellState) -> usize {
        match state {
            CellState::Free => self.free,
            CellState::Booked => self.booked,
            CellState::Unavailable => self.unavailable,
            CellState::Unknown => self.unknown,
        }
    }
}

/// Diagnostic raised when the snapshot looks degraded. Never fatal.
///
/// The builder returns [`MatrixError::NoData`] before an empty matrix can
/// exist, so only [`MatrixWarning::NoFreeCells`] is raised in practice. The
/// other variants keep the wire format of the full warning list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixWarning {
    NoCells,
    NoResources,
    NoTimePoints,
    NoFreeCells,
}

impl fmt::Display for MatrixWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            MatrixWarning::NoCells => "no cells found",
            MatrixWarning::NoResources => "no resources found",
            MatrixWarning::NoTimePoints => "no time points found",
            MatrixWarning::NoFreeCells => "no free cells found",
        };
        f.write_str(msg)
    }
}

/// Quality metrics gathered while building a matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixMetrics {
    /// Cells held in the index after duplicate replacement.
    pub total_cells: usize,
    pub state_counts: StateCounts,
    pub resources_with_data: usize,
    pub time_points_with_data: usize,
    pub build_duration_micros: u64,
    /// Observations that replaced an earlier cell at the same position.
    pub duplicate_cells: usize,
    /// Observations dropped because they had no resource identifier.
    pub skipped_cells: usize,
    pub is_complete: bool,
    pub warnings: Vec<MatrixWarning>,
}

/// First and last date observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Immutable availability snapshot with O(1) lookup by resource and time.
#[derive(Debug, Clone)]
pub struct AvailabilityMatrix {
    index: HashMap<String, HashMap<SlotKey, Cell>>,
    resources: BTreeSet<String>,
    time_points: BTreeSet<SlotTime>,
    date_range: DateRange,
    metrics: MatrixMetrics,
}

impl AvailabilityMatrix {
    /// The cell at `(resource, date, start)`, if one was observed.
    pub fn cell(&self, resource: &str, date: NaiveDate, start: SlotTime) -> Option<&Cell> {
        self.cell_by_key(resource, &SlotKey::new(date, start))
    }

    pub fn cell_by_key(&self, resource: &str, key: &SlotKey) -> Option<&Cell> {
        self.index.get(resource)?.get(key)
    }

    /// True only for an observed cell in the `Free` state.
    pub fn is_free(&self, resource: &str, date: NaiveDate, start: SlotTime) -> bool {
        self.cell(resource, date, start).is_some_and(Cell::is_free)
    }

    pub fn has_resource(&self, resource: &str) -> bool {
        self.index.contains_key(resource)
    }

    /// All cells for one resource, in no particular order.
    pub fn cells_for<'a>(&'a self, resource: &str) -> impl Iterator<Item = &'a Cell> + 'a {
        self.index
            .get(resource)
            .into_iter()
            .flat_map(|slots| slots.values())
    }

    /// Every `(resource, key, cell)` entry of the index, for inspection.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SlotKey, &Cell)> {
        self.index.iter().flat_map(|(resource, slots)| {
            slots
                .iter()
                .map(move |(key, cell)| (resource.as_str(), key, cell))
        })
    }

    /// Resources with at least one free cell anywhere, sorted.
    pub fn free_resources(&self) -> Vec<String> {
        self.resources
            .iter()
            .filter(|r| self.cells_for(r).any(Cell::is_free))
            .cloned()
            .collect()
    }

    pub fn resources(&self) -> &BTreeSet<String> {
        &self.resources
    }

    pub fn time_points(&self) -> &BTreeSet<SlotTime> {
        &self.time_points
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    pub fn metrics(&self) -> &MatrixMetrics {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.metrics.total_cells
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.total_cells == 0
    }
}

/// Builds [`AvailabilityMatrix`] values from a cell sequence.
#[derive(Debug, Clone, Default)]
pub struct MatrixBuilder {
    config: MatrixConfig,
}

impl MatrixBuilder {
    pub fn new(config: MatrixConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }

    /// Index `cells` in a single pass.
    ///
    /// Cells with a blank resource or a start off the half-hour grid are
    /// skipped and counted in [`MatrixMetrics::skipped_cells`].
    ///
    /// # Errors
    /// Returns [`MatrixError::NoData`] when the sequence is empty or none of its
    /// cells is usable. A snapshot with zero free cells is still a valid matrix.
    pub fn build<I>(&self, cells: I) -> Result<AvailabilityMatrix>
    where
        I: IntoIterator<Item = Cell>,
    {
        let started = Instant::now();

        let mut index: HashMap<String, HashMap<SlotKey, Cell>> = HashMap::new();
        let mut time_points = BTreeSet::new();
        let mut counts = StateCounts::default();
        let mut date_range: Option<DateRange> = None;
        let mut duplicate_cells = 0;
        let mut skipped_cells = 0;

        for cell in cells {
            // Off-grid cells have no half-hour neighbors to analyse.
            if cell.resource.trim().is_empty() || !cell.start.is_on_grid() {
                skipped_cells += 1;
                continue;
            }

            date_range = Some(match date_range {
                Some(range) => DateRange {
                    start: range.start.min(cell.date),
                    end: range.end.max(cell.date),
                },
                None => DateRange {
                    start: cell.date,
                    end: cell.date,
                },
            });
            time_points.insert(cell.start);
            counts.record(cell.state);

            let key = cell.key();
            let slots = index.entry(cell.resource.clone()).or_default();
            if let Some(previous) = slots.insert(key, cell) {
                // Last observation wins.
                counts.forget(previous.state);
                duplicate_cells += 1;
            }
        }

        let Some(date_range) = date_range else {
            warn!(skipped_cells, "cell source yielded no usable cells");
            return Err(MatrixError::NoData);
        };

        let resources: BTreeSet<String> = index.keys().cloned().collect();
        let total_cells: usize = index.values().map(HashMap::len).sum();

        let mut warnings = Vec::new();
        if total_cells == 0 {
            warnings.push(MatrixWarning::NoCells);
        }
        if resources.is_empty() {
            warnings.push(MatrixWarning::NoResources);
        }
        if time_points.is_empty() {
            warnings.push(MatrixWarning::NoTimePoints);
        }
        if counts.free == 0 {
            warnings.push(MatrixWarning::NoFreeCells);
        }
        for warning in &warnings {
            warn!(%warning, "availability matrix degraded");
        }

        let is_complete = warnings.is_empty() && total_cells > self.config.min_cells_for_complete;

        let metrics = MatrixMetrics {
            total_cells,
            state_counts: counts,
            resources_with_data: resources.len(),
            time_points_with_data: time_points.len(),
            build_duration_micros: u64::try_from(started.elapsed().as_micros())
                .unwrap_or(u64::MAX),
            duplicate_cells,
            skipped_cells,
            is_complete,
            warnings,
        };

        debug!(
            total_cells,
            resources = metrics.resources_with_data,
            time_points = metrics.time_points_with_data,
            free = counts.free,
            is_complete,
            "built availability matrix"
        );

        Ok(AvailabilityMatrix {
            index,
            resources,
            time_points,
            date_range,
            metrics,
        })
    }
}

/// Build a matrix with the default configuration.
///
/// # Errors
/// See [`MatrixBuilder::build`].
pub fn build<I>(cells: I) -> Result<AvailabilityMatrix>
where
    I: IntoIterator<Item = Cell>,
{
    MatrixBuilder::default().build(cells)
}
