//! Slot-pair search -- find 60-minute bookings that strand nothing.
//!
//! For every resource and each desired start time `t`, a pair `(t, t + 30)`
//! is proposed when both cells are free, then kept only if a 60-minute
//! booking at `t` passes isolation analysis. Pairs come out in resource order,
//! then in the order the start times were requested. Ranking is left to
//! [`crate::scoring`].
//!
//! The search holds no state. It reads whatever matrix it is given; callers
//! rebuild the matrix when the page may have changed.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cell::Cell;
use crate::config::MatrixConfig;
use crate::error::SearchError;
use crate::isolation::analyze_isolation;
use crate::matrix::{AvailabilityMatrix, MatrixBuilder};
use crate::time::{parse_date, SlotTime};

/// Length of one slot-pair booking.
pub const PAIR_DURATION_MINUTES: u32 = 60;

/// A free cell matching one of the desired start times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSlot {
    pub resource: String,
    pub date: NaiveDate,
    pub start: SlotTime,
    pub source_selector: String,
}

impl From<&Cell> for CandidateSlot {
    fn from(cell: &Cell) -> Self {
        Self {
            resource: cell.resource.clone(),
            date: cell.date,
            start: cell.start,
            source_selector: cell.source_selector.clone(),
        }
    }
}

/// Two consecutive free cells on one resource: a 60-minute booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPair {
    pub resource: String,
    pub date: NaiveDate,
    pub first_start: SlotTime,
    pub second_start: SlotTime,
    pub first_selector: String,
    pub second_selector: String,
}

/// Result of one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Resources with at least one free cell anywhere in the matrix.
    pub available_resources: Vec<String>,
    pub candidate_slots: Vec<CandidateSlot>,
    pub total_candidate_slots: usize,
    pub available_pairs: Vec<SlotPair>,
}

impl SearchResult {
    /// The placeholder for a query that could not run.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Unvalidated search parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub date: String,
    pub start_times: Vec<String>,
}

impl SearchQuery {
    pub fn new<S: AsRef<str>>(date: impl Into<String>, start_times: &[S]) -> Self {
        Self {
            date: date.into(),
            start_times: start_times.iter().map(|t| t.as_ref().to_string()).collect(),
        }
    }
}

/// A query carrying its own cell snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotQuery {
    pub query: SearchQuery,
    pub cells: Vec<Cell>,
}

/// Validated search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPairSearch {
    date: NaiveDate,
    start_times: Vec<SlotTime>,
}

impl SlotPairSearch {
    /// Validate the target date and start times.
    ///
    /// Repeated start times are dropped, keeping first occurrence order.
    ///
    /// # Errors
    /// [`SearchError::InvalidDate`] or [`SearchError::InvalidTime`] for
    /// malformed parameters. These are configuration errors and surface here
    /// rather than as an empty result.
    pub fn new<S: AsRef<str>>(date: &str, start_times: &[S]) -> Result<Self, SearchError> {
        let date = parse_date(date).ok_or_else(|| SearchError::InvalidDate(date.to_string()))?;

        let mut times: Vec<SlotTime> = Vec::with_capacity(start_times.len());
        for raw in start_times {
            let t: SlotTime = raw.as_ref().parse()?;
            if !times.contains(&t) {
                times.push(t);
            }
        }

        Ok(Self {
            date,
            start_times: times,
        })
    }

    pub fn from_query(query: &SearchQuery) -> Result<Self, SearchError> {
        Self::new(&query.date, query.start_times.as_slice())
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start_times(&self) -> &[SlotTime] {
        &self.start_times
    }

    /// Search `matrix`. Always returns a structurally valid result.
    pub fn run(&self, matrix: &AvailabilityMatrix) -> SearchResult {
        let available_resources = matrix.free_resources();

        let mut candidate_slots = Vec::new();
        for resource in matrix.resources() {
            for &t in &self.start_times {
                if let Some(cell) = matrix.cell(resource, self.date, t).filter(|c| c.is_free()) {
                    candidate_slots.push(CandidateSlot::from(cell));
                }
            }
        }

        let mut by_resource: BTreeMap<&str, HashMap<SlotTime, &CandidateSlot>> = BTreeMap::new();
        for slot in &candidate_slots {
            by_resource
                .entry(slot.resource.as_str())
                .or_default()
                .insert(slot.start, slot);
        }

        let mut available_pairs = Vec::new();
        for (resource, slots) in &by_resource {
            for t in &self.start_times {
                let Some(first) = slots.get(t) else {
                    continue;
                };
                let Some(second) = t
                    .next_slot()
                    .and_then(|next| matrix.cell(resource, self.date, next))
                    .filter(|c| c.is_free())
                else {
                    continue;
                };

                let safe = analyze_isolation(matrix, resource, self.date, *t, PAIR_DURATION_MINUTES)
                    .is_ok_and(|verdict| !verdict.is_isolating);
                if !safe {
                    debug!(resource, start = %t, "rejected isolating pair");
                    continue;
                }

                available_pairs.push(SlotPair {
                    resource: resource.to_string(),
                    date: self.date,
                    first_start: first.start,
                    second_start: second.start,
                    first_selector: first.source_selector.clone(),
                    second_selector: second.source_selector.clone(),
                });
            }
        }

        debug!(
            date = %self.date,
            candidates = candidate_slots.len(),
            pairs = available_pairs.len(),
            "slot-pair search complete"
        );

        SearchResult {
            available_resources,
            total_candidate_slots: candidate_slots.len(),
            candidate_slots,
            available_pairs,
        }
    }
}

/// Validate the parameters and search `matrix` once.
///
/// # Errors
/// See [`SlotPairSearch::new`].
pub fn search<S: AsRef<str>>(
    matrix: &AvailabilityMatrix,
    date: &str,
    start_times: &[S],
) -> Result<SearchResult, SearchError> {
    Ok(SlotPairSearch::new(date, start_times)?.run(matrix))
}

/// Run several queries against one matrix.
///
/// A query with bad parameters yields [`SearchResult::empty`] in its slot;
/// the output always has one entry per query.
pub fn search_batch(matrix: &AvailabilityMatrix, queries: &[SearchQuery]) -> Vec<SearchResult> {
    queries
        .iter()
        .map(|query| match SlotPairSearch::from_query(query) {
            Ok(search) => search.run(matrix),
            Err(err) => {
                warn!(date = %query.date, error = %err, "batch query skipped");
                SearchResult::empty()
            }
        })
        .collect()
}

/// Run queries that each carry their own cell snapshot.
///
/// Each snapshot is built into its own matrix. A snapshot that yields no
/// matrix, or a query with bad parameters, yields [`SearchResult::empty`].
pub fn search_batch_snapshots(
    queries: Vec<SnapshotQuery>,
    config: &MatrixConfig,
) -> Vec<SearchResult> {
    let builder = MatrixBuilder::new(config.clone());
    queries
        .into_iter()
        .map(|SnapshotQuery { query, cells }| {
            let search = match SlotPairSearch::from_query(&query) {
                Ok(search) => search,
                Err(err) => {
                    warn!(date = %query.date, error = %err, "batch query skipped");
                    return SearchResult::empty();
                }
            };
            match builder.build(cells) {
                Ok(matrix) => search.run(&matrix),
                Err(err) => {
                    warn!(date = %query.date, error = %err, "batch snapshot unusable");
                    SearchResult::empty()
                }
            }
        })
        .collect()
}
