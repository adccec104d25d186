//! Isolation analysis -- would a booking strand a free slot?
//!
//! The site's minimum booking is 60 minutes (two grid cells). A free cell
//! next to a candidate booking is *isolated* when, once the booking is placed,
//! it can no longer be combined with a reachable free neighbor into a booking
//! of that length. Booking it would leave a dead 30-minute gap.
//!
//! Both edges of the candidate are checked independently:
//!
//! - **Before** the booking: the cell at `start - 30` is isolated when it is
//!   free but `start - 60` is not.
//! - **After** the booking: the cell at `end` is isolated when both of its
//!   neighbors are blocked and neither skip extension (`end + 60` forward,
//!   `start - 60` backward) is free. The skip rule assumes a booking may step
//!   over exactly one occupied cell.
//! - When `end` is past the last observed cell, each free interior cell of the
//!   booking with no cell after it is reported instead.
//!
//! Any failure (bad date or time, bad duration, unknown resource, a start cell
//! the matrix never observed) resolves to an isolating verdict. An error is never reported as safe to book.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cell::SlotRef;
use crate::error::IsolationError;
use crate::matrix::AvailabilityMatrix;
use crate::time::{parse_date, SlotTime, MINUTES_PER_DAY, SLOT_MINUTES};

/// Outcome of analysing one candidate booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolationVerdict {
    pub is_isolating: bool,
    pub affected_slots: Vec<SlotRef>,
    pub explanation: String,
}

impl IsolationVerdict {
    /// The safe default for an analysis that could not be completed.
    fn failed(err: &IsolationError) -> Self {
        Self {
            is_isolating: true,
            affected_slots: Vec::new(),
            explanation: format!("isolation analysis failed ({err}); treating booking as isolating"),
        }
    }
}

/// A booking to analyse, as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCandidate {
    pub resource: String,
    pub date: String,
    pub start: String,
    pub duration_minutes: u32,
}

impl BookingCandidate {
    pub fn new(
        resource: impl Into<String>,
        date: impl Into<String>,
        start: impl Into<String>,
        duration_minutes: u32,
    ) -> Self {
        Self {
            resource: resource.into(),
            date: date.into(),
            start: start.into(),
            duration_minutes,
        }
    }
}

/// Check whether booking `duration_minutes` at `start` would isolate a slot.
///
/// Never fails: malformed input or a resource or cell missing from the matrix yields
/// an isolating verdict with no affected slots and an explanation.
pub fn check_isolation(
    matrix: &AvailabilityMatrix,
    resource: &str,
    date: &str,
    start: &str,
    duration_minutes: u32,
) -> IsolationVerdict {
    let analysis = parse_date(date)
        .ok_or_else(|| IsolationError::InvalidDate(date.to_string()))
        .and_then(|date| Ok((date, start.parse::<SlotTime>()?)))
        .and_then(|(date, start)| analyze_isolation(matrix, resource, date, start, duration_minutes));

    match analysis {
        Ok(verdict) => verdict,
        Err(err) => {
            warn!(resource, date, start, duration_minutes, error = %err, "isolation analysis failed");
            IsolationVerdict::failed(&err)
        }
    }
}

/// Typed isolation analysis.
///
/// # Errors
/// [`IsolationError::InvalidDuration`] unless the duration is a positive
/// multiple of 30 no longer than a day, and
/// [`IsolationError::UnknownResource`] if the matrix has no such resource, and
/// [`IsolationError::MissingEntry`] if the date lies outside the matrix or the
/// resource has no cell at `start`.
pub fn analyze_isolation(
    matrix: &AvailabilityMatrix,
    resource: &str,
    date: NaiveDate,
    start: SlotTime,
    duration_minutes: u32,
) -> Result<IsolationVerdict, IsolationError> {
    let duration = i32::try_from(duration_minutes)
        .ok()
        .filter(|d| *d > 0 && *d <= MINUTES_PER_DAY && d % SLOT_MINUTES == 0)
        .ok_or(IsolationError::InvalidDuration(duration_minutes))?;

    if !matrix.has_resource(resource) {
        return Err(IsolationError::UnknownResource(resource.to_string()));
    }

    if !matrix.date_range().contains(date) || matrix.cell(resource, date, start).is_none() {
        return Err(IsolationError::MissingEntry {
            resource: resource.to_string(),
            date,
            start,
        });
    }

    let probe = Probe {
        matrix,
        resource,
        date,
        start,
        duration,
    };

    let mut isolated: Vec<SlotTime> = probe.before_side().into_iter().collect();
    isolated.extend(probe.after_side());

    let explanation = if isolated.is_empty() {
        format!(
            "{duration_minutes}-minute booking at {start} on {date} leaves no isolated slots on {resource}"
        )
    } else {
        let times: Vec<String> = isolated.iter().map(SlotTime::to_string).collect();
        format!(
            "{duration_minutes}-minute booking at {start} on {date} would isolate {} on {resource}",
            times.join(", ")
        )
    };

    Ok(IsolationVerdict {
        is_isolating: !isolated.is_empty(),
        affected_slots: isolated
            .into_iter()
            .map(|start| SlotRef {
                resource: resource.to_string(),
                date,
                start,
            })
            .collect(),
        explanation,
    })
}

/// Run [`check_isolation`] on each candidate, preserving order.
pub fn check_batch_isolation(
    matrix: &AvailabilityMatrix,
    candidates: &[BookingCandidate],
) -> Vec<(BookingCandidate, IsolationVerdict)> {
    candidates
        .iter()
        .map(|c| {
            let verdict = check_isolation(matrix, &c.resource, &c.date, &c.start, c.duration_minutes);
            (c.clone(), verdict)
        })
        .collect()
}

/// Free start times on `resource`/`date` where a booking of
/// `duration_minutes` isolates nothing, sorted ascending.
///
/// An unparseable date yields an empty list.
pub fn get_isolation_safe_slots(
    matrix: &AvailabilityMatrix,
    resource: &str,
    date: &str,
    duration_minutes: u32,
) -> Vec<SlotTime> {
    let Some(date) = parse_date(date) else {
        warn!(resource, date, "invalid date for safe-slot query");
        return Vec::new();
    };

    matrix
        .time_points()
        .iter()
        .copied()
        .filter(|&t| matrix.is_free(resource, date, t))
        .filter(|&t| {
            analyze_isolation(matrix, resource, date, t, duration_minutes)
                .is_ok_and(|verdict| !verdict.is_isolating)
        })
        .collect()
}

/// One candidate booking laid over a matrix.
struct Probe<'a> {
    matrix: &'a AvailabilityMatrix,
    resource: &'a str,
    date: NaiveDate,
    start: SlotTime,
    duration: i32,
}

impl Probe<'_> {
    fn exists(&self, t: Option<SlotTime>) -> bool {
        t.is_some_and(|t| self.matrix.cell(self.resource, self.date, t).is_some())
    }

    fn free(&self, t: Option<SlotTime>) -> bool {
        t.is_some_and(|t| self.matrix.is_free(self.resource, self.date, t))
    }

    fn in_window(&self, t: SlotTime) -> bool {
        let offset = t.minutes() - self.start.minutes();
        (0..self.duration).contains(&offset)
    }

    /// Off the grid, covered by the booking, or not free.
    fn blocked(&self, t: Option<SlotTime>) -> bool {
        match t {
            Some(t) => self.in_window(t) || !self.free(Some(t)),
            None => true,
        }
    }

    fn before_side(&self) -> Option<SlotTime> {
        let before = self.start.prev_slot()?;
        if !self.free(Some(before)) {
            return None;
        }
        if self.free(before.prev_slot()) {
            None
        } else {
            Some(before)
        }
    }

    fn after_side(&self) -> Vec<SlotTime> {
        let end = self.start.offset(self.duration);
        match end {
            Some(end) if self.exists(Some(end)) => {
                if self.free(Some(end)) && self.end_is_isolated(end) {
                    vec![end]
                } else {
                    Vec::new()
                }
            }
            _ => self.end_of_day(),
        }
    }

    fn end_is_isolated(&self, end: SlotTime) -> bool {
        let prev_blocked = self.blocked(end.prev_slot());
        let next_blocked = self.blocked(end.next_slot());
        if !(prev_blocked && next_blocked) {
            return false;
        }

        let skip_forward = self.free(end.offset(2 * SLOT_MINUTES));
        let skip_backward = self.free(self.start.offset(-2 * SLOT_MINUTES));
        !(skip_forward || skip_backward)
    }

    /// The booking runs past the last observed cell.
    fn end_of_day(&self) -> Vec<SlotTime> {
        (SLOT_MINUTES..self.duration)
            .step_by(SLOT_MINUTES as usize)
            .filter_map(|offset| self.start.offset(offset))
            .filter(|&t| self.free(Some(t)) && !self.exists(t.next_slot()))
            .collect()
    }
}
