//! Hybrid matrix -- the page snapshot plus an optional second opinion.
//!
//! A second source (for example the site's own availability feed) may report
//! per-resource, per-date free times. Reports are stored next to the matrix
//! keyed by `(resource, date)`. Reconciling the two sources is not done here:
//! `conflicts` exists for that purpose and is always empty.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cell::{Cell, CellState};
use crate::error::{MatrixError, Result};
use crate::matrix::{AvailabilityMatrix, MatrixBuilder};
use crate::time::SlotTime;

/// One externally reported availability record, as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalReport {
    pub resource: String,
    pub date: NaiveDate,
    pub available_times: Vec<String>,
    pub reported_at: DateTime<Utc>,
    /// How much the source is trusted, in `[0, 1]`.
    pub reliability: f64,
}

/// Stored form of an external report for one resource and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalAvailability {
    pub available_times: Vec<String>,
    pub reported_at: DateTime<Utc>,
    pub reliability: f64,
}

/// A disagreement between the page and the external source for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConflict {
    pub resource: String,
    pub date: NaiveDate,
    pub start: SlotTime,
    pub observed: CellState,
    pub reported_available: bool,
}

/// An availability matrix with attached corroborating data.
#[derive(Debug, Clone)]
pub struct HybridMatrix {
    matrix: AvailabilityMatrix,
    external: Option<BTreeMap<(String, NaiveDate), ExternalAvailability>>,
    conflicts: Vec<SourceConflict>,
}

impl HybridMatrix {
    pub fn matrix(&self) -> &AvailabilityMatrix {
        &self.matrix
    }

    pub fn into_matrix(self) -> AvailabilityMatrix {
        self.matrix
    }

    pub fn has_external(&self) -> bool {
        self.external.is_some()
    }

    pub fn external_for(&self, resource: &str, date: NaiveDate) -> Option<&ExternalAvailability> {
        self.external
            .as_ref()?
            .get(&(resource.to_string(), date))
    }

    /// Number of `(resource, date)` entries attached.
    pub fn external_len(&self) -> usize {
        self.external.as_ref().map_or(0, BTreeMap::len)
    }

    pub fn conflicts(&self) -> &[SourceConflict] {
        &self.conflicts
    }
}

impl MatrixBuilder {
    /// Build a matrix and attach external reports.
    ///
    /// A later report for the same `(resource, date)` replaces an earlier one.
    ///
    /// # Errors
    /// [`MatrixError::NoData`] as for [`MatrixBuilder::build`], and
    /// [`MatrixError::InvalidReliability`] if any report's reliability is
    /// outside `[0, 1]` or not a number.
    pub fn build_hybrid<I>(
        &self,
        cells: I,
        external: Option<Vec<ExternalReport>>,
    ) -> Result<HybridMatrix>
    where
        I: IntoIterator<Item = Cell>,
    {
        let matrix = self.build(cells)?;

        let external = match external {
            Some(reports) => {
                let mut stored = BTreeMap::new();
                for report in reports {
                    if !(0.0..=1.0).contains(&report.reliability) {
                        return Err(MatrixError::InvalidReliability {
                            resource: report.resource,
                            date: report.date,
                            reliability: report.reliability,
                        });
                    }
                    stored.insert(
                        (report.resource, report.date),
                        ExternalAvailability {
                            available_times: report.available_times,
                            reported_at: report.reported_at,
                            reliability: report.reliability,
                        },
                    );
                }
                debug!(entries = stored.len(), "attached external availability");
                Some(stored)
            }
            None => None,
        };

        Ok(HybridMatrix {
            matrix,
            external,
            conflicts: Vec::new(),
        })
    }
}

/// Build a hybrid matrix with the default configuration.
///
/// # Errors
/// See [`MatrixBuilder::build_hybrid`].
pub fn build_hybrid<I>(cells: I, external: Option<Vec<ExternalReport>>) -> Result<HybridMatrix>
where
    I: IntoIterator<Item = Cell>,
{
    MatrixBuilder::default().build_hybrid(cells, external)
}
