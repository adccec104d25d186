//! # court-engine
//!
//! Availability model and slot selection for booking sports courts on a
//! 30-minute calendar grid.
//!
//! Cells extracted from the booking site's calendar are indexed into an
//! immutable [`AvailabilityMatrix`]. Candidate bookings are checked against
//! the matrix for *isolation* (leaving a free 30-minute cell that can no
//! longer be booked), and the searcher returns the 60-minute slot-pairs that
//! are safe to reserve. Everything here is synchronous and pure; page
//! automation and booking actions live elsewhere.
//!
//! ## Modules
//!
//! - [`cell`] — raw cell records, states and index keys
//! - [`time`] — `HH:MM` time-of-day arithmetic on the grid
//! - [`matrix`] — single-pass matrix builder and quality metrics
//! - [`hybrid`] — matrix plus externally reported availability
//! - [`isolation`] — stranded-slot analysis for candidate bookings
//! - [`search`] — slot-pair search over resources and start times
//! - [`scoring`] — ranking pairs by preference and booking history
//! - [`config`] — builder and scoring settings
//! - [`error`] — error types

pub mod cell;
pub mod config;
pub mod error;
pub mod hybrid;
pub mod isolation;
pub mod matrix;
pub mod scoring;
pub mod search;
pub mod time;

pub use cell::{Cell, CellState, SlotKey, SlotRef};
pub use config::{EngineConfig, MatrixConfig, ScoringConfig};
pub use error::{IsolationError, MatrixError, SearchError, TimeError};
pub use hybrid::{build_hybrid, ExternalReport, HybridMatrix};
pub use isolation::{
    check_batch_isolation, check_isolation, get_isolation_safe_slots, BookingCandidate,
    IsolationVerdict,
};
pub use matrix::{build, AvailabilityMatrix, MatrixBuilder, MatrixMetrics, MatrixWarning};
pub use scoring::{choose_pair, rank_pairs, PatternContext, PatternStats, ScoredPair};
pub use search::{search, search_batch, SearchQuery, SearchResult, SlotPair, SlotPairSearch};
pub use time::SlotTime;
