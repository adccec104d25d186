//! Tests for isolation analysis.
//!
//! Grids are written as one string per resource: each character is a
//! half-hour cell starting at the given time. `F` free, `B` booked,
//! `U` unavailable, `?` unknown, `.` no cell observed.

use chrono::NaiveDate;
use court_engine::isolation::{
    analyze_isolation, check_batch_isolation, check_isolation, get_isolation_safe_slots,
    BookingCandidate,
};
use court_engine::matrix::build;
use court_engine::{AvailabilityMatrix, Cell, CellState, IsolationError, SlotTime};

const DAY: &str = "2026-03-16";

// ── Helpers ─────────────────────────────────────────────────────────────────

fn time(s: &str) -> SlotTime {
    s.parse().unwrap()
}

fn day() -> NaiveDate {
    DAY.parse().unwrap()
}

fn row(resource: &str, first: &str, pattern: &str) -> Vec<Cell> {
    let first = time(first);
    pattern
        .chars()
        .enumerate()
        .filter_map(|(i, ch)| {
            let state = match ch {
                'F' => CellState::Free,
                'B' => CellState::Booked,
                'U' => CellState::Unavailable,
                '?' => CellState::Unknown,
                _ => return None,
            };
            let start = first.offset(30 * i as i32).unwrap();
            Some(Cell::new(resource, day(), start, state))
        })
        .collect()
}

fn matrix(rows: &[(&str, &str, &str)]) -> AvailabilityMatrix {
    let cells: Vec<Cell> = rows
        .iter()
        .flat_map(|(resource, first, pattern)| row(resource, first, pattern))
        .collect();
    build(cells).unwrap()
}

fn isolated_times(verdict: &court_engine::IsolationVerdict) -> Vec<String> {
    verdict
        .affected_slots
        .iter()
        .map(|s| s.start.to_string())
        .collect()
}

// ── Worked examples ─────────────────────────────────────────────────────────

#[test]
fn slot_before_booking_with_no_partner_is_isolated() {
    // 13:00 F, 13:30 B (candidate start), 14:00 F, 14:30 F
    let m = matrix(&[("R", "13:00", "FBFF")]);

    let verdict = check_isolation(&m, "R", DAY, "13:30", 60);

    assert!(verdict.is_isolating);
    let times = isolated_times(&verdict);
    assert!(times.contains(&"13:00".to_string()));
    assert!(!times.contains(&"14:00".to_string()));
    assert_eq!(verdict.affected_slots[0].resource, "R");
    assert_eq!(verdict.affected_slots[0].date, day());
}

#[test]
fn free_slot_two_before_rescues_the_before_side() {
    // Same as above with 12:30 free.
    let m = matrix(&[("R", "12:30", "FFBFF")]);

    let verdict = check_isolation(&m, "R", DAY, "13:30", 60);

    assert!(!isolated_times(&verdict).contains(&"13:00".to_string()));
    assert!(!verdict.is_isolating);
    assert!(verdict.affected_slots.is_empty());
}

#[test]
fn booking_at_start_of_day_has_no_before_side() {
    // 00:00 is the first possible slot; nothing before it can be stranded.
    let m = matrix(&[("R", "00:00", "FFB")]);

    let verdict = check_isolation(&m, "R", DAY, "00:00", 60);

    assert!(!verdict.is_isolating, "{}", verdict.explanation);
}

#[test]
fn occupied_slot_before_booking_is_not_reported() {
    let m = matrix(&[("R", "09:00", "FBFFB")]);

    // Before-side cell 09:30 is booked; after-side 11:00 is booked.
    let verdict = check_isolation(&m, "R", DAY, "10:00", 60);

    assert!(!verdict.is_isolating);
}

#[test]
fn unknown_slot_before_booking_is_not_treated_as_free() {
    // 09:30 is unknown: it is not free, so it can neither be stranded nor rescue 10:00.
    let m = matrix(&[("R", "09:30", "?FFFB")]);

    let verdict = check_isolation(&m, "R", DAY, "10:30", 60);

    assert_eq!(isolated_times(&verdict), vec!["10:00"]);
}

// ── After side ──────────────────────────────────────────────────────────────

#[test]
fn slot_after_booking_with_free_successor_is_safe() {
    // Booking 10:00-11:00, end 11:00 F, 11:30 F.
    let m = matrix(&[("R", "09:00", "BBFFFFB")]);

    let verdict = check_isolation(&m, "R", DAY, "10:00", 60);

    assert!(!verdict.is_isolating, "{}", verdict.explanation);
}

#[test]
fn slot_after_booking_boxed_in_is_isolated() {
    // Booking 10:00-11:00, end 11:00 F boxed by 11:30 B, no skip extensions.
    let m = matrix(&[("R", "09:00", "BBFFFBB")]);

    let verdict = check_isolation(&m, "R", DAY, "10:00", 60);

    assert!(verdict.is_isolating);
    assert_eq!(isolated_times(&verdict), vec!["11:00"]);
    assert!(verdict.explanation.contains("11:00"));
}

#[test]
fn skip_forward_extension_rescues_end_slot() {
    // End 11:00 F, 11:30 B, 12:00 F → a booking can still reach past 11:30.
    let m = matrix(&[("R", "09:00", "BBFFFBF")]);

    let verdict = check_isolation(&m, "R", DAY, "10:00", 60);

    assert!(!verdict.is_isolating, "{}", verdict.explanation);
}

#[test]
fn skip_backward_extension_rescues_end_slot() {
    // 09:00 F, 09:30 F (so the before side is safe), booking 10:00-11:00,
    // end 11:00 F boxed in by 11:30 B; start - 60 (09:00) is free.
    let m = matrix(&[("R", "09:00", "FFFFFBB")]);

    let verdict = check_isolation(&m, "R", DAY, "10:00", 60);

    assert!(!verdict.is_isolating, "{}", verdict.explanation);
}

#[test]
fn occupied_end_slot_is_not_reported() {
    let m = matrix(&[("R", "09:00", "BBFFBF")]);

    let verdict = check_isolation(&m, "R", DAY, "10:00", 60);

    assert!(!verdict.is_isolating);
}

#[test]
fn both_sides_can_be_isolated_at_once() {
    // 09:30 F alone before, 11:00 F alone after.
    let m = matrix(&[("R", "09:00", "BFFFFB")]);

    let verdict = check_isolation(&m, "R", DAY, "10:00", 60);

    assert_eq!(isolated_times(&verdict), vec!["09:30", "11:00"]);
}

#[test]
fn longer_bookings_check_the_cell_after_the_full_window() {
    // 90-minute booking 10:00-11:30; end 11:30 F followed by 12:00 F.
    let m = matrix(&[("R", "09:30", "BFFFFFB")]);

    let verdict = check_isolation(&m, "R", DAY, "10:00", 90);

    assert!(!verdict.is_isolating, "{}", verdict.explanation);
}

// ── End of grid ─────────────────────────────────────────────────────────────

#[test]
fn booking_past_grid_end_reports_trailing_interior_slot() {
    // Grid ends at 21:30. A 60-minute booking at 21:00 ends at 22:00, which
    // has no cell; 21:30 is free with nothing after it.
    let m = matrix(&[("R", "20:00", "BBFF")]);

    let verdict = check_isolation(&m, "R", DAY, "21:00", 60);

    assert!(verdict.is_isolating);
    assert_eq!(isolated_times(&verdict), vec!["21:30"]);
}

#[test]
fn booking_past_grid_end_ignores_occupied_interior_slots() {
    let m = matrix(&[("R", "20:00", "BBFB")]);

    let verdict = check_isolation(&m, "R", DAY, "21:00", 60);

    assert!(!verdict.is_isolating);
}

#[test]
fn booking_past_midnight_uses_end_of_grid_analysis() {
    let m = matrix(&[("R", "22:30", "BFF")]);

    let verdict = check_isolation(&m, "R", DAY, "23:00", 60);

    assert_eq!(isolated_times(&verdict), vec!["23:30"]);
}

// ── Failure policy ──────────────────────────────────────────────────────────

#[test]
fn malformed_time_is_isolating_with_no_slots() {
    let m = matrix(&[("R", "10:00", "FFFF")]);

    let verdict = check_isolation(&m, "R", DAY, "25:99", 60);

    assert!(verdict.is_isolating);
    assert!(verdict.affected_slots.is_empty());
    assert!(verdict.explanation.contains("failed"));
}

#[test]
fn malformed_date_is_isolating() {
    let m = matrix(&[("R", "10:00", "FFFF")]);

    let verdict = check_isolation(&m, "R", "16/03/2026", "10:00", 60);

    assert!(verdict.is_isolating);
    assert!(verdict.affected_slots.is_empty());
}

#[test]
fn unknown_resource_is_isolating() {
    let m = matrix(&[("R", "10:00", "FFFF")]);

    let verdict = check_isolation(&m, "Nowhere", DAY, "10:00", 60);

    assert!(verdict.is_isolating);
    assert!(verdict.explanation.contains("Nowhere"));
}

#[test]
fn bad_duration_is_isolating() {
    let m = matrix(&[("R", "10:00", "FFFF")]);

    for duration in [0, 45, 24 * 60 + 30] {
        let verdict = check_isolation(&m, "R", DAY, "10:00", duration);
        assert!(verdict.is_isolating, "duration {duration} must be rejected");
        assert!(verdict.affected_slots.is_empty());
    }
}

#[test]
fn date_outside_the_matrix_is_isolating() {
    let m = matrix(&[("R", "13:00", "FFF")]);

    let verdict = check_isolation(&m, "R", "2030-01-01", "13:30", 60);

    assert!(verdict.is_isolating);
    assert!(verdict.affected_slots.is_empty());
    assert!(verdict.explanation.contains("No cell observed"));
}

#[test]
fn start_without_a_cell_is_isolating() {
    let m = matrix(&[("R", "13:00", "FFF")]);

    let verdict = check_isolation(&m, "R", DAY, "20:00", 60);

    assert!(verdict.is_isolating);
    assert!(verdict.affected_slots.is_empty());
}

#[test]
fn typed_analysis_reports_the_error() {
    let m = matrix(&[("R", "10:00", "FFFF")]);

    let err = analyze_isolation(&m, "R", day(), time("10:00"), 45).unwrap_err();
    assert_eq!(err, IsolationError::InvalidDuration(45));

    let err = analyze_isolation(&m, "X", day(), time("10:00"), 60).unwrap_err();
    assert_eq!(err, IsolationError::UnknownResource("X".to_string()));

    let err = analyze_isolation(&m, "R", day(), time("20:00"), 60).unwrap_err();
    assert_eq!(
        err,
        IsolationError::MissingEntry {
            resource: "R".to_string(),
            date: day(),
            start: time("20:00"),
        }
    );
}

// ── Purity ──────────────────────────────────────────────────────────────────

#[test]
fn repeated_checks_give_identical_verdicts() {
    let m = matrix(&[("R", "13:00", "FBFF")]);

    let first = check_isolation(&m, "R", DAY, "13:30", 60);
    let second = check_isolation(&m, "R", DAY, "13:30", 60);

    assert_eq!(first, second);
}

// ── Batch ───────────────────────────────────────────────────────────────────

#[test]
fn batch_preserves_order_and_isolates_failures() {
    let m = matrix(&[("R", "09:00", "BFFFFB"), ("S", "09:00", "FFFFFF")]);
    let candidates = vec![
        BookingCandidate::new("R", DAY, "10:00", 60),
        BookingCandidate::new("R", DAY, "not-a-time", 60),
        BookingCandidate::new("S", DAY, "10:00", 60),
    ];

    let results = check_batch_isolation(&m, &candidates);

    assert_eq!(results.len(), 3);
    for ((candidate, _), expected) in results.iter().zip(&candidates) {
        assert_eq!(candidate, expected);
    }
    assert!(results[0].1.is_isolating);
    assert!(!results[0].1.affected_slots.is_empty());
    assert!(results[1].1.is_isolating);
    assert!(results[1].1.affected_slots.is_empty());
    assert!(!results[2].1.is_isolating, "{}", results[2].1.explanation);
}

#[test]
fn batch_of_nothing_is_empty() {
    let m = matrix(&[("R", "10:00", "FF")]);
    assert!(check_batch_isolation(&m, &[]).is_empty());
}

// ── Safe slots ──────────────────────────────────────────────────────────────

#[test]
fn safe_slots_are_free_and_non_isolating() {
    // 09:00 B, 09:30..11:30 F (5 cells), 12:00 B
    let m = matrix(&[("R", "09:00", "BFFFFFB")]);

    let safe: Vec<String> = get_isolation_safe_slots(&m, "R", DAY, 60)
        .iter()
        .map(ToString::to_string)
        .collect();

    // 09:30: nothing before; end 10:30 F → 11:00 F open → safe.
    // 10:00: strands 09:30.
    // 10:30: before 10:00 F, 09:30 F → ok; end 11:30 boxed by 11:00 (window) and 12:00 B,
    //        skip-forward 12:30 absent, skip-backward 09:30 F → rescued → safe.
    // 11:00: end 12:00 booked; before 10:30 F with 10:00 F → safe.
    // 11:30: end 12:30 absent → trailing-interior check: 12:00 booked → safe;
    //        before 11:00 F with 10:30 F → safe.
    assert_eq!(safe, vec!["09:30", "10:30", "11:00", "11:30"]);
}

#[test]
fn safe_slots_for_bad_date_or_resource_are_empty() {
    let m = matrix(&[("R", "10:00", "FFFF")]);

    assert!(get_isolation_safe_slots(&m, "R", "tomorrow", 60).is_empty());
    assert!(get_isolation_safe_slots(&m, "Nowhere", DAY, 60).is_empty());
}
