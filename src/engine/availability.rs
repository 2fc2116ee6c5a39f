use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use ulid::Ulid;

use crate::model::*;

// ── Availability Resolution ──────────────────────────────────────
//
// Two independent stages, combined here and nowhere else:
//   1. recurring weekly schedule  → who is scheduled on that weekday
//   2. session ledger subtraction → who is occupied at that instant
// The recurring schedule and the transient sessions are edited and queried
// separately; only this module joins them.

/// Weekday number in the schedule convention: 0=Sunday .. 6=Saturday.
pub fn weekday_number(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Staff scheduled to work on `date`'s weekday, in catalog order.
///
/// A staff member with no schedule entry works no days. Scheduled-or-not
/// depends only on the weekday, never on the calendar date itself.
pub fn scheduled_staff_for_day(state: &ClinicState, date: NaiveDate) -> Vec<Staff> {
    let weekday = weekday_number(date);
    state
        .staff
        .iter()
        .filter(|member| {
            state
                .weekly_schedule
                .get(&member.id)
                .is_some_and(|days| days.contains(&weekday))
        })
        .cloned()
        .collect()
}

/// Staff ids occupied by at least one session covering `at`.
///
/// A session covers `at` iff `start <= at < start + duration` (half-open: a
/// session ending exactly at `at` does not occupy, one starting exactly at
/// `at` does). Sessions whose start time fails to parse or whose service id
/// is dangling occupy nobody — malformed ledger data must never break reads.
pub fn occupied_staff_at(state: &ClinicState, at: DateTime<Utc>) -> HashSet<Ulid> {
    let mut occupied = HashSet::new();
    for session in &state.sessions {
        if let Some((start, end)) = session.occupancy(&state.services)
            && start <= at
            && at < end
        {
            occupied.insert(session.staff_id);
        }
    }
    occupied
}

/// Staff both scheduled for `at`'s weekday and not occupied at `at`,
/// preserving catalog order. Always a subset of `scheduled_staff_for_day`:
/// occupancy only removes candidates, never adds.
pub fn available_staff(state: &ClinicState, at: DateTime<Utc>) -> Vec<Staff> {
    let occupied = occupied_staff_at(state, at);
    scheduled_staff_for_day(state, at.date_naive())
        .into_iter()
        .filter(|member| !occupied.contains(&member.id))
        .collect()
}
