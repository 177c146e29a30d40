//! Schedule write path and accessors.
//!
//! ## What a save does
//! [`save_schedule`] validates the submitted day schedule against the tour's
//! derived calendar, runs the authoritative conflict pre-check over every
//! implied `(guide, date)` and `(vehicle, date)` pair, persists the itinerary's
//! activities document, and then reconciles each vehicle's derived `InUse`
//! occupation records (see [`reconcile`]).
//!
//! ## Failure semantics
//! The pre-check is all-or-nothing: any hard conflict aborts with the full
//! conflict list and zero writes. The schedule write itself is the operation
//! of record: once it commits, a failure in the occupation bookkeeping does
//! NOT roll it back. The outcome then carries `occupations_reconciled =
//! false` and a structured warning with the tour id, window, and referenced
//! vehicles; the index stays stale until the next successful save
//! (self-healing). Callers must not assume the occupation index is always
//! immediately consistent with the schedule.

pub mod conflict;
pub mod index;
pub mod read;
pub mod reconcile;

use std::collections::BTreeSet;

use diesel::SqliteConnection;

use crate::calendar::tour_calendar;
use crate::error::{SchedError, SchedResult};
use crate::models::DaySchedule;
use crate::models::schedule::{decode_activities, encode_activities};
use crate::repo;

/// Outcome of a committed save.
#[derive(Debug, Clone)]
pub struct SavedSchedule {
    /// Tour the schedule belongs to.
    pub tour_id: i32,
    /// Itinerary that now holds the document.
    pub itinerary_id: i32,
    /// The persisted per-day schedule, after merging with prior values.
    pub days: Vec<DaySchedule>,
    /// False when the schedule committed but the occupation-index update
    /// failed and was deferred to the next save.
    pub occupations_reconciled: bool,
}

/// Persist a complete replacement day schedule for a tour's bound itinerary.
///
/// See the module docs for ordering and failure semantics. Errors:
/// `TourNotFound`, `NotBound`, `InvalidCalendar` (no usable anchors; a
/// fallback calendar is never persisted against), `InvalidSchedule`
/// (day index 0, duplicate, or beyond the calendar), `HardConflict`.
pub fn save_schedule(
    conn: &mut SqliteConnection,
    tour_id: i32,
    incoming: Vec<DaySchedule>,
) -> SchedResult<SavedSchedule> {
    let tour = repo::get_tour(conn, tour_id)?;
    let itinerary_id = tour.itinerary_id.ok_or(SchedError::NotBound { tour_id })?;
    let calendar = tour_calendar(&tour)?;

    let mut days = incoming;
    days.sort_by_key(|d| d.day);
    validate_day_indices(&days, calendar.len())?;

    // Step 1: authoritative pre-check over every implied pair, guides and
    // vehicles alike. Hard stop on any conflict, nothing written.
    let pairs = conflict::pairs_from_schedule(&calendar, &days);
    let conflicts = conflict::check_conflicts(conn, tour_id, &pairs)?;
    if !conflicts.is_empty() {
        return Err(SchedError::HardConflict(conflicts));
    }

    // Step 2: persist the document. Per-day merge keeps hotelInfo and
    // description from the prior version when the incoming day omits them.
    let itinerary = repo::get_itinerary(conn, itinerary_id)?;
    let prior = decode_activities(&itinerary.activities)?;
    let merged: Vec<DaySchedule> = days
        .into_iter()
        .map(|d| {
            let day = d.day;
            d.merged_over(prior.iter().find(|p| p.day == day))
        })
        .collect();
    repo::replace_itinerary_activities(conn, itinerary_id, &encode_activities(&merged)?)?;

    // Steps 3–5: best-effort occupation bookkeeping.
    let occupations_reconciled =
        match reconcile::reconcile_vehicle_usage(conn, tour.agency_id, &calendar, &merged) {
            Ok(report) => {
                tracing::debug!(
                    tour_id,
                    window = ?report.window,
                    cleared = ?report.cleared,
                    marked = ?report.marked,
                    "occupation index reconciled"
                );
                true
            }
            Err(e) => {
                let referenced: Vec<i32> = reconcile::vehicle_usage(&calendar, &merged)
                    .keys()
                    .copied()
                    .collect();
                tracing::warn!(
                    tour_id,
                    window = ?reconcile::clearing_window(&calendar),
                    vehicles = ?referenced,
                    error = %e,
                    "schedule saved but occupation reconciliation failed; \
                     index is stale until the next save"
                );
                false
            }
        };

    if let Err(e) = index::refresh_guide_index(conn) {
        tracing::warn!(tour_id, error = %e, "guide-day index refresh failed after save");
    }

    Ok(SavedSchedule {
        tour_id,
        itinerary_id,
        days: merged,
        occupations_reconciled,
    })
}

fn validate_day_indices(days: &[DaySchedule], calendar_len: usize) -> SchedResult<()> {
    let mut seen = BTreeSet::new();
    for day in days {
        if day.day == 0 {
            return Err(SchedError::InvalidSchedule("day indices are 1-based".into()));
        }
        if day.day as usize > calendar_len {
            return Err(SchedError::InvalidSchedule(format!(
                "day {} is beyond the {}-day tour calendar",
                day.day, calendar_len
            )));
        }
        if !seen.insert(day.day) {
            return Err(SchedError::InvalidSchedule(format!(
                "duplicate entry for day {}",
                day.day
            )));
        }
    }
    Ok(())
}
