//! Conflict checking (the read-only gate).
//!
//! Given a candidate set of `(resource, date)` pairs for one tour, reports
//! the subset that collides with existing commitments, mutating nothing.
//!
//! Rules:
//! - a **vehicle** pair conflicts when any *hard* occupation record
//!   (Maintenance, Upkeep, Accident, Rental) covers the date. `InUse`,
//!   `Standby` and `Inspection` never block: `InUse` reflects this
//!   subsystem's own prior output and is recomputed wholesale on every save;
//! - a **guide** pair conflicts when another tour's bound itinerary schedules
//!   that guide on the same calendar date, resolved through the guide-day
//!   index ([`crate::sched::index`]) rather than a per-check scan of every
//!   itinerary document.
//!
//! The checker is advisory: a second actor can commit between a check and a
//! save (check-then-act race). [`crate::sched::save_schedule`] re-runs the
//! same check inside its own write path, which is the authoritative one.

use std::collections::HashMap;

use chrono::NaiveDate;
use diesel::SqliteConnection;
use serde::Serialize;

use crate::error::SchedResult;
use crate::models::DaySchedule;
use crate::models::occupation::{blocking_record, decode_occupations};
use crate::repo;
use crate::sched::index;

/// Which kind of resource a pair refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// A tour guide.
    Guide,
    /// A fleet vehicle.
    Vehicle,
}

/// One proposed `(resource, date)` pair to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentRef {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Guide or vehicle id.
    pub resource_id: i32,
    /// Calendar date of the assignment.
    pub date: NaiveDate,
}

/// One detected collision. An empty conflict list means "safe to persist";
/// a non-empty list is a hard stop with no partial writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Guide or vehicle id.
    #[serde(rename = "resourceId")]
    pub resource_id: i32,
    /// Blocked date.
    pub date: NaiveDate,
    /// Human-readable explanation.
    pub message: String,
}

/// Expand a proposed day schedule into the `(resource, date)` pairs it
/// implies. Days outside the calendar carry no date and are skipped here;
/// the save path rejects them up front.
pub fn pairs_from_schedule(calendar: &[NaiveDate], days: &[DaySchedule]) -> Vec<AssignmentRef> {
    let mut pairs = Vec::new();
    for day in days {
        let Some(date) = day
            .day
            .checked_sub(1)
            .and_then(|i| calendar.get(i as usize).copied())
        else {
            continue;
        };
        for ga in &day.guides {
            pairs.push(AssignmentRef {
                kind: ResourceKind::Guide,
                resource_id: ga.guide_id,
                date,
            });
            if let Some(vehicle_id) = ga.vehicle_id {
                pairs.push(AssignmentRef {
                    kind: ResourceKind::Vehicle,
                    resource_id: vehicle_id,
                    date,
                });
            }
        }
    }
    pairs
}

/// Check a candidate pair set against existing commitments for `tour_id`.
///
/// Read-only. Refreshes the guide-day index first so guide lookups reflect
/// the store as of this call.
pub fn check_conflicts(
    conn: &mut SqliteConnection,
    tour_id: i32,
    pairs: &[AssignmentRef],
) -> SchedResult<Vec<Conflict>> {
    // Resolves the tour up front so unknown ids fail loudly even when the
    // pair set is empty.
    let _tour = repo::get_tour(conn, tour_id)?;

    index::refresh_guide_index(conn)?;

    let mut conflicts = Vec::new();
    // Each vehicle's occupation document is decoded once per call.
    let mut occupations_by_vehicle = HashMap::new();

    for pair in pairs {
        match pair.kind {
            ResourceKind::Vehicle => {
                let occupations = match occupations_by_vehicle.entry(pair.resource_id) {
                    std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
                    std::collections::hash_map::Entry::Vacant(e) => {
                        let loaded = match repo::get_vehicle(conn, pair.resource_id)? {
                            Some(v) => decode_occupations(&v.occupations)?,
                            None => Vec::new(),
                        };
                        e.insert(loaded)
                    }
                };
                if let Some(block) = blocking_record(occupations, pair.date) {
                    conflicts.push(Conflict {
                        kind: ResourceKind::Vehicle,
                        resource_id: pair.resource_id,
                        date: pair.date,
                        message: format!(
                            "vehicle {} is blocked by {} on {}",
                            pair.resource_id, block.kind, pair.date
                        ),
                    });
                }
            }
            ResourceKind::Guide => {
                let holders = index::tours_for_guide_on(pair.resource_id, pair.date);
                if let Some(other) = holders.iter().find(|t| **t != tour_id) {
                    conflicts.push(Conflict {
                        kind: ResourceKind::Guide,
                        resource_id: pair.resource_id,
                        date: pair.date,
                        message: format!(
                            "guide {} is already scheduled on {} by tour {}",
                            pair.resource_id, pair.date, other
                        ),
                    });
                }
            }
        }
    }

    Ok(conflicts)
}
