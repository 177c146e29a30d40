//! Clear-then-recompute maintenance of derived `InUse` occupation state.
//!
//! `InUse` records are a cache of "this vehicle is referenced by a live
//! schedule on these dates". They are never written by an operator and never
//! trusted as input: every save rebuilds them in two batches:
//!
//! 1. **Clear.** Every agency vehicle holding a non-`Standby` record that
//!    touches the tour's calendar window (± [`CLEARING_BUFFER_DAYS`] for
//!    pickup/drop-off logistics) gets its occupation list rewritten without
//!    `InUse`, `Standby` or `Inspection` records. Scanning the whole agency,
//!    not just the vehicles the new schedule references, recovers vehicles
//!    that were in use under a *previous* version of the schedule and have
//!    since been dropped from it.
//! 2. **Apply.** From the just-persisted schedule, each referenced vehicle
//!    gets one fresh `InUse` record covering exactly its assignment dates (a
//!    vehicle working 2 of 4 tour days gets a 2-date record).
//!
//! Each batch is one `BEGIN IMMEDIATE` transaction. A second reconciliation
//! interleaving between the two batches can observe a partially-cleared list;
//! that window is accepted as a self-correcting race; the next save
//! re-reconciles.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use diesel::SqliteConnection;
use indexmap::IndexMap;

use crate::error::{SchedError, SchedResult};
use crate::models::DaySchedule;
use crate::models::occupation::{
    Occupation, OccupationKind, decode_occupations, encode_occupations, strip_reconciled,
};
use crate::repo;

/// Days added on each side of the tour calendar when hunting for stale
/// derived state.
pub const CLEARING_BUFFER_DAYS: u64 = 3;

/// What a reconciliation pass did, for logging and tests.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    /// Inclusive clearing window that was scanned.
    pub window: (NaiveDate, NaiveDate),
    /// Vehicles whose occupation lists were rewritten by the clearing batch.
    pub cleared: Vec<i32>,
    /// Vehicles that received a fresh `InUse` record.
    pub marked: Vec<i32>,
}

/// Inclusive clearing window for a tour calendar.
pub(crate) fn clearing_window(calendar: &[NaiveDate]) -> Option<(NaiveDate, NaiveDate)> {
    let first = *calendar.first()?;
    let last = *calendar.last()?;
    let from = first
        .checked_sub_days(Days::new(CLEARING_BUFFER_DAYS))
        .unwrap_or(first);
    let to = last
        .checked_add_days(Days::new(CLEARING_BUFFER_DAYS))
        .unwrap_or(last);
    Some((from, to))
}

/// Map each referenced vehicle to the set of dates it is assigned on,
/// preserving first-reference order.
pub(crate) fn vehicle_usage(
    calendar: &[NaiveDate],
    days: &[DaySchedule],
) -> IndexMap<i32, BTreeSet<NaiveDate>> {
    let mut usage: IndexMap<i32, BTreeSet<NaiveDate>> = IndexMap::new();
    for day in days {
        let Some(date) = day
            .day
            .checked_sub(1)
            .and_then(|i| calendar.get(i as usize).copied())
        else {
            continue;
        };
        for ga in &day.guides {
            if let Some(vehicle_id) = ga.vehicle_id {
                usage.entry(vehicle_id).or_default().insert(date);
            }
        }
    }
    usage
}

/// Run steps 3–5 of the save path: clear stale derived state inside the
/// window, then re-apply usage from the saved schedule.
///
/// Best-effort bookkeeping: the caller treats a failure here as
/// "schedule saved, occupation index stale until the next pass".
pub(crate) fn reconcile_vehicle_usage(
    conn: &mut SqliteConnection,
    agency_id: i32,
    calendar: &[NaiveDate],
    days: &[DaySchedule],
) -> SchedResult<ReconcileReport> {
    let (from, to) = clearing_window(calendar).ok_or_else(|| {
        SchedError::InvalidCalendar("cannot reconcile against an empty calendar".into())
    })?;

    // Batch 1: clear. Candidates are vehicles with any non-Standby record
    // touching the window; the rewrite drops derived and transient records
    // and leaves hard ones untouched.
    let mut rewrites: Vec<(i32, String)> = Vec::new();
    for vehicle in repo::list_vehicles_for_agency(conn, agency_id)? {
        let occupations = decode_occupations(&vehicle.occupations)?;
        let touches_window = occupations
            .iter()
            .any(|o| o.kind != OccupationKind::Standby && o.touches(from, to));
        if !touches_window {
            continue;
        }
        let kept = strip_reconciled(occupations.clone());
        if kept != occupations {
            rewrites.push((vehicle.id, encode_occupations(&kept)?));
        }
    }

    let cleared: Vec<i32> = rewrites.iter().map(|(id, _)| *id).collect();
    conn.immediate_transaction::<_, SchedError, _>(|conn| {
        for (vehicle_id, json) in &rewrites {
            repo::update_vehicle_occupations(conn, *vehicle_id, json)?;
        }
        Ok(())
    })?;

    // Batch 2: apply. One fresh InUse record per referenced vehicle, driven
    // by actual assignment dates.
    let usage = vehicle_usage(calendar, days);
    let mut marked = Vec::with_capacity(usage.len());
    conn.immediate_transaction::<_, SchedError, _>(|conn| {
        for (vehicle_id, dates) in &usage {
            let Some(vehicle) = repo::get_vehicle(conn, *vehicle_id)? else {
                tracing::warn!(
                    vehicle_id,
                    "schedule references a vehicle missing from the store; skipping its InUse record"
                );
                continue;
            };
            let mut occupations = decode_occupations(&vehicle.occupations)?;
            occupations.push(Occupation {
                kind: OccupationKind::InUse,
                dates: dates.clone(),
            });
            repo::update_vehicle_occupations(conn, *vehicle_id, &encode_occupations(&occupations)?)?;
            marked.push(*vehicle_id);
        }
        Ok(())
    })?;

    Ok(ReconcileReport {
        window: (from, to),
        cleared,
        marked,
    })
}
