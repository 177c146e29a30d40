//! Lock-free, read-mostly index of guide bookings.
//!
//! Guide assignments live embedded inside each itinerary's activities
//! document, so a naive guide conflict check would re-scan every itinerary
//! on every call. Instead this module keeps a `(guide_id, date) -> [tour_id]`
//! snapshot behind an `ArcSwap`: readers do one atomic load plus a map
//! lookup, and writers rebuild the whole snapshot from the store after every
//! reconciliation (or before a check).
//!
//! The snapshot starts empty; until someone calls [`refresh_guide_index`],
//! all lookups come back empty.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::NaiveDate;
use diesel::SqliteConnection;
use once_cell::sync::Lazy;

use crate::calendar::tour_calendar;
use crate::error::SchedResult;
use crate::models::schedule::decode_activities;
use crate::repo;

/// Snapshot type held inside the index: which tours book a guide on a date.
type GuideDayMap = HashMap<(i32, NaiveDate), Vec<i32>>;

static GUIDE_DAYS: Lazy<ArcSwap<GuideDayMap>> =
    Lazy::new(|| ArcSwap::from_pointee(GuideDayMap::new()));

/// Tours whose bound itineraries schedule `guide_id` on `date`, per the
/// current snapshot. One atomic load, no database access.
pub fn tours_for_guide_on(guide_id: i32, date: NaiveDate) -> Vec<i32> {
    let snap = GUIDE_DAYS.load();
    snap.get(&(guide_id, date)).cloned().unwrap_or_default()
}

/// Rebuild the snapshot from the store and atomically swap it in.
///
/// Called by the conflict checker before lookups and by the save path after
/// each reconciliation. Tours that are cancelled, unbound, or lack usable
/// anchors contribute nothing; an itinerary document that fails to decode is
/// skipped with a warning rather than poisoning the whole refresh.
pub fn refresh_guide_index(conn: &mut SqliteConnection) -> SchedResult<()> {
    let mut map = GuideDayMap::new();

    for tour in repo::list_all_tours(conn)? {
        if tour.is_cancelled() {
            continue;
        }
        let Some(itinerary_id) = tour.itinerary_id else {
            continue;
        };
        let Ok(calendar) = tour_calendar(&tour) else {
            // No anchors yet: the tour has no authoritative dates to hold.
            continue;
        };
        let itinerary = repo::get_itinerary(conn, itinerary_id)?;
        let days = match decode_activities(&itinerary.activities) {
            Ok(days) => days,
            Err(e) => {
                tracing::warn!(
                    tour_id = tour.id,
                    itinerary_id,
                    error = %e,
                    "skipping undecodable activities document during index refresh"
                );
                continue;
            }
        };

        for day in &days {
            let Some(date) = day
                .day
                .checked_sub(1)
                .and_then(|i| calendar.get(i as usize).copied())
            else {
                continue;
            };
            for ga in &day.guides {
                map.entry((ga.guide_id, date)).or_default().push(tour.id);
            }
        }
    }

    GUIDE_DAYS.store(Arc::new(map));
    Ok(())
}

/// Reset the snapshot to empty. Useful for tests.
pub fn clear_guide_index() {
    GUIDE_DAYS.store(Arc::new(GuideDayMap::new()));
}

/// Current snapshot, for callers that need to iterate or inspect.
pub fn snapshot() -> Arc<GuideDayMap> {
    GUIDE_DAYS.load_full()
}
