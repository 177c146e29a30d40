//! Schedule read accessor.
//!
//! Zips a tour's derived calendar with its itinerary's stored activities by
//! day index. Days the itinerary does not yet cover render as empty rather
//! than erroring. A tour without anchors gets a *provisional* calendar
//! starting today so the UI has rows to render; nothing derived from it may
//! be persisted or conflict-checked.

use chrono::NaiveDate;
use diesel::SqliteConnection;
use serde::Serialize;

use crate::calendar::{self, FALLBACK_DAYS, fallback_calendar, tour_calendar};
use crate::error::{SchedError, SchedResult};
use crate::models::DaySchedule;
use crate::models::schedule::decode_activities;
use crate::repo;

/// One calendar day of a tour with its (possibly empty) schedule entry.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledDay {
    /// Derived calendar date of this day.
    pub date: NaiveDate,
    /// The stored day entry, or an empty one when the itinerary is shorter
    /// than the calendar.
    #[serde(flatten)]
    pub entry: DaySchedule,
}

/// A tour's full derived schedule view.
#[derive(Debug, Clone, Serialize)]
pub struct TourSchedule {
    /// Tour id.
    #[serde(rename = "tourId")]
    pub tour_id: i32,
    /// True when the calendar is the non-authoritative "today + N" fallback.
    pub provisional: bool,
    /// Derived calendar, one date per day.
    pub calendar: Vec<NaiveDate>,
    /// Calendar zipped with the stored activities.
    pub days: Vec<ScheduledDay>,
}

/// Resolve the day-by-day schedule view for a bound tour.
pub fn get_schedule(conn: &mut SqliteConnection, tour_id: i32) -> SchedResult<TourSchedule> {
    let tour = repo::get_tour(conn, tour_id)?;
    let itinerary_id = tour.itinerary_id.ok_or(SchedError::NotBound { tour_id })?;
    let itinerary = repo::get_itinerary(conn, itinerary_id)?;
    let activities = decode_activities(&itinerary.activities)?;

    let (calendar, provisional) = match tour_calendar(&tour) {
        Ok(calendar) => (calendar, false),
        Err(SchedError::InvalidCalendar(_)) => {
            let rows = activities.len().max(FALLBACK_DAYS as usize) as u32;
            (fallback_calendar(calendar::today(), rows), true)
        }
        Err(e) => return Err(e),
    };

    let days = calendar
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let day_no = i as u32 + 1;
            let entry = activities
                .iter()
                .find(|d| d.day == day_no)
                .cloned()
                .unwrap_or_else(|| DaySchedule::empty(day_no));
            ScheduledDay { date: *date, entry }
        })
        .collect();

    Ok(TourSchedule {
        tour_id,
        provisional,
        calendar,
        days,
    })
}
