//! Calendar derivation.
//!
//! A tour's calendar is the ordered, gap-free sequence of calendar dates
//! between its arrival and departure anchors, inclusive of both endpoints.
//! All scheduling logic compares calendar-date values, never timestamps, so
//! anchors are collapsed to the wall-clock date of their recorded offset the
//! moment they enter the engine. This is what keeps a tour arriving at 23:30
//! and one departing at 00:15 from producing timezone-induced off-by-one
//! conflicts.

use chrono::{DateTime, Days, Local, NaiveDate};

use crate::error::{SchedError, SchedResult};
use crate::models::records::TourRow;

/// Number of rows the provisional fallback calendar renders when a tour has
/// no anchors yet.
pub const FALLBACK_DAYS: u32 = 7;

/// Derive the inclusive day-by-day calendar between two anchor dates.
///
/// Returns `InvalidCalendar` when `departure` precedes `arrival`. For a
/// one-day tour (`arrival == departure`) the calendar has exactly one entry.
pub fn derive_calendar(arrival: NaiveDate, departure: NaiveDate) -> SchedResult<Vec<NaiveDate>> {
    if departure < arrival {
        return Err(SchedError::InvalidCalendar(format!(
            "departure {departure} precedes arrival {arrival}"
        )));
    }

    let mut dates = Vec::new();
    let mut cur = arrival;
    while cur <= departure {
        dates.push(cur);
        cur = cur
            .checked_add_days(Days::new(1))
            .ok_or_else(|| SchedError::InvalidCalendar(format!("date overflow after {cur}")))?;
    }
    Ok(dates)
}

/// Provisional calendar starting at `from`, used only so the UI has rows to
/// render while a tour has no anchors. Never authoritative: conflict checks
/// and persistence refuse to run on it.
pub fn fallback_calendar(from: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days.max(1))
        .map_while(|i| from.checked_add_days(Days::new(u64::from(i))))
        .collect()
}

/// Calendar date of 1-based day `day` for a tour arriving on `arrival`.
pub fn day_date(arrival: NaiveDate, day: u32) -> Option<NaiveDate> {
    if day == 0 {
        return None;
    }
    arrival.checked_add_days(Days::new(u64::from(day) - 1))
}

/// Parse one stored anchor into a calendar date.
///
/// Accepts an RFC3339 timestamp (the date is taken in the timestamp's own
/// recorded offset) or a bare `YYYY-MM-DD`.
pub fn anchor_date(raw: &str) -> SchedResult<NaiveDate> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.date_naive());
    }
    raw.parse::<NaiveDate>()
        .map_err(|e| SchedError::InvalidCalendar(format!("unparseable anchor '{raw}': {e}")))
}

/// Derive the authoritative calendar for a tour from its stored anchors.
///
/// Both anchors are required; a tour without them has no persistable
/// calendar (the UI may still render [`fallback_calendar`] rows).
pub fn tour_calendar(tour: &TourRow) -> SchedResult<Vec<NaiveDate>> {
    let arrival = tour
        .arrival
        .as_deref()
        .ok_or_else(|| SchedError::InvalidCalendar(format!("tour {} has no arrival", tour.id)))?;
    let departure = tour.departure.as_deref().ok_or_else(|| {
        SchedError::InvalidCalendar(format!("tour {} has no departure", tour.id))
    })?;

    derive_calendar(anchor_date(arrival)?, anchor_date(departure)?)
}

/// Today's local calendar date; seam for the provisional read path.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
