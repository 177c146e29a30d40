//! Error taxonomy for the scheduling engine.
//!
//! `HardConflict` and `NotBound` are recoverable by the caller (present the
//! conflicts, bind an itinerary first). `InvalidCalendar` and
//! `InvalidSchedule` abort the whole operation with no partial state. A
//! failure of the occupation-index maintenance after the schedule write has
//! committed is *not* an error variant: the schedule is the operation of
//! record, so [`crate::sched::save_schedule`] reports it through
//! `occupations_reconciled = false` and a structured warning instead.

use crate::sched::conflict::Conflict;

/// Errors produced by the scheduling engine.
#[derive(Debug, thiserror::Error)]
pub enum SchedError {
    /// Anchor timestamps are missing or unparseable, or departure precedes
    /// arrival. Nothing derived from such a calendar may be persisted.
    #[error("invalid calendar: {0}")]
    InvalidCalendar(String),

    /// The submitted day schedule is malformed (day index 0, duplicate day,
    /// or a day beyond the tour's inclusive calendar).
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// The tour exists but has no bound itinerary to hold a schedule.
    #[error("tour {tour_id} has no bound itinerary")]
    NotBound {
        /// Id of the tour that was addressed.
        tour_id: i32,
    },

    /// No tour with the given id.
    #[error("tour {tour_id} not found")]
    TourNotFound {
        /// Id that failed to resolve.
        tour_id: i32,
    },

    /// One or more resource/date pairs are blocked. Carries the full
    /// conflict list, never a partial one; nothing was written.
    #[error("{} hard conflict(s) block this schedule", .0.len())]
    HardConflict(Vec<Conflict>),

    /// Underlying database failure.
    #[error("database error: {0}")]
    Db(#[from] diesel::result::Error),

    /// A stored embedded document (activities or occupations) failed to
    /// decode or encode.
    #[error("embedded document codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Result alias used throughout the engine.
pub type SchedResult<T> = Result<T, SchedError>;
