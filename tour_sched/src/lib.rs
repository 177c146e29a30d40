//! Resource scheduling and conflict engine for multi-day travel tours.
//!
//! Coordinates shared, scarce resources (tour guides and vehicles) across
//! concurrently-running tours. The surrounding CRUD application supplies and
//! persists plain records; this crate owns the scheduling decision logic:
//!
//! - **`calendar`**: derives a day-by-day calendar from a tour's anchor
//!   timestamps.
//! - **`sched::conflict`**: read-only gate that reports which proposed
//!   `(resource, date)` pairs collide with existing commitments.
//! - **`sched`** (`save_schedule`): the write path: authoritative pre-check,
//!   schedule persistence, then clear-and-recompute of each vehicle's derived
//!   `InUse` occupation records.
//! - **`sched::read`**: zips the derived calendar with the stored per-day
//!   assignment document.
//! - **`sched::index`**: lock-free `(guide, date)` lookup snapshot kept in
//!   step with every reconciliation.
//!
//! Persistence is SQLite via Diesel with embedded migrations; the per-day
//! schedule and per-vehicle occupation lists are stored as JSON documents
//! whose shape is a wire contract (see [`models`]).

#![deny(missing_docs)]

pub mod calendar;
pub mod db;
pub mod error;
pub mod fixture;
pub mod models;
pub mod repo;
pub mod sched;
#[allow(missing_docs)]
pub mod schema;
