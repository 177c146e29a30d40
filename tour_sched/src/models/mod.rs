//! Domain and row types.
//!
//! [`occupation`] and [`schedule`] define the two embedded JSON documents
//! whose shapes are wire/storage contracts; [`records`] holds the Diesel
//! row structs the repository reads and writes.

pub mod occupation;
pub mod records;
pub mod schedule;

pub use occupation::{Occupation, OccupationKind};
pub use schedule::{DaySchedule, GuideAssignment, HotelInfo};
