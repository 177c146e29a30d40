//! Queryable/Insertable row structs used by the repository.

use diesel::prelude::*;

use crate::schema::{agency, guide, itinerary, tour, vehicle};

/// Tour lifecycle status, stored as text.
pub const TOUR_STATUSES: [&str; 4] = ["planned", "paid", "completed", "cancelled"];

/// An agency row.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = agency)]
pub struct AgencyRow {
    /// Primary key.
    pub id: i32,
    /// Stable lowercase code.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// A tour row; `arrival`/`departure` are RFC3339 anchors the calendar is
/// derived from.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = tour)]
pub struct TourRow {
    /// Primary key.
    pub id: i32,
    /// Owning agency.
    pub agency_id: i32,
    /// Agency-unique tour code.
    pub code: String,
    /// Bound itinerary, if any. Binding is managed by the collaborator.
    pub itinerary_id: Option<i32>,
    /// `planned|paid|completed|cancelled`.
    pub status: String,
    /// Seats offered.
    pub seats_total: i32,
    /// Seats sold.
    pub seats_sold: i32,
    /// RFC3339 arrival anchor.
    pub arrival: Option<String>,
    /// RFC3339 departure anchor.
    pub departure: Option<String>,
    /// Row creation timestamp.
    pub created_at: String,
    /// Row update timestamp.
    pub updated_at: String,
}

impl TourRow {
    /// Cancelled tours hold no resources: the conflict scan and the guide-day
    /// index skip them.
    pub fn is_cancelled(&self) -> bool {
        self.status == "cancelled"
    }
}

/// An itinerary row; `activities` is the embedded schedule document.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = itinerary)]
pub struct ItineraryRow {
    /// Primary key.
    pub id: i32,
    /// Owning agency.
    pub agency_id: i32,
    /// Agency-unique title.
    pub title: String,
    /// JSON array of [`crate::models::DaySchedule`].
    pub activities: String,
}

/// A guide roster row. Languages/specialties are display metadata, not
/// conflict inputs.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = guide)]
pub struct GuideRow {
    /// Primary key.
    pub id: i32,
    /// Owning agency.
    pub agency_id: i32,
    /// Guide name.
    pub name: String,
    /// JSON array of language codes.
    pub languages: String,
    /// JSON array of specialty tags.
    pub specialties: String,
}

/// A fleet vehicle row; `occupations` is the embedded occupation document.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = vehicle)]
pub struct VehicleRow {
    /// Primary key.
    pub id: i32,
    /// Owning agency.
    pub agency_id: i32,
    /// Registration plate, unique per agency.
    pub plate: String,
    /// Passenger capacity.
    pub capacity: i32,
    /// JSON array of [`crate::models::Occupation`].
    pub occupations: String,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = agency)]
pub(crate) struct NewAgency<'a> {
    pub(crate) code: &'a str,
    pub(crate) name: &'a str,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = tour)]
pub(crate) struct NewTour<'a> {
    pub(crate) agency_id: i32,
    pub(crate) code: &'a str,
    pub(crate) itinerary_id: Option<i32>,
    pub(crate) status: &'a str,
    pub(crate) seats_total: i32,
    pub(crate) seats_sold: i32,
    pub(crate) arrival: Option<&'a str>,
    pub(crate) departure: Option<&'a str>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = itinerary)]
pub(crate) struct NewItinerary<'a> {
    pub(crate) agency_id: i32,
    pub(crate) title: &'a str,
    pub(crate) activities: &'a str,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = guide)]
pub(crate) struct NewGuide<'a> {
    pub(crate) agency_id: i32,
    pub(crate) name: &'a str,
    pub(crate) languages: &'a str,
    pub(crate) specialties: &'a str,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = vehicle)]
pub(crate) struct NewVehicle<'a> {
    pub(crate) agency_id: i32,
    pub(crate) plate: &'a str,
    pub(crate) capacity: i32,
    pub(crate) occupations: &'a str,
}
