//! Row-level persistence helpers.
//!
//! Thin Diesel wrappers over the record tables. Upserts key on the natural
//! agency-scoped identifiers (tour code, vehicle plate, itinerary title) so
//! fixture seeding and collaborator syncs are idempotent. An itinerary upsert
//! deliberately leaves an existing `activities` document alone: schedules are
//! owned by the engine, not by whoever re-seeds the roster.

use diesel::prelude::*;
use diesel::{SqliteConnection, insert_into};

use crate::error::{SchedError, SchedResult};
use crate::models::records::{
    AgencyRow, GuideRow, ItineraryRow, NewAgency, NewGuide, NewItinerary, NewTour, NewVehicle,
    TourRow, VehicleRow,
};
use crate::schema::{agency, guide, itinerary, tour, vehicle};

/// Fetch a tour or fail with `TourNotFound`.
pub fn get_tour(conn: &mut SqliteConnection, tour_id: i32) -> SchedResult<TourRow> {
    tour::table
        .find(tour_id)
        .select(TourRow::as_select())
        .first(conn)
        .optional()?
        .ok_or(SchedError::TourNotFound { tour_id })
}

/// Fetch an itinerary row; missing rows surface as a database error since a
/// bound tour pointing at a dead itinerary is a broken invariant upstream.
pub fn get_itinerary(conn: &mut SqliteConnection, itinerary_id: i32) -> SchedResult<ItineraryRow> {
    Ok(itinerary::table
        .find(itinerary_id)
        .select(ItineraryRow::as_select())
        .first(conn)?)
}

/// All tours of one agency.
pub fn list_tours_for_agency(
    conn: &mut SqliteConnection,
    agency: i32,
) -> SchedResult<Vec<TourRow>> {
    Ok(tour::table
        .filter(tour::agency_id.eq(agency))
        .select(TourRow::as_select())
        .load(conn)?)
}

/// Every tour in the store; used when rebuilding the guide-day index.
pub fn list_all_tours(conn: &mut SqliteConnection) -> SchedResult<Vec<TourRow>> {
    Ok(tour::table.select(TourRow::as_select()).load(conn)?)
}

/// All vehicles of one agency; the reconciler's clearing pass scans these.
pub fn list_vehicles_for_agency(
    conn: &mut SqliteConnection,
    agency: i32,
) -> SchedResult<Vec<VehicleRow>> {
    Ok(vehicle::table
        .filter(vehicle::agency_id.eq(agency))
        .select(VehicleRow::as_select())
        .load(conn)?)
}

/// Fetch a vehicle if it exists. Unknown ids are the collaborator's
/// referential-integrity problem, not a scheduling conflict.
pub fn get_vehicle(conn: &mut SqliteConnection, vehicle_id: i32) -> SchedResult<Option<VehicleRow>> {
    Ok(vehicle::table
        .find(vehicle_id)
        .select(VehicleRow::as_select())
        .first(conn)
        .optional()?)
}

/// Fetch a guide if it exists.
pub fn get_guide(conn: &mut SqliteConnection, guide_id: i32) -> SchedResult<Option<GuideRow>> {
    Ok(guide::table
        .find(guide_id)
        .select(GuideRow::as_select())
        .first(conn)
        .optional()?)
}

/// Replace an itinerary's embedded activities document.
pub fn replace_itinerary_activities(
    conn: &mut SqliteConnection,
    itinerary_id: i32,
    activities_json: &str,
) -> SchedResult<()> {
    diesel::update(itinerary::table.find(itinerary_id))
        .set(itinerary::activities.eq(activities_json))
        .execute(conn)?;
    Ok(())
}

/// Rewrite a vehicle's embedded occupations document.
pub fn update_vehicle_occupations(
    conn: &mut SqliteConnection,
    vehicle_id: i32,
    occupations_json: &str,
) -> SchedResult<()> {
    diesel::update(vehicle::table.find(vehicle_id))
        .set(vehicle::occupations.eq(occupations_json))
        .execute(conn)?;
    Ok(())
}

/// Bind or unbind a tour's itinerary. Binding lifecycle belongs to the
/// collaborator; this exists for fixtures and tests.
pub fn set_tour_itinerary(
    conn: &mut SqliteConnection,
    tour_id: i32,
    itinerary_id: Option<i32>,
) -> SchedResult<()> {
    diesel::update(tour::table.find(tour_id))
        .set(tour::itinerary_id.eq(itinerary_id))
        .execute(conn)?;
    Ok(())
}

/// Upsert an agency by code, returning its id.
pub fn upsert_agency(conn: &mut SqliteConnection, code: &str, name: &str) -> SchedResult<i32> {
    let row = NewAgency { code, name };
    let id = insert_into(agency::table)
        .values(&row)
        .on_conflict(agency::code)
        .do_update()
        .set(agency::name.eq(name))
        .returning(agency::id)
        .get_result(conn)?;
    Ok(id)
}

/// Look up an agency by code.
pub fn find_agency(conn: &mut SqliteConnection, code: &str) -> SchedResult<Option<AgencyRow>> {
    Ok(agency::table
        .filter(agency::code.eq(code))
        .select(AgencyRow::as_select())
        .first(conn)
        .optional()?)
}

/// Upsert a guide by (agency, name), returning its id.
pub fn upsert_guide(
    conn: &mut SqliteConnection,
    agency_id: i32,
    name: &str,
    languages_json: &str,
    specialties_json: &str,
) -> SchedResult<i32> {
    let row = NewGuide {
        agency_id,
        name,
        languages: languages_json,
        specialties: specialties_json,
    };
    let id = insert_into(guide::table)
        .values(&row)
        .on_conflict((guide::agency_id, guide::name))
        .do_update()
        .set((
            guide::languages.eq(languages_json),
            guide::specialties.eq(specialties_json),
        ))
        .returning(guide::id)
        .get_result(conn)?;
    Ok(id)
}

/// Upsert a vehicle by (agency, plate), returning its id. Overwrites the
/// operator-set occupation document with the provided one.
pub fn upsert_vehicle(
    conn: &mut SqliteConnection,
    agency_id: i32,
    plate: &str,
    capacity: i32,
    occupations_json: &str,
) -> SchedResult<i32> {
    let row = NewVehicle {
        agency_id,
        plate,
        capacity,
        occupations: occupations_json,
    };
    let id = insert_into(vehicle::table)
        .values(&row)
        .on_conflict((vehicle::agency_id, vehicle::plate))
        .do_update()
        .set((
            vehicle::capacity.eq(capacity),
            vehicle::occupations.eq(occupations_json),
        ))
        .returning(vehicle::id)
        .get_result(conn)?;
    Ok(id)
}

/// Upsert an itinerary by (agency, title), returning its id. An existing
/// row keeps its activities document.
pub fn upsert_itinerary(conn: &mut SqliteConnection, agency_id: i32, title: &str) -> SchedResult<i32> {
    let row = NewItinerary {
        agency_id,
        title,
        activities: "[]",
    };
    insert_into(itinerary::table)
        .values(&row)
        .on_conflict((itinerary::agency_id, itinerary::title))
        .do_nothing()
        .execute(conn)?;

    let id = itinerary::table
        .filter(itinerary::agency_id.eq(agency_id))
        .filter(itinerary::title.eq(title))
        .select(itinerary::id)
        .first(conn)?;
    Ok(id)
}

/// Parameters for [`upsert_tour`].
pub struct TourParams<'a> {
    /// Owning agency.
    pub agency_id: i32,
    /// Agency-unique tour code.
    pub code: &'a str,
    /// Bound itinerary, if any.
    pub itinerary_id: Option<i32>,
    /// Lifecycle status.
    pub status: &'a str,
    /// Seats offered / sold.
    pub seats: (i32, i32),
    /// RFC3339 arrival anchor.
    pub arrival: Option<&'a str>,
    /// RFC3339 departure anchor.
    pub departure: Option<&'a str>,
}

/// Upsert a tour by (agency, code), returning its id.
pub fn upsert_tour(conn: &mut SqliteConnection, p: &TourParams<'_>) -> SchedResult<i32> {
    let row = NewTour {
        agency_id: p.agency_id,
        code: p.code,
        itinerary_id: p.itinerary_id,
        status: p.status,
        seats_total: p.seats.0,
        seats_sold: p.seats.1,
        arrival: p.arrival,
        departure: p.departure,
    };
    let id = insert_into(tour::table)
        .values(&row)
        .on_conflict((tour::agency_id, tour::code))
        .do_update()
        .set((
            tour::itinerary_id.eq(p.itinerary_id),
            tour::status.eq(p.status),
            tour::seats_total.eq(p.seats.0),
            tour::seats_sold.eq(p.seats.1),
            tour::arrival.eq(p.arrival),
            tour::departure.eq(p.departure),
        ))
        .returning(tour::id)
        .get_result(conn)?;
    Ok(id)
}
