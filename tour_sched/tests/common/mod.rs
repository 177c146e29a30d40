#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use diesel::SqliteConnection;
use once_cell::sync::Lazy;
use tempfile::TempDir;

use tour_sched::db::{connection, migrate};
use tour_sched::models::{DaySchedule, GuideAssignment};
use tour_sched::repo::{self, TourParams};

pub struct TestDb {
    _dir: TempDir, // keep alive for the life of the test
    pub path: String,
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_sqlite(&path).expect("migrations");
    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { _dir: dir, path }, conn)
}

// The guide-day index is a process-wide snapshot, so tests that run the
// check/save paths must not interleave.
static INDEX_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub fn index_guard() -> MutexGuard<'static, ()> {
    INDEX_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct Seeded {
    pub agency_id: i32,
    pub tour_id: i32,
    pub itinerary_id: i32,
    pub guide_a: i32,
    pub guide_b: i32,
    pub vehicle_a: i32,
    pub vehicle_b: i32,
}

/// One agency, two guides, two idle vehicles, and a 4-day tour
/// (2025-07-15 .. 2025-07-18) bound to an empty itinerary.
pub fn seed_basic(conn: &mut SqliteConnection) -> Seeded {
    let agency_id = repo::upsert_agency(conn, "atlas", "Atlas Travel").unwrap();
    let guide_a = repo::upsert_guide(conn, agency_id, "Mara Ionescu", "[\"en\"]", "[]").unwrap();
    let guide_b = repo::upsert_guide(conn, agency_id, "Radu Pop", "[\"de\"]", "[]").unwrap();
    let vehicle_a = repo::upsert_vehicle(conn, agency_id, "B-204-TUR", 16, "[]").unwrap();
    let vehicle_b = repo::upsert_vehicle(conn, agency_id, "B-310-TUR", 8, "[]").unwrap();
    let itinerary_id = repo::upsert_itinerary(conn, agency_id, "Coastal loop").unwrap();
    let tour_id = repo::upsert_tour(
        conn,
        &TourParams {
            agency_id,
            code: "CL-2025-07",
            itinerary_id: Some(itinerary_id),
            status: "planned",
            seats: (16, 10),
            arrival: Some("2025-07-15T08:30:00+02:00"),
            departure: Some("2025-07-18T19:00:00+02:00"),
        },
    )
    .unwrap();

    Seeded {
        agency_id,
        tour_id,
        itinerary_id,
        guide_a,
        guide_b,
        vehicle_a,
        vehicle_b,
    }
}

/// A second tour in the same agency with the same dates, bound to its own
/// itinerary.
pub fn seed_second_tour(conn: &mut SqliteConnection, agency_id: i32) -> (i32, i32) {
    let itinerary_id = repo::upsert_itinerary(conn, agency_id, "Mountain loop").unwrap();
    let tour_id = repo::upsert_tour(
        conn,
        &TourParams {
            agency_id,
            code: "ML-2025-07",
            itinerary_id: Some(itinerary_id),
            status: "planned",
            seats: (8, 4),
            arrival: Some("2025-07-15"),
            departure: Some("2025-07-18"),
        },
    )
    .unwrap();
    (tour_id, itinerary_id)
}

/// A day entry assigning one guide, optionally driving a vehicle.
pub fn day(day: u32, guide_id: i32, vehicle_id: Option<i32>) -> DaySchedule {
    let mut ga = GuideAssignment::for_guide(guide_id);
    ga.vehicle_id = vehicle_id;
    DaySchedule {
        guides: vec![ga],
        ..DaySchedule::empty(day)
    }
}
