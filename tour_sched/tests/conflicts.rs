mod common;

use common::{day, seed_basic, seed_second_tour, setup_db};
use tour_sched::calendar::tour_calendar;
use tour_sched::error::SchedError;
use tour_sched::models::occupation::{Occupation, OccupationKind, decode_occupations, encode_occupations};
use tour_sched::repo::{self, TourParams};
use tour_sched::sched::conflict::{ResourceKind, check_conflicts, pairs_from_schedule};
use tour_sched::sched::{self, index};

fn d(s: &str) -> chrono::NaiveDate {
    s.parse().unwrap()
}

#[test]
fn hard_occupation_blocks_vehicle_pair() {
    let _guard = common::index_guard();
    let (_db, mut conn) = setup_db();
    let s = seed_basic(&mut conn);
    index::clear_guide_index();

    let occ = vec![Occupation::new(
        OccupationKind::Maintenance,
        [d("2025-07-16")],
    )];
    repo::update_vehicle_occupations(&mut conn, s.vehicle_a, &encode_occupations(&occ).unwrap())
        .unwrap();

    let tour = repo::get_tour(&mut conn, s.tour_id).unwrap();
    let cal = tour_calendar(&tour).unwrap();
    let plan = vec![
        day(1, s.guide_a, Some(s.vehicle_a)),
        day(2, s.guide_a, Some(s.vehicle_a)),
    ];
    let conflicts = check_conflicts(&mut conn, s.tour_id, &pairs_from_schedule(&cal, &plan)).unwrap();

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ResourceKind::Vehicle);
    assert_eq!(conflicts[0].resource_id, s.vehicle_a);
    assert_eq!(conflicts[0].date, d("2025-07-16"));
    assert!(conflicts[0].message.contains("Maintenance"));
}

#[test]
fn derived_and_transient_records_never_block() {
    let _guard = common::index_guard();
    let (_db, mut conn) = setup_db();
    let s = seed_basic(&mut conn);
    index::clear_guide_index();

    let occ = vec![
        Occupation::new(OccupationKind::InUse, [d("2025-07-15")]),
        Occupation::new(OccupationKind::Standby, [d("2025-07-16")]),
        Occupation::new(OccupationKind::Inspection, [d("2025-07-17")]),
    ];
    repo::update_vehicle_occupations(&mut conn, s.vehicle_a, &encode_occupations(&occ).unwrap())
        .unwrap();

    let tour = repo::get_tour(&mut conn, s.tour_id).unwrap();
    let cal = tour_calendar(&tour).unwrap();
    let plan: Vec<_> = (1..=4).map(|i| day(i, s.guide_a, Some(s.vehicle_a))).collect();
    let conflicts = check_conflicts(&mut conn, s.tour_id, &pairs_from_schedule(&cal, &plan)).unwrap();

    assert!(conflicts.is_empty());
}

#[test]
fn guide_double_booking_across_tours_is_reported() {
    let _guard = common::index_guard();
    let (_db, mut conn) = setup_db();
    let s = seed_basic(&mut conn);
    let (tour2, _itin2) = seed_second_tour(&mut conn, s.agency_id);
    index::clear_guide_index();

    // First tour books guide A on day 1 (2025-07-15).
    sched::save_schedule(&mut conn, s.tour_id, vec![day(1, s.guide_a, None)]).unwrap();

    // Second tour asks for the same guide on the same date.
    let row2 = repo::get_tour(&mut conn, tour2).unwrap();
    let cal2 = tour_calendar(&row2).unwrap();
    let plan2 = vec![day(1, s.guide_a, None)];
    let conflicts = check_conflicts(&mut conn, tour2, &pairs_from_schedule(&cal2, &plan2)).unwrap();

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ResourceKind::Guide);
    assert_eq!(conflicts[0].resource_id, s.guide_a);
    assert_eq!(conflicts[0].date, d("2025-07-15"));
    assert!(conflicts[0].message.contains(&s.tour_id.to_string()));

    // And the save path enforces the same verdict.
    let err = sched::save_schedule(&mut conn, tour2, plan2).unwrap_err();
    assert!(matches!(err, SchedError::HardConflict(_)));

    // A different guide sails through.
    let ok = sched::save_schedule(&mut conn, tour2, vec![day(1, s.guide_b, None)]);
    assert!(ok.is_ok());
}

#[test]
fn a_tour_never_conflicts_with_itself() {
    let _guard = common::index_guard();
    let (_db, mut conn) = setup_db();
    let s = seed_basic(&mut conn);
    index::clear_guide_index();

    let plan = vec![day(1, s.guide_a, Some(s.vehicle_a))];
    sched::save_schedule(&mut conn, s.tour_id, plan.clone()).unwrap();

    // Re-checking the same plan for the same tour reports nothing: its own
    // guide bookings and its own InUse records are not collisions.
    let tour = repo::get_tour(&mut conn, s.tour_id).unwrap();
    let cal = tour_calendar(&tour).unwrap();
    let conflicts = check_conflicts(&mut conn, s.tour_id, &pairs_from_schedule(&cal, &plan)).unwrap();
    assert!(conflicts.is_empty());
}

#[test]
fn cancelled_tours_hold_no_guides() {
    let _guard = common::index_guard();
    let (_db, mut conn) = setup_db();
    let s = seed_basic(&mut conn);
    let (tour2, _itin2) = seed_second_tour(&mut conn, s.agency_id);
    index::clear_guide_index();

    sched::save_schedule(&mut conn, s.tour_id, vec![day(1, s.guide_a, None)]).unwrap();

    // Tour 1 gets cancelled; its bookings must stop counting.
    repo::upsert_tour(
        &mut conn,
        &TourParams {
            agency_id: s.agency_id,
            code: "CL-2025-07",
            itinerary_id: Some(s.itinerary_id),
            status: "cancelled",
            seats: (16, 10),
            arrival: Some("2025-07-15T08:30:00+02:00"),
            departure: Some("2025-07-18T19:00:00+02:00"),
        },
    )
    .unwrap();

    let row2 = repo::get_tour(&mut conn, tour2).unwrap();
    let cal2 = tour_calendar(&row2).unwrap();
    let plan2 = vec![day(1, s.guide_a, None)];
    let conflicts = check_conflicts(&mut conn, tour2, &pairs_from_schedule(&cal2, &plan2)).unwrap();
    assert!(conflicts.is_empty());
}

#[test]
fn save_sweeps_transient_records_from_referenced_window() {
    let _guard = common::index_guard();
    let (_db, mut conn) = setup_db();
    let s = seed_basic(&mut conn);
    index::clear_guide_index();

    // Advisory clutter inside the tour window, plus a hard record outside it.
    let occ = vec![
        Occupation::new(OccupationKind::Inspection, [d("2025-07-16")]),
        Occupation::new(OccupationKind::Standby, [d("2025-07-17")]),
        Occupation::new(OccupationKind::Maintenance, [d("2025-09-01")]),
    ];
    repo::update_vehicle_occupations(&mut conn, s.vehicle_a, &encode_occupations(&occ).unwrap())
        .unwrap();

    let plan: Vec<_> = (1..=4).map(|i| day(i, s.guide_a, Some(s.vehicle_a))).collect();
    sched::save_schedule(&mut conn, s.tour_id, plan).unwrap();

    let vehicle = repo::get_vehicle(&mut conn, s.vehicle_a).unwrap().unwrap();
    let occupations = decode_occupations(&vehicle.occupations).unwrap();
    // Transients are gone; the out-of-window Maintenance and the fresh InUse
    // remain.
    assert_eq!(occupations.len(), 2);
    assert!(occupations.iter().any(|o| o.kind == OccupationKind::Maintenance));
    let in_use = occupations
        .iter()
        .find(|o| o.kind == OccupationKind::InUse)
        .unwrap();
    assert_eq!(in_use.dates.len(), 4);
}

#[test]
fn dropped_vehicle_is_recovered_by_the_clearing_scan() {
    let _guard = common::index_guard();
    let (_db, mut conn) = setup_db();
    let s = seed_basic(&mut conn);
    index::clear_guide_index();

    // First version of the schedule uses vehicle A.
    let v1: Vec<_> = (1..=4).map(|i| day(i, s.guide_a, Some(s.vehicle_a))).collect();
    sched::save_schedule(&mut conn, s.tour_id, v1).unwrap();

    // Second version swaps to vehicle B. A must lose its InUse record even
    // though the new schedule never mentions it.
    let v2: Vec<_> = (1..=4).map(|i| day(i, s.guide_a, Some(s.vehicle_b))).collect();
    sched::save_schedule(&mut conn, s.tour_id, v2).unwrap();

    let a = repo::get_vehicle(&mut conn, s.vehicle_a).unwrap().unwrap();
    assert_eq!(a.occupations, "[]");
    let b = repo::get_vehicle(&mut conn, s.vehicle_b).unwrap().unwrap();
    let occ = decode_occupations(&b.occupations).unwrap();
    assert_eq!(occ.len(), 1);
    assert_eq!(occ[0].kind, OccupationKind::InUse);
}

#[test]
fn unknown_vehicle_reference_does_not_block() {
    let _guard = common::index_guard();
    let (_db, mut conn) = setup_db();
    let s = seed_basic(&mut conn);
    index::clear_guide_index();

    // Referential integrity is the collaborator's job; the checker treats an
    // unknown id as unoccupied and the reconciler skips it with a warning.
    let plan = vec![day(1, s.guide_a, Some(9999))];
    let saved = sched::save_schedule(&mut conn, s.tour_id, plan).unwrap();
    assert!(saved.occupations_reconciled);
}
