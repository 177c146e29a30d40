//! Roster fixtures: parsing, normalization, and seeding.
//!
//! A TOML fixture describes one agency's roster: guides, vehicles with their
//! operator-set occupations, itineraries, and tours. Fixtures exist for the
//! CLI `seed` command, demos, and tests; the collaborating CRUD application
//! owns these records in production.
//!
//! Key behaviors:
//! - Normalization lowercases the agency code, uppercases plates, trims
//!   everything, de-duplicates guides while preserving order, and prunes
//!   occupation records with empty date sets.
//! - Fixtures may only carry operator-set occupation kinds: `InUse` is
//!   derived state owned by the reconciler and is rejected.
//! - Duplicate plates, tour codes, or itinerary titles after normalization
//!   are errors, as are unknown itinerary references and inverted anchors.
//! - [`apply_fixture`] upserts everything inside a single
//!   `BEGIN IMMEDIATE` transaction, so a fixture lands whole or not at all,
//!   and re-seeding the same file is idempotent.
//!
//! Entrypoints: [`load_fixture_str`], [`load_fixture_path`],
//! [`normalize_fixture`], [`apply_fixture`].

use std::collections::HashSet;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use diesel::SqliteConnection;
use serde::{Deserialize, Serialize};
use toml::from_str;

use crate::calendar::anchor_date;
use crate::models::occupation::{Occupation, OccupationKind, encode_occupations};
use crate::models::records::TOUR_STATUSES;
use crate::repo::{self, TourParams};

/// Top-level fixture document.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Fixture {
    /// The agency every other record belongs to.
    pub agency: AgencyCfg,
    /// Guide roster.
    #[serde(default)]
    pub guides: Vec<GuideCfg>,
    /// Vehicle fleet.
    #[serde(default)]
    pub vehicles: Vec<VehicleCfg>,
    /// Itineraries available for binding.
    #[serde(default)]
    pub itineraries: Vec<ItineraryCfg>,
    /// Tours, optionally bound to an itinerary by title.
    #[serde(default)]
    pub tours: Vec<TourCfg>,
}

/// Agency identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgencyCfg {
    /// Stable code, normalized to lowercase.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// One guide roster entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GuideCfg {
    /// Guide name, unique per agency.
    pub name: String,
    /// Spoken language codes.
    #[serde(default)]
    pub languages: Vec<String>,
    /// Specialty tags.
    #[serde(default)]
    pub specialties: Vec<String>,
}

/// One fleet vehicle.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VehicleCfg {
    /// Registration plate, normalized to uppercase.
    pub plate: String,
    /// Passenger capacity.
    #[serde(default)]
    pub capacity: i32,
    /// Operator-set occupation records (`InUse` is rejected).
    #[serde(default)]
    pub occupations: Vec<OccupationCfg>,
}

/// One occupation record in a fixture. Dates are quoted `"YYYY-MM-DD"`
/// strings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OccupationCfg {
    /// Occupation kind.
    #[serde(rename = "type")]
    pub kind: OccupationKind,
    /// Covered dates.
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
}

/// One itinerary shell; its activities document is owned by the engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItineraryCfg {
    /// Title, unique per agency.
    pub title: String,
}

/// One tour.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TourCfg {
    /// Agency-unique code.
    pub code: String,
    /// Title of the itinerary to bind, if any.
    #[serde(default)]
    pub itinerary: Option<String>,
    /// Lifecycle status; defaults to `planned`.
    #[serde(default = "default_status")]
    pub status: String,
    /// Seats offered.
    #[serde(default)]
    pub seats_total: i32,
    /// Seats sold.
    #[serde(default)]
    pub seats_sold: i32,
    /// RFC3339 arrival anchor.
    #[serde(default)]
    pub arrival: Option<String>,
    /// RFC3339 departure anchor.
    #[serde(default)]
    pub departure: Option<String>,
}

fn default_status() -> String {
    "planned".to_string()
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default)]
pub struct NormalizationReport {
    /// Plates whose spelling changed when trimming/uppercasing.
    pub plates_normalized: usize,
    /// Occupation records dropped because their date set was empty.
    pub occupations_pruned: usize,
    /// Duplicate guide entries removed (first occurrence kept).
    pub guides_deduped: usize,
}

/// Normalize a fixture in place.
///
/// Errors on: empty codes/names/plates after trimming, duplicate plates,
/// tour codes, or itinerary titles, an `InUse` occupation, an unknown tour
/// status, an unknown itinerary reference, or a departure anchor that
/// precedes the arrival anchor.
pub fn normalize_fixture(fix: &mut Fixture) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();

    fix.agency.code = fix.agency.code.trim().to_lowercase();
    if fix.agency.code.is_empty() {
        bail!("agency code cannot be empty after trimming");
    }
    fix.agency.name = fix.agency.name.trim().to_string();

    // Guides: dedupe by name, preserve order.
    let before = fix.guides.len();
    let mut seen_guides = HashSet::new();
    fix.guides.retain_mut(|g| {
        g.name = g.name.trim().to_string();
        seen_guides.insert(g.name.clone())
    });
    report.guides_deduped = before - fix.guides.len();
    if fix.guides.iter().any(|g| g.name.is_empty()) {
        bail!("guide name cannot be empty after trimming");
    }

    // Vehicles: plates are identity, so collisions are errors rather than
    // silent merges.
    let mut seen_plates = HashSet::new();
    for v in &mut fix.vehicles {
        let plate = v.plate.trim().to_uppercase();
        if plate.is_empty() {
            bail!("vehicle plate cannot be empty after trimming");
        }
        if plate != v.plate {
            report.plates_normalized += 1;
        }
        if !seen_plates.insert(plate.clone()) {
            bail!("duplicate vehicle plate after normalization: {plate}");
        }
        v.plate = plate;

        for occ in &v.occupations {
            if occ.kind.is_derived() {
                bail!(
                    "vehicle {}: '{}' occupations are derived from live schedules \
                     and cannot be seeded",
                    v.plate,
                    occ.kind
                );
            }
        }
        let before = v.occupations.len();
        v.occupations.retain(|o| !o.dates.is_empty());
        report.occupations_pruned += before - v.occupations.len();
    }

    // Itineraries: titles are binding keys.
    let mut titles = HashSet::new();
    for it in &mut fix.itineraries {
        it.title = it.title.trim().to_string();
        if it.title.is_empty() {
            bail!("itinerary title cannot be empty after trimming");
        }
        if !titles.insert(it.title.clone()) {
            bail!("duplicate itinerary title after normalization: {}", it.title);
        }
    }

    // Tours.
    let mut codes = HashSet::new();
    for t in &mut fix.tours {
        t.code = t.code.trim().to_string();
        if t.code.is_empty() {
            bail!("tour code cannot be empty after trimming");
        }
        if !codes.insert(t.code.clone()) {
            bail!("duplicate tour code after normalization: {}", t.code);
        }
        if !TOUR_STATUSES.contains(&t.status.as_str()) {
            bail!("tour {}: unknown status '{}'", t.code, t.status);
        }
        if let Some(title) = &t.itinerary {
            if !titles.contains(title.trim()) {
                bail!("tour {}: unknown itinerary '{title}'", t.code);
            }
        }
        if let (Some(arr), Some(dep)) = (&t.arrival, &t.departure) {
            let a = anchor_date(arr)
                .with_context(|| format!("tour {}: bad arrival anchor", t.code))?;
            let d = anchor_date(dep)
                .with_context(|| format!("tour {}: bad departure anchor", t.code))?;
            if d < a {
                bail!("tour {}: departure {d} precedes arrival {a}", t.code);
            }
        }
    }

    Ok(report)
}

/// Counts of rows touched by [`apply_fixture`].
#[derive(Debug, Default, Serialize)]
pub struct SeedReport {
    /// Seeded agency id.
    pub agency_id: i32,
    /// Guides upserted.
    pub guides: usize,
    /// Vehicles upserted.
    pub vehicles: usize,
    /// Itineraries upserted.
    pub itineraries: usize,
    /// Tours upserted.
    pub tours: usize,
}

/// Upsert a normalized fixture into the store in one immediate transaction.
pub fn apply_fixture(conn: &mut SqliteConnection, fix: &Fixture) -> anyhow::Result<SeedReport> {
    conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let agency_id = repo::upsert_agency(conn, &fix.agency.code, &fix.agency.name)?;
        let mut report = SeedReport {
            agency_id,
            ..Default::default()
        };

        for g in &fix.guides {
            repo::upsert_guide(
                conn,
                agency_id,
                &g.name,
                &serde_json::to_string(&g.languages)?,
                &serde_json::to_string(&g.specialties)?,
            )?;
            report.guides += 1;
        }

        for v in &fix.vehicles {
            let occupations: Vec<Occupation> = v
                .occupations
                .iter()
                .map(|o| Occupation::new(o.kind, o.dates.iter().copied()))
                .collect();
            repo::upsert_vehicle(
                conn,
                agency_id,
                &v.plate,
                v.capacity,
                &encode_occupations(&occupations)?,
            )?;
            report.vehicles += 1;
        }

        let mut itinerary_ids = indexmap::IndexMap::new();
        for it in &fix.itineraries {
            let id = repo::upsert_itinerary(conn, agency_id, &it.title)?;
            itinerary_ids.insert(it.title.clone(), id);
            report.itineraries += 1;
        }

        for t in &fix.tours {
            let itinerary_id = t
                .itinerary
                .as_ref()
                .and_then(|title| itinerary_ids.get(title.trim()))
                .copied();
            repo::upsert_tour(
                conn,
                &TourParams {
                    agency_id,
                    code: &t.code,
                    itinerary_id,
                    status: &t.status,
                    seats: (t.seats_total, t.seats_sold),
                    arrival: t.arrival.as_deref(),
                    departure: t.departure.as_deref(),
                },
            )?;
            report.tours += 1;
        }

        Ok(report)
    })
}

/// Parse and normalize a fixture from a TOML string.
pub fn load_fixture_str(toml_str: &str) -> anyhow::Result<Fixture> {
    let mut fix: Fixture = from_str(toml_str).context("failed to parse fixture TOML")?;
    let report = normalize_fixture(&mut fix).context("normalize_fixture failed")?;
    tracing::debug!(?report, "fixture normalized");
    Ok(fix)
}

/// Read a fixture TOML file from disk, parse, and normalize it.
pub fn load_fixture_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<Fixture> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read fixture file {}", path.as_ref().display()))?;
    load_fixture_str(&text)
}
