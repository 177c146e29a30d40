//! Vehicle occupation records.
//!
//! Each vehicle carries a list of `{ "type": <kind>, "dates": [...] }`
//! records explaining why it is unavailable on a set of calendar dates. The
//! JSON shape is a storage contract with the surrounding application and must
//! round-trip losslessly; empty `dates` arrays are pruned, never stored.
//!
//! Three classes of kind:
//! - **hard** (Maintenance, Upkeep, Accident, Rental): operator-set, always
//!   block assignment;
//! - **transient** (Standby, Inspection): advisory annotations, never block,
//!   and never survive a reconciliation pass;
//! - **derived** (InUse): written exclusively by the reconciler from live
//!   schedules, never by an operator.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Why a vehicle is unavailable on a set of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OccupationKind {
    /// Derived from live schedules by the reconciler.
    InUse,
    /// Scheduled maintenance window.
    Maintenance,
    /// Routine upkeep (cleaning, fitting).
    Upkeep,
    /// Out of service after an accident.
    Accident,
    /// Held on standby; advisory only.
    Standby,
    /// Rented out to a third party.
    Rental,
    /// Technical inspection; advisory only.
    Inspection,
}

impl OccupationKind {
    /// Kinds that always block an assignment on a covered date.
    pub fn is_hard(self) -> bool {
        matches!(
            self,
            OccupationKind::Maintenance
                | OccupationKind::Upkeep
                | OccupationKind::Accident
                | OccupationKind::Rental
        )
    }

    /// Advisory kinds the reconciler discards rather than preserves.
    pub fn is_transient(self) -> bool {
        matches!(self, OccupationKind::Standby | OccupationKind::Inspection)
    }

    /// True for the sole system-derived kind.
    pub fn is_derived(self) -> bool {
        matches!(self, OccupationKind::InUse)
    }

    /// Canonical wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            OccupationKind::InUse => "InUse",
            OccupationKind::Maintenance => "Maintenance",
            OccupationKind::Upkeep => "Upkeep",
            OccupationKind::Accident => "Accident",
            OccupationKind::Standby => "Standby",
            OccupationKind::Rental => "Rental",
            OccupationKind::Inspection => "Inspection",
        }
    }
}

impl fmt::Display for OccupationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One occupation record: a kind plus the calendar dates it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupation {
    /// Why the vehicle is unavailable.
    #[serde(rename = "type")]
    pub kind: OccupationKind,
    /// Covered calendar dates, sorted and deduplicated.
    pub dates: BTreeSet<NaiveDate>,
}

impl Occupation {
    /// Build a record from any date iterator.
    pub fn new(kind: OccupationKind, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            kind,
            dates: dates.into_iter().collect(),
        }
    }

    /// True if any covered date falls inside `[from, to]` (inclusive).
    pub fn touches(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.dates.range(from..=to).next().is_some()
    }
}

/// Decode a vehicle's stored occupation list.
pub fn decode_occupations(json: &str) -> Result<Vec<Occupation>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Encode an occupation list for storage, pruning empty `dates` sets.
pub fn encode_occupations(list: &[Occupation]) -> Result<String, serde_json::Error> {
    let pruned: Vec<&Occupation> = list.iter().filter(|o| !o.dates.is_empty()).collect();
    serde_json::to_string(&pruned)
}

/// Drop every derived (`InUse`) and transient (`Standby`, `Inspection`)
/// record, keeping hard records untouched. This is the clearing half of a
/// reconciliation pass.
pub fn strip_reconciled(list: Vec<Occupation>) -> Vec<Occupation> {
    list.into_iter()
        .filter(|o| !o.kind.is_derived() && !o.kind.is_transient())
        .collect()
}

/// First hard record covering `date`, if any.
pub fn blocking_record(list: &[Occupation], date: NaiveDate) -> Option<&Occupation> {
    list.iter()
        .find(|o| o.kind.is_hard() && o.dates.contains(&date))
}

/// Post-reconciliation consistency invariant: no date appears in more than
/// one non-transient record.
pub fn dates_overlap_free(list: &[Occupation]) -> bool {
    let mut seen = BTreeSet::new();
    for occ in list.iter().filter(|o| !o.kind.is_transient()) {
        for d in &occ.dates {
            if !seen.insert(*d) {
                return false;
            }
        }
    }
    true
}
