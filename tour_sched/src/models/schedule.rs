//! The per-day schedule document embedded in an itinerary.
//!
//! `activities` is stored as a JSON array of [`DaySchedule`], one entry per
//! trip day, indexed 1..N. Day *i*'s calendar date is always derived from the
//! owning tour's arrival anchor (`arrival + (i-1) days`), never stored here.
//! Field names (`hotelInfo`, `guideId`, `vehicleId`) are part of the storage
//! contract. Unknown fields written by the collaborator are tolerated.

use serde::{Deserialize, Serialize};

/// One day's worth of guide/vehicle assignment within an itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    /// 1-based day index into the tour calendar.
    pub day: u32,
    /// Free-text programme for the day.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Overnight accommodation, if booked.
    #[serde(default, rename = "hotelInfo", skip_serializing_if = "Option::is_none")]
    pub hotel: Option<HotelInfo>,
    /// Ordered guide assignments; multi-guide days carry several entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guides: Vec<GuideAssignment>,
}

impl DaySchedule {
    /// An empty day used when the itinerary does not yet cover a calendar
    /// date.
    pub fn empty(day: u32) -> Self {
        Self {
            day,
            description: String::new(),
            hotel: None,
            guides: Vec::new(),
        }
    }

    /// Merge an incoming day over its prior stored value: the guide list is
    /// replaced wholesale, while `hotelInfo` and `description` are preserved
    /// from the prior value when the incoming day omits them.
    pub fn merged_over(mut self, prior: Option<&DaySchedule>) -> Self {
        if let Some(prev) = prior {
            if self.hotel.is_none() {
                self.hotel = prev.hotel.clone();
            }
            if self.description.is_empty() {
                self.description = prev.description.clone();
            }
        }
        self
    }
}

/// Hotel booking details for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelInfo {
    /// Hotel name.
    pub name: String,
    /// Check-in time or note, as recorded by the collaborator.
    #[serde(default, rename = "checkIn", skip_serializing_if = "Option::is_none")]
    pub check_in: Option<String>,
    /// Check-out time or note.
    #[serde(default, rename = "checkOut", skip_serializing_if = "Option::is_none")]
    pub check_out: Option<String>,
}

/// One guide's assignment on one day, optionally with a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideAssignment {
    /// Roster id of the guide.
    #[serde(rename = "guideId")]
    pub guide_id: i32,
    /// Fleet id of the vehicle the guide drives that day, if any.
    #[serde(default, rename = "vehicleId", skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<i32>,
    /// Where the guide stays overnight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accommodation: Option<String>,
    /// Free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl GuideAssignment {
    /// A bare assignment with just the guide reference.
    pub fn for_guide(guide_id: i32) -> Self {
        Self {
            guide_id,
            vehicle_id: None,
            accommodation: None,
            notes: None,
        }
    }

    /// Attach a vehicle.
    pub fn with_vehicle(mut self, vehicle_id: i32) -> Self {
        self.vehicle_id = Some(vehicle_id);
        self
    }
}

/// Decode a stored activities document.
pub fn decode_activities(json: &str) -> Result<Vec<DaySchedule>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Encode an activities document for storage.
pub fn encode_activities(days: &[DaySchedule]) -> Result<String, serde_json::Error> {
    serde_json::to_string(days)
}
