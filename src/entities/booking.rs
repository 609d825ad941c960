// 🎟️ Booking Entity - immutable record of a settled request
//
// Created only by settlement, never edited or removed.
// Serialized in the bookings.json layout.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// The only status: there is no cancellation path
    Confirmed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Sequential id, 1-based across the whole history
    pub id: u64,

    /// Club name
    pub club: String,

    /// Competition name
    pub competition: String,

    /// Places booked (always positive)
    pub places: u32,

    /// Points spent (equal to places)
    pub points_used: u32,

    /// When the booking was settled
    #[serde(rename = "date", with = "super::timestamp")]
    pub created_at: NaiveDateTime,

    pub status: BookingStatus,
}

impl Booking {
    /// Check whether this booking belongs to the given club/competition pair
    pub fn is_for(&self, club: &str, competition: &str) -> bool {
        self.club == club && self.competition == competition
    }
}
