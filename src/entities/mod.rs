// Entity Models
//
// The three records the booking engine works with:
// - Club: spends points, identified by name (and email for login)
// - Competition: offers places until its date passes
// - Booking: immutable, append-only history of settled requests

pub mod booking;
pub mod club;
pub mod competition;

pub use booking::{Booking, BookingStatus};
pub use club::Club;
pub use competition::Competition;

/// Timestamp layout shared by competition dates and booking records
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serde adapter for `NaiveDateTime` in `TIMESTAMP_FORMAT`
pub(crate) mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
