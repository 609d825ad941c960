// 🏆 Competition Entity - place inventory with a start date
//
// A competition whose date has passed is closed. The date string is kept
// verbatim so it round-trips through storage unchanged.

use super::TIMESTAMP_FORMAT;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competition {
    /// Unique competition name
    pub name: String,

    /// Start date/time as stored (`YYYY-MM-DD HH:MM:SS`, local time)
    pub date: String,

    /// Places still available
    pub places: u32,
}

impl Competition {
    pub fn new(name: impl Into<String>, date: impl Into<String>, places: u32) -> Self {
        Competition {
            name: name.into(),
            date: date.into(),
            places,
        }
    }

    /// Parsed start date, `None` when the stored date is not parseable
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.date.trim(), TIMESTAMP_FORMAT).ok()
    }

    /// Closed once the date has passed. An unparseable date counts as passed.
    pub fn is_closed_at(&self, now: NaiveDateTime) -> bool {
        match self.starts_at() {
            Some(starts_at) => starts_at <= now,
            None => true,
        }
    }

    /// Remove places from the inventory, refusing to go below zero
    pub fn take_places(&mut self, places: u32) -> Option<u32> {
        self.places = self.places.checked_sub(places)?;
        Some(self.places)
    }
}
