// ✅ Booking Validator
//
// Check order (first failure wins):
//   0. competition still open
//   1. quantity > 0
//   2. quantity <= 12 for a single request
//   3. already booked + quantity <= 12
//   4. quantity <= competition places
//   5. quantity <= club points
//
// All comparisons are strict: hitting a limit exactly is allowed.

use crate::entities::Competition;
use crate::error::Rejection;
use crate::limits::{BookingLimits, MAX_PLACES_PER_CLUB, MAX_PLACES_PER_REQUEST, POINTS_PER_PLACE};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ============================================================================
// REQUESTED PLACES
// ============================================================================

/// Place count as received from a caller: already numeric, raw form text,
/// or any other JSON value (always malformed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestedPlaces {
    Count(i64),
    Text(String),
    Other(serde_json::Value),
}

impl RequestedPlaces {
    /// Parse into a signed count. Sign is checked later by rule 1.
    ///
    /// Integers too large for `i64` are clamped to `i64::MIN` / `i64::MAX`,
    /// so they still fail as non-positive or over the per-request cap.
    pub fn parse(&self) -> Result<i64, Rejection> {
        match self {
            RequestedPlaces::Count(n) => Ok(*n),
            RequestedPlaces::Text(raw) => {
                let trimmed = raw.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| clamp_oversized(trimmed))
                    .ok_or_else(|| Rejection::MalformedQuantity {
                        input: raw.clone(),
                    })
            }
            RequestedPlaces::Other(value) => clamp_json_number(value).ok_or_else(|| {
                Rejection::MalformedQuantity {
                    input: value.to_string(),
                }
            }),
        }
    }
}

/// Integer text that overflowed `i64`
fn clamp_oversized(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}

/// JSON numbers outside `i64` (serde_json keeps them as `u64` or `f64`)
fn clamp_json_number(value: &serde_json::Value) -> Option<i64> {
    let number = match value {
        serde_json::Value::Number(n) => n,
        _ => return None,
    };
    if number.as_u64().is_some() {
        return Some(i64::MAX);
    }
    let x = number.as_f64()?;
    if x.fract() != 0.0 {
        return None;
    }
    if x >= i64::MAX as f64 {
        Some(i64::MAX)
    } else if x <= i64::MIN as f64 {
        Some(i64::MIN)
    } else {
        None
    }
}

impl From<i64> for RequestedPlaces {
    fn from(n: i64) -> Self {
        RequestedPlaces::Count(n)
    }
}

impl From<i32> for RequestedPlaces {
    fn from(n: i32) -> Self {
        RequestedPlaces::Count(n.into())
    }
}

impl From<u32> for RequestedPlaces {
    fn from(n: u32) -> Self {
        RequestedPlaces::Count(n.into())
    }
}

impl From<&str> for RequestedPlaces {
    fn from(raw: &str) -> Self {
        RequestedPlaces::Text(raw.to_string())
    }
}

impl From<String> for RequestedPlaces {
    fn from(raw: String) -> Self {
        RequestedPlaces::Text(raw)
    }
}

// ============================================================================
// CHECKS
// ============================================================================

/// Precondition checked before the quantity rules
pub fn check_competition_open(competition: &Competition, now: NaiveDateTime) -> Result<(), Rejection> {
    if competition.is_closed_at(now) {
        return Err(Rejection::CompetitionClosed {
            competition: competition.name.clone(),
        });
    }
    Ok(())
}

/// Apply rules 1-5 to a parsed place count. On success returns the count as `u32`.
pub fn validate_booking_request(places_requested: i64, limits: &BookingLimits) -> Result<u32, Rejection> {
    if places_requested <= 0 {
        return Err(Rejection::NonPositiveQuantity {
            requested: places_requested,
        });
    }

    if places_requested > MAX_PLACES_PER_REQUEST {
        return Err(Rejection::PerRequestCapExceeded {
            requested: places_requested,
        });
    }

    // 1..=12 from here on
    let places = places_requested as u32;

    if limits.places_already_booked.saturating_add(places) > MAX_PLACES_PER_CLUB {
        return Err(Rejection::CumulativeCapExceeded {
            already_booked: limits.places_already_booked,
            remaining: MAX_PLACES_PER_CLUB.saturating_sub(limits.places_already_booked),
        });
    }

    if places > limits.available_places {
        return Err(Rejection::InsufficientPlaces {
            available: limits.available_places,
        });
    }

    let points_needed = places * POINTS_PER_PLACE;
    if points_needed > limits.club_points {
        return Err(Rejection::InsufficientPoints {
            needed: i64::from(points_needed),
            held: limits.club_points,
        });
    }

    Ok(places)
}
