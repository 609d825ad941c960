// 💳 Settlement Engine
//
// Turns a validated request into state changes:
// - club points    -= places
// - competition    -= places
// - bookings       += new confirmed booking
//
// Split in two steps so the journal can record the outcome before memory changes:
// `plan_settlement` computes absolute post-values, `apply_settlement` writes them.
// Applying the same settlement twice leaves the repository unchanged.

use crate::entities::{Booking, BookingStatus, Club, Competition};
use crate::error::StoreError;
use crate::limits::POINTS_PER_PLACE;
use crate::repository::Repository;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub booking: Booking,
    pub club_points_after: u32,
    pub competition_places_after: u32,
}

/// Compute the outcome of booking `places` for `club` in `competition`
pub fn plan_settlement(
    repo: &Repository,
    club: &Club,
    competition: &Competition,
    places: u32,
    now: NaiveDateTime,
) -> Result<Settlement, StoreError> {
    if places == 0 {
        return Err(StoreError::Invariant("a booking must cover at least one place".to_string()));
    }

    let points_used = places * POINTS_PER_PLACE;

    let club_points_after = club.clone().debit(points_used).ok_or_else(|| {
        StoreError::Invariant(format!(
            "club '{}' would go negative ({} - {})",
            club.name, club.points, points_used
        ))
    })?;

    let competition_places_after = competition.clone().take_places(places).ok_or_else(|| {
        StoreError::Invariant(format!(
            "competition '{}' would go negative ({} - {})",
            competition.name, competition.places, places
        ))
    })?;

    Ok(Settlement {
        booking: Booking {
            id: repo.next_booking_id(),
            club: club.name.clone(),
            competition: competition.name.clone(),
            places,
            points_used,
            created_at: now,
            status: BookingStatus::Confirmed,
        },
        club_points_after,
        competition_places_after,
    })
}

/// Write a planned settlement into the repository
pub fn apply_settlement(repo: &mut Repository, settlement: &Settlement) -> Result<(), StoreError> {
    let booking = &settlement.booking;

    // Resolve both records before touching either
    if repo.find_club_by_name(&booking.club).is_none() {
        return Err(StoreError::Invariant(format!("unknown club '{}'", booking.club)));
    }
    if repo.find_competition_by_name(&booking.competition).is_none() {
        return Err(StoreError::Invariant(format!(
            "unknown competition '{}'",
            booking.competition
        )));
    }

    if let Some(club) = repo.club_mut(&booking.club) {
        club.points = settlement.club_points_after;
    }
    if let Some(competition) = repo.competition_mut(&booking.competition) {
        competition.places = settlement.competition_places_after;
    }

    if repo.find_booking(booking.id).is_none() {
        repo.push_booking(booking.clone());
    }

    Ok(())
}
