// 📏 Limit Calculator
//
// How many more places can a club book for a competition right now?
// The answer is the tightest of three constraints:
//   1. the 12-place cap per club per competition (minus what is already booked)
//   2. the club's points (1 point = 1 place)
//   3. the competition's remaining places

use crate::entities::{Club, Competition};
use crate::repository::Repository;
use serde::{Deserialize, Serialize};

/// Maximum places a club may hold, in total, for one competition
pub const MAX_PLACES_PER_CLUB: u32 = 12;

/// Maximum places in a single request
pub const MAX_PLACES_PER_REQUEST: i64 = 12;

/// Exchange rate: points spent per place booked
pub const POINTS_PER_PLACE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingLimits {
    pub places_already_booked: u32,
    pub remaining_from_cap: u32,
    pub club_points: u32,
    pub available_places: u32,
    pub max_remaining: u32,
}

impl BookingLimits {
    /// Combine the three constraint inputs
    pub fn new(places_already_booked: u32, club_points: u32, available_places: u32) -> Self {
        let remaining_from_cap = MAX_PLACES_PER_CLUB.saturating_sub(places_already_booked);
        let max_remaining = remaining_from_cap
            .min(club_points / POINTS_PER_PLACE)
            .min(available_places);

        BookingLimits {
            places_already_booked,
            remaining_from_cap,
            club_points,
            available_places,
            max_remaining,
        }
    }

    /// True once the club cannot book anything more for this competition
    pub fn is_exhausted(&self) -> bool {
        self.max_remaining == 0
    }
}

/// Compute the limits for `club` booking into `competition`. Read-only.
pub fn calculate_booking_limits(
    repo: &Repository,
    club: &Club,
    competition: &Competition,
) -> BookingLimits {
    let already_booked = repo.places_already_booked(&club.name, &competition.name);
    BookingLimits::new(already_booked, club.points, competition.places)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Booking, BookingStatus};
    use crate::repository::Snapshot;
    use chrono::NaiveDate;

    fn repo(club_points: u32, comp_places: u32, prior: &[u32]) -> Repository {
        let created_at = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bookings = prior
            .iter()
            .enumerate()
            .map(|(i, &places)| Booking {
                id: i as u64 + 1,
                club: "Test Club".to_string(),
                competition: "Test Competition".to_string(),
                places,
                points_used: places,
                created_at,
                status: BookingStatus::Confirmed,
            })
            .collect();

        Repository::from_snapshot(Snapshot {
            clubs: vec![Club::new("Test Club", "test@club.com", club_points)],
            competitions: vec![Competition::new("Test Competition", "2030-01-01 10:00:00", comp_places)],
            bookings,
        })
    }

    fn limits_for(repo: &Repository) -> BookingLimits {
        let club = repo.find_club_by_name("Test Club").unwrap();
        let comp = repo.find_competition_by_name("Test Competition").unwrap();
        calculate_booking_limits(repo, club, comp)
    }

    #[test]
    fn test_limits_no_existing_bookings() {
        let limits = limits_for(&repo(15, 20, &[]));

        assert_eq!(limits.places_already_booked, 0);
        assert_eq!(limits.remaining_from_cap, 12);
        assert_eq!(limits.club_points, 15);
        assert_eq!(limits.available_places, 20);
        assert_eq!(limits.max_remaining, 12);
    }

    #[test]
    fn test_limits_with_existing_bookings() {
        let limits = limits_for(&repo(15, 20, &[3, 2]));

        assert_eq!(limits.places_already_booked, 5);
        assert_eq!(limits.remaining_from_cap, 7);
        assert_eq!(limits.max_remaining, 7);
    }

    #[test]
    fn test_limits_tightest_constraint_wins() {
        // (already booked, points, places, expected max)
        let cases = [
            (0, 13, 25, 12),
            (5, 13, 25, 7),
            (0, 3, 25, 3),
            (0, 13, 2, 2),
            (12, 13, 25, 0),
            (7, 3, 2, 2),
        ];

        for (booked, points, places, expected) in cases {
            let limits = BookingLimits::new(booked, points, places);
            assert_eq!(
                limits.max_remaining, expected,
                "booked={} points={} places={}",
                booked, points, places
            );
        }
    }

    #[test]
    fn test_remaining_from_cap_floors_at_zero() {
        let limits = BookingLimits::new(15, 10, 10);

        assert_eq!(limits.remaining_from_cap, 0);
        assert!(limits.is_exhausted());
    }

    #[test]
    fn test_limits_are_idempotent() {
        let repo = repo(13, 25, &[4]);

        assert_eq!(limits_for(&repo), limits_for(&repo));
    }
}
