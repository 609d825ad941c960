// 🔎 Query Surface - read-only views over the repository
//
// Plain scans over the booking history. Nothing here is cached, so every
// answer reflects the latest settlement.

use crate::entities::Booking;
use crate::repository::Repository;
use serde::Serialize;

/// One row of the public points board
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based dense rank: tied clubs share a rank, the next one follows without a gap
    pub rank: usize,
    pub club: String,
    pub points: u32,
}

impl Repository {
    pub fn bookings_for_club(&self, club: &str) -> Vec<&Booking> {
        self.bookings().iter().filter(|b| b.club == club).collect()
    }

    pub fn bookings_for_competition(&self, competition: &str) -> Vec<&Booking> {
        self.bookings()
            .iter()
            .filter(|b| b.competition == competition)
            .collect()
    }

    pub fn bookings_for_club_and_competition(&self, club: &str, competition: &str) -> Vec<&Booking> {
        self.bookings()
            .iter()
            .filter(|b| b.is_for(club, competition))
            .collect()
    }

    /// Sum of places over every booking of `club` for `competition` (saturates at `u32::MAX`)
    pub fn places_already_booked(&self, club: &str, competition: &str) -> u32 {
        self.bookings_for_club_and_competition(club, competition)
            .iter()
            .fold(0u32, |total, b| total.saturating_add(b.places))
    }

    /// Clubs sorted by points (highest first). Ties keep file order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut clubs: Vec<_> = self.clubs().iter().collect();
        // sort_by is stable
        clubs.sort_by(|a, b| b.points.cmp(&a.points));

        let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(clubs.len());
        for club in clubs {
            let rank = match entries.last() {
                Some(prev) if prev.points == club.points => prev.rank,
                Some(prev) => prev.rank + 1,
                None => 1,
            };
            entries.push(LeaderboardEntry {
                rank,
                club: club.name.clone(),
                points: club.points,
            });
        }
        entries
    }
}
