// 📚 Repository - the single owner of clubs, competitions and bookings
//
// Lookups follow an explicit first-match policy: duplicate keys are tolerated
// in source data, reported by `duplicate_keys()`, and the earliest record wins.

use crate::entities::{Booking, Club, Competition};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// SNAPSHOT
// ============================================================================

/// The three collections as loaded from / saved to storage, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub clubs: Vec<Club>,
    pub competitions: Vec<Competition>,
    pub bookings: Vec<Booking>,
}

// ============================================================================
// DUPLICATE REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateKey {
    ClubName(String),
    ClubEmail(String),
    CompetitionName(String),
}

impl std::fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicateKey::ClubName(name) => write!(f, "club name '{}'", name),
            DuplicateKey::ClubEmail(email) => write!(f, "club email '{}'", email),
            DuplicateKey::CompetitionName(name) => write!(f, "competition name '{}'", name),
        }
    }
}

// ============================================================================
// REPOSITORY
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Repository {
    clubs: Vec<Club>,
    competitions: Vec<Competition>,
    bookings: Vec<Booking>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Repository {
            clubs: snapshot.clubs,
            competitions: snapshot.competitions,
            bookings: snapshot.bookings,
        }
    }

    /// Copy of the current state, for persistence
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            clubs: self.clubs.clone(),
            competitions: self.competitions.clone(),
            bookings: self.bookings.clone(),
        }
    }

    pub fn clubs(&self) -> &[Club] {
        &self.clubs
    }

    pub fn competitions(&self) -> &[Competition] {
        &self.competitions
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    // ========================================================================
    // LOOKUPS (first match wins)
    // ========================================================================

    pub fn find_club_by_name(&self, name: &str) -> Option<&Club> {
        self.clubs.iter().find(|c| c.name == name)
    }

    pub fn find_club_by_email(&self, email: &str) -> Option<&Club> {
        self.clubs.iter().find(|c| c.email == email)
    }

    pub fn find_competition_by_name(&self, name: &str) -> Option<&Competition> {
        self.competitions.iter().find(|c| c.name == name)
    }

    pub(crate) fn club_mut(&mut self, name: &str) -> Option<&mut Club> {
        self.clubs.iter_mut().find(|c| c.name == name)
    }

    pub(crate) fn competition_mut(&mut self, name: &str) -> Option<&mut Competition> {
        self.competitions.iter_mut().find(|c| c.name == name)
    }

    pub fn find_booking(&self, id: u64) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    // ========================================================================
    // BOOKING HISTORY
    // ========================================================================

    /// Next sequential booking id: max existing id + 1, or 1 for an empty history
    pub fn next_booking_id(&self) -> u64 {
        self.bookings.iter().map(|b| b.id).max().map_or(1, |max| max + 1)
    }

    /// Append a booking. History is append-only.
    pub(crate) fn push_booking(&mut self, booking: Booking) {
        self.bookings.push(booking);
    }

    // ========================================================================
    // DATA INTEGRITY
    // ========================================================================

    /// Keys that appear more than once, in first-seen order
    pub fn duplicate_keys(&self) -> Vec<DuplicateKey> {
        let mut duplicates = Vec::new();

        let mut names = HashSet::new();
        let mut emails = HashSet::new();
        for club in &self.clubs {
            if !names.insert(club.name.as_str()) {
                duplicates.push(DuplicateKey::ClubName(club.name.clone()));
            }
            if !emails.insert(club.email.as_str()) {
                duplicates.push(DuplicateKey::ClubEmail(club.email.clone()));
            }
        }

        let mut comp_names = HashSet::new();
        for comp in &self.competitions {
            if !comp_names.insert(comp.name.as_str()) {
                duplicates.push(DuplicateKey::CompetitionName(comp.name.clone()));
            }
        }

        duplicates
    }
}
