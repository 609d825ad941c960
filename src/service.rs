// 🎯 Booking Service - the one handle callers use
//
// Owns the repository and the settlement journal behind a single mutex, so
// lookup → limits → validation → settlement runs as one critical section.
// Two concurrent requests can never both pass validation on stale numbers.
//
// Durability: journal first (commit point), then memory, then the JSON files.
// A failed file flush keeps the booking (it is journaled) and is retried on
// the next settlement, on `flush()`, or by replay at the next start.

use crate::config::Config;
use crate::entities::{Booking, Club, Competition};
use crate::error::{BookingError, Rejection, StoreError};
use crate::journal::Journal;
use crate::limits::{calculate_booking_limits, BookingLimits};
use crate::queries::LeaderboardEntry;
use crate::repository::{Repository, Snapshot};
use crate::settlement::{apply_settlement, plan_settlement};
use crate::storage::{DataStore, JsonFileStore};
use crate::validator::{check_competition_open, validate_booking_request, RequestedPlaces};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

// ============================================================================
// RESPONSES
// ============================================================================

/// Successful booking: the record plus updated balances for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingReceipt {
    pub booking: Booking,
    pub club_points: u32,
    pub competition_places: u32,
    /// False when the data files could not be written yet (the journal holds the booking)
    pub flushed: bool,
}

/// Everything needed to render a booking form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingPage {
    pub club: Club,
    pub competition: Competition,
    pub limits: BookingLimits,
    pub closed: bool,
}

// ============================================================================
// SERVICE
// ============================================================================

struct Ledger {
    repo: Repository,
    journal: Journal,
}

pub struct BookingService {
    store: Box<dyn DataStore>,
    ledger: Mutex<Ledger>,
}

impl BookingService {
    /// Load the collections, replay any pending journal entries, and flush them
    pub fn open<S>(store: S, journal: Journal) -> Result<Self, StoreError>
    where
        S: DataStore + 'static,
    {
        let snapshot = store.load()?;
        info!(
            clubs = snapshot.clubs.len(),
            competitions = snapshot.competitions.len(),
            bookings = snapshot.bookings.len(),
            "📂 loaded booking data"
        );

        let mut repo = Repository::from_snapshot(snapshot);
        for duplicate in repo.duplicate_keys() {
            warn!("duplicate {} in source data, first match will be used", duplicate);
        }

        debug!(entries = journal.count()?, "settlement journal opened");
        let pending = journal.pending()?;
        if !pending.is_empty() {
            info!(entries = pending.len(), "replaying pending settlements from journal");
            for entry in &pending {
                debug!(
                    entry_id = %entry.entry_id,
                    recorded_at = %entry.recorded_at,
                    booking_id = entry.settlement.booking.id,
                    "replay"
                );
                apply_settlement(&mut repo, &entry.settlement)?;
            }
            store.save_all(&repo.snapshot())?;
            journal.mark_all_applied()?;
        }

        Ok(BookingService {
            store: Box::new(store),
            ledger: Mutex::new(Ledger { repo, journal }),
        })
    }

    /// Open the JSON files and journal named by `config`
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let store = JsonFileStore::new(
            &config.clubs_file,
            &config.competitions_file,
            &config.bookings_file,
        );
        let journal = Journal::open(&config.journal_file)?;
        Self::open(store, journal)
    }

    /// The ledger is only written after the journal commit, so a poisoned lock
    /// still guards a state that replay can reproduce
    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|poisoned| {
            warn!("ledger lock was poisoned by a panicked request, continuing");
            poisoned.into_inner()
        })
    }

    // ========================================================================
    // READ SIDE
    // ========================================================================

    /// Email lookup "login"
    pub fn login(&self, email: &str) -> Result<Club, BookingError> {
        let ledger = self.lock();
        ledger
            .repo
            .find_club_by_email(email)
            .cloned()
            .ok_or_else(|| BookingError::UnknownEmail(email.to_string()))
    }

    pub fn clubs(&self) -> Result<Vec<Club>, BookingError> {
        Ok(self.lock().repo.clubs().to_vec())
    }

    pub fn competitions(&self) -> Result<Vec<Competition>, BookingError> {
        Ok(self.lock().repo.competitions().to_vec())
    }

    pub fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, BookingError> {
        Ok(self.lock().repo.leaderboard())
    }

    pub fn bookings_for_club(&self, club: &str) -> Result<Vec<Booking>, BookingError> {
        let ledger = self.lock();
        Ok(ledger.repo.bookings_for_club(club).into_iter().cloned().collect())
    }

    pub fn bookings_for_competition(&self, competition: &str) -> Result<Vec<Booking>, BookingError> {
        let ledger = self.lock();
        Ok(ledger
            .repo
            .bookings_for_competition(competition)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn bookings_for_club_and_competition(
        &self,
        club: &str,
        competition: &str,
    ) -> Result<Vec<Booking>, BookingError> {
        let ledger = self.lock();
        Ok(ledger
            .repo
            .bookings_for_club_and_competition(club, competition)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Current state of all three collections
    pub fn snapshot(&self) -> Result<Snapshot, BookingError> {
        Ok(self.lock().repo.snapshot())
    }

    /// Limits and status for the booking form of `club` in `competition`
    pub fn booking_page(&self, club: &str, competition: &str) -> Result<BookingPage, BookingError> {
        self.booking_page_at(club, competition, Local::now().naive_local())
    }

    pub fn booking_page_at(
        &self,
        club: &str,
        competition: &str,
        now: NaiveDateTime,
    ) -> Result<BookingPage, BookingError> {
        let ledger = self.lock();
        let (club, competition) = resolve(&ledger.repo, club, competition)?;
        let limits = calculate_booking_limits(&ledger.repo, &club, &competition);
        let closed = competition.is_closed_at(now);

        Ok(BookingPage {
            club,
            competition,
            limits,
            closed,
        })
    }

    // ========================================================================
    // WRITE SIDE
    // ========================================================================

    /// Book `places` for `club` in `competition`, using the local clock
    pub fn book(
        &self,
        club: &str,
        competition: &str,
        places: impl Into<RequestedPlaces>,
    ) -> Result<BookingReceipt, BookingError> {
        self.book_at(club, competition, places, Local::now().naive_local())
    }

    /// Book with an explicit "now" (closed-competition check, booking timestamp)
    pub fn book_at(
        &self,
        club: &str,
        competition: &str,
        places: impl Into<RequestedPlaces>,
        now: NaiveDateTime,
    ) -> Result<BookingReceipt, BookingError> {
        let places = places.into();

        let mut guard = self.lock();
        let ledger = &mut *guard;

        let (club, competition) = resolve(&ledger.repo, club, competition)?;
        let limits = calculate_booking_limits(&ledger.repo, &club, &competition);

        check_competition_open(&competition, now).map_err(|r| rejected(r, limits, &club, &competition))?;
        let requested = places
            .parse()
            .map_err(|r| rejected(r, limits, &club, &competition))?;
        let places = validate_booking_request(requested, &limits)
            .map_err(|r| rejected(r, limits, &club, &competition))?;

        let settlement = plan_settlement(&ledger.repo, &club, &competition, places, now)?;
        ledger.journal.record(&settlement)?;
        apply_settlement(&mut ledger.repo, &settlement)?;

        info!(
            club = %club.name,
            competition = %competition.name,
            places,
            booking_id = settlement.booking.id,
            "✅ booking settled"
        );

        let flushed = self.flush_ledger(ledger).is_ok();

        Ok(BookingReceipt {
            booking: settlement.booking,
            club_points: settlement.club_points_after,
            competition_places: settlement.competition_places_after,
            flushed,
        })
    }

    /// Write all collections and clear the journal's pending entries
    pub fn flush(&self) -> Result<(), BookingError> {
        let guard = self.lock();
        self.flush_ledger(&guard)?;
        Ok(())
    }

    fn flush_ledger(&self, ledger: &Ledger) -> Result<(), StoreError> {
        let result = self
            .store
            .save_all(&ledger.repo.snapshot())
            .and_then(|()| ledger.journal.mark_all_applied().map(|_| ()));

        if let Err(e) = &result {
            warn!("⚠️ flush failed, settlement kept in journal for retry: {}", e);
        }
        result
    }
}

fn resolve(repo: &Repository, club: &str, competition: &str) -> Result<(Club, Competition), BookingError> {
    let club = repo
        .find_club_by_name(club)
        .cloned()
        .ok_or_else(|| BookingError::UnknownClub(club.to_string()))?;
    let competition = repo
        .find_competition_by_name(competition)
        .cloned()
        .ok_or_else(|| BookingError::UnknownCompetition(competition.to_string()))?;
    Ok((club, competition))
}

fn rejected(reason: Rejection, limits: BookingLimits, club: &Club, competition: &Competition) -> BookingError {
    if reason.is_input_error() {
        debug!(club = %club.name, code = reason.code(), "booking input refused");
    } else {
        info!(
            club = %club.name,
            competition = %competition.name,
            code = reason.code(),
            "booking rejected"
        );
    }
    BookingError::Rejected { reason, limits }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn fixtures() -> Snapshot {
        Snapshot {
            clubs: vec![
                Club::new("Simply Lift", "john@simplylift.co", 13),
                Club::new("Iron Temple", "admin@irontemple.com", 4),
                Club::new("She Lifts", "kate@shelifts.co.uk", 12),
            ],
            competitions: vec![
                Competition::new("Spring Festival", "2030-03-27 10:00:00", 25),
                Competition::new("Fall Classic", "2030-10-22 13:30:00", 13),
                Competition::new("Old Cup", "2020-03-27 10:00:00", 25),
            ],
            bookings: vec![],
        }
    }

    fn service_with(snapshot: Snapshot) -> BookingService {
        BookingService::open(MemoryStore::new(snapshot), Journal::open_in_memory().unwrap()).unwrap()
    }

    fn service() -> BookingService {
        service_with(fixtures())
    }

    fn reason(err: BookingError) -> Rejection {
        match err {
            BookingError::Rejected { reason, .. } => reason,
            other => panic!("expected a rejection, got {:?}", other),
        }
    }

    /// Store whose writes can be switched off
    struct FlakyStore {
        inner: Arc<MemoryStore>,
        failing: Arc<AtomicBool>,
    }

    impl FlakyStore {
        fn check(&self) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Io {
                    path: "flaky".into(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            Ok(())
        }
    }

    impl DataStore for FlakyStore {
        fn load(&self) -> Result<Snapshot, StoreError> {
            self.inner.load()
        }
        fn save_clubs(&self, clubs: &[Club]) -> Result<(), StoreError> {
            self.check()?;
            self.inner.save_clubs(clubs)
        }
        fn save_competitions(&self, competitions: &[Competition]) -> Result<(), StoreError> {
            self.check()?;
            self.inner.save_competitions(competitions)
        }
        fn save_bookings(&self, bookings: &[Booking]) -> Result<(), StoreError> {
            self.check()?;
            self.inner.save_bookings(bookings)
        }
    }

    // ========================================================================
    // BOOKING FLOW
    // ========================================================================

    #[test]
    fn test_successful_booking_updates_all_collections() {
        let service = service();

        let receipt = service.book_at("Simply Lift", "Spring Festival", 5, now()).unwrap();

        assert_eq!(receipt.club_points, 8);
        assert_eq!(receipt.competition_places, 20);
        assert_eq!(receipt.booking.id, 1);
        assert_eq!(receipt.booking.places, 5);
        assert_eq!(receipt.booking.points_used, 5);
        assert_eq!(receipt.booking.created_at, now());
        assert!(receipt.flushed);

        let snapshot = service.snapshot().unwrap();
        assert_eq!(snapshot.clubs[0].points, 8);
        assert_eq!(snapshot.competitions[0].places, 20);
        assert_eq!(snapshot.bookings.len(), 1);
    }

    #[test]
    fn test_insufficient_points_mutates_nothing() {
        let service = service();
        let before = service.snapshot().unwrap();

        let err = service.book_at("Iron Temple", "Spring Festival", "5", now()).unwrap_err();

        assert_eq!(reason(err), Rejection::InsufficientPoints { needed: 5, held: 4 });
        assert_eq!(service.snapshot().unwrap(), before);
    }

    #[test]
    fn test_cumulative_cap_across_requests() {
        let service = service_with(Snapshot {
            clubs: vec![Club::new("Big Club", "big@club.com", 30)],
            ..fixtures()
        });
        service.book_at("Big Club", "Spring Festival", 8, now()).unwrap();

        let err = service.book_at("Big Club", "Spring Festival", 5, now()).unwrap_err();
        assert_eq!(
            reason(err),
            Rejection::CumulativeCapExceeded {
                already_booked: 8,
                remaining: 4
            }
        );

        service.book_at("Big Club", "Spring Festival", 4, now()).unwrap();

        let err = service.book_at("Big Club", "Spring Festival", 1, now()).unwrap_err();
        let rejection = reason(err);
        assert_eq!(
            rejection,
            Rejection::CumulativeCapExceeded {
                already_booked: 12,
                remaining: 0
            }
        );
        assert!(rejection.to_string().contains("You already have 12 places booked"));
    }

    #[test]
    fn test_non_positive_places_rejected() {
        let service = service();

        for places in [0, -1, -5] {
            let err = service.book_at("Simply Lift", "Spring Festival", places, now()).unwrap_err();
            assert_eq!(reason(err).to_string(), "Number of places must be greater than 0.");
        }
        assert!(service.snapshot().unwrap().bookings.is_empty());
    }

    #[test]
    fn test_exactly_twelve_in_one_request() {
        let service = service_with(Snapshot {
            clubs: vec![Club::new("Big Club", "big@club.com", 12)],
            ..fixtures()
        });

        let receipt = service.book_at("Big Club", "Spring Festival", 12, now()).unwrap();

        assert_eq!(receipt.club_points, 0);
        assert_eq!(receipt.competition_places, 13);
    }

    #[test]
    fn test_leaderboard_after_bookings() {
        let board = service().leaderboard().unwrap();

        let ranks: Vec<usize> = board.iter().map(|e| e.rank).collect();
        let points: Vec<u32> = board.iter().map(|e| e.points).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(points, vec![13, 12, 4]);
    }

    // ========================================================================
    // LOOKUPS, CLOSED COMPETITIONS, INPUT
    // ========================================================================

    #[test]
    fn test_unknown_identifiers() {
        let service = service();

        assert!(matches!(
            service.book_at("Ghost Club", "Spring Festival", 1, now()),
            Err(BookingError::UnknownClub(_))
        ));
        assert!(matches!(
            service.book_at("Simply Lift", "Ghost Cup", 1, now()),
            Err(BookingError::UnknownCompetition(_))
        ));
        assert!(service.login("nobody@nowhere.com").unwrap_err().is_lookup_error());
    }

    #[test]
    fn test_oversized_history_keeps_cap_closed() {
        let huge = |id| Booking {
            id,
            club: "Simply Lift".to_string(),
            competition: "Spring Festival".to_string(),
            places: 3_000_000_000,
            points_used: 3_000_000_000,
            created_at: now(),
            status: crate::entities::BookingStatus::Confirmed,
        };
        let service = service_with(Snapshot {
            bookings: vec![huge(1), huge(2)],
            ..fixtures()
        });

        let page = service.booking_page_at("Simply Lift", "Spring Festival", now()).unwrap();
        assert_eq!(page.limits.places_already_booked, u32::MAX);
        assert_eq!(page.limits.max_remaining, 0);

        let err = service.book_at("Simply Lift", "Spring Festival", 1, now()).unwrap_err();
        assert_eq!(
            reason(err),
            Rejection::CumulativeCapExceeded {
                already_booked: u32::MAX,
                remaining: 0
            }
        );
    }

    #[test]
    fn test_oversized_quantity_text_hits_the_rules() {
        let service = service();

        let err = service
            .book_at("Simply Lift", "Spring Festival", "99999999999999999999", now())
            .unwrap_err();
        assert_eq!(reason(err).code(), "per_request_cap_exceeded");

        let err = service
            .book_at("Simply Lift", "Spring Festival", "-99999999999999999999", now())
            .unwrap_err();
        assert_eq!(reason(err).code(), "non_positive_quantity");
    }

    #[test]
    fn test_login_by_email() {
        let club = service().login("kate@shelifts.co.uk").unwrap();

        assert_eq!(club.name, "She Lifts");
        assert_eq!(club.points, 12);
    }

    #[test]
    fn test_closed_competition_is_rejected_first() {
        let service = service();

        let err = service.book_at("Simply Lift", "Old Cup", 0, now()).unwrap_err();

        assert_eq!(
            reason(err),
            Rejection::CompetitionClosed {
                competition: "Old Cup".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_quantity_carries_limits() {
        let service = service();

        match service.book_at("Simply Lift", "Spring Festival", "abc", now()) {
            Err(BookingError::Rejected { reason, limits }) => {
                assert_eq!(reason.code(), "malformed_quantity");
                assert_eq!(limits.max_remaining, 12);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_booking_page_reflects_history() {
        let service = service();
        service.book_at("Simply Lift", "Spring Festival", 5, now()).unwrap();

        let page = service.booking_page_at("Simply Lift", "Spring Festival", now()).unwrap();

        assert_eq!(page.limits.places_already_booked, 5);
        assert_eq!(page.limits.remaining_from_cap, 7);
        assert_eq!(page.limits.max_remaining, 7);
        assert!(!page.closed);
        assert!(service.booking_page_at("Simply Lift", "Old Cup", now()).unwrap().closed);
    }

    #[test]
    fn test_booking_history_queries() {
        let service = service();
        service.book_at("Simply Lift", "Spring Festival", 2, now()).unwrap();
        service.book_at("Simply Lift", "Spring Festival", 1, now()).unwrap();
        service.book_at("Iron Temple", "Spring Festival", 3, now()).unwrap();
        service.book_at("Simply Lift", "Fall Classic", 1, now()).unwrap();

        assert_eq!(service.bookings_for_club("Simply Lift").unwrap().len(), 3);
        assert_eq!(service.bookings_for_competition("Spring Festival").unwrap().len(), 3);
        assert_eq!(
            service
                .bookings_for_club_and_competition("Simply Lift", "Spring Festival")
                .unwrap()
                .len(),
            2
        );
        let ids: Vec<u64> = service.snapshot().unwrap().bookings.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    // ========================================================================
    // DURABILITY
    // ========================================================================

    #[test]
    fn test_successful_booking_is_saved() {
        let store = Arc::new(MemoryStore::new(fixtures()));
        let service = BookingService::open(
            FlakyStore {
                inner: store.clone(),
                failing: Arc::new(AtomicBool::new(false)),
            },
            Journal::open_in_memory().unwrap(),
        )
        .unwrap();

        service.book_at("Simply Lift", "Spring Festival", 3, now()).unwrap();

        let saved = store.saved();
        assert_eq!(saved.clubs[0].points, 10);
        assert_eq!(saved.competitions[0].places, 22);
        assert_eq!(saved.bookings.len(), 1);
    }

    #[test]
    fn test_flush_failure_keeps_booking_and_retries() {
        let store = Arc::new(MemoryStore::new(fixtures()));
        let failing = Arc::new(AtomicBool::new(true));
        let service = BookingService::open(
            FlakyStore {
                inner: store.clone(),
                failing: failing.clone(),
            },
            Journal::open_in_memory().unwrap(),
        )
        .unwrap();

        let receipt = service.book_at("Simply Lift", "Spring Festival", 3, now()).unwrap();
        assert!(!receipt.flushed);
        assert_eq!(service.snapshot().unwrap().clubs[0].points, 10, "held in memory");
        assert!(store.saved().bookings.is_empty(), "nothing reached the store");
        assert!(service.flush().is_err());

        failing.store(false, Ordering::SeqCst);
        service.flush().unwrap();

        assert_eq!(store.saved().bookings.len(), 1);
        assert_eq!(store.saved().clubs[0].points, 10);
    }

    #[test]
    fn test_pending_journal_entries_are_replayed_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let journal_path = dir.path().join("journal.db");
        let store = Arc::new(MemoryStore::new(fixtures()));
        let failing = Arc::new(AtomicBool::new(true));

        {
            let service = BookingService::open(
                FlakyStore {
                    inner: store.clone(),
                    failing: failing.clone(),
                },
                Journal::open(&journal_path).unwrap(),
            )
            .unwrap();
            service.book_at("Simply Lift", "Spring Festival", 3, now()).unwrap();
            service.book_at("She Lifts", "Fall Classic", 2, now()).unwrap();
            // dropped without a successful flush
        }
        assert!(store.saved().bookings.is_empty());

        failing.store(false, Ordering::SeqCst);
        let journal = Journal::open(&journal_path).unwrap();
        let service = BookingService::open(
            FlakyStore {
                inner: store.clone(),
                failing,
            },
            journal,
        )
        .unwrap();

        let saved = store.saved();
        assert_eq!(saved.bookings.len(), 2);
        assert_eq!(saved.clubs[0].points, 10);
        assert_eq!(saved.clubs[2].points, 10);
        assert_eq!(saved.competitions[1].places, 11);
        assert_eq!(service.snapshot().unwrap(), saved);

        // Replay happened once: a second open changes nothing
        let again = BookingService::open(
            MemoryStore::new(saved.clone()),
            Journal::open(&journal_path).unwrap(),
        )
        .unwrap();
        assert_eq!(again.snapshot().unwrap(), saved);
    }

    #[test]
    fn test_journal_failure_mutates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let journal_path = dir.path().join("journal.db");
        let journal = Journal::open(&journal_path).unwrap();

        // Refuse every append from a second connection to the same file
        let conn = rusqlite::Connection::open(&journal_path).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER refuse_settlements BEFORE INSERT ON settlements
             BEGIN SELECT RAISE(ABORT, 'journal is read-only'); END;",
        )
        .unwrap();

        let store = Arc::new(MemoryStore::new(fixtures()));
        let service = BookingService::open(
            FlakyStore {
                inner: store.clone(),
                failing: Arc::new(AtomicBool::new(false)),
            },
            journal,
        )
        .unwrap();
        let before = service.snapshot().unwrap();

        let result = service.book_at("Simply Lift", "Spring Festival", 3, now());

        assert!(matches!(result, Err(BookingError::Store(StoreError::Journal(_)))));
        assert_eq!(service.snapshot().unwrap(), before);
        assert_eq!(store.saved(), fixtures());
    }

    #[test]
    fn test_json_files_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        store.save_all(&fixtures()).unwrap();

        let config = Config::from_lookup(|key| match key {
            "BOOKING_DATA_DIR" => Some(dir.path().to_string_lossy().into_owned()),
            _ => None,
        });

        {
            let service = BookingService::from_config(&config).unwrap();
            service.book_at("Simply Lift", "Spring Festival", "3", now()).unwrap();
        }

        let reloaded = JsonFileStore::in_dir(dir.path()).load().unwrap();
        assert_eq!(reloaded.clubs[0].points, 10);
        assert_eq!(reloaded.competitions[0].places, 22);
        assert_eq!(reloaded.bookings[0].club, "Simply Lift");
        assert_eq!(reloaded.bookings[0].competition, "Spring Festival");
    }

    // ========================================================================
    // CONCURRENCY
    // ========================================================================

    #[test]
    fn test_service_recovers_after_panicked_request() {
        let service = Arc::new(service());

        let poisoner = service.clone();
        let outcome = std::thread::spawn(move || {
            let _ledger = poisoner.ledger.lock().unwrap();
            panic!("request handler crashed");
        })
        .join();
        assert!(outcome.is_err());
        assert!(service.ledger.is_poisoned());

        let receipt = service.book_at("Simply Lift", "Spring Festival", 2, now()).unwrap();
        assert_eq!(receipt.club_points, 11);
        assert_eq!(service.leaderboard().unwrap()[0].points, 12);
    }

    #[test]
    fn test_concurrent_requests_never_exceed_cap() {
        let service = Arc::new(service_with(Snapshot {
            clubs: vec![Club::new("Big Club", "big@club.com", 100)],
            ..fixtures()
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                std::thread::spawn(move || service.book_at("Big Club", "Spring Festival", 3, now()).is_ok())
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(accepted, 4, "only 4 x 3 places fit under the cap of 12");
        let snapshot = service.snapshot().unwrap();
        assert_eq!(snapshot.clubs[0].points, 88);
        assert_eq!(snapshot.competitions[0].places, 13);
    }

    // ========================================================================
    // INVARIANTS
    // ========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_invariants_hold_for_any_request_sequence(
            requests in prop::collection::vec((0usize..3, 0usize..2, -3i64..16), 1..40)
        ) {
            let service = service();
            let clubs = ["Simply Lift", "Iron Temple", "She Lifts"];
            let comps = ["Spring Festival", "Fall Classic"];

            for (club, comp, places) in requests {
                let before = service.booking_page_at(clubs[club], comps[comp], now()).unwrap().limits;
                let result = service.book_at(clubs[club], comps[comp], places, now());

                match result {
                    Ok(receipt) => {
                        prop_assert!(places >= 1 && places <= i64::from(before.max_remaining));
                        prop_assert_eq!(receipt.booking.points_used, receipt.booking.places);
                    }
                    Err(BookingError::Rejected { limits, .. }) => {
                        prop_assert_eq!(limits, before);
                        prop_assert!(places < 1 || places > i64::from(before.max_remaining));
                    }
                    Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                }
            }

            let repo = Repository::from_snapshot(service.snapshot().unwrap());
            for club in clubs {
                for comp in comps {
                    prop_assert!(repo.places_already_booked(club, comp) <= 12);
                }
            }
            let spent: u32 = repo.bookings().iter().map(|b| b.points_used).sum();
            let points: u32 = repo.clubs().iter().map(|c| c.points).sum();
            prop_assert_eq!(spent + points, 13 + 4 + 12);
            let taken: u32 = repo.bookings().iter().map(|b| b.places).sum();
            let left: u32 = repo.competitions().iter().map(|c| c.places).sum();
            prop_assert_eq!(taken + left, 25 + 13 + 25);
        }
    }
}
