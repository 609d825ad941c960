// 📒 Settlement Journal - SQLite write-ahead log for bookings
//
// Every settlement is written here (status 'pending') BEFORE memory changes,
// then marked 'applied' once clubs/competitions/bookings files are flushed.
// Pending entries found at startup are replayed onto the loaded files.

use crate::error::StoreError;
use crate::settlement::Settlement;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    Pending,
    Applied,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Applied => "applied",
        }
    }
}

/// A journaled settlement
#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub entry_id: String,
    pub recorded_at: DateTime<Utc>,
    pub settlement: Settlement,
}

pub struct Journal {
    conn: Connection,
}

impl Journal {
    /// Open (or create) the journal database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Journal that lives only as long as the process
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        setup_journal(&conn)?;
        Ok(Journal { conn })
    }

    /// Append a settlement as pending. This is the commit point of a booking.
    pub fn record(&self, settlement: &Settlement) -> Result<String, StoreError> {
        let entry_id = uuid::Uuid::new_v4().to_string();
        let payload = serde_json::to_string(settlement)?;

        self.conn.execute(
            "INSERT INTO settlements (entry_id, booking_id, recorded_at, payload, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry_id,
                settlement.booking.id as i64,
                Utc::now().to_rfc3339(),
                payload,
                EntryStatus::Pending.as_str(),
            ],
        )?;

        Ok(entry_id)
    }

    /// Pending entries in the order they were recorded
    pub fn pending(&self) -> Result<Vec<JournalEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT entry_id, recorded_at, payload
             FROM settlements
             WHERE status = ?1
             ORDER BY id ASC",
        )?;

        let rows = stmt
            .query_map(params![EntryStatus::Pending.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(entry_id, recorded_at, payload)| -> Result<JournalEntry, StoreError> {
                let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
                    .map_err(|e| {
                        StoreError::Invariant(format!("bad journal timestamp '{}': {}", recorded_at, e))
                    })?
                    .with_timezone(&Utc);
                Ok(JournalEntry {
                    entry_id,
                    recorded_at,
                    settlement: serde_json::from_str(&payload)?,
                })
            })
            .collect()
    }

    /// Mark every pending entry as applied. Returns how many were marked.
    pub fn mark_all_applied(&self) -> Result<usize, StoreError> {
        let updated = self.conn.execute(
            "UPDATE settlements SET status = ?1 WHERE status = ?2",
            params![EntryStatus::Applied.as_str(), EntryStatus::Pending.as_str()],
        )?;
        Ok(updated)
    }

    /// Total entries ever recorded
    pub fn count(&self) -> Result<i64, StoreError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM settlements", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn setup_journal(conn: &Connection) -> Result<(), StoreError> {
    // WAL for crash recovery (in-memory databases stay in 'memory' mode)
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settlements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id TEXT UNIQUE NOT NULL,
            booking_id INTEGER NOT NULL,
            recorded_at TEXT NOT NULL,
            payload TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_settlements_status ON settlements(status)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Booking, BookingStatus};
    use chrono::NaiveDate;

    fn settlement(id: u64) -> Settlement {
        Settlement {
            booking: Booking {
                id,
                club: "Simply Lift".to_string(),
                competition: "Spring Festival".to_string(),
                places: 2,
                points_used: 2,
                created_at: NaiveDate::from_ymd_opt(2025, 3, 1)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap(),
                status: BookingStatus::Confirmed,
            },
            club_points_after: 11,
            competition_places_after: 23,
        }
    }

    #[test]
    fn test_record_and_read_pending() {
        let journal = Journal::open_in_memory().unwrap();

        journal.record(&settlement(1)).unwrap();
        journal.record(&settlement(2)).unwrap();

        let pending = journal.pending().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].settlement, settlement(1));
        assert_eq!(pending[1].settlement.booking.id, 2);
    }

    #[test]
    fn test_mark_all_applied() {
        let journal = Journal::open_in_memory().unwrap();
        journal.record(&settlement(1)).unwrap();

        assert_eq!(journal.mark_all_applied().unwrap(), 1);
        assert!(journal.pending().unwrap().is_empty());
        assert_eq!(journal.count().unwrap(), 1, "applied entries are kept as history");
        assert_eq!(journal.mark_all_applied().unwrap(), 0);
    }

    #[test]
    fn test_journal_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");

        {
            let journal = Journal::open(&path).unwrap();
            journal.record(&settlement(7)).unwrap();
        }

        let reopened = Journal::open(&path).unwrap();
        let pending = reopened.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].settlement.booking.id, 7);
    }
}
