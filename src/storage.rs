// 💾 Storage - load/save of the three collections
//
// Files keep the legacy layout:
//   clubs.json        {"clubs": [{"name", "email", "points"}]}
//   competitions.json {"competitions": [{"name", "date", "numberOfPlaces"}]}
//   bookings.json     {"bookings": [...]}   (optional, empty when missing)
//
// Numbers in clubs/competitions are stored as text. Each file is replaced
// atomically (temp file + rename), so a collection is never half-written.

use crate::entities::{Booking, Club, Competition};
use crate::error::StoreError;
use crate::limits::{MAX_PLACES_PER_CLUB, POINTS_PER_PLACE};
use crate::repository::Snapshot;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

// ============================================================================
// DATA STORE TRAIT
// ============================================================================

/// Durable home of the collections. Writes are per collection, not across them.
pub trait DataStore: Send + Sync {
    fn load(&self) -> Result<Snapshot, StoreError>;
    fn save_clubs(&self, clubs: &[Club]) -> Result<(), StoreError>;
    fn save_competitions(&self, competitions: &[Competition]) -> Result<(), StoreError>;
    fn save_bookings(&self, bookings: &[Booking]) -> Result<(), StoreError>;

    /// Write all three collections (three independent writes)
    fn save_all(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.save_clubs(&snapshot.clubs)?;
        self.save_competitions(&snapshot.competitions)?;
        self.save_bookings(&snapshot.bookings)
    }
}

// ============================================================================
// FILE RECORDS
// ============================================================================

/// Integer that may be stored as a JSON number or as text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NumericField {
    Number(serde_json::Number),
    Text(String),
}

impl NumericField {
    fn to_u32(&self, entity: &'static str, key: &str, field: &'static str) -> Result<u32, StoreError> {
        let raw = match self {
            NumericField::Number(n) => n.to_string(),
            NumericField::Text(s) => s.clone(),
        };
        raw.trim().parse::<u32>().map_err(|_| StoreError::MalformedData {
            entity,
            key: key.to_string(),
            field,
            value: raw,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ClubRecord {
    name: String,
    email: String,
    points: NumericField,
}

#[derive(Debug, Serialize)]
struct ClubRecordOut<'a> {
    name: &'a str,
    email: &'a str,
    points: String,
}

#[derive(Debug, Deserialize)]
struct CompetitionRecord {
    name: String,
    date: String,
    #[serde(rename = "numberOfPlaces")]
    number_of_places: NumericField,
}

#[derive(Debug, Serialize)]
struct CompetitionRecordOut<'a> {
    name: &'a str,
    date: &'a str,
    #[serde(rename = "numberOfPlaces")]
    number_of_places: String,
}

#[derive(Deserialize)]
struct ClubsFile {
    clubs: Vec<ClubRecord>,
}

#[derive(Serialize)]
struct ClubsFileOut<'a> {
    clubs: Vec<ClubRecordOut<'a>>,
}

#[derive(Deserialize)]
struct CompetitionsFile {
    competitions: Vec<CompetitionRecord>,
}

#[derive(Serialize)]
struct CompetitionsFileOut<'a> {
    competitions: Vec<CompetitionRecordOut<'a>>,
}

#[derive(Deserialize)]
struct BookingsFile {
    #[serde(default)]
    bookings: Vec<Booking>,
}

#[derive(Serialize)]
struct BookingsFileOut<'a> {
    bookings: &'a [Booking],
}

impl TryFrom<ClubRecord> for Club {
    type Error = StoreError;

    fn try_from(record: ClubRecord) -> Result<Self, Self::Error> {
        let points = record.points.to_u32("club", &record.name, "points")?;
        Ok(Club::new(record.name, record.email, points))
    }
}

impl TryFrom<CompetitionRecord> for Competition {
    type Error = StoreError;

    fn try_from(record: CompetitionRecord) -> Result<Self, Self::Error> {
        let places = record
            .number_of_places
            .to_u32("competition", &record.name, "numberOfPlaces")?;
        Ok(Competition::new(record.name, record.date, places))
    }
}

/// A stored booking covers 1..=12 places and cost exactly its places in points
fn check_booking(booking: &Booking) -> Result<(), StoreError> {
    let malformed = |field: &'static str, value: u32| StoreError::MalformedData {
        entity: "booking",
        key: booking.id.to_string(),
        field,
        value: value.to_string(),
    };

    if booking.places == 0 || booking.places > MAX_PLACES_PER_CLUB {
        return Err(malformed("places", booking.places));
    }
    if Some(booking.points_used) != booking.places.checked_mul(POINTS_PER_PLACE) {
        return Err(malformed("points_used", booking.points_used));
    }
    Ok(())
}

// ============================================================================
// JSON FILE STORE
// ============================================================================

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    clubs_path: PathBuf,
    competitions_path: PathBuf,
    bookings_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(
        clubs_path: impl Into<PathBuf>,
        competitions_path: impl Into<PathBuf>,
        bookings_path: impl Into<PathBuf>,
    ) -> Self {
        JsonFileStore {
            clubs_path: clubs_path.into(),
            competitions_path: competitions_path.into(),
            bookings_path: bookings_path.into(),
        }
    }

    /// Store using the default file names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join("clubs.json"),
            dir.join("competitions.json"),
            dir.join("bookings.json"),
        )
    }

    pub fn load_clubs(&self) -> Result<Vec<Club>, StoreError> {
        let file: ClubsFile = read_json(&self.clubs_path)?;
        file.clubs.into_iter().map(Club::try_from).collect()
    }

    pub fn load_competitions(&self) -> Result<Vec<Competition>, StoreError> {
        let file: CompetitionsFile = read_json(&self.competitions_path)?;
        file.competitions
            .into_iter()
            .map(Competition::try_from)
            .collect()
    }

    /// Missing bookings file means no bookings yet
    pub fn load_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        if !self.bookings_path.exists() {
            debug!(path = ?self.bookings_path, "no bookings file, starting with empty history");
            return Ok(Vec::new());
        }
        let file: BookingsFile = read_json(&self.bookings_path)?;
        for booking in &file.bookings {
            check_booking(booking)?;
        }
        Ok(file.bookings)
    }
}

impl DataStore for JsonFileStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        Ok(Snapshot {
            clubs: self.load_clubs()?,
            competitions: self.load_competitions()?,
            bookings: self.load_bookings()?,
        })
    }

    fn save_clubs(&self, clubs: &[Club]) -> Result<(), StoreError> {
        let file = ClubsFileOut {
            clubs: clubs
                .iter()
                .map(|c| ClubRecordOut {
                    name: &c.name,
                    email: &c.email,
                    points: c.points.to_string(),
                })
                .collect(),
        };
        write_json_atomic(&self.clubs_path, &file)
    }

    fn save_competitions(&self, competitions: &[Competition]) -> Result<(), StoreError> {
        let file = CompetitionsFileOut {
            competitions: competitions
                .iter()
                .map(|c| CompetitionRecordOut {
                    name: &c.name,
                    date: &c.date,
                    number_of_places: c.places.to_string(),
                })
                .collect(),
        };
        write_json_atomic(&self.competitions_path, &file)
    }

    fn save_bookings(&self, bookings: &[Booking]) -> Result<(), StoreError> {
        write_json_atomic(&self.bookings_path, &BookingsFileOut { bookings })
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let content = serde_json::to_string_pretty(value)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    fs::write(&tmp, content).map_err(io_err)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(e));
    }
    Ok(())
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Store kept entirely in memory (embedding, tests)
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Snapshot>,
}

impl MemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        MemoryStore {
            data: Mutex::new(snapshot),
        }
    }

    /// What has been saved so far
    pub fn saved(&self) -> Snapshot {
        self.data.lock().map(|d| d.clone()).unwrap_or_default()
    }

    fn with_data<F: FnOnce(&mut Snapshot)>(&self, f: F) -> Result<(), StoreError> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| StoreError::Invariant("memory store lock poisoned".to_string()))?;
        f(&mut data);
        Ok(())
    }
}

impl DataStore for MemoryStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        self.data
            .lock()
            .map(|d| d.clone())
            .map_err(|_| StoreError::Invariant("memory store lock poisoned".to_string()))
    }

    fn save_clubs(&self, clubs: &[Club]) -> Result<(), StoreError> {
        self.with_data(|d| d.clubs = clubs.to_vec())
    }

    fn save_competitions(&self, competitions: &[Competition]) -> Result<(), StoreError> {
        self.with_data(|d| d.competitions = competitions.to_vec())
    }

    fn save_bookings(&self, bookings: &[Booking]) -> Result<(), StoreError> {
        self.with_data(|d| d.bookings = bookings.to_vec())
    }
}
