// ⚙️ Configuration - where the data lives and where the server listens
//
// Read from environment variables; every value has a default so the app
// runs out of the box in a directory holding clubs.json/competitions.json.

use std::path::{Path, PathBuf};

pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:5000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base directory for relative file names
    pub data_dir: PathBuf,
    pub clubs_file: PathBuf,
    pub competitions_file: PathBuf,
    pub bookings_file: PathBuf,
    /// SQLite settlement journal
    pub journal_file: PathBuf,
    pub server_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// - `BOOKING_DATA_DIR` (default `.`)
    /// - `BOOKING_CLUBS_FILE` (default `clubs.json`)
    /// - `BOOKING_COMPETITIONS_FILE` (default `competitions.json`)
    /// - `BOOKING_BOOKINGS_FILE` (default `bookings.json`)
    /// - `BOOKING_JOURNAL_FILE` (default `journal.db`)
    /// - `BOOKING_SERVER_ADDR` (default `0.0.0.0:5000`)
    pub fn from_env() -> Self {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment, a map in tests...)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let data_dir = PathBuf::from(get("BOOKING_DATA_DIR", "."));
        let resolve = |key: &str, default: &str| resolve_in(&data_dir, get(key, default));

        Config {
            clubs_file: resolve("BOOKING_CLUBS_FILE", "clubs.json"),
            competitions_file: resolve("BOOKING_COMPETITIONS_FILE", "competitions.json"),
            bookings_file: resolve("BOOKING_BOOKINGS_FILE", "bookings.json"),
            journal_file: resolve("BOOKING_JOURNAL_FILE", "journal.db"),
            server_addr: get("BOOKING_SERVER_ADDR", DEFAULT_SERVER_ADDR),
            data_dir,
        }
    }
}

fn resolve_in(dir: &Path, file: String) -> PathBuf {
    let path = PathBuf::from(file);
    if path.is_absolute() {
        path
    } else {
        dir.join(path)
    }
}
