// Club Booking - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod entities;
pub mod error;
pub mod journal;
pub mod limits;
pub mod queries;
pub mod repository;
pub mod service;
pub mod settlement;
pub mod storage;
pub mod validator;

// Re-export commonly used types
pub use config::Config;
pub use entities::{Booking, BookingStatus, Club, Competition, TIMESTAMP_FORMAT};
pub use error::{BookingError, Rejection, StoreError};
pub use journal::{Journal, JournalEntry};
pub use limits::{
    calculate_booking_limits, BookingLimits, MAX_PLACES_PER_CLUB, MAX_PLACES_PER_REQUEST,
    POINTS_PER_PLACE,
};
pub use queries::LeaderboardEntry;
pub use repository::{DuplicateKey, Repository, Snapshot};
pub use service::{BookingPage, BookingReceipt, BookingService};
pub use settlement::{apply_settlement, plan_settlement, Settlement};
pub use storage::{DataStore, JsonFileStore, MemoryStore};
pub use validator::{check_competition_open, validate_booking_request, RequestedPlaces};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the `tracing` subscriber used by both binaries (`RUST_LOG` overrides INFO)
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
