// ⚠️ Error taxonomy for the booking engine
//
// Rejection    → a request the rules refuse (recoverable, shown to the user)
// BookingError → anything that stops a request (lookup, rejection, storage)
// StoreError   → load/save/journal failures

use crate::limits::BookingLimits;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// REJECTION REASONS
// ============================================================================

/// Why a booking request was refused.
///
/// Variants are listed in the order the checks run; a request failing several
/// checks only ever reports the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("This competition has already taken place. Booking is closed.")]
    CompetitionClosed { competition: String },

    #[error("Please enter a valid number of places.")]
    MalformedQuantity { input: String },

    #[error("Number of places must be greater than 0.")]
    NonPositiveQuantity { requested: i64 },

    #[error("Impossible to reserve more than 12 places at once per competition.")]
    PerRequestCapExceeded { requested: i64 },

    #[error(
        "Maximum 12 places per club per competition. You already have {already_booked} places booked. You can only book {remaining} more places."
    )]
    CumulativeCapExceeded { already_booked: u32, remaining: u32 },

    #[error("Not enough places available. Only {available} places left.")]
    InsufficientPlaces { available: u32 },

    #[error("Not enough points. You need {needed} points but only have {held}.")]
    InsufficientPoints { needed: i64, held: u32 },
}

impl Rejection {
    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::CompetitionClosed { .. } => "competition_closed",
            Rejection::MalformedQuantity { .. } => "malformed_quantity",
            Rejection::NonPositiveQuantity { .. } => "non_positive_quantity",
            Rejection::PerRequestCapExceeded { .. } => "per_request_cap_exceeded",
            Rejection::CumulativeCapExceeded { .. } => "cumulative_cap_exceeded",
            Rejection::InsufficientPlaces { .. } => "insufficient_places",
            Rejection::InsufficientPoints { .. } => "insufficient_points",
        }
    }

    /// Input errors are about the request itself, not about club/competition state
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Rejection::MalformedQuantity { .. } | Rejection::NonPositiveQuantity { .. }
        )
    }
}

// ============================================================================
// STORE ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A numeric field stored as text could not be converted
    #[error("Malformed {entity} '{key}': field '{field}' has invalid value '{value}'")]
    MalformedData {
        entity: &'static str,
        key: String,
        field: &'static str,
        value: String,
    },

    #[error("Journal error: {0}")]
    Journal(#[from] rusqlite::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// A settlement would break a data-model invariant (negative points or inventory)
    #[error("Invariant violated: {0}")]
    Invariant(String),
}

// ============================================================================
// BOOKING ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Unknown club '{0}'. Please try again.")]
    UnknownClub(String),

    #[error("Unknown competition '{0}'. Please try again.")]
    UnknownCompetition(String),

    #[error("This email doesn't exist. Please try again.")]
    UnknownEmail(String),

    /// Carries the limits computed for the request so callers can re-display guidance
    #[error("{reason}")]
    Rejected {
        reason: Rejection,
        limits: BookingLimits,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingError {
    /// The rejection reason, if this error is a rule rejection
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            BookingError::Rejected { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Lookup errors: the caller should retry with a different identifier
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            BookingError::UnknownClub(_)
                | BookingError::UnknownCompetition(_)
                | BookingError::UnknownEmail(_)
        )
    }
}
