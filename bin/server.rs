// Club Booking - Web Server
// JSON API over the booking service with Axum

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use club_booking::{
    init_logging, Booking, BookingError, BookingLimits, BookingService, Config, RequestedPlaces,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
struct AppState {
    service: Arc<BookingService>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ApiError>,
}

#[derive(Serialize)]
struct ApiError {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    limits: Option<BookingLimits>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// Map a service error onto a status code and structured body
fn error_response(err: BookingError) -> Response {
    let (status, code, limits) = match &err {
        BookingError::UnknownClub(_) => (StatusCode::NOT_FOUND, "unknown_club", None),
        BookingError::UnknownCompetition(_) => (StatusCode::NOT_FOUND, "unknown_competition", None),
        BookingError::UnknownEmail(_) => (StatusCode::NOT_FOUND, "unknown_email", None),
        BookingError::Rejected { reason, limits } => {
            (StatusCode::UNPROCESSABLE_ENTITY, reason.code(), Some(*limits))
        }
        BookingError::Store(_) => {
            error!("request failed: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "internal", None)
        }
    };

    let body = ApiResponse {
        success: false,
        data: (),
        error: Some(ApiError {
            code,
            message: err.to_string(),
            limits,
        }),
    };
    (status, Json(body)).into_response()
}

fn respond<T: Serialize>(result: Result<T, BookingError>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        Err(e) => error_response(e),
    }
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
}

#[derive(Deserialize)]
struct BookingRequest {
    club: String,
    competition: String,
    places: RequestedPlaces,
}

#[derive(Serialize)]
struct ClubSummary {
    club: club_booking::Club,
    competitions: Vec<club_booking::Competition>,
    bookings: Vec<Booking>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/login - Email lookup, returns the club summary
async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    let result = state.service.login(&req.email).and_then(|club| {
        Ok(ClubSummary {
            competitions: state.service.competitions()?,
            bookings: state.service.bookings_for_club(&club.name)?,
            club,
        })
    });
    respond(result)
}

/// GET /api/clubs
async fn get_clubs(State(state): State<AppState>) -> Response {
    respond(state.service.clubs())
}

/// GET /api/competitions
async fn get_competitions(State(state): State<AppState>) -> Response {
    respond(state.service.competitions())
}

/// GET /api/book/:competition/:club - Booking form data (limits)
async fn booking_page(
    State(state): State<AppState>,
    Path((competition, club)): Path<(String, String)>,
) -> Response {
    respond(state.service.booking_page(&club, &competition))
}

/// POST /api/bookings - Purchase places
async fn purchase_places(State(state): State<AppState>, Json(req): Json<BookingRequest>) -> Response {
    respond(state.service.book(&req.club, &req.competition, req.places))
}

/// GET /api/clubs/:club/bookings
async fn club_bookings(State(state): State<AppState>, Path(club): Path<String>) -> Response {
    respond(state.service.bookings_for_club(&club))
}

/// GET /api/competitions/:competition/bookings
async fn competition_bookings(
    State(state): State<AppState>,
    Path(competition): Path<String>,
) -> Response {
    respond(state.service.bookings_for_competition(&competition))
}

/// GET /api/public/points - Public leaderboard (no login)
async fn public_points(State(state): State<AppState>) -> Response {
    respond(state.service.leaderboard())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = Config::from_env();
    info!("🌐 Club Booking - Web Server");

    let service = BookingService::from_config(&config)?;
    let state = AppState {
        service: Arc::new(service),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/login", post(login))
        .route("/clubs", get(get_clubs))
        .route("/competitions", get(get_competitions))
        .route("/book/:competition/:club", get(booking_page))
        .route("/bookings", post(purchase_places))
        .route("/clubs/:club/bookings", get(club_bookings))
        .route("/competitions/:competition/bookings", get(competition_bookings))
        .route("/public/points", get(public_points))
        .with_state(state.clone());

    let app = Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    info!("🚀 Server running on http://{}", config.server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // Final flush before exit
    if let Err(e) = state.service.flush() {
        error!("final flush failed: {}", e);
    }

    Ok(())
}
