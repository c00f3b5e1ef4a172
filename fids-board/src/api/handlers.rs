//! HTTP request handlers
//!
//! Implements the REST endpoints for the flight board, flight ingest,
//! announcement control, and user management.

use crate::announce::NextAnnouncement;
use crate::api::auth::CurrentUser;
use crate::api::server::AppContext;
use crate::db;
use crate::error::{Error, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use fids_common::events::FidsEvent;
use fids_common::{time, AnnouncementType, Flight, FlightStatus, Role, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct AirportQuery {
    pub airport: String,
}

#[derive(Debug, Deserialize)]
pub struct FlightsQuery {
    pub airport: String,
    pub date: Option<NaiveDate>,
}

/// Flight ingest payload; the airline code is derived from the flight
/// number prefix
#[derive(Debug, Deserialize)]
pub struct FlightRequest {
    pub flight_number: String,
    pub origin_airport: String,
    pub destination_airport: String,
    pub scheduled_time: DateTime<Utc>,
    pub actual_time: Option<DateTime<Utc>>,
    pub status: Option<FlightStatus>,
    pub gate: String,
    pub terminal: String,
    pub aircraft_type: String,
    pub airport_code: String,
}

#[derive(Debug, Serialize)]
pub struct BoardRow {
    #[serde(flatten)]
    pub flight: Flight,
    pub next_announcement: Option<NextAnnouncement>,
}

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub airport_code: String,
    pub rows: Vec<BoardRow>,
}

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub flight_id: Uuid,
    #[serde(rename = "type")]
    pub announcement_type: AnnouncementType,
}

#[derive(Debug, Deserialize)]
pub struct SelectAirportRequest {
    pub airport_code: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub airport_codes: Vec<String>,
}

// ============================================================================
// Helpers
// ============================================================================

fn require_airport(user: &User, airport_code: &str) -> Result<()> {
    if user.may_view(airport_code) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "No access to airport {}",
            airport_code
        )))
    }
}

fn require_admin(user: &User) -> Result<()> {
    if user.role == Role::Admin {
        Ok(())
    } else {
        Err(Error::Forbidden("Admin role required".into()))
    }
}

fn flight_from_request(id: Uuid, request: FlightRequest) -> Result<Flight> {
    let airline_code: String = request.flight_number.chars().take(2).collect();
    if airline_code.chars().count() < 2 {
        return Err(Error::BadRequest(format!(
            "Flight number '{}' too short",
            request.flight_number
        )));
    }

    Ok(Flight {
        id,
        flight_number: request.flight_number,
        airline_code,
        origin_airport: request.origin_airport,
        destination_airport: request.destination_airport,
        scheduled_time: request.scheduled_time,
        actual_time: request.actual_time,
        status: request.status.unwrap_or(FlightStatus::Scheduled),
        gate: request.gate,
        terminal: request.terminal,
        aircraft_type: request.aircraft_type,
        airport_code: request.airport_code,
    })
}

fn emit_flights_changed(ctx: &AppContext, airport_code: &str) {
    ctx.bus.emit_lossy(FidsEvent::FlightsChanged {
        airport_code: airport_code.to_string(),
        timestamp: time::now(),
    });
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "flight_board".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Flight Endpoints
// ============================================================================

/// GET /flights?airport=XXX&date=YYYY-MM-DD - day-window flight list
pub async fn list_flights(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<FlightsQuery>,
) -> Result<Json<Vec<Flight>>> {
    require_airport(&user, &query.airport)?;
    let flights = db::flights::fetch_for_airport(&ctx.db_pool, &query.airport, query.date).await?;
    Ok(Json(flights))
}

/// POST /flights - ingest a new flight (operations staff / upstream feed)
pub async fn create_flight(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<FlightRequest>,
) -> Result<(StatusCode, Json<Flight>)> {
    require_airport(&user, &request.airport_code)?;
    let flight = flight_from_request(Uuid::new_v4(), request)?;
    db::flights::insert(&ctx.db_pool, &flight).await?;
    emit_flights_changed(&ctx, &flight.airport_code);
    Ok((StatusCode::CREATED, Json(flight)))
}

/// PUT /flights/:flight_id - replace a flight row
pub async fn update_flight(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Path(flight_id): Path<Uuid>,
    Json(request): Json<FlightRequest>,
) -> Result<Json<Flight>> {
    require_airport(&user, &request.airport_code)?;
    let flight = flight_from_request(flight_id, request)?;
    db::flights::update(&ctx.db_pool, &flight).await?;
    emit_flights_changed(&ctx, &flight.airport_code);
    Ok(Json(flight))
}

/// DELETE /flights/:flight_id - remove a flight
pub async fn delete_flight(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Path(flight_id): Path<Uuid>,
) -> Result<StatusCode> {
    let flight = db::flights::get(&ctx.db_pool, flight_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Flight not found: {}", flight_id)))?;
    require_airport(&user, &flight.airport_code)?;

    db::flights::delete(&ctx.db_pool, flight_id).await?;
    emit_flights_changed(&ctx, &flight.airport_code);
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Flight Board Endpoints
// ============================================================================

/// GET /board?airport=XXX - flight rows with next-announcement info
pub async fn get_board(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<AirportQuery>,
) -> Result<Json<BoardResponse>> {
    require_airport(&user, &query.airport)?;
    let flights = db::flights::fetch_for_airport(&ctx.db_pool, &query.airport, None).await?;
    let mut next = ctx.scheduler.next_announcements().await?;

    let rows = flights
        .into_iter()
        .map(|flight| {
            let next_announcement = next.remove(&flight.id);
            BoardRow {
                flight,
                next_announcement,
            }
        })
        .collect();

    Ok(Json(BoardResponse {
        airport_code: query.airport,
        rows,
    }))
}

/// POST /airport/select - switch the scheduler's active airport
pub async fn select_airport(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SelectAirportRequest>,
) -> Result<Json<StatusResponse>> {
    require_airport(&user, &request.airport_code)?;
    ctx.scheduler.select_airport(&request.airport_code).await?;
    Ok(Json(StatusResponse {
        status: "selected".to_string(),
    }))
}

// ============================================================================
// Announcement Endpoints
// ============================================================================

/// GET /announcements?airport=XXX - playback history, newest first
pub async fn get_history(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<AirportQuery>,
) -> Result<Json<Vec<db::announcements::HistoryEntry>>> {
    require_airport(&user, &query.airport)?;
    let history = db::announcements::history(&ctx.db_pool, &query.airport).await?;
    Ok(Json(history))
}

/// POST /announcements/play - operator-triggered manual playback
pub async fn play_announcement(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<PlayRequest>,
) -> Result<Json<StatusResponse>> {
    let flight = db::flights::get(&ctx.db_pool, request.flight_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Flight not found: {}", request.flight_id)))?;
    require_airport(&user, &flight.airport_code)?;

    ctx.scheduler
        .manual_play(request.flight_id, request.announcement_type, Some(user.id))
        .await?;
    Ok(Json(StatusResponse {
        status: "playing".to_string(),
    }))
}

// ============================================================================
// User Management Endpoints (admin)
// ============================================================================

/// GET /users - list accounts, newest first
pub async fn list_users(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<User>>> {
    require_admin(&user)?;
    let users = db::users::list(&ctx.db_pool).await?;
    Ok(Json(users))
}

/// POST /users - create an account
pub async fn create_user(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    require_admin(&user)?;
    let created = db::users::create(
        &ctx.db_pool,
        &request.email,
        &request.password,
        request.role,
        &request.airport_codes,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}
