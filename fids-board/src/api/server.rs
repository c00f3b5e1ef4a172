//! HTTP server setup and routing
//!
//! Sets up the axum router with routes for the flight board, announcement
//! control, user management, and SSE.

use crate::announce::SchedulerHandle;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use fids_common::events::EventBus;
use sqlx::{Pool, Sqlite};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application context passed to all handlers
///
/// **Note:** AppContext implements Clone, which gives us `FromRef<AppContext>`
/// for free via axum's blanket implementation. This allows custom extractors
/// (the session lookup) to access state.
#[derive(Clone)]
pub struct AppContext {
    pub db_pool: Pool<Sqlite>,
    pub bus: EventBus,
    pub scheduler: SchedulerHandle,
}

/// Build the application router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Session auth
        .route("/auth/login", post(super::auth::login))
        .route("/auth/logout", post(super::auth::logout))
        .route("/auth/me", get(super::auth::me))
        // Flight ingest and queries
        .route("/flights", get(super::handlers::list_flights))
        .route("/flights", post(super::handlers::create_flight))
        .route("/flights/:flight_id", put(super::handlers::update_flight))
        .route("/flights/:flight_id", delete(super::handlers::delete_flight))
        // Flight board view
        .route("/board", get(super::handlers::get_board))
        .route("/airport/select", post(super::handlers::select_airport))
        // Announcements
        .route("/announcements", get(super::handlers::get_history))
        .route("/announcements/play", post(super::handlers::play_announcement))
        // User management (admin)
        .route("/users", get(super::handlers::list_users))
        .route("/users", post(super::handlers::create_user))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        // Attach application context
        .with_state(ctx)
        // Enable CORS for local dashboards
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
