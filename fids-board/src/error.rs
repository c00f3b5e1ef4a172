//! Error types for fids-board
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Failure taxonomy:
//! - data access failures abort the operation and surface to the user,
//!   no retry;
//! - playback failures leave the announcement key unplayed and eligible
//!   for manual replay;
//! - superseded reconciliations are silently discarded and never
//!   represented as an error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main error type for the fids-board module
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Clip resolution or playback start errors
    #[error("Playback error: {0}")]
    Playback(String),

    /// Announcement scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or invalid session
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An announcement was already played for this (flight, type)
    #[error("Already played: {0}")]
    AlreadyPlayed(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<fids_common::Error> for Error {
    fn from(e: fids_common::Error) -> Self {
        match e {
            fids_common::Error::NotFound(msg) => Error::NotFound(msg),
            fids_common::Error::InvalidInput(msg) => Error::BadRequest(msg),
            fids_common::Error::Config(msg) => Error::Config(msg),
            fids_common::Error::Io(e) => Error::Io(e),
            fids_common::Error::Internal(msg) => Error::Internal(msg),
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::AlreadyPlayed(_) => StatusCode::CONFLICT,
            Error::Playback(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Convenience Result type using the fids-board Error
pub type Result<T> = std::result::Result<T, Error>;
