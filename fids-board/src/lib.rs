//! # FIDS Flight Board Service (fids-board)
//!
//! Flight-information dashboard service: serves the flight board and
//! announcement history, runs the timer-driven announcement scheduler,
//! and manages dashboard user accounts.
//!
//! **Architecture:** one scheduler actor owns all announcement state and
//! serializes timer expiry, reconciliation, and manual playback through a
//! single run loop; an axum HTTP/SSE surface provides the thin CRUD glue.

pub mod announce;
pub mod api;
pub mod audio;
pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
