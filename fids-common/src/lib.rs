//! # FIDS Common Library
//!
//! Shared code for the FIDS (flight information display service) workspace:
//! - Domain models (flights, announcements, users)
//! - Event types (FidsEvent enum) and EventBus
//! - Common error types
//! - Configuration and audio root folder resolution
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod events;
pub mod time;
pub mod types;

pub use error::{Error, Result};
pub use types::{Announcement, AnnouncementType, Flight, FlightStatus, Role, User};
