//! Database access layer
//!
//! Provides queries for flights, announcements, users, and sessions.

pub mod announcements;
pub mod flights;
pub mod init;
pub mod users;
