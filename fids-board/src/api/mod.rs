//! HTTP API for the flight board service
//!
//! Thin glue: route handlers validate the session, forward to the data
//! layer or the scheduler, and translate errors into status codes.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, AppContext};
