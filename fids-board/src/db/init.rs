//! Database initialization
//!
//! Opens the connection pool, creates the schema if missing, and seeds
//! the first admin account on an empty users table.
//!
//! The announcements table carries a UNIQUE index on
//! (flight_id, announcement_type): at most one playback is ever recorded
//! per flight and call type, matching the scheduler-level guarantee.

use crate::error::Result;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Open the SQLite pool, enabling foreign keys and WAL mode
pub async fn connect(db_path: &Path) -> Result<Pool<Sqlite>> {
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePool::connect(&db_url).await?;

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes if they do not exist
pub async fn init_schema(pool: &Pool<Sqlite>) -> Result<()> {
    info!("Initializing database schema");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS flights (
            id TEXT PRIMARY KEY,
            flight_number TEXT NOT NULL,
            airline_code TEXT NOT NULL,
            origin_airport TEXT NOT NULL,
            destination_airport TEXT NOT NULL,
            scheduled_time TEXT NOT NULL,
            actual_time TEXT,
            status TEXT NOT NULL DEFAULT 'SCHEDULED',
            gate TEXT NOT NULL,
            terminal TEXT NOT NULL,
            aircraft_type TEXT NOT NULL,
            airport_code TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_flights_airport_time
         ON flights(airport_code, scheduled_time)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS announcements (
            id TEXT PRIMARY KEY,
            flight_id TEXT NOT NULL REFERENCES flights(id) ON DELETE CASCADE,
            announcement_type TEXT NOT NULL,
            played_at TEXT NOT NULL,
            played_by TEXT,
            airport_code TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // At most one recorded playback per (flight, call type)
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_announcements_once
         ON announcements(flight_id, announcement_type)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_announcements_airport
         ON announcements(airport_code, played_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_digest TEXT NOT NULL,
            role TEXT NOT NULL,
            airport_codes TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Seed the initial admin account when the users table is empty
///
/// Credentials default to admin@fids.local / admin and must be changed
/// through the user management view.
pub async fn seed_admin(pool: &Pool<Sqlite>) -> Result<()> {
    let count = super::users::count(pool).await?;
    if count > 0 {
        return Ok(());
    }

    warn!("Users table empty - seeding default admin account (change its password)");
    super::users::create(
        pool,
        "admin@fids.local",
        "admin",
        fids_common::Role::Admin,
        &[],
    )
    .await?;

    Ok(())
}
