//! User account and session queries
//!
//! Sessions back `currentUser()`: a bearer token issued at login is looked
//! up per request. Passwords are stored as blake3 hex digests.

use crate::error::{Error, Result};
use fids_common::{time, Role, User};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// Digest used for password storage and verification
pub fn password_digest(password: &str) -> String {
    blake3::hash(password.as_bytes()).to_hex().to_string()
}

fn parse_user(
    id: String,
    email: String,
    role: String,
    airport_codes: String,
    created_at: String,
) -> Result<User> {
    Ok(User {
        id: Uuid::parse_str(&id)
            .map_err(|e| Error::Internal(format!("Invalid user UUID: {}", e)))?,
        email,
        role: role.parse::<Role>()?,
        airport_codes: serde_json::from_str(&airport_codes)
            .map_err(|e| Error::Internal(format!("Invalid airport code list: {}", e)))?,
        created_at: time::from_db(&created_at)?,
    })
}

/// Number of user accounts
pub async fn count(pool: &Pool<Sqlite>) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Create a user account
pub async fn create(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
    role: Role,
    airport_codes: &[String],
) -> Result<User> {
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        role,
        airport_codes: airport_codes.to_vec(),
        created_at: time::now(),
    };

    sqlx::query(
        "INSERT INTO users (id, email, password_digest, role, airport_codes, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id.to_string())
    .bind(&user.email)
    .bind(password_digest(password))
    .bind(user.role.as_str())
    .bind(
        serde_json::to_string(&user.airport_codes)
            .map_err(|e| Error::Internal(format!("Airport code list serialization: {}", e)))?,
    )
    .bind(time::to_db(user.created_at))
    .execute(pool)
    .await?;

    Ok(user)
}

/// All users, newest first (user management view)
pub async fn list(pool: &Pool<Sqlite>) -> Result<Vec<User>> {
    let rows = sqlx::query_as::<_, (String, String, String, String, String)>(
        "SELECT id, email, role, airport_codes, created_at
         FROM users ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(id, email, role, codes, created)| parse_user(id, email, role, codes, created))
        .collect()
}

/// Verify credentials; returns the user on a digest match
pub async fn verify_credentials(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<Option<User>> {
    let row = sqlx::query_as::<_, (String, String, String, String, String, String)>(
        "SELECT id, email, password_digest, role, airport_codes, created_at
         FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    match row {
        Some((id, email, digest, role, codes, created)) => {
            if digest == password_digest(password) {
                Ok(Some(parse_user(id, email, role, codes, created)?))
            } else {
                Ok(None)
            }
        }
        None => Ok(None),
    }
}

/// Issue a session token for a user
pub async fn create_session(pool: &Pool<Sqlite>, user_id: Uuid) -> Result<String> {
    let token = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user_id.to_string())
        .bind(time::to_db(time::now()))
        .execute(pool)
        .await?;
    Ok(token)
}

/// Invalidate a session token
pub async fn delete_session(pool: &Pool<Sqlite>, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Resolve the user behind a session token (authenticated-session lookup)
pub async fn user_for_token(pool: &Pool<Sqlite>, token: &str) -> Result<Option<User>> {
    let row = sqlx::query_as::<_, (String, String, String, String, String)>(
        "SELECT u.id, u.email, u.role, u.airport_codes, u.created_at
         FROM sessions s JOIN users u ON u.id = s.user_id
         WHERE s.token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    row.map(|(id, email, role, codes, created)| parse_user(id, email, role, codes, created))
        .transpose()
}
