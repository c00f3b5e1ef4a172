//! Session authentication
//!
//! Bearer-token sessions backed by the sessions table. The `CurrentUser`
//! extractor is the `currentUser()` lookup: handlers that take it reject
//! requests without a valid session.

use crate::api::server::AppContext;
use crate::db;
use crate::error::{Error, Result};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    Json,
};
use fids_common::User;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Authenticated user for the current request
pub struct CurrentUser(pub User);

fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| Error::Unauthorized("Missing bearer token".into()))
}

#[async_trait]
impl FromRequestParts<AppContext> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, ctx: &AppContext) -> Result<Self> {
        let token = bearer_token(&parts.headers)?;
        let user = db::users::user_for_token(&ctx.db_pool, token)
            .await?
            .ok_or_else(|| Error::Unauthorized("Invalid or expired session".into()))?;
        Ok(CurrentUser(user))
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// POST /auth/login - issue a session token
pub async fn login(
    State(ctx): State<AppContext>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let user = db::users::verify_credentials(&ctx.db_pool, &request.email, &request.password)
        .await?
        .ok_or_else(|| Error::Unauthorized("Invalid credentials".into()))?;

    let token = db::users::create_session(&ctx.db_pool, user.id).await?;
    info!("User {} logged in", user.email);
    Ok(Json(LoginResponse { token, user }))
}

/// POST /auth/logout - invalidate the current session
pub async fn logout(State(ctx): State<AppContext>, headers: HeaderMap) -> Result<()> {
    let token = bearer_token(&headers)?;
    db::users::delete_session(&ctx.db_pool, token).await?;
    Ok(())
}

/// GET /auth/me - the authenticated-session lookup
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
