//! Registration, login, logout, and the current-user extractor.
//!
//! The session token travels in an HTTP cookie whose name comes from one
//! config value; no handler re-declares it. There is no process-wide
//! "current user": identity is derived from the cookie on every request.

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration;
use std::sync::Arc;

use crate::api::error::{ApiError, ValidationErrorBuilder};
use crate::api::validation::{validate_name, validate_password, validate_username};
use crate::auth::{self, hash_password, verify_password};
use crate::db::{LoginRequest, RegisterRequest, User, UserResponse};
use crate::AppState;

/// Build the session cookie. Path is `/` so the whole site sees it.
fn session_cookie(name: &str, token: String) -> Cookie<'static> {
    Cookie::build((name.to_string(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .path("/")
        .build()
}

/// Token from the session cookie, if the client sent one.
pub(crate) fn token_from_jar<'a>(jar: &'a CookieJar, cookie_name: &str) -> Option<&'a str> {
    jar.get(cookie_name).map(|c| c.value())
}

/// Register a new user and log them in
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<UserResponse>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_username(&request.username) {
        errors.add("username", e);
    }
    if let Err(e) = validate_password(&request.password) {
        errors.add("password", e);
    }
    if let Err(e) = validate_name(&request.name) {
        errors.add("name", e);
    }
    errors.finish()?;

    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(&request.username)
        .fetch_optional(&state.db)
        .await?;

    if existing.is_some() {
        return Err(ApiError::conflict("Username is already taken"));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    sqlx::query(
        "INSERT INTO users (id, username, password_hash, name, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&request.username)
    .bind(&password_hash)
    .bind(&request.name)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    tracing::info!(username = %request.username, "User registered");

    let created = auth::create_session(&state.db, &id, session_ttl(&state)).await?;
    let jar = jar.add(session_cookie(&state.config.auth.cookie_name, created.token));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(UserResponse {
            id,
            username: request.username,
            name: request.name,
        }),
    ))
}

/// Log in with username and password
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<UserResponse>), ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(&request.username)
        .fetch_optional(&state.db)
        .await?;

    // One message for both unknown user and wrong password.
    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    let created = auth::create_session(&state.db, &user.id, session_ttl(&state)).await?;
    let jar = jar.add(session_cookie(&state.config.auth.cookie_name, created.token));

    Ok((jar, Json(UserResponse::from(user))))
}

/// Log out: delete the session and clear the cookie
///
/// POST /api/auth/logout
///
/// Succeeds even when the cookie is missing or stale.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), ApiError> {
    let cookie_name = state.config.auth.cookie_name.clone();

    if let Some(token) = token_from_jar(&jar, &cookie_name) {
        if let Some(session) = auth::validate_session_token(&state.db, token).await? {
            auth::delete_session(&state.db, &session.id).await?;
        }
    }

    let jar = jar.remove(removal_cookie(&cookie_name));
    Ok((jar, StatusCode::NO_CONTENT))
}

/// Current user from the session cookie
///
/// GET /api/auth/me
pub async fn me(user: User) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

fn session_ttl(state: &AppState) -> Duration {
    Duration::days(state.config.auth.session_ttl_days)
}

/// Extractor for the authenticated user behind the session cookie.
#[async_trait]
impl FromRequestParts<Arc<AppState>> for User {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = token_from_jar(&jar, &state.config.auth.cookie_name)
            .ok_or_else(|| ApiError::unauthorized("Not logged in"))?;

        let session = auth::validate_session_token(&state.db, token)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Not logged in"))?;

        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(&session.user_id)
            .fetch_optional(&state.db)
            .await?;

        user.ok_or_else(|| ApiError::unauthorized("Not logged in"))
    }
}
