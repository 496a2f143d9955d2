//! Watchlist CRUD, scoped to the user named in the path.
//!
//! Every handler first checks the session token against the path's user id:
//! no valid session reads as 401, a valid session for a different user as
//! 403. The two must stay distinguishable.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::api::auth::token_from_jar;
use crate::api::error::ApiError;
use crate::api::validation::validate_symbol;
use crate::auth::{self, Authorization};
use crate::db::{Stock, WatchlistItem};
use crate::AppState;

/// Require the session behind `jar` to belong to `claimed_user_id`.
async fn authorize(
    state: &AppState,
    jar: &CookieJar,
    claimed_user_id: &str,
) -> Result<(), ApiError> {
    let token = token_from_jar(jar, &state.config.auth.cookie_name);

    match auth::authorize_user_action(&state.db, token, claimed_user_id).await? {
        Authorization::Authorized => Ok(()),
        Authorization::Unauthenticated => Err(ApiError::unauthorized("Not logged in")),
        Authorization::Forbidden => {
            Err(ApiError::forbidden("Watchlist belongs to another user"))
        }
    }
}

/// List a user's watchlist
///
/// GET /api/users/:user_id/watchlist
pub async fn list_watchlist(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<WatchlistItem>>, ApiError> {
    authorize(&state, &jar, &user_id).await?;

    let items: Vec<WatchlistItem> =
        sqlx::query_as("SELECT * FROM watchlists WHERE user_id = ? ORDER BY created_at")
            .bind(&user_id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(items))
}

/// Check whether a symbol is on the watchlist
///
/// GET /api/users/:user_id/watchlist/:symbol
pub async fn contains_symbol(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path((user_id, symbol)): Path<(String, String)>,
) -> Result<Json<bool>, ApiError> {
    validate_symbol(&symbol).map_err(ApiError::bad_request)?;
    authorize(&state, &jar, &user_id).await?;

    let symbol = symbol.to_uppercase();
    let existing: Option<WatchlistItem> =
        sqlx::query_as("SELECT * FROM watchlists WHERE user_id = ? AND symbol = ?")
            .bind(&user_id)
            .bind(&symbol)
            .fetch_optional(&state.db)
            .await?;

    Ok(Json(existing.is_some()))
}

/// Add a symbol to the watchlist
///
/// POST /api/users/:user_id/watchlist/:symbol
pub async fn add_symbol(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path((user_id, symbol)): Path<(String, String)>,
) -> Result<(StatusCode, Json<WatchlistItem>), ApiError> {
    validate_symbol(&symbol).map_err(ApiError::bad_request)?;
    authorize(&state, &jar, &user_id).await?;

    let symbol = symbol.to_uppercase();

    let stock: Option<Stock> = sqlx::query_as("SELECT * FROM stocks WHERE symbol = ?")
        .bind(&symbol)
        .fetch_optional(&state.db)
        .await?;

    if stock.is_none() {
        return Err(ApiError::not_found("Unknown stock symbol"));
    }

    let item = WatchlistItem {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.clone(),
        symbol: symbol.clone(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    let result = sqlx::query(
        "INSERT INTO watchlists (id, user_id, symbol, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&item.id)
    .bind(&item.user_id)
    .bind(&item.symbol)
    .bind(&item.created_at)
    .execute(&state.db)
    .await;

    match result {
        Ok(_) => {
            tracing::info!(user_id = %user_id, symbol = %symbol, "Added to watchlist");
            Ok((StatusCode::CREATED, Json(item)))
        }
        Err(sqlx::Error::Database(db_err))
            if db_err.message().contains("UNIQUE constraint failed") =>
        {
            Err(ApiError::conflict("Stock already in watchlist"))
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove a symbol from the watchlist
///
/// DELETE /api/users/:user_id/watchlist/:symbol
///
/// Removing a symbol that isn't on the list is not an error.
pub async fn remove_symbol(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path((user_id, symbol)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    validate_symbol(&symbol).map_err(ApiError::bad_request)?;
    authorize(&state, &jar, &user_id).await?;

    sqlx::query("DELETE FROM watchlists WHERE user_id = ? AND symbol = ?")
        .bind(&user_id)
        .bind(symbol.to_uppercase())
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
