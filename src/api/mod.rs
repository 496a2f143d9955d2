pub mod auth;
mod error;
mod stocks;
mod validation;
mod watchlists;

pub use error::{ApiError, ErrorCode};

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let stock_routes = Router::new()
        .route("/search", get(stocks::search_stocks))
        .route("/:symbol", get(stocks::get_quote))
        .route("/:symbol/history", get(stocks::get_history));

    // Watchlist routes authorize the cookie session against the user id in
    // the path (401 without a session, 403 for someone else's list).
    let watchlist_routes = Router::new()
        .route("/:user_id/watchlist", get(watchlists::list_watchlist))
        .route("/:user_id/watchlist/:symbol", get(watchlists::contains_symbol))
        .route("/:user_id/watchlist/:symbol", post(watchlists::add_symbol))
        .route("/:user_id/watchlist/:symbol", delete(watchlists::remove_symbol));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/stocks", stock_routes)
        .nest("/api/users", watchlist_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
