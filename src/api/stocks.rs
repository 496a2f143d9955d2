//! Stock search, quotes, and price history.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::validation::validate_symbol;
use crate::db::SearchResult;
use crate::market::{StockHistory, StockQuote, TimeRange};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub term: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub range: Option<String>,
}

/// Quote plus the company name from the local symbol table.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub name: Option<String>,
    #[serde(flatten)]
    pub quote: StockQuote,
}

/// Substring search over the stock symbol table
///
/// GET /api/stocks/search?term=...
pub async fn search_stocks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let term = query.term.trim();

    // Don't waste a query on an empty term
    if term.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let pattern = format!("%{}%", escape_like(term));
    let results: Vec<SearchResult> = sqlx::query_as(
        "SELECT symbol, name FROM stocks WHERE symbol LIKE ?1 ESCAPE '\\' OR name LIKE ?1 ESCAPE '\\' ORDER BY symbol LIMIT 20",
    )
    .bind(&pattern)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(results))
}

/// Previous-day quote for a symbol
///
/// GET /api/stocks/:symbol
pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<QuoteResponse>, ApiError> {
    validate_symbol(&symbol).map_err(ApiError::bad_request)?;
    let symbol = symbol.to_uppercase();

    if !state.market.is_configured() {
        return Err(ApiError::service_unavailable(
            "Market data is not configured",
        ));
    }

    let name: Option<(String,)> = sqlx::query_as("SELECT name FROM stocks WHERE symbol = ?")
        .bind(&symbol)
        .fetch_optional(&state.db)
        .await?;

    let quote: StockQuote = state.market.previous_close(&symbol).await.map_err(|e| {
        tracing::warn!(symbol = %symbol, error = %e, "Quote lookup failed");
        ApiError::upstream("Failed to fetch stock quote")
    })?;

    Ok(Json(QuoteResponse {
        name: name.map(|(n,)| n),
        quote,
    }))
}

/// OHLC history for a symbol over a time range
///
/// GET /api/stocks/:symbol/history?range=1M
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<StockHistory>, ApiError> {
    validate_symbol(&symbol).map_err(ApiError::bad_request)?;
    let symbol = symbol.to_uppercase();

    let range = match query.range.as_deref() {
        None => TimeRange::OneMonth,
        Some(raw) => raw
            .parse::<TimeRange>()
            .map_err(|_| ApiError::bad_request("Invalid time range"))?,
    };

    if !state.market.is_configured() {
        return Err(ApiError::service_unavailable(
            "Market data is not configured",
        ));
    }

    let history = state.market.aggregates(&symbol, range).await.map_err(|e| {
        tracing::warn!(symbol = %symbol, error = %e, "History lookup failed");
        ApiError::upstream("Failed to fetch stock history")
    })?;

    Ok(Json(history))
}

/// Escape SQL LIKE wildcards in a user-supplied search term.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
