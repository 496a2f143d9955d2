//! Watchlist entry model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One entry in a user's watchlist.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WatchlistItem {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub created_at: String,
}
