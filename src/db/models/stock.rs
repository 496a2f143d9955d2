//! Stock symbol table model and search DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Stock {
    pub symbol: String,
    pub name: String,
}

/// A single search hit: symbol plus company name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct SearchResult {
    pub symbol: String,
    pub name: String,
}
