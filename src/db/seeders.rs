//! Database seeders for built-in data
//!
//! Seeds the stock symbol table so search works out of the box. In a real
//! deployment this table would be refreshed from an exchange listing feed;
//! the built-in set covers the large-cap tickers the UI demos with.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Seed well-known stock symbols (runs on every startup; existing rows win)
pub async fn seed_stocks(pool: &SqlitePool) -> Result<()> {
    info!("Seeding stock symbols...");

    // Format: (symbol, name)
    let stocks: Vec<(&str, &str)> = vec![
        ("AAPL", "Apple Inc."),
        ("MSFT", "Microsoft Corporation"),
        ("GOOGL", "Alphabet Inc."),
        ("AMZN", "Amazon.com, Inc."),
        ("NVDA", "NVIDIA Corporation"),
        ("META", "Meta Platforms, Inc."),
        ("TSLA", "Tesla Inc."),
        ("BRK.B", "Berkshire Hathaway Inc."),
        ("JPM", "JPMorgan Chase & Co."),
        ("V", "Visa Inc."),
        ("JNJ", "Johnson & Johnson"),
        ("WMT", "Walmart Inc."),
        ("PG", "The Procter & Gamble Company"),
        ("XOM", "Exxon Mobil Corporation"),
        ("UNH", "UnitedHealth Group Incorporated"),
        ("MA", "Mastercard Incorporated"),
        ("HD", "The Home Depot, Inc."),
        ("KO", "The Coca-Cola Company"),
        ("PEP", "PepsiCo, Inc."),
        ("DIS", "The Walt Disney Company"),
        ("NFLX", "Netflix, Inc."),
        ("INTC", "Intel Corporation"),
        ("AMD", "Advanced Micro Devices, Inc."),
        ("ORCL", "Oracle Corporation"),
        ("CRM", "Salesforce, Inc."),
    ];

    for (symbol, name) in &stocks {
        sqlx::query("INSERT OR IGNORE INTO stocks (symbol, name) VALUES (?, ?)")
            .bind(symbol)
            .bind(name)
            .execute(pool)
            .await?;
    }

    info!("Seeded {} stock symbols", stocks.len());
    Ok(())
}
