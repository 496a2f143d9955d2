pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod market;

pub use db::DbPool;

use config::Config;
use market::MarketClient;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub market: MarketClient,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        let market = MarketClient::new(
            config.market.api_key.clone(),
            config.market.base_url.clone(),
        );
        Self { config, db, market }
    }
}
