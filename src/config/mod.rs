use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static/dist")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Name of the session cookie. Every handler reads the cookie through
    /// this one value.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Absolute session lifetime in days. Sessions are not renewed; a login
    /// older than this is invalid and swept on the next startup.
    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            session_ttl_days: default_session_ttl_days(),
        }
    }
}

fn default_cookie_name() -> String {
    "session".to_string()
}

fn default_session_ttl_days() -> i64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    /// API key for the market-data provider. Quote and history endpoints
    /// return 503 until this is set.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_market_base_url")]
    pub base_url: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_market_base_url(),
        }
    }
}

fn default_market_base_url() -> String {
    "https://api.polygon.io".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            market: MarketConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.auth.cookie_name, "session");
        assert_eq!(config.auth.session_ttl_days, 30);
        assert_eq!(config.server.port, 8080);
        assert!(config.market.api_key.is_none());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config: Config = toml::from_str(
            r#"
            [auth]
            session_ttl_days = 7

            [market]
            api_key = "test-key"
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.session_ttl_days, 7);
        assert_eq!(config.auth.cookie_name, "session");
        assert_eq!(config.market.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.market.base_url, "https://api.polygon.io");
    }
}
