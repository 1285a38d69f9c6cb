//! Configuration loader

use config::{Config, Environment, File};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

use super::types::{AppConfig, DatabaseConfig, ExchangeConfig, StorageConfig, StrategyConfig};
use crate::common::errors::{Result, TraderError};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with APP__)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| TraderError::Configuration(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| TraderError::Configuration(e.to_string()))
}

/// Load configuration from the flat environment variables only
pub fn load_from_env() -> Result<AppConfig> {
    // Try to load from .env file
    dotenvy::dotenv().ok();

    let defaults = AppConfig::default();

    let exchange = ExchangeConfig {
        api_key: std::env::var("BINANCE_API_KEY").ok(),
        api_secret: std::env::var("BINANCE_API_SECRET").ok(),
        base_url: std::env::var("BINANCE_BASE_URL").unwrap_or(defaults.exchange.base_url),
        dry_run: std::env::var("DRY_RUN")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.exchange.dry_run),
    };

    let default_quantity = match std::env::var("ORDER_QUANTITY") {
        Ok(raw) => raw.trim().parse::<Decimal>().map_err(|e| {
            TraderError::Configuration(format!("invalid ORDER_QUANTITY {:?}: {}", raw, e))
        })?,
        Err(_) => defaults.strategy.default_quantity,
    };

    let strategy = StrategyConfig {
        default_symbol: std::env::var("DEFAULT_SYMBOL").unwrap_or(defaults.strategy.default_symbol),
        default_quantity,
        ..defaults.strategy
    };

    let storage = StorageConfig {
        data_dir: std::env::var("PRICE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.data_dir),
        ..defaults.storage
    };

    let database = std::env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
        url,
        max_connections: 5,
        connection_timeout_seconds: 30,
    });

    Ok(AppConfig {
        exchange,
        strategy,
        storage,
        database,
        settings: defaults.settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[exchange]
base_url = "https://api.binance.com"
dry_run = false

[strategy]
default_symbol = "BTCUSDT"
poll_interval_ms = 500

[storage]
data_dir = "/var/lib/trader"
"#
        )
        .unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.exchange.base_url, "https://api.binance.com");
        assert!(!config.exchange.dry_run);
        assert_eq!(config.strategy.default_symbol, "BTCUSDT");
        assert_eq!(config.strategy.poll_interval_ms, 500);
        assert_eq!(config.strategy.stop_grace_ms, 2000);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/trader"));
        assert_eq!(config.storage.retention_days, 30);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config(Some("/definitely/not/here.toml")).unwrap();
        assert!(config.exchange.dry_run);
        assert_eq!(config.strategy.default_symbol, "ETHUSDT");
    }
}
