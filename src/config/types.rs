//! Configuration types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Exchange connection settings
    #[serde(default)]
    pub exchange: ExchangeConfig,
    /// Strategy defaults and loop timing
    #[serde(default)]
    pub strategy: StrategyConfig,
    /// Local price log settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Database configuration (optional)
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

/// Binance-compatible exchange configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// API key for signed requests
    #[serde(default)]
    pub api_key: Option<String>,
    /// API secret for signing requests
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Base URL for the REST API
    #[serde(default = "default_exchange_base_url")]
    pub base_url: String,
    /// Simulate order fills instead of sending them
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            base_url: default_exchange_base_url(),
            dry_run: default_dry_run(),
        }
    }
}

fn default_exchange_base_url() -> String {
    "https://testnet.binance.vision".to_string()
}

fn default_dry_run() -> bool {
    true
}

/// Strategy defaults and worker timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_symbol")]
    pub default_symbol: String,
    #[serde(default = "default_quantity")]
    pub default_quantity: Decimal,
    /// Delay between polls in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// How long stop() waits for the worker to exit
    #[serde(default = "default_stop_grace")]
    pub stop_grace_ms: u64,
    /// Feed polled prices into the price ledger
    #[serde(default = "default_record_prices")]
    pub record_prices: bool,
}

impl StrategyConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            default_symbol: default_symbol(),
            default_quantity: default_quantity(),
            poll_interval_ms: default_poll_interval(),
            stop_grace_ms: default_stop_grace(),
            record_prices: default_record_prices(),
        }
    }
}

fn default_symbol() -> String {
    "ETHUSDT".to_string()
}

fn default_quantity() -> Decimal {
    dec!(0.01)
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_stop_grace() -> u64 {
    2000
}

fn default_record_prices() -> bool {
    true
}

/// Local price log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one CSV file per symbol
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Days of price history kept by pruning
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_retention_days() -> u32 {
    30
}

/// Database configuration for the trade store and price mirror
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_connection_timeout() -> u64 {
    30
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// API credentials for signed requests
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl ApiCredentials {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self {
            api_key,
            api_secret,
        }
    }
}

impl ExchangeConfig {
    /// Credentials, if both halves are configured and non-empty
    pub fn credentials(&self) -> Option<ApiCredentials> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some(ApiCredentials::new(key.clone(), secret.clone()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.exchange.dry_run);
        assert_eq!(config.exchange.base_url, "https://testnet.binance.vision");
        assert_eq!(config.strategy.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.strategy.stop_grace(), Duration::from_secs(2));
        assert_eq!(config.strategy.default_quantity, dec!(0.01));
        assert_eq!(config.storage.retention_days, 30);
        assert!(config.database.is_none());
    }

    #[test]
    fn test_empty_secret_means_no_credentials() {
        let exchange = ExchangeConfig {
            api_key: Some("key".into()),
            api_secret: Some(String::new()),
            ..ExchangeConfig::default()
        };
        assert!(exchange.credentials().is_none());
    }
}
