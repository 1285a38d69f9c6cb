//! Domain types shared by the portfolio, price ledger and strategy engine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::TraderError;

/// Current wall-clock time as Unix epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Exchange symbols are non-empty ASCII alphanumerics such as `ETHUSDT`
///
/// Symbols end up in file names and request paths, so anything else is
/// rejected before it reaches either.
pub fn validate_symbol(symbol: &str) -> Result<(), TraderError> {
    if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(TraderError::InvalidParameters(format!(
            "invalid symbol {:?}",
            symbol
        )));
    }
    Ok(())
}

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = TraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(TraderError::InvalidParameters(format!(
                "unknown order side: {}",
                other
            ))),
        }
    }
}

/// Who originated a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSource {
    Manual,
    Strategy,
}

impl TradeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSource::Manual => "MANUAL",
            TradeSource::Strategy => "STRATEGY",
        }
    }
}

impl std::fmt::Display for TradeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observed price for a symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub symbol: String,
    #[serde(rename = "timestampMillis")]
    pub timestamp_ms: i64,
    pub price: Decimal,
}

impl PricePoint {
    pub fn new(symbol: impl Into<String>, timestamp_ms: i64, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp_ms,
            price,
        }
    }

    /// Timestamp as a UTC datetime (None if out of chrono's range)
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }
}

/// An executed order, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    #[serde(rename = "timestampMillis")]
    pub timestamp_ms: i64,
    #[serde(default)]
    pub order_id: Option<String>,
    pub source: TradeSource,
    /// Account the trade is attributed to, when known
    #[serde(default)]
    pub owner_id: Option<String>,
}

impl TradeRecord {
    /// Notional value of the trade
    pub fn value(&self) -> Decimal {
        self.quantity * self.price
    }
}

/// Result of a market order as reported by the exchange client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFill {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    /// Average execution price, if the venue reported one
    pub price: Option<Decimal>,
    pub order_id: Option<String>,
    pub timestamp_ms: i64,
    /// Fabricated by a simulated (dry-run) client
    pub dry_run: bool,
}

/// Candle granularity for historical price fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleInterval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    OneHour,
    FourHours,
}

impl CandleInterval {
    /// Interval code understood by the exchange kline endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::OneMinute => "1m",
            CandleInterval::FiveMinutes => "5m",
            CandleInterval::FifteenMinutes => "15m",
            CandleInterval::OneHour => "1h",
            CandleInterval::FourHours => "4h",
        }
    }
}

impl std::fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
