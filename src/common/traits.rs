//! Trait definitions for the engine's external collaborators
//!
//! The engine only talks to the exchange and to persistence through these
//! seams, so a live client, a dry-run client, a database or an in-memory
//! fake can be swapped in without touching the core.

use async_trait::async_trait;
use rust_decimal::Decimal;

#[cfg(test)]
use mockall::automock;

use super::errors::Result;
use super::types::{CandleInterval, OrderFill, PricePoint, Side, TradeRecord};

/// Price lookup and order placement against a venue (real or simulated)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Latest traded price for a symbol
    async fn get_price(&self, symbol: &str) -> Result<Decimal>;

    /// Place a market order
    ///
    /// In dry-run mode implementations fabricate a fill at the current
    /// price instead of contacting the venue.
    async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
    ) -> Result<OrderFill>;

    /// Whether orders are simulated
    fn is_dry_run(&self) -> bool;
}

/// Coarse historical series, used as the price ledger's fallback source
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Close prices for candles opening at or after `start_ms`
    async fn fetch_history(
        &self,
        symbol: &str,
        interval: CandleInterval,
        start_ms: i64,
    ) -> Result<Vec<PricePoint>>;
}

/// External persistence for executed trades
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn save_trade(&self, trade: &TradeRecord) -> Result<()>;
}

/// Remote mirror of the local price log
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PriceMirror: Send + Sync {
    async fn save_point(&self, point: &PricePoint) -> Result<()>;

    /// Points for a symbol at or after `start_ms`, ascending
    async fn points_since(&self, symbol: &str, start_ms: i64) -> Result<Vec<PricePoint>>;
}
