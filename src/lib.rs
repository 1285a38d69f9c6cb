//! ThresholdTrader Library
//!
//! A threshold buy-low/sell-high trading engine over the Binance spot REST
//! API, with portfolio P&L accounting and durable per-symbol price history.

pub mod binance;
pub mod common;
pub mod config;
pub mod execution;
pub mod portfolio;
pub mod prices;
pub mod storage;
pub mod strategy;

// Re-export commonly used types
pub use common::errors::{Result, TraderError};
pub use common::traits::{ExchangeClient, HistorySource, PriceMirror, TradeStore};
pub use common::types::{
    CandleInterval, OrderFill, PricePoint, Side, TradeRecord, TradeSource,
};
pub use config::types::AppConfig;

pub use binance::BinanceClient;
pub use execution::{ExecutedTrade, TradeExecutor, TradingDesk};
pub use portfolio::{Portfolio, PortfolioSummary, Position, TradeOutcome};
pub use prices::{HistoryPeriod, PriceLedger};
pub use storage::{InMemoryPriceMirror, InMemoryTradeStore, PgStore};

// Strategy types
pub use strategy::{
    Decision, StartOutcome, StopOutcome, StrategyManager, StrategyParams, StrategyRunState,
    StrategyStatus, ThresholdRule,
};
