//! Execution module - Order placement and trade booking

mod desk;
mod executor;

pub use desk::TradingDesk;
pub use executor::{ExecutedTrade, TradeExecutor};
