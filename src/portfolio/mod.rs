//! Portfolio module - Position and P&L accounting
//!
//! Positions carry a quantity-weighted average cost. Realized P&L is kept
//! per symbol independently of the open position, so closing a position
//! and reopening it later does not lose the earlier result.

mod book;
mod types;

pub use book::Portfolio;
pub use types::{PortfolioSummary, Position, TradeOutcome};
