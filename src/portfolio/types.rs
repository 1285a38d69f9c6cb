use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Net open holding in one symbol
///
/// Only exists while `quantity > 0`; the portfolio deletes it the moment a
/// sell brings the quantity to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
    /// Quantity-weighted average cost
    pub entry_price: Decimal,
    pub entry_time: i64,
    pub current_price: Option<Decimal>,
    pub unrealized_pnl: Option<Decimal>,
    /// Realized P&L accrued since this position was opened
    pub realized_pnl: Decimal,
}

impl Position {
    pub fn open(symbol: impl Into<String>, quantity: Decimal, price: Decimal, time: i64) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            entry_price: price,
            entry_time: time,
            current_price: None,
            unrealized_pnl: None,
            realized_pnl: Decimal::ZERO,
        }
    }

    /// Cost basis of the open quantity
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.entry_price
    }

    /// Mark to a new price and recompute unrealized P&L
    pub fn mark(&mut self, price: Decimal) {
        self.current_price = Some(price);
        self.unrealized_pnl = Some((price - self.entry_price) * self.quantity);
    }
}

/// What a recorded trade did to the position set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeOutcome {
    /// First buy of a symbol with no open position
    Opened,
    /// Buy added to an existing position and re-averaged its entry
    Increased,
    /// Sell reduced the position, which stays open
    Reduced { realized: Decimal },
    /// Sell closed the position exactly
    Closed { realized: Decimal },
    /// Sell exceeded the open quantity; the position was dropped and the
    /// excess discarded without booking P&L
    ForceClosed {
        closed_quantity: Decimal,
        discarded_quantity: Decimal,
    },
    /// Sell with nothing open; only the trade log changed
    NoPosition,
}

/// Snapshot of the portfolio for callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub positions: Vec<Position>,
    /// Cumulative realized P&L across all symbols, closed or open
    pub total_realized_pnl: Decimal,
    pub total_unrealized_pnl: Decimal,
    pub total_pnl: Decimal,
    pub position_count: usize,
    pub trade_count: usize,
    pub realized_by_symbol: BTreeMap<String, Decimal>,
}
