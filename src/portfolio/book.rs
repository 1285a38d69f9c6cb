use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::types::{PortfolioSummary, Position, TradeOutcome};
use crate::common::types::{Side, TradeRecord};

#[derive(Debug, Default)]
struct PortfolioState {
    positions: BTreeMap<String, Position>,
    trades: Vec<TradeRecord>,
    realized_by_symbol: BTreeMap<String, Decimal>,
}

/// In-memory position and trade ledger
///
/// One instance is shared (behind an `Arc`) by the manual order path and the
/// strategy worker. Every operation takes the single state lock for its whole
/// read-modify-write, so trades are applied in a total order.
#[derive(Debug, Default)]
pub struct Portfolio {
    state: Mutex<PortfolioState>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a trade to the log and apply it to the position set
    pub async fn record_trade(&self, trade: TradeRecord) -> TradeOutcome {
        let mut state = self.state.lock().await;
        let outcome = state.apply(&trade);
        debug!(
            "Recorded {} {} {} @ {}: {:?}",
            trade.side, trade.quantity, trade.symbol, trade.price, outcome
        );
        state.trades.push(trade);
        outcome
    }

    /// Mark open positions to the given prices
    ///
    /// Positions without an entry in `prices` keep their previous marks.
    pub async fn update_prices(&self, prices: &HashMap<String, Decimal>) {
        let mut state = self.state.lock().await;
        for (symbol, position) in state.positions.iter_mut() {
            if let Some(price) = prices.get(symbol) {
                position.mark(*price);
            }
        }
    }

    pub async fn get_summary(&self) -> PortfolioSummary {
        let state = self.state.lock().await;

        let positions: Vec<Position> = state.positions.values().cloned().collect();
        let total_realized_pnl: Decimal = state.realized_by_symbol.values().copied().sum();
        let total_unrealized_pnl: Decimal = positions
            .iter()
            .map(|p| p.unrealized_pnl.unwrap_or_default())
            .sum();

        PortfolioSummary {
            position_count: positions.len(),
            positions,
            total_realized_pnl,
            total_unrealized_pnl,
            total_pnl: total_realized_pnl + total_unrealized_pnl,
            trade_count: state.trades.len(),
            realized_by_symbol: state.realized_by_symbol.clone(),
        }
    }

    /// Last `limit` trades, oldest first
    pub async fn get_recent_trades(&self, limit: usize) -> Vec<TradeRecord> {
        let state = self.state.lock().await;
        let start = state.trades.len().saturating_sub(limit);
        state.trades[start..].to_vec()
    }

    pub async fn position(&self, symbol: &str) -> Option<Position> {
        self.state.lock().await.positions.get(symbol).cloned()
    }

    /// Symbols with an open position
    pub async fn open_symbols(&self) -> Vec<String> {
        self.state.lock().await.positions.keys().cloned().collect()
    }

    /// Cumulative realized P&L for a symbol, including closed positions
    pub async fn realized_pnl(&self, symbol: &str) -> Decimal {
        self.state
            .lock()
            .await
            .realized_by_symbol
            .get(symbol)
            .copied()
            .unwrap_or_default()
    }
}

impl PortfolioState {
    fn apply(&mut self, trade: &TradeRecord) -> TradeOutcome {
        match trade.side {
            Side::Buy => self.apply_buy(trade),
            Side::Sell => self.apply_sell(trade),
        }
    }

    fn apply_buy(&mut self, trade: &TradeRecord) -> TradeOutcome {
        match self.positions.get_mut(&trade.symbol) {
            Some(pos) => {
                let total_quantity = pos.quantity + trade.quantity;
                let total_value = pos.quantity * pos.entry_price + trade.quantity * trade.price;
                pos.entry_price = total_value / total_quantity;
                pos.quantity = total_quantity;
                TradeOutcome::Increased
            }
            None => {
                self.positions.insert(
                    trade.symbol.clone(),
                    Position::open(&trade.symbol, trade.quantity, trade.price, trade.timestamp_ms),
                );
                TradeOutcome::Opened
            }
        }
    }

    fn apply_sell(&mut self, trade: &TradeRecord) -> TradeOutcome {
        let Some(pos) = self.positions.get_mut(&trade.symbol) else {
            warn!("Sell of {} with no open position", trade.symbol);
            return TradeOutcome::NoPosition;
        };

        if pos.quantity < trade.quantity {
            // Over-sell: drop the position, book nothing on the excess
            let closed_quantity = pos.quantity;
            let discarded_quantity = trade.quantity - pos.quantity;
            warn!(
                "Sell of {} {} exceeds open quantity {}; force-closing position",
                trade.quantity, trade.symbol, closed_quantity
            );
            self.positions.remove(&trade.symbol);
            return TradeOutcome::ForceClosed {
                closed_quantity,
                discarded_quantity,
            };
        }

        let realized = (trade.price - pos.entry_price) * trade.quantity;
        pos.realized_pnl += realized;
        pos.quantity -= trade.quantity;
        *self
            .realized_by_symbol
            .entry(trade.symbol.clone())
            .or_default() += realized;

        if pos.quantity.is_zero() {
            self.positions.remove(&trade.symbol);
            TradeOutcome::Closed { realized }
        } else {
            TradeOutcome::Reduced { realized }
        }
    }
}
