use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{instrument, warn};

use super::executor::{ExecutedTrade, TradeExecutor};
use crate::common::errors::{Result, TraderError};
use crate::common::types::{now_millis, PricePoint, Side, TradeSource};
use crate::portfolio::{Portfolio, PortfolioSummary};
use crate::prices::PriceLedger;

/// Request-facing operations outside the strategy loop
pub struct TradingDesk {
    executor: TradeExecutor,
    ledger: Option<Arc<PriceLedger>>,
}

impl TradingDesk {
    pub fn new(executor: TradeExecutor) -> Self {
        Self {
            executor,
            ledger: None,
        }
    }

    /// Record every quoted price in this ledger
    pub fn with_price_ledger(mut self, ledger: Arc<PriceLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn portfolio(&self) -> &Arc<Portfolio> {
        self.executor.portfolio()
    }

    /// Place a manual market order attributed to `owner_id`
    ///
    /// The price is read before the order goes out; if that read fails no
    /// order is placed.
    pub async fn place_manual_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        owner_id: Option<&str>,
    ) -> Result<ExecutedTrade> {
        if quantity <= Decimal::ZERO {
            return Err(TraderError::InvalidParameters(format!(
                "quantity must be positive, got {}",
                quantity
            )));
        }
        let observed = self.executor.exchange().get_price(symbol).await?;
        self.executor
            .execute(symbol, side, quantity, observed, TradeSource::Manual, owner_id)
            .await
    }

    /// Current exchange price, also appended to the price ledger
    #[instrument(skip(self))]
    pub async fn quote(&self, symbol: &str) -> Result<PricePoint> {
        let price = self.executor.exchange().get_price(symbol).await?;
        match &self.ledger {
            Some(ledger) => match ledger.record_price(symbol, price, None).await {
                Ok(point) => Ok(point),
                Err(e) => {
                    warn!("Failed to record quoted price for {}: {}", symbol, e);
                    Ok(PricePoint::new(symbol, now_millis(), price))
                }
            },
            None => Ok(PricePoint::new(symbol, now_millis(), price)),
        }
    }

    /// Re-price every open position and return the refreshed summary
    ///
    /// Symbols whose price read fails keep their previous marks.
    pub async fn mark_to_market(&self) -> PortfolioSummary {
        let portfolio = self.executor.portfolio();
        let mut prices = HashMap::new();
        for symbol in portfolio.open_symbols().await {
            match self.executor.exchange().get_price(&symbol).await {
                Ok(price) => {
                    prices.insert(symbol, price);
                }
                Err(e) => warn!("Failed to price open position {}: {}", symbol, e),
            }
        }
        portfolio.update_prices(&prices).await;
        portfolio.get_summary().await
    }
}
