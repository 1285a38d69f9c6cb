use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::common::errors::Result;
use crate::common::traits::{ExchangeClient, TradeStore};
use crate::common::types::{now_millis, OrderFill, Side, TradeRecord, TradeSource};
use crate::portfolio::{Portfolio, TradeOutcome};

/// Everything produced by one executed order
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedTrade {
    pub record: TradeRecord,
    pub fill: OrderFill,
    pub outcome: TradeOutcome,
}

/// Places orders and books the resulting trades
///
/// Manual orders and strategy orders both go through here, so every fill
/// lands in the portfolio and the trade store the same way.
#[derive(Clone)]
pub struct TradeExecutor {
    exchange: Arc<dyn ExchangeClient>,
    portfolio: Arc<Portfolio>,
    trade_store: Option<Arc<dyn TradeStore>>,
}

impl TradeExecutor {
    pub fn new(exchange: Arc<dyn ExchangeClient>, portfolio: Arc<Portfolio>) -> Self {
        Self {
            exchange,
            portfolio,
            trade_store: None,
        }
    }

    pub fn with_trade_store(mut self, store: Arc<dyn TradeStore>) -> Self {
        self.trade_store = Some(store);
        self
    }

    pub fn exchange(&self) -> &Arc<dyn ExchangeClient> {
        &self.exchange
    }

    pub fn portfolio(&self) -> &Arc<Portfolio> {
        &self.portfolio
    }

    /// Place a market order and book it
    ///
    /// The recorded price is the fill price when the venue reported a positive
    /// one, else `observed_price`. Callers read the price before the order so
    /// a placed order can always be booked. Only the order itself can fail
    /// the call; trade store failures are logged.
    #[instrument(skip(self, owner_id), fields(dry_run = self.exchange.is_dry_run()))]
    pub async fn execute(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        observed_price: Decimal,
        source: TradeSource,
        owner_id: Option<&str>,
    ) -> Result<ExecutedTrade> {
        let fill = self
            .exchange
            .place_market_order(symbol, side, quantity)
            .await?;

        let price = fill
            .price
            .filter(|p| *p > Decimal::ZERO)
            .unwrap_or(observed_price);

        let record = TradeRecord {
            symbol: symbol.to_string(),
            side,
            quantity,
            price,
            timestamp_ms: now_millis(),
            order_id: fill.order_id.clone(),
            source,
            owner_id: owner_id.map(str::to_string),
        };

        if let Some(store) = &self.trade_store {
            if let Err(e) = store.save_trade(&record).await {
                warn!("Failed to persist {} trade for {}: {}", side, symbol, e);
            }
        }

        let outcome = self.portfolio.record_trade(record.clone()).await;
        info!(
            "{} {} {} {} @ {} = {} ({:?}, dry_run={})",
            source,
            side,
            quantity,
            symbol,
            price,
            record.value(),
            outcome,
            fill.dry_run
        );

        Ok(ExecutedTrade {
            record,
            fill,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::TraderError;
    use crate::common::traits::{MockExchangeClient, MockTradeStore};
    use rust_decimal_macros::dec;

    fn fill(price: Option<Decimal>) -> OrderFill {
        OrderFill {
            symbol: "ETHUSDT".to_string(),
            side: Side::Buy,
            quantity: dec!(0.01),
            price,
            order_id: Some("42".to_string()),
            timestamp_ms: 1,
            dry_run: false,
        }
    }

    fn exchange_with_fill(price: Option<Decimal>) -> MockExchangeClient {
        let mut exchange = MockExchangeClient::new();
        exchange.expect_is_dry_run().return_const(false);
        exchange
            .expect_place_market_order()
            .times(1)
            .returning(move |_, _, _| Ok(fill(price)));
        exchange
    }

    #[tokio::test]
    async fn test_fill_price_is_recorded() {
        let mut exchange = exchange_with_fill(Some(dec!(2995)));
        exchange.expect_get_price().times(0);
        let portfolio = Arc::new(Portfolio::new());
        let executor = TradeExecutor::new(Arc::new(exchange), portfolio.clone());

        let executed = executor
            .execute(
                "ETHUSDT",
                Side::Buy,
                dec!(0.01),
                dec!(2990),
                TradeSource::Strategy,
                Some("u-1"),
            )
            .await
            .unwrap();

        assert_eq!(executed.record.price, dec!(2995));
        assert_eq!(executed.record.order_id.as_deref(), Some("42"));
        assert_eq!(executed.record.owner_id.as_deref(), Some("u-1"));
        assert_eq!(executed.outcome, TradeOutcome::Opened);
        assert_eq!(
            portfolio.position("ETHUSDT").await.unwrap().entry_price,
            dec!(2995)
        );
    }

    #[tokio::test]
    async fn test_zero_fill_price_falls_back_to_observed() {
        let exchange = exchange_with_fill(Some(Decimal::ZERO));
        let executor = TradeExecutor::new(Arc::new(exchange), Arc::new(Portfolio::new()));

        let executed = executor
            .execute(
                "ETHUSDT",
                Side::Buy,
                dec!(0.01),
                dec!(2990),
                TradeSource::Strategy,
                None,
            )
            .await
            .unwrap();
        assert_eq!(executed.record.price, dec!(2990));
    }

    #[tokio::test]
    async fn test_missing_fill_price_books_at_observed_without_reading() {
        let mut exchange = exchange_with_fill(None);
        exchange
            .expect_get_price()
            .times(0)
            .returning(|_| Err(TraderError::ExchangeUnavailable("down".to_string())));
        let mut store = MockTradeStore::new();
        store.expect_save_trade().times(1).returning(|_| Ok(()));

        let portfolio = Arc::new(Portfolio::new());
        let executor = TradeExecutor::new(Arc::new(exchange), portfolio.clone())
            .with_trade_store(Arc::new(store));

        let executed = executor
            .execute(
                "ETHUSDT",
                Side::Buy,
                dec!(0.01),
                dec!(3001),
                TradeSource::Manual,
                None,
            )
            .await
            .unwrap();
        assert_eq!(executed.record.price, dec!(3001));
        assert_eq!(executed.record.source, TradeSource::Manual);
        assert_eq!(portfolio.get_summary().await.trade_count, 1);
    }

    #[tokio::test]
    async fn test_store_failure_still_books_trade() {
        let exchange = exchange_with_fill(Some(dec!(2990)));
        let mut store = MockTradeStore::new();
        store
            .expect_save_trade()
            .times(1)
            .returning(|_| Err(TraderError::Persistence("db down".to_string())));

        let portfolio = Arc::new(Portfolio::new());
        let executor = TradeExecutor::new(Arc::new(exchange), portfolio.clone())
            .with_trade_store(Arc::new(store));

        let executed = executor
            .execute(
                "ETHUSDT",
                Side::Buy,
                dec!(0.01),
                dec!(2990),
                TradeSource::Manual,
                None,
            )
            .await;
        assert!(executed.is_ok());
        assert_eq!(portfolio.get_summary().await.trade_count, 1);
    }

    #[tokio::test]
    async fn test_order_failure_books_nothing() {
        let mut exchange = MockExchangeClient::new();
        exchange.expect_is_dry_run().return_const(false);
        exchange
            .expect_place_market_order()
            .returning(|_, _, _| Err(TraderError::ExchangeUnavailable("timeout".to_string())));
        let mut store = MockTradeStore::new();
        store.expect_save_trade().times(0);

        let portfolio = Arc::new(Portfolio::new());
        let executor = TradeExecutor::new(Arc::new(exchange), portfolio.clone())
            .with_trade_store(Arc::new(store));

        let result = executor
            .execute(
                "ETHUSDT",
                Side::Sell,
                dec!(0.01),
                dec!(3210),
                TradeSource::Strategy,
                None,
            )
            .await;
        assert!(matches!(result, Err(TraderError::ExchangeUnavailable(_))));
        assert_eq!(portfolio.get_summary().await.trade_count, 0);
    }
}
