//! End-to-end strategy runs against a scripted dry-run exchange
//!
//! Each test wires the real manager, executor, portfolio, price ledger and
//! in-memory trade store together; only the exchange is simulated.

mod common;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

use common::{eth_params, wait_for_state, ScriptedExchange};
use threshold_trader::{
    InMemoryTradeStore, Portfolio, PriceLedger, Side, StopOutcome, StrategyManager, TradeExecutor,
    TradeSource, TraderError,
};

struct Harness {
    exchange: Arc<ScriptedExchange>,
    portfolio: Arc<Portfolio>,
    store: Arc<InMemoryTradeStore>,
    ledger: Arc<PriceLedger>,
    manager: StrategyManager,
    _dir: tempfile::TempDir,
}

fn harness(exchange: ScriptedExchange) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let exchange = Arc::new(exchange);
    let portfolio = Arc::new(Portfolio::new());
    let store = Arc::new(InMemoryTradeStore::new());
    let ledger = Arc::new(PriceLedger::new(dir.path()));

    let executor =
        TradeExecutor::new(exchange.clone(), portfolio.clone()).with_trade_store(store.clone());
    let manager = StrategyManager::new(executor)
        .with_price_ledger(ledger.clone())
        .with_poll_interval(Duration::from_millis(10))
        .with_stop_grace(Duration::from_secs(2));

    Harness {
        exchange,
        portfolio,
        store,
        ledger,
        manager,
        _dir: dir,
    }
}

#[test_log::test(tokio::test)]
async fn test_buy_low_sell_high_round_trip() {
    let h = harness(ScriptedExchange::new(vec![dec!(2990), dec!(3210)]));

    h.manager.start(eth_params()).await.unwrap();
    let state = wait_for_state(&h.manager, |s| {
        s.last_order.as_ref().map(|o| o.side) == Some(Side::Sell)
    })
    .await
    .expect("worker should sell after buying");

    assert!(!state.holding);
    assert!(state.entry_price.is_none());
    assert!(state.last_error.is_none());
    assert_eq!(h.manager.stop().await, StopOutcome::stopped());

    assert_eq!(
        h.exchange.orders(),
        vec![(Side::Buy, dec!(0.01)), (Side::Sell, dec!(0.01))]
    );

    let trades = h.portfolio.get_recent_trades(10).await;
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].price, dec!(2990));
    assert_eq!(trades[1].price, dec!(3210));
    assert!(trades.iter().all(|t| t.source == TradeSource::Strategy));

    let summary = h.portfolio.get_summary().await;
    assert_eq!(summary.position_count, 0);
    assert_eq!(summary.total_realized_pnl, dec!(2.2));

    assert_eq!(h.store.trades().await, trades);

    let recorded = h.ledger.local_log().read_all("ETHUSDT").unwrap();
    assert!(recorded.len() >= 2);
    assert_eq!(recorded[0].price, dec!(2990));
}

#[tokio::test]
async fn test_second_start_rejected_until_stopped() {
    let h = harness(ScriptedExchange::new(vec![dec!(3100)]));

    h.manager.start(eth_params()).await.unwrap();
    let err = h.manager.start(eth_params()).await.unwrap_err();
    assert!(matches!(err, TraderError::AlreadyRunning { .. }));

    assert!(h.manager.stop().await.stopped);
    assert_eq!(h.manager.stop().await, StopOutcome::not_running());

    h.manager.start(eth_params()).await.unwrap();
    assert!(h.manager.status().await.running);
    h.manager.stop().await;
}

#[tokio::test]
async fn test_price_outage_keeps_worker_alive() {
    let h = harness(ScriptedExchange::unreachable());

    h.manager.start(eth_params()).await.unwrap();
    let state = wait_for_state(&h.manager, |s| s.last_error.is_some())
        .await
        .expect("price failure should be published");

    assert!(state.running);
    assert!(state.last_price.is_none());
    assert!(h.manager.is_running().await);
    assert!(h.exchange.orders().is_empty());

    h.manager.stop().await;
}

#[tokio::test]
async fn test_rejected_order_leaves_worker_flat() {
    let h = harness(ScriptedExchange::rejecting_orders(vec![dec!(2990)]));

    h.manager.start(eth_params()).await.unwrap();
    let state = wait_for_state(&h.manager, |s| s.last_order.is_some())
        .await
        .expect("order attempt should be published");

    assert!(!state.holding);
    assert!(state.last_error.unwrap().contains("BUY order failed"));
    assert!(state.last_order.unwrap().error.is_some());
    h.manager.stop().await;

    assert_eq!(h.portfolio.get_summary().await.trade_count, 0);
    assert!(h.store.trades().await.is_empty());
}
