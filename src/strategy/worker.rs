use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use super::rule::{Decision, ThresholdRule};
use super::types::{LastOrder, StrategyParams, StrategyRunState};
use crate::common::types::{now_millis, Side, TradeSource};
use crate::execution::TradeExecutor;
use crate::prices::PriceLedger;

/// Polling loop for one strategy run
///
/// The worker owns its holding flag and entry price. Everything a caller may
/// want to observe is published into the shared `StrategyRunState` at the end
/// of each cycle.
pub(crate) struct StrategyWorker {
    params: StrategyParams,
    rule: ThresholdRule,
    executor: TradeExecutor,
    ledger: Option<Arc<PriceLedger>>,
    poll_interval: Duration,
    state: Arc<RwLock<StrategyRunState>>,
    shutdown: watch::Receiver<bool>,
    holding: bool,
    entry_price: Option<Decimal>,
}

impl StrategyWorker {
    pub(crate) fn new(
        params: StrategyParams,
        executor: TradeExecutor,
        ledger: Option<Arc<PriceLedger>>,
        poll_interval: Duration,
        state: Arc<RwLock<StrategyRunState>>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            rule: ThresholdRule::new(params.buy_threshold, params.sell_threshold),
            params,
            executor,
            ledger,
            poll_interval,
            state,
            shutdown,
            holding: false,
            entry_price: None,
        }
    }

    pub(crate) async fn run(mut self) {
        info!(
            "Strategy started: {} buy<={} sell>={} qty={}",
            self.params.symbol,
            self.params.buy_threshold,
            self.params.sell_threshold,
            self.params.quantity
        );

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            self.run_cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        debug!("Shutdown sender dropped for {}", self.params.symbol);
                        break;
                    }
                }
            }
        }

        self.state.write().await.running = false;
        info!("Strategy stopped: {}", self.params.symbol);
    }

    /// One poll: read price, record it, decide, maybe trade, publish state
    pub(crate) async fn run_cycle(&mut self) {
        let symbol = self.params.symbol.as_str();

        let price = match self.executor.exchange().get_price(symbol).await {
            Ok(price) => price,
            Err(e) => {
                warn!("Price read failed for {}: {}", symbol, e);
                self.state.write().await.last_error = Some(format!("price read failed: {}", e));
                return;
            }
        };

        if let Some(ledger) = &self.ledger {
            if let Err(e) = ledger.record_price(symbol, price, None).await {
                warn!("Failed to record price for {}: {}", symbol, e);
            }
        }

        let mut cycle_error = None;
        let mut last_order = None;

        if let Decision::Go(side) = self.rule.evaluate(price, self.holding) {
            match self
                .executor
                .execute(
                    symbol,
                    side,
                    self.params.quantity,
                    price,
                    TradeSource::Strategy,
                    self.params.owner_id.as_deref(),
                )
                .await
            {
                Ok(executed) => {
                    match side {
                        Side::Buy => {
                            self.holding = true;
                            self.entry_price = Some(price);
                        }
                        Side::Sell => {
                            self.holding = false;
                            self.entry_price = None;
                        }
                    }
                    last_order = Some(LastOrder {
                        side,
                        price,
                        fill_price: Some(executed.record.price),
                        order_id: executed.fill.order_id,
                        dry_run: executed.fill.dry_run,
                        timestamp_ms: executed.record.timestamp_ms,
                        error: None,
                    });
                }
                Err(e) => {
                    warn!("{} order failed for {}: {}", side, symbol, e);
                    let message = format!("{} order failed: {}", side, e);
                    last_order = Some(LastOrder {
                        side,
                        price,
                        fill_price: None,
                        order_id: None,
                        dry_run: self.executor.exchange().is_dry_run(),
                        timestamp_ms: now_millis(),
                        error: Some(message.clone()),
                    });
                    cycle_error = Some(message);
                }
            }
        }

        let mut state = self.state.write().await;
        state.last_price = Some(price);
        state.holding = self.holding;
        state.entry_price = self.entry_price;
        if last_order.is_some() {
            state.last_order = last_order;
        }
        state.last_error = cycle_error;
    }
}
