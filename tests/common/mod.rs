//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Mutex;
use std::time::Duration;

use threshold_trader::common::types::now_millis;
use threshold_trader::{
    ExchangeClient, OrderFill, Result, Side, StrategyManager, StrategyParams, StrategyRunState,
    TraderError,
};

/// ETHUSDT, buy <= 3000, sell >= 3200, 0.01 per order
pub fn eth_params() -> StrategyParams {
    StrategyParams::new("ETHUSDT", dec!(3000), dec!(3200), dec!(0.01))
}

/// Dry-run exchange that serves a fixed price script
///
/// Prices are returned in order and the last one repeats forever. Orders
/// fill at the most recently served price without consuming a new one.
pub struct ScriptedExchange {
    prices: Vec<Decimal>,
    state: Mutex<ScriptState>,
    fail_prices: bool,
    fail_orders: bool,
}

#[derive(Default)]
struct ScriptState {
    next: usize,
    last: Option<Decimal>,
    orders: Vec<(Side, Decimal)>,
}

impl ScriptedExchange {
    pub fn new(prices: Vec<Decimal>) -> Self {
        Self {
            prices,
            state: Mutex::new(ScriptState::default()),
            fail_prices: false,
            fail_orders: false,
        }
    }

    /// Every price read fails
    pub fn unreachable() -> Self {
        Self {
            fail_prices: true,
            ..Self::new(vec![dec!(0)])
        }
    }

    /// Prices are served but every order is rejected
    pub fn rejecting_orders(prices: Vec<Decimal>) -> Self {
        Self {
            fail_orders: true,
            ..Self::new(prices)
        }
    }

    /// Orders accepted so far, as (side, quantity)
    pub fn orders(&self) -> Vec<(Side, Decimal)> {
        self.state.lock().unwrap().orders.clone()
    }
}

#[async_trait]
impl ExchangeClient for ScriptedExchange {
    async fn get_price(&self, _symbol: &str) -> Result<Decimal> {
        if self.fail_prices {
            return Err(TraderError::ExchangeUnavailable("connection refused".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let idx = state.next.min(self.prices.len() - 1);
        let price = self.prices[idx];
        state.next += 1;
        state.last = Some(price);
        Ok(price)
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
    ) -> Result<OrderFill> {
        if self.fail_orders {
            return Err(TraderError::InvalidResponse(
                "Server returned status 400: insufficient balance".to_string(),
            ));
        }
        let mut state = self.state.lock().unwrap();
        state.orders.push((side, quantity));
        Ok(OrderFill {
            symbol: symbol.to_string(),
            side,
            quantity,
            price: state.last,
            order_id: Some(format!("sim-{}", state.orders.len())),
            timestamp_ms: now_millis(),
            dry_run: true,
        })
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

/// Poll the manager until `predicate` holds for the published state
pub async fn wait_for_state<F>(manager: &StrategyManager, predicate: F) -> Option<StrategyRunState>
where
    F: Fn(&StrategyRunState) -> bool,
{
    for _ in 0..300 {
        if let Some(state) = manager.status().await.state {
            if predicate(&state) {
                return Some(state);
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}
