use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::errors::{Result, TraderError};
use crate::common::types::{validate_symbol, Side};

/// Parameters for one strategy run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub symbol: String,
    pub buy_threshold: Decimal,
    pub sell_threshold: Decimal,
    pub quantity: Decimal,
    /// Account that strategy trades are attributed to
    #[serde(default)]
    pub owner_id: Option<String>,
}

impl StrategyParams {
    pub fn new(
        symbol: impl Into<String>,
        buy_threshold: Decimal,
        sell_threshold: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            buy_threshold,
            sell_threshold,
            quantity,
            owner_id: None,
        }
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_symbol(&self.symbol)?;
        if self.quantity <= Decimal::ZERO {
            return Err(TraderError::InvalidParameters(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        if self.buy_threshold <= Decimal::ZERO || self.sell_threshold <= Decimal::ZERO {
            return Err(TraderError::InvalidParameters(format!(
                "thresholds must be positive, got buy {} / sell {}",
                self.buy_threshold, self.sell_threshold
            )));
        }
        Ok(())
    }
}

/// Summary of the worker's most recent order attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastOrder {
    pub side: Side,
    /// Price observed by the poll that triggered the order
    pub price: Decimal,
    /// Price recorded for the trade, when the order went through
    pub fill_price: Option<Decimal>,
    pub order_id: Option<String>,
    pub dry_run: bool,
    pub timestamp_ms: i64,
    pub error: Option<String>,
}

/// Mutable snapshot owned by one worker, overwritten every poll cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRunState {
    pub running: bool,
    pub symbol: String,
    pub buy_threshold: Decimal,
    pub sell_threshold: Decimal,
    pub quantity: Decimal,
    pub owner_id: Option<String>,
    pub last_price: Option<Decimal>,
    pub holding: bool,
    pub entry_price: Option<Decimal>,
    pub last_order: Option<LastOrder>,
    pub last_error: Option<String>,
}

impl StrategyRunState {
    pub fn initial(params: &StrategyParams) -> Self {
        Self {
            running: true,
            symbol: params.symbol.clone(),
            buy_threshold: params.buy_threshold,
            sell_threshold: params.sell_threshold,
            quantity: params.quantity,
            owner_id: params.owner_id.clone(),
            last_price: None,
            holding: false,
            entry_price: None,
            last_order: None,
            last_error: None,
        }
    }
}

/// Result of a successful `start`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartOutcome {
    pub started: bool,
    #[serde(flatten)]
    pub params: StrategyParams,
}

/// Result of `stop`; stopping an idle manager is a no-op, not an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopOutcome {
    pub stopped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StopOutcome {
    pub fn stopped() -> Self {
        Self {
            stopped: true,
            reason: None,
        }
    }

    pub fn not_running() -> Self {
        Self {
            stopped: false,
            reason: Some("not running".to_string()),
        }
    }
}

/// Result of `status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStatus {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<StrategyRunState>,
}

impl StrategyStatus {
    pub fn idle() -> Self {
        Self {
            running: false,
            state: None,
        }
    }
}
