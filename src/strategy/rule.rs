use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::types::Side;

/// Strategy decision output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No action should be taken
    NoGo,
    /// Place a market order on this side
    Go(Side),
}

impl Decision {
    pub fn no_go() -> Self {
        Self::NoGo
    }

    pub fn is_go(&self) -> bool {
        matches!(self, Self::Go(_))
    }
}

/// Buy-low/sell-high threshold rule
///
/// Comparisons are inclusive. Buying is only considered while flat and
/// selling only while holding, so at most one side fires per evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub buy_threshold: Decimal,
    pub sell_threshold: Decimal,
}

impl ThresholdRule {
    pub fn new(buy_threshold: Decimal, sell_threshold: Decimal) -> Self {
        Self {
            buy_threshold,
            sell_threshold,
        }
    }

    pub fn evaluate(&self, price: Decimal, holding: bool) -> Decision {
        if !holding && price <= self.buy_threshold {
            Decision::Go(Side::Buy)
        } else if holding && price >= self.sell_threshold {
            Decision::Go(Side::Sell)
        } else {
            Decision::no_go()
        }
    }
}
