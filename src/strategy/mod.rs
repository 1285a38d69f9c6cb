//! Strategy module - Threshold trading on a polled price
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  StrategyManager (start / stop / status)                    │
//! │    - Owns at most one WorkerHandle                          │
//! │    - Stop = watch signal + bounded join                     │
//! └─────────────────────────────────────────────────────────────┘
//!        │ spawns
//!        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  StrategyWorker (tokio task, one cycle per poll interval)   │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  ExchangeClient.get_price ──► PriceLedger.record_price      │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  ThresholdRule.evaluate(price, holding) → Go(side)/NoGo     │
//! │       │                                                     │
//! │       ▼ (if Go)                                             │
//! │  TradeExecutor → TradeStore + Portfolio                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`StrategyManager`]: Lifecycle control, single active worker
//! - [`ThresholdRule`]: Pure buy-low/sell-high decision
//! - [`Decision`]: Go/NoGo returned by the rule
//! - [`StrategyRunState`]: Snapshot published by the worker every cycle

mod manager;
mod rule;
mod types;
mod worker;

pub use manager::StrategyManager;
pub use rule::{Decision, ThresholdRule};
pub use types::{
    LastOrder,
    StartOutcome,
    StopOutcome,
    StrategyParams,
    StrategyRunState,
    StrategyStatus,
};
