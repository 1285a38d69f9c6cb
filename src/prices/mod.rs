//! Prices module - Durable per-symbol price history

mod ledger;
mod local_log;
mod period;

pub use ledger::{PriceLedger, LOCAL_SUFFICIENT_POINTS};
pub use local_log::LocalPriceLog;
pub use period::HistoryPeriod;
