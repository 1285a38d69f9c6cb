use chrono::Duration;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::local_log::LocalPriceLog;
use super::period::HistoryPeriod;
use crate::common::errors::Result;
use crate::common::traits::{HistorySource, PriceMirror};
use crate::common::types::{now_millis, validate_symbol, PricePoint};

/// Local point count above which the exchange fallback is skipped
pub const LOCAL_SUFFICIENT_POINTS: usize = 10;

/// Per-symbol price history with a local authority and optional remotes
///
/// Writes go to the local CSV log first; the remote mirror is best-effort.
/// Reads merge local points, mirror points and (when local data is thin)
/// exchange candles, keyed by timestamp with earlier sources winning.
pub struct PriceLedger {
    local: LocalPriceLog,
    mirror: Option<Arc<dyn PriceMirror>>,
    history: Option<Arc<dyn HistorySource>>,
    io_lock: Mutex<()>,
}

impl PriceLedger {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            local: LocalPriceLog::new(data_dir),
            mirror: None,
            history: None,
            io_lock: Mutex::new(()),
        }
    }

    /// Mirror every recorded point to a remote store
    pub fn with_mirror(mut self, mirror: Arc<dyn PriceMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Fall back to exchange candles when local history is thin
    pub fn with_history_source(mut self, history: Arc<dyn HistorySource>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn local_log(&self) -> &LocalPriceLog {
        &self.local
    }

    /// Append a price point (timestamp defaults to now)
    ///
    /// Only a local write failure is returned; mirror failures are logged.
    #[instrument(skip(self))]
    pub async fn record_price(
        &self,
        symbol: &str,
        price: Decimal,
        timestamp_ms: Option<i64>,
    ) -> Result<PricePoint> {
        validate_symbol(symbol)?;
        let point = PricePoint::new(symbol, timestamp_ms.unwrap_or_else(now_millis), price);

        {
            let _guard = self.io_lock.lock().await;
            self.local.append(&point)?;
        }

        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.save_point(&point).await {
                warn!("Failed to mirror price point for {}: {}", symbol, e);
            }
        }

        Ok(point)
    }

    /// History for a named period ending now
    pub async fn get_history(&self, symbol: &str, period: &str) -> Result<Vec<PricePoint>> {
        self.get_history_at(symbol, HistoryPeriod::parse_or_default(period), now_millis())
            .await
    }

    /// History for a period ending at `now_ms`, ascending and de-duplicated
    #[instrument(skip(self))]
    pub async fn get_history_at(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        now_ms: i64,
    ) -> Result<Vec<PricePoint>> {
        validate_symbol(symbol)?;
        let start_ms = period.start_ms(now_ms);
        let mut merged = self.local_window(symbol, start_ms).await?;

        if merged.len() > LOCAL_SUFFICIENT_POINTS {
            debug!("{} local points for {} {}, skipping remote", merged.len(), symbol, period);
            return Ok(merged.into_values().collect());
        }

        if let Some(history) = &self.history {
            match history
                .fetch_history(symbol, period.granularity(), start_ms)
                .await
            {
                Ok(remote) => {
                    debug!("Fetched {} remote candles for {} {}", remote.len(), symbol, period);
                    merge_missing(&mut merged, remote);
                }
                Err(e) => warn!("Failed to fetch remote history for {}: {}", symbol, e),
            }
        }

        Ok(merged.into_values().collect())
    }

    /// Local log plus mirror points within the window, keyed by timestamp
    async fn local_window(&self, symbol: &str, start_ms: i64) -> Result<BTreeMap<i64, PricePoint>> {
        let local = {
            let _guard = self.io_lock.lock().await;
            self.local.read_since(symbol, start_ms)?
        };

        let mut merged = BTreeMap::new();
        merge_missing(&mut merged, local);

        if let Some(mirror) = &self.mirror {
            match mirror.points_since(symbol, start_ms).await {
                Ok(points) => merge_missing(&mut merged, points),
                Err(e) => warn!("Failed to read mirrored prices for {}: {}", symbol, e),
            }
        }

        Ok(merged)
    }

    /// Most recently appended local point
    pub async fn latest_price(&self, symbol: &str) -> Result<Option<PricePoint>> {
        let _guard = self.io_lock.lock().await;
        self.local.latest(symbol)
    }

    /// Delete local points older than `retention_days`; returns the count removed
    pub async fn prune_older_than(&self, retention_days: u32) -> Result<usize> {
        let cutoff_ms = now_millis() - Duration::days(i64::from(retention_days)).num_milliseconds();
        let _guard = self.io_lock.lock().await;
        let removed = self.local.prune_before(cutoff_ms)?;
        debug!("Pruned {} price points older than {} days", removed, retention_days);
        Ok(removed)
    }
}

/// Insert points whose timestamp is not already present
fn merge_missing(merged: &mut BTreeMap<i64, PricePoint>, points: Vec<PricePoint>) {
    for point in points {
        merged.entry(point.timestamp_ms).or_insert(point);
    }
}
