use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::types::{StartOutcome, StopOutcome, StrategyParams, StrategyRunState, StrategyStatus};
use super::worker::StrategyWorker;
use crate::common::errors::{Result, TraderError};
use crate::config::types::StrategyConfig;
use crate::execution::TradeExecutor;
use crate::prices::PriceLedger;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(2);

struct WorkerHandle {
    symbol: String,
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
    state: Arc<RwLock<StrategyRunState>>,
}

/// Lifecycle control for the single strategy worker
///
/// At most one worker is active per manager. `start`, `stop` and `status`
/// serialize on one lock, so a status read never sees a half-replaced
/// worker.
pub struct StrategyManager {
    executor: TradeExecutor,
    ledger: Option<Arc<PriceLedger>>,
    poll_interval: Duration,
    stop_grace: Duration,
    active: Mutex<Option<WorkerHandle>>,
}

impl StrategyManager {
    pub fn new(executor: TradeExecutor) -> Self {
        Self {
            executor,
            ledger: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            stop_grace: DEFAULT_STOP_GRACE,
            active: Mutex::new(None),
        }
    }

    /// Apply poll interval and stop grace from configuration
    pub fn with_config(mut self, config: &StrategyConfig) -> Self {
        self.poll_interval = config.poll_interval();
        self.stop_grace = config.stop_grace();
        self
    }

    /// Record every polled price in this ledger
    pub fn with_price_ledger(mut self, ledger: Arc<PriceLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_stop_grace(mut self, stop_grace: Duration) -> Self {
        self.stop_grace = stop_grace;
        self
    }

    /// Spawn a worker for `params`
    ///
    /// Fails with `AlreadyRunning` while a previous worker is still alive. A
    /// worker that has already exited is replaced.
    pub async fn start(&self, params: StrategyParams) -> Result<StartOutcome> {
        params.validate()?;

        let mut active = self.active.lock().await;
        if let Some(handle) = active.as_ref() {
            if !handle.join.is_finished() {
                return Err(TraderError::AlreadyRunning {
                    symbol: handle.symbol.clone(),
                });
            }
        }

        let state = Arc::new(RwLock::new(StrategyRunState::initial(&params)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = StrategyWorker::new(
            params.clone(),
            self.executor.clone(),
            self.ledger.clone(),
            self.poll_interval,
            state.clone(),
            shutdown_rx,
        );

        let join = tokio::spawn(worker.run());
        *active = Some(WorkerHandle {
            symbol: params.symbol.clone(),
            shutdown: shutdown_tx,
            join,
            state,
        });

        info!("Started strategy worker for {}", params.symbol);
        Ok(StartOutcome {
            started: true,
            params,
        })
    }

    /// Signal the worker and wait up to the grace period for it to exit
    ///
    /// The handle is released whether or not the worker exited in time; a
    /// late worker is detached and finishes its current cycle on its own.
    pub async fn stop(&self) -> StopOutcome {
        let mut active = self.active.lock().await;
        let Some(mut handle) = active.take() else {
            return StopOutcome::not_running();
        };

        // the worker may already be gone, in which case there is no receiver
        let _ = handle.shutdown.send(true);

        match tokio::time::timeout(self.stop_grace, &mut handle.join).await {
            Ok(Ok(())) => info!("Strategy worker for {} stopped", handle.symbol),
            Ok(Err(e)) => warn!("Strategy worker for {} ended abnormally: {}", handle.symbol, e),
            Err(_) => warn!(
                "Strategy worker for {} did not exit within {:?}; detaching",
                handle.symbol, self.stop_grace
            ),
        }

        StopOutcome::stopped()
    }

    /// Snapshot of the active worker's state
    pub async fn status(&self) -> StrategyStatus {
        let active = self.active.lock().await;
        match active.as_ref() {
            Some(handle) => StrategyStatus {
                running: true,
                state: Some(handle.state.read().await.clone()),
            },
            None => StrategyStatus::idle(),
        }
    }

    /// Whether a worker is currently alive
    pub async fn is_running(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|handle| !handle.join.is_finished())
            .unwrap_or(false)
    }
}
