//! ThresholdTrader - Main Entry Point
//!
//! Runs the threshold strategy against Binance (dry-run by default) and
//! exposes one-shot commands for prices, history, manual orders and
//! price log maintenance.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use threshold_trader::config::{load_config, load_from_env};
use threshold_trader::{
    AppConfig, BinanceClient, InMemoryTradeStore, PgStore, Portfolio, PriceLedger, Side,
    StrategyManager, StrategyParams, TradeExecutor, TradeStore, TradingDesk,
};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (falls back to plain environment variables if missing)
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the threshold strategy until Ctrl-C
    Run {
        #[arg(long)]
        symbol: Option<String>,
        /// Buy when price <= this while flat
        #[arg(long)]
        buy: Decimal,
        /// Sell when price >= this while holding
        #[arg(long)]
        sell: Decimal,
        #[arg(long)]
        quantity: Option<Decimal>,
        #[arg(long)]
        owner: Option<String>,
        /// Seconds between status log lines
        #[arg(long, default_value_t = 30)]
        status_every: u64,
    },
    /// Print the current price (and record it)
    Price {
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Print price history for a period (1h, 1d, 3d, 1w, 1m)
    History {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long, default_value = "1d")]
        period: String,
    },
    /// Place a manual market order
    Order {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        side: Side,
        #[arg(long)]
        quantity: Option<Decimal>,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Delete local price points older than the retention window
    Prune {
        #[arg(long)]
        days: Option<u32>,
    },
    /// List tradable symbols
    Symbols,
}

/// Shared collaborators for every command
struct Engine {
    client: Arc<BinanceClient>,
    ledger: Arc<PriceLedger>,
    executor: TradeExecutor,
}

impl Engine {
    async fn build(config: &AppConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.settings.request_timeout_seconds);
        let client = Arc::new(
            BinanceClient::from_config(&config.exchange, timeout)
                .context("failed to build exchange client")?,
        );

        let mut ledger =
            PriceLedger::new(&config.storage.data_dir).with_history_source(client.clone());
        let mut trade_store: Arc<dyn TradeStore> = Arc::new(InMemoryTradeStore::new());

        if let Some(database) = &config.database {
            match connect_database(database).await {
                Ok(store) => {
                    let store = Arc::new(store);
                    ledger = ledger.with_mirror(store.clone());
                    trade_store = store;
                }
                Err(e) => warn!("Database unavailable, keeping trades in memory: {}", e),
            }
        }

        let executor = TradeExecutor::new(client.clone(), Arc::new(Portfolio::new()))
            .with_trade_store(trade_store);

        Ok(Self {
            client,
            ledger: Arc::new(ledger),
            executor,
        })
    }

    fn desk(&self) -> TradingDesk {
        TradingDesk::new(self.executor.clone()).with_price_ledger(self.ledger.clone())
    }
}

async fn connect_database(
    database: &threshold_trader::config::types::DatabaseConfig,
) -> threshold_trader::Result<PgStore> {
    let store = PgStore::connect(database).await?;
    store.ensure_schema().await?;
    Ok(store)
}

fn init_logging(level: &str) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = if Path::new(&args.config).exists() {
        load_config(Some(args.config.as_str()))?
    } else {
        load_from_env()?
    };

    init_logging(args.log_level.as_deref().unwrap_or(&config.settings.log_level))?;

    info!(
        "Starting ThresholdTrader against {} (dry_run={})",
        config.exchange.base_url, config.exchange.dry_run
    );

    let engine = Engine::build(&config).await?;
    let default_symbol = config.strategy.default_symbol.clone();
    let default_quantity = config.strategy.default_quantity;

    match args.command {
        Command::Run {
            symbol,
            buy,
            sell,
            quantity,
            owner,
            status_every,
        } => {
            let mut params = StrategyParams::new(
                symbol.unwrap_or(default_symbol),
                buy,
                sell,
                quantity.unwrap_or(default_quantity),
            );
            params.owner_id = owner;

            let mut manager =
                StrategyManager::new(engine.executor.clone()).with_config(&config.strategy);
            if config.strategy.record_prices {
                manager = manager.with_price_ledger(engine.ledger.clone());
            }

            print_json(&manager.start(params).await?)?;

            let mut ticker = tokio::time::interval(Duration::from_secs(status_every.max(1)));
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Some(state) = manager.status().await.state {
                            info!(
                                "{} last={:?} holding={} entry={:?} error={:?}",
                                state.symbol, state.last_price, state.holding,
                                state.entry_price, state.last_error
                            );
                        }
                    }
                    signal = tokio::signal::ctrl_c() => {
                        signal?;
                        info!("Received shutdown signal, cleaning up...");
                        break;
                    }
                }
            }

            print_json(&manager.stop().await)?;
            print_json(&engine.desk().mark_to_market().await)?;
        }
        Command::Price { symbol } => {
            let point = engine.desk().quote(&symbol.unwrap_or(default_symbol)).await?;
            print_json(&point)?;
        }
        Command::History { symbol, period } => {
            let history = engine
                .ledger
                .get_history(&symbol.unwrap_or(default_symbol), &period)
                .await?;
            print_json(&history)?;
        }
        Command::Order {
            symbol,
            side,
            quantity,
            owner,
        } => {
            let executed = engine
                .desk()
                .place_manual_order(
                    &symbol.unwrap_or(default_symbol),
                    side,
                    quantity.unwrap_or(default_quantity),
                    owner.as_deref(),
                )
                .await?;
            print_json(&executed.record)?;
            print_json(&executed.outcome)?;
        }
        Command::Prune { days } => {
            let days = days.unwrap_or(config.storage.retention_days);
            let removed = engine.ledger.prune_older_than(days).await?;
            info!("Removed {} price points older than {} days", removed, days);
        }
        Command::Symbols => {
            print_json(&engine.client.symbols().await)?;
        }
    }

    Ok(())
}
