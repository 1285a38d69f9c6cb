use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use crate::common::errors::{Result, TraderError};
use crate::common::traits::{PriceMirror, TradeStore};
use crate::common::types::{PricePoint, TradeRecord};
use crate::config::types::DatabaseConfig;

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS trades (
        id BIGSERIAL PRIMARY KEY,
        symbol TEXT NOT NULL,
        side TEXT NOT NULL,
        quantity NUMERIC NOT NULL,
        price NUMERIC NOT NULL,
        timestamp_ms BIGINT NOT NULL,
        order_id TEXT,
        source TEXT NOT NULL,
        owner_id TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS price_points (
        id BIGSERIAL PRIMARY KEY,
        symbol TEXT NOT NULL,
        timestamp_ms BIGINT NOT NULL,
        price NUMERIC NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_price_points_symbol_ts ON price_points (symbol, timestamp_ms)",
];

/// Postgres-backed trade store and price mirror
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .connect(&config.url)
            .await?;
        info!("Connected to Postgres (max {} connections)", config.max_connections);
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Database schema ready");
        Ok(())
    }
}

#[async_trait]
impl TradeStore for PgStore {
    #[instrument(skip(self, trade), fields(symbol = %trade.symbol, side = %trade.side))]
    async fn save_trade(&self, trade: &TradeRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO trades (
                symbol, side, quantity, price, timestamp_ms, order_id, source, owner_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&trade.symbol)
        .bind(trade.side.as_str())
        .bind(trade.quantity)
        .bind(trade.price)
        .bind(trade.timestamp_ms)
        .bind(&trade.order_id)
        .bind(trade.source.as_str())
        .bind(&trade.owner_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert trade: {}", e);
            TraderError::Persistence(format!("Failed to insert trade: {}", e))
        })?;
        Ok(())
    }
}

#[async_trait]
impl PriceMirror for PgStore {
    async fn save_point(&self, point: &PricePoint) -> Result<()> {
        sqlx::query("INSERT INTO price_points (symbol, timestamp_ms, price) VALUES ($1, $2, $3)")
            .bind(&point.symbol)
            .bind(point.timestamp_ms)
            .bind(point.price)
            .execute(&self.pool)
            .await
            .map_err(|e| TraderError::Persistence(format!("Failed to insert price point: {}", e)))?;
        Ok(())
    }

    async fn points_since(&self, symbol: &str, start_ms: i64) -> Result<Vec<PricePoint>> {
        let rows = sqlx::query(
            r#"
            SELECT timestamp_ms, price FROM price_points
            WHERE symbol = $1 AND timestamp_ms >= $2
            ORDER BY timestamp_ms ASC
            "#,
        )
        .bind(symbol)
        .bind(start_ms)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TraderError::Persistence(format!("Failed to read price points: {}", e)))?;

        rows.iter()
            .map(|row| -> Result<PricePoint> {
                let timestamp_ms: i64 = row.try_get("timestamp_ms")?;
                let price: Decimal = row.try_get("price")?;
                Ok(PricePoint::new(symbol, timestamp_ms, price))
            })
            .collect()
    }
}
