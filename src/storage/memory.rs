use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::common::errors::Result;
use crate::common::traits::{PriceMirror, TradeStore};
use crate::common::types::{PricePoint, TradeRecord};

/// Trade store that keeps everything in process memory
#[derive(Debug, Default)]
pub struct InMemoryTradeStore {
    trades: Mutex<Vec<TradeRecord>>,
}

impl InMemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved trades, in save order
    pub async fn trades(&self) -> Vec<TradeRecord> {
        self.trades.lock().await.clone()
    }
}

#[async_trait]
impl TradeStore for InMemoryTradeStore {
    async fn save_trade(&self, trade: &TradeRecord) -> Result<()> {
        self.trades.lock().await.push(trade.clone());
        Ok(())
    }
}

/// Price mirror backed by a vector
#[derive(Debug, Default)]
pub struct InMemoryPriceMirror {
    points: Mutex<Vec<PricePoint>>,
}

impl InMemoryPriceMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn point_count(&self) -> usize {
        self.points.lock().await.len()
    }
}

#[async_trait]
impl PriceMirror for InMemoryPriceMirror {
    async fn save_point(&self, point: &PricePoint) -> Result<()> {
        self.points.lock().await.push(point.clone());
        Ok(())
    }

    async fn points_since(&self, symbol: &str, start_ms: i64) -> Result<Vec<PricePoint>> {
        let mut points: Vec<PricePoint> = self
            .points
            .lock()
            .await
            .iter()
            .filter(|p| p.symbol == symbol && p.timestamp_ms >= start_ms)
            .cloned()
            .collect();
        points.sort_by_key(|p| p.timestamp_ms);
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::{Side, TradeSource};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_trade_store_keeps_order() {
        let store = InMemoryTradeStore::new();
        for side in [Side::Buy, Side::Sell] {
            store
                .save_trade(&TradeRecord {
                    symbol: "ETHUSDT".to_string(),
                    side,
                    quantity: dec!(0.01),
                    price: dec!(3000),
                    timestamp_ms: 1,
                    order_id: None,
                    source: TradeSource::Strategy,
                    owner_id: None,
                })
                .await
                .unwrap();
        }

        let sides: Vec<Side> = store.trades().await.iter().map(|t| t.side).collect();
        assert_eq!(sides, vec![Side::Buy, Side::Sell]);
    }

    #[tokio::test]
    async fn test_mirror_filters_and_sorts() {
        let mirror = InMemoryPriceMirror::new();
        mirror.save_point(&PricePoint::new("ETHUSDT", 300, dec!(3))).await.unwrap();
        mirror.save_point(&PricePoint::new("ETHUSDT", 100, dec!(1))).await.unwrap();
        mirror.save_point(&PricePoint::new("BTCUSDT", 200, dec!(2))).await.unwrap();
        mirror.save_point(&PricePoint::new("ETHUSDT", 50, dec!(0.5))).await.unwrap();

        let points = mirror.points_since("ETHUSDT", 100).await.unwrap();
        let stamps: Vec<i64> = points.iter().map(|p| p.timestamp_ms).collect();
        assert_eq!(stamps, vec![100, 300]);
        assert_eq!(mirror.point_count().await, 4);
    }
}
