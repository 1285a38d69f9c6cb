//! REST API client for Binance spot

use async_trait::async_trait;
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::auth::{signed_query, API_KEY_HEADER};
use super::messages::*;
use crate::common::errors::{Result, TraderError};
use crate::common::traits::{ExchangeClient, HistorySource};
use crate::common::types::{now_millis, CandleInterval, OrderFill, PricePoint, Side};
use crate::config::types::{ApiCredentials, ExchangeConfig};

/// Maximum candles returned by one kline request
const KLINE_LIMIT: u32 = 1000;

/// Symbols offered when exchange info cannot be fetched
pub const FALLBACK_SYMBOLS: [&str; 5] = ["ETHUSDT", "BTCUSDT", "SOLUSDT", "ADAUSDT", "AVAXUSDT"];

/// REST API client for Binance spot
#[derive(Debug)]
pub struct BinanceClient {
    /// HTTP client
    client: Client,
    /// Base URL for the REST API
    base_url: String,
    /// Optional API credentials for signed endpoints
    credentials: Option<ApiCredentials>,
    /// Simulate order fills instead of sending them
    dry_run: AtomicBool,
}

impl BinanceClient {
    /// Create a new REST client (unauthenticated, dry-run)
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TraderError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
            dry_run: AtomicBool::new(true),
        })
    }

    /// Build a client from configuration
    pub fn from_config(config: &ExchangeConfig, timeout: Duration) -> Result<Self> {
        let client = Self::with_timeout(&config.base_url, timeout)?.with_dry_run(config.dry_run);

        Ok(match config.credentials() {
            Some(creds) => client.with_credentials(creds),
            None => client,
        })
    }

    /// Set API credentials for signed requests
    pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_dry_run(self, dry_run: bool) -> Self {
        self.dry_run.store(dry_run, Ordering::SeqCst);
        self
    }

    /// Toggle simulated order execution at runtime
    pub fn set_dry_run(&self, dry_run: bool) {
        info!("Dry-run mode set to {}", dry_run);
        self.dry_run.store(dry_run, Ordering::SeqCst);
    }

    /// Get the latest price for a symbol
    #[instrument(skip(self))]
    pub async fn ticker_price(&self, symbol: &str) -> Result<Decimal> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);
        debug!("Fetching price from: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let ticker: TickerPriceResponse = response.json().await?;
        ticker
            .price
            .parse()
            .map_err(|e| TraderError::InvalidResponse(format!("Invalid price: {}", e)))
    }

    /// Send a signed MARKET order to the venue
    #[instrument(skip(self))]
    pub async fn new_market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
    ) -> Result<OrderFill> {
        let creds = self.credentials.as_ref().ok_or_else(|| {
            TraderError::Authentication("API credentials required for live orders".to_string())
        })?;

        let params = format!(
            "symbol={}&side={}&type=MARKET&quantity={}&newOrderRespType=FULL",
            symbol,
            side.as_str(),
            quantity.normalize()
        );
        let query = signed_query(&creds.api_secret, &params, now_millis())?;
        let url = format!("{}/api/v3/order?{}", self.base_url, query);
        debug!("Placing {} MARKET order for {} {}", side, quantity, symbol);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &creds.api_key)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let order: NewOrderResponse = response.json().await?;
        info!("Order {} for {} accepted: {:?}", order.order_id, symbol, order.status);

        Ok(OrderFill {
            symbol: order.symbol.clone(),
            side,
            quantity,
            price: Self::average_fill_price(&order),
            order_id: Some(order.order_id.to_string()),
            timestamp_ms: order.transact_time.unwrap_or_else(now_millis),
            dry_run: false,
        })
    }

    /// Fetch close prices per candle
    #[instrument(skip(self))]
    pub async fn klines(
        &self,
        symbol: &str,
        interval: CandleInterval,
        start_ms: i64,
    ) -> Result<Vec<PricePoint>> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let start = start_ms.to_string();
        let limit = KLINE_LIMIT.to_string();
        debug!("Fetching {} klines for {} from: {}", interval, symbol, url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval.as_str()),
                ("startTime", start.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let rows: Vec<KlineRow> = response.json().await?;
        rows.iter()
            .map(|row| Self::convert_kline(symbol, row))
            .collect()
    }

    /// List tradeable symbols, falling back to a fixed list on failure
    #[instrument(skip(self))]
    pub async fn symbols(&self) -> Vec<String> {
        match self.fetch_exchange_info().await {
            Ok(symbols) if !symbols.is_empty() => symbols,
            Ok(_) => FALLBACK_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            Err(e) => {
                warn!("Failed to fetch exchange info, using fallback symbols: {}", e);
                FALLBACK_SYMBOLS.iter().map(|s| s.to_string()).collect()
            }
        }
    }

    async fn fetch_exchange_info(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/v3/exchangeInfo", self.base_url);
        let response = self.client.get(&url).send().await?;
        let response = Self::check_status(response).await?;

        let info: ExchangeInfoResponse = response.json().await?;
        Ok(info.symbols.into_iter().map(|s| s.symbol).collect())
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    /// Turn a non-success status into an error carrying the venue's message
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_error) => format!("code {}: {}", api_error.code, api_error.msg),
            Err(_) => body,
        };

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(TraderError::Authentication(format!(
                "Server returned status {}: {}",
                status, detail
            )));
        }

        Err(TraderError::InvalidResponse(format!(
            "Server returned status {}: {}",
            status, detail
        )))
    }

    /// Average execution price from the quote total, or the first fill
    fn average_fill_price(order: &NewOrderResponse) -> Option<Decimal> {
        let executed = order
            .executed_qty
            .as_deref()
            .and_then(|q| q.parse::<Decimal>().ok());
        let quote = order
            .cummulative_quote_qty
            .as_deref()
            .and_then(|q| q.parse::<Decimal>().ok());

        match (executed, quote) {
            (Some(executed), Some(quote)) if executed > Decimal::ZERO => Some(quote / executed),
            _ => order
                .fills
                .first()
                .and_then(|fill| fill.price.parse::<Decimal>().ok()),
        }
    }

    fn convert_kline(symbol: &str, row: &KlineRow) -> Result<PricePoint> {
        let open_time = row
            .first()
            .and_then(|v| v.as_i64())
            .ok_or_else(|| TraderError::InvalidResponse("Kline missing open time".to_string()))?;

        let close = match row.get(4) {
            Some(serde_json::Value::String(s)) => s.parse::<Decimal>().ok(),
            Some(serde_json::Value::Number(n)) => n.to_string().parse::<Decimal>().ok(),
            _ => None,
        }
        .ok_or_else(|| TraderError::InvalidResponse("Kline missing close price".to_string()))?;

        Ok(PricePoint::new(symbol, open_time, close))
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn get_price(&self, symbol: &str) -> Result<Decimal> {
        self.ticker_price(symbol).await
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
    ) -> Result<OrderFill> {
        if !self.is_dry_run() {
            return self.new_market_order(symbol, side, quantity).await;
        }

        // Simulate execution at the current market price
        let price = match self.ticker_price(symbol).await {
            Ok(price) => Some(price),
            Err(e) => {
                warn!("Dry-run fill for {} has no price: {}", symbol, e);
                None
            }
        };
        info!("Dry-run {} {} {} at {:?}", side, quantity, symbol, price);

        Ok(OrderFill {
            symbol: symbol.to_string(),
            side,
            quantity,
            price,
            order_id: None,
            timestamp_ms: now_millis(),
            dry_run: true,
        })
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistorySource for BinanceClient {
    async fn fetch_history(
        &self,
        symbol: &str,
        interval: CandleInterval,
        start_ms: i64,
    ) -> Result<Vec<PricePoint>> {
        self.klines(symbol, interval, start_ms).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_client_creation() {
        let client = BinanceClient::new("https://testnet.binance.vision");
        assert!(client.is_ok());
        assert!(client.unwrap().is_dry_run());
    }

    #[test]
    fn test_url_normalization() {
        let client = BinanceClient::new("https://testnet.binance.vision/").unwrap();
        assert!(!client.base_url.ends_with('/'));
    }

    #[test]
    fn test_dry_run_toggle() {
        let client = BinanceClient::new("https://testnet.binance.vision")
            .unwrap()
            .with_dry_run(false);
        assert!(!client.is_dry_run());
        client.set_dry_run(true);
        assert!(client.is_dry_run());
    }

    #[test]
    fn test_average_fill_price_prefers_quote_total() {
        let order: NewOrderResponse = serde_json::from_str(
            r#"{
                "symbol": "ETHUSDT", "orderId": 1,
                "executedQty": "0.02", "cummulativeQuoteQty": "60.20",
                "fills": [{"price": "3000.00", "qty": "0.01"}, {"price": "3020.00", "qty": "0.01"}]
            }"#,
        )
        .unwrap();
        assert_eq!(BinanceClient::average_fill_price(&order), Some(dec!(3010)));
    }

    #[test]
    fn test_average_fill_price_falls_back_to_first_fill() {
        let order: NewOrderResponse = serde_json::from_str(
            r#"{"symbol": "ETHUSDT", "orderId": 1, "executedQty": "0", "fills": [{"price": "2990.5", "qty": "0.01"}]}"#,
        )
        .unwrap();
        assert_eq!(BinanceClient::average_fill_price(&order), Some(dec!(2990.5)));
    }

    #[test]
    fn test_convert_kline() {
        let row: KlineRow = serde_json::from_str(
            r#"[1499040000000, "0.01634790", "0.80000000", "0.01575800", "0.01577100", "148976.11427815", 1499644799999, "2434.19055334", 308, "1756.87402397", "28.46694368", "0"]"#,
        )
        .unwrap();
        let point = BinanceClient::convert_kline("LTCBTC", &row).unwrap();
        assert_eq!(point.timestamp_ms, 1_499_040_000_000);
        assert_eq!(point.price, dec!(0.01577100));
        assert_eq!(point.symbol, "LTCBTC");
    }

    #[test]
    fn test_convert_kline_rejects_short_row() {
        let row: KlineRow = serde_json::from_str(r#"[1499040000000, "1.0"]"#).unwrap();
        assert!(BinanceClient::convert_kline("LTCBTC", &row).is_err());
    }
}
