//! Binance REST response types

use serde::{Deserialize, Serialize};

/// `GET /api/v3/ticker/price` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerPriceResponse {
    pub symbol: String,
    pub price: String,
}

/// `POST /api/v3/order` response (FULL or RESULT response type)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderResponse {
    pub symbol: String,
    pub order_id: i64,
    #[serde(default)]
    pub client_order_id: Option<String>,
    #[serde(default)]
    pub transact_time: Option<i64>,
    #[serde(default)]
    pub executed_qty: Option<String>,
    /// Binance's own spelling
    #[serde(default)]
    pub cummulative_quote_qty: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub fills: Vec<OrderFillResponse>,
}

/// A single fill inside a FULL order response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFillResponse {
    pub price: String,
    pub qty: String,
    #[serde(default)]
    pub commission: Option<String>,
    #[serde(default)]
    pub commission_asset: Option<String>,
}

/// Error body returned on non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub code: i64,
    pub msg: String,
}

/// `GET /api/v3/exchangeInfo` response (only the fields we read)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeInfoResponse {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// One kline row: `[openTime, open, high, low, close, volume, closeTime, ...]`
pub type KlineRow = Vec<serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_order_response() {
        let json = r#"{
            "symbol": "ETHUSDT",
            "orderId": 28,
            "clientOrderId": "6gCrw2kRUAF9CvJDGP16IP",
            "transactTime": 1507725176595,
            "executedQty": "0.01000000",
            "cummulativeQuoteQty": "29.90000000",
            "status": "FILLED",
            "fills": [
                {"price": "2990.00", "qty": "0.01", "commission": "0.00001", "commissionAsset": "ETH"}
            ]
        }"#;

        let order: NewOrderResponse = serde_json::from_str(json).unwrap();
        assert_eq!(order.order_id, 28);
        assert_eq!(order.executed_qty.as_deref(), Some("0.01000000"));
        assert_eq!(order.fills.len(), 1);
        assert_eq!(order.fills[0].price, "2990.00");
    }

    #[test]
    fn test_parse_ack_order_response() {
        let json = r#"{"symbol": "ETHUSDT", "orderId": 7, "transactTime": 1}"#;
        let order: NewOrderResponse = serde_json::from_str(json).unwrap();
        assert!(order.fills.is_empty());
        assert!(order.cummulative_quote_qty.is_none());
    }
}
