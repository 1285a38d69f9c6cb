//! Request signing for the Binance REST API

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::common::errors::{Result, TraderError};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the API key on signed and keyed endpoints
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Generate the HMAC-SHA256 signature for a query string
///
/// Binance signs the exact `totalParams` string (query string plus body)
/// with the raw secret and expects the digest hex encoded.
///
/// # Arguments
/// * `secret` - API secret key
/// * `query` - URL-encoded parameters, including `timestamp`
pub fn sign_query(secret: &str, query: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| TraderError::Authentication(format!("Failed to create HMAC: {}", e)))?;
    mac.update(query.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Append `timestamp` and `signature` to a parameter string
pub fn signed_query(secret: &str, params: &str, timestamp_ms: i64) -> Result<String> {
    let unsigned = if params.is_empty() {
        format!("timestamp={}", timestamp_ms)
    } else {
        format!("{}&timestamp={}", params, timestamp_ms)
    };
    let signature = sign_query(secret, &unsigned)?;

    Ok(format!("{}&signature={}", unsigned, signature))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_query_matches_published_example() {
        // Worked example from the Binance API documentation
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";

        let signature = sign_query(secret, query).unwrap();
        assert_eq!(
            signature,
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_signed_query_layout() {
        let query = signed_query("secret", "symbol=ETHUSDT", 1_700_000_000_000).unwrap();
        assert!(query.starts_with("symbol=ETHUSDT&timestamp=1700000000000&signature="));
        let signature = query.rsplit('=').next().unwrap();
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_signed_query_without_params() {
        let query = signed_query("secret", "", 42).unwrap();
        assert!(query.starts_with("timestamp=42&signature="));
    }
}
