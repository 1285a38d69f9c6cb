//! Error types for the application

use thiserror::Error;

/// Result type alias using our TraderError
pub type Result<T> = std::result::Result<T, TraderError>;

/// Main error type for engine and client operations
#[derive(Error, Debug)]
pub enum TraderError {
    /// A strategy worker is already alive
    #[error("Strategy already running for {symbol}")]
    AlreadyRunning { symbol: String },

    /// Price or order call failed at the exchange
    #[error("Exchange unavailable: {0}")]
    ExchangeUnavailable(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Remote store write/read failures
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Local price log I/O
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local price log format errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Rejected caller input
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}
