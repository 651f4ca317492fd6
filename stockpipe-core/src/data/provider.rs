//! Market data provider trait and structured error types.
//!
//! `MarketDataProvider` abstracts over bar sources so the ETL pipeline can run
//! against Alpaca in production and an in-memory source in tests.

use crate::domain::Timeframe;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bar as delivered by a provider, before cleaning.
///
/// Field names follow the Alpaca wire format (`t`, `o`, `h`, `l`, `c`, `v`,
/// `n`, `vw`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: u64,
    #[serde(rename = "n", default)]
    pub trade_count: Option<u64>,
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
}

/// Time window and interval for a bar request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timeframe: Timeframe,
}

/// Errors from data operations, displayable in the CLI.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("storage error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("data error: {0}")]
    Other(String),
}

/// A source of OHLCV bars.
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch every bar for `symbol` inside the request window, oldest first.
    ///
    /// An empty vector means the provider knows the symbol but has no bars
    /// in the window.
    fn fetch_bars(&self, symbol: &str, request: &BarRequest) -> Result<Vec<RawBar>, DataError>;

    /// False once the provider has stopped accepting requests (rate limit or ban).
    fn is_available(&self) -> bool;
}
