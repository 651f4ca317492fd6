//! Alpaca market data provider.
//!
//! Pulls bars from the v2 stock bars endpoint, following `next_page_token`
//! until the window is exhausted. Handles retries with exponential backoff,
//! rate limiting, and the circuit breaker.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{BarRequest, DataError, MarketDataProvider, RawBar};
use crate::config::{AlpacaConfig, PipelineConfig, ALPACA_KEY, ALPACA_SECRET};
use chrono::SecondsFormat;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Largest page the bars endpoint serves.
const PAGE_LIMIT: &str = "10000";

/// API key pair sent as `APCA-API-KEY-ID` / `APCA-API-SECRET-KEY`.
#[derive(Clone)]
pub struct Credentials {
    pub key_id: String,
    pub secret: String,
}

impl Credentials {
    /// Resolve `ALPACA_KEY` and `ALPACA_SECRET` through the config's secret lookup.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, crate::config::ConfigError> {
        Ok(Self {
            key_id: config.secret(ALPACA_KEY)?,
            secret: config.secret(ALPACA_SECRET)?,
        })
    }

    pub(crate) fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("APCA-API-KEY-ID", &self.key_id)
            .header("APCA-API-SECRET-KEY", &self.secret)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &self.key_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, DataError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("stockpipe/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))
}

/// One page of the multi-symbol bars response.
#[derive(Debug, Deserialize)]
pub(crate) struct BarsPage {
    #[serde(default)]
    bars: Option<HashMap<String, Vec<RawBar>>>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

impl BarsPage {
    /// Take the bars for `symbol` out of the page. Missing means none.
    fn take(&mut self, symbol: &str) -> Vec<RawBar> {
        self.bars
            .as_mut()
            .and_then(|m| m.remove(symbol))
            .unwrap_or_default()
    }
}

pub struct AlpacaProvider {
    client: Client,
    credentials: Credentials,
    circuit_breaker: Arc<CircuitBreaker>,
    data_url: String,
    feed: String,
    max_retries: u32,
    base_delay: Duration,
}

impl AlpacaProvider {
    pub fn new(
        config: &AlpacaConfig,
        credentials: Credentials,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            credentials,
            circuit_breaker,
            data_url: config.data_url.trim_end_matches('/').to_string(),
            feed: config.feed.clone(),
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(500),
        })
    }

    fn bars_url(&self) -> String {
        format!("{}/v2/stocks/bars", self.data_url)
    }

    fn page_query(
        &self,
        symbol: &str,
        request: &BarRequest,
        page_token: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("symbols", symbol.to_string()),
            ("timeframe", request.timeframe.as_alpaca().to_string()),
            (
                "start",
                request.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("end", request.end.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("limit", PAGE_LIMIT.to_string()),
            ("adjustment", "raw".to_string()),
            ("feed", self.feed.clone()),
        ];
        if let Some(token) = page_token {
            query.push(("page_token", token.to_string()));
        }
        query
    }

    /// Fetch one page, retrying transient failures.
    fn fetch_page(
        &self,
        symbol: &str,
        request: &BarRequest,
        page_token: Option<&str>,
    ) -> Result<BarsPage, DataError> {
        let query = self.page_query(symbol, request, page_token);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(symbol, attempt, ?delay, "retrying bars request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let req = self.credentials.apply(self.client.get(self.bars_url()).query(&query));
            match req.send() {
                Ok(resp) => match self.classify(symbol, resp) {
                    Ok(page) => {
                        self.circuit_breaker.record_success();
                        return Ok(page);
                    }
                    Err(Retry::Again(e)) => last_error = Some(e),
                    Err(Retry::Stop(e)) => return Err(e),
                },
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }

    fn classify(&self, symbol: &str, resp: Response) -> Result<BarsPage, Retry> {
        let status = resp.status();

        if status == StatusCode::FORBIDDEN {
            self.circuit_breaker.trip();
            return Err(Retry::Stop(DataError::CircuitBreakerTripped));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            self.circuit_breaker.record_failure();
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(Retry::Again(DataError::RateLimited {
                retry_after_secs: retry_after,
            }));
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(Retry::Stop(DataError::AuthenticationRequired(
                "Alpaca rejected the API key pair".into(),
            )));
        }
        if status == StatusCode::NOT_FOUND || status == StatusCode::UNPROCESSABLE_ENTITY {
            let message = resp
                .json::<ApiErrorBody>()
                .map(|b| b.message)
                .unwrap_or_default();
            tracing::debug!(symbol, %status, message = %message, "provider rejected symbol");
            return Err(Retry::Stop(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }));
        }
        if !status.is_success() {
            self.circuit_breaker.record_failure();
            return Err(Retry::Again(DataError::Other(format!(
                "HTTP {status} for {symbol}"
            ))));
        }

        resp.json::<BarsPage>().map_err(|e| {
            Retry::Stop(DataError::ResponseFormatChanged(format!(
                "failed to parse bars for {symbol}: {e}"
            )))
        })
    }
}

enum Retry {
    Again(DataError),
    Stop(DataError),
}

impl MarketDataProvider for AlpacaProvider {
    fn name(&self) -> &str {
        "alpaca"
    }

    fn fetch_bars(&self, symbol: &str, request: &BarRequest) -> Result<Vec<RawBar>, DataError> {
        if request.start > request.end {
            return Err(DataError::InvalidRequest(format!(
                "start {} is after end {}",
                request.start, request.end
            )));
        }

        let mut bars = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let mut page = self.fetch_page(symbol, request, token.as_deref())?;
            bars.extend(page.take(symbol));
            match page.next_page_token.take() {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => break,
            }
        }

        bars.sort_by_key(|b| b.timestamp);
        tracing::debug!(symbol, count = bars.len(), "fetched bars");
        Ok(bars)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
