//! Ticker validation against the provider's list of active assets.

use super::alpaca::{build_client, Credentials};
use super::provider::DataError;
use crate::config::AlpacaConfig;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashSet;

/// Source of the symbols a provider currently recognizes.
pub trait AssetDirectory {
    fn active_symbols(&self) -> Result<HashSet<String>, DataError>;
}

#[derive(Debug, Deserialize)]
struct Asset {
    symbol: String,
}

/// Active US equities from the Alpaca trading API.
pub struct AlpacaAssets {
    client: Client,
    credentials: Credentials,
    trading_url: String,
}

impl AlpacaAssets {
    pub fn new(config: &AlpacaConfig, credentials: Credentials) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            credentials,
            trading_url: config.trading_url.trim_end_matches('/').to_string(),
        })
    }
}

impl AssetDirectory for AlpacaAssets {
    fn active_symbols(&self) -> Result<HashSet<String>, DataError> {
        let url = format!("{}/v2/assets", self.trading_url);
        let req = self
            .client
            .get(url)
            .query(&[("status", "active"), ("asset_class", "us_equity")]);
        let resp = self
            .credentials
            .apply(req)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(DataError::AuthenticationRequired(format!(
                "asset listing refused with HTTP {status}"
            )));
        }
        if !status.is_success() {
            return Err(DataError::Other(format!("asset listing failed: HTTP {status}")));
        }

        let assets: Vec<Asset> = resp
            .json()
            .map_err(|e| DataError::ResponseFormatChanged(format!("asset listing: {e}")))?;
        Ok(symbols_of(assets))
    }
}

fn symbols_of(assets: Vec<Asset>) -> HashSet<String> {
    assets.into_iter().map(|a| a.symbol).collect()
}

/// Outcome of checking a ticker list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickerCheck {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

impl TickerCheck {
    pub fn all_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// Split `tickers` into known and unknown symbols, preserving input order.
pub fn validate_tickers<S: AsRef<str>>(tickers: &[S], known: &HashSet<String>) -> TickerCheck {
    let mut check = TickerCheck::default();
    for t in tickers {
        let t = t.as_ref();
        if known.contains(t) {
            check.valid.push(t.to_string());
        } else {
            check.invalid.push(t.to_string());
        }
    }
    check
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn known() -> HashSet<String> {
        ["AAPL", "MSFT", "NVDA"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn partitions_in_input_order() {
        let check = validate_tickers(&["NVDA", "FAKE", "AAPL", "ZZZZ"], &known());
        assert_eq!(check.valid, vec!["NVDA", "AAPL"]);
        assert_eq!(check.invalid, vec!["FAKE", "ZZZZ"]);
        assert!(!check.all_valid());
    }

    #[test]
    fn every_listed_asset_is_known() {
        let assets: Vec<Asset> = serde_json::from_str(
            r#"[{"symbol":"AAPL","tradable":true},{"symbol":"OLD","tradable":false},{"symbol":"MSFT"}]"#,
        )
        .unwrap();
        let symbols = symbols_of(assets);
        assert_eq!(symbols.len(), 3);
        for s in ["AAPL", "OLD", "MSFT"] {
            assert!(symbols.contains(s), "{s} missing");
        }
        assert!(validate_tickers(&["OLD"], &symbols).all_valid());
    }

    proptest! {
        #[test]
        fn every_ticker_lands_on_exactly_one_side(
            tickers in proptest::collection::vec("[A-Z]{1,5}", 0..30)
        ) {
            let known = known();
            let check = validate_tickers(&tickers, &known);
            prop_assert_eq!(check.valid.len() + check.invalid.len(), tickers.len());
            prop_assert!(check.valid.iter().all(|t| known.contains(t)));
            prop_assert!(check.invalid.iter().all(|t| !known.contains(t)));
        }
    }
}
