//! Ticker universe for batch loads.

use serde::{Deserialize, Serialize};

/// Large-cap US equities loaded when no tickers are configured.
pub const DEFAULT_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "AVGO", "TSLA", "BRK.B", "JPM",
    "LLY", "V", "UNH", "XOM", "MA", "JNJ", "PG", "COST", "HD", "ABBV",
    "MRK", "WMT", "NFLX", "CRM", "BAC", "KO", "CVX", "PEP", "AMD", "ORCL",
    "ADBE", "TMO", "LIN", "MCD", "ACN", "CSCO", "ABT", "WFC", "DIS", "INTU",
    "QCOM", "TXN", "IBM", "CAT", "GE", "AMGN", "PFE", "NOW", "SPGI", "UBER",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    tickers: Vec<String>,
}

impl Universe {
    /// Build from a list, upper-casing and dropping blanks and repeats
    /// (first occurrence wins).
    pub fn new<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for t in tickers {
            let t = t.as_ref().trim().to_ascii_uppercase();
            if !t.is_empty() && !out.contains(&t) {
                out.push(t);
            }
        }
        Self { tickers: out }
    }

    pub fn default_us() -> Self {
        Self::new(DEFAULT_TICKERS.iter().copied())
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Every `step`-th ticker starting with the first. A step of 0 is taken as 1.
    pub fn stride(&self, step: usize) -> Vec<&str> {
        self.tickers
            .iter()
            .step_by(step.max(1))
            .map(|t| t.as_str())
            .collect()
    }
}
