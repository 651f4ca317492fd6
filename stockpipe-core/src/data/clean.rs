//! Extraction plus cleaning: provider bars in, `Bar`s ready for `stock_data` out.

use super::provider::{BarRequest, DataError, MarketDataProvider, RawBar};
use crate::domain::{Bar, Timeframe};
use chrono::{DateTime, NaiveDate, Utc};

/// UTC midnight at the start of `date`.
pub fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::default()).and_utc()
}

/// Request covering `start` to `end`, both taken as UTC midnight.
pub fn day_window(start: NaiveDate, end: NaiveDate, timeframe: Timeframe) -> BarRequest {
    BarRequest {
        start: utc_midnight(start),
        end: utc_midnight(end),
        timeframe,
    }
}

/// Tag each raw bar with its symbol and drop the provider extras.
pub fn clean_bars(symbol: &str, raw: Vec<RawBar>) -> Vec<Bar> {
    raw.into_iter()
        .map(|r| Bar {
            symbol: symbol.to_string(),
            timestamp: r.timestamp,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            volume: r.volume,
        })
        .collect()
}

/// Fetch and clean the bars of one symbol.
///
/// A symbol with no bars in the window yields an empty vector rather than an
/// error; provider failures propagate.
pub fn process_stock_data(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    timeframe: Timeframe,
) -> Result<Vec<Bar>, DataError> {
    let request = day_window(start, end, timeframe);
    let raw = provider.fetch_bars(symbol, &request)?;
    if raw.is_empty() {
        tracing::info!(symbol, "no data returned");
        return Ok(Vec::new());
    }

    let bars = clean_bars(symbol, raw);
    let insane = bars.iter().filter(|b| !b.is_sane()).count();
    if insane > 0 {
        tracing::warn!(symbol, insane, "bars with inconsistent OHLC values");
    }
    Ok(bars)
}
