//! ETL batch: extract bars per symbol, clean, and upsert into `stock_data`.

use crate::data::{process_stock_data, DataError, MarketDataProvider};
use crate::domain::Timeframe;
use crate::store::tables::insert_bars;
use crate::store::TableStore;
use chrono::NaiveDate;

/// Window and interval applied to every symbol in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub timeframe: Timeframe,
}

/// Callbacks for multi-symbol loads.
pub trait LoadProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// `result` carries the number of bars stored for the symbol.
    fn on_complete(&self, symbol: &str, index: usize, total: usize, result: &Result<usize, DataError>);

    fn on_batch_complete(&self, summary: &LoadSummary);
}

/// Reports progress as `tracing` events.
pub struct TracingProgress;

impl LoadProgress for TracingProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        tracing::info!("[{}/{}] processing {symbol}", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, _index: usize, _total: usize, result: &Result<usize, DataError>) {
        match result {
            Ok(n) => tracing::info!(symbol, bars = n, "stored"),
            Err(e) => tracing::warn!(symbol, "failed: {e}"),
        }
    }

    fn on_batch_complete(&self, summary: &LoadSummary) {
        tracing::info!(
            "load complete: {}/{} succeeded, {} failed, {} rows inserted, {} updated",
            summary.succeeded,
            summary.total,
            summary.failed,
            summary.inserted,
            summary.updated
        );
    }
}

#[derive(Debug, Default)]
pub struct LoadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub errors: Vec<(String, DataError)>,
}

impl LoadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Load every symbol into `stock_data`.
///
/// A failing symbol is recorded and the batch moves on. Once the provider
/// stops accepting requests, the remaining symbols fail without being tried.
pub fn load_symbols(
    provider: &dyn MarketDataProvider,
    store: &TableStore,
    symbols: &[&str],
    request: &LoadRequest,
    progress: &dyn LoadProgress,
) -> LoadSummary {
    let mut summary = LoadSummary {
        total: symbols.len(),
        ..LoadSummary::default()
    };

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, summary.total);

        let result = load_single(provider, store, symbol, request, &mut summary);
        progress.on_complete(symbol, i, summary.total, &result);

        match result {
            Ok(_) => summary.succeeded += 1,
            Err(e) => {
                summary.errors.push((symbol.to_string(), e));
                summary.failed += 1;
            }
        }

        if !provider.is_available() {
            for sym in &symbols[(i + 1)..] {
                summary
                    .errors
                    .push((sym.to_string(), DataError::CircuitBreakerTripped));
                summary.failed += 1;
            }
            break;
        }
    }

    progress.on_batch_complete(&summary);
    summary
}

fn load_single(
    provider: &dyn MarketDataProvider,
    store: &TableStore,
    symbol: &str,
    request: &LoadRequest,
    summary: &mut LoadSummary,
) -> Result<usize, DataError> {
    let bars = process_stock_data(provider, symbol, request.start, request.end, request.timeframe)?;
    let written = insert_bars(store, &bars)?;
    summary.inserted += written.inserted;
    summary.updated += written.updated;
    Ok(bars.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BarRequest, RawBar};
    use crate::store::{init_pipeline_tables, STOCK_DATA};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct Scripted {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
        block_after_failure: bool,
        blocked: AtomicBool,
    }

    impl Scripted {
        fn new(fail_on: Option<&'static str>, block_after_failure: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on,
                block_after_failure,
                blocked: AtomicBool::new(false),
            }
        }
    }

    impl MarketDataProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn fetch_bars(&self, symbol: &str, _request: &BarRequest) -> Result<Vec<RawBar>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if Some(symbol) == self.fail_on {
                if self.block_after_failure {
                    self.blocked.store(true, Ordering::SeqCst);
                }
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }
            Ok((14..16)
                .map(|h| RawBar {
                    timestamp: Utc.with_ymd_and_hms(2026, 1, 2, h, 0, 0).unwrap(),
                    open: 10.0,
                    high: 11.0,
                    low: 9.0,
                    close: 10.5,
                    volume: 100,
                    trade_count: None,
                    vwap: None,
                })
                .collect())
        }

        fn is_available(&self) -> bool {
            !self.blocked.load(Ordering::SeqCst)
        }
    }

    struct Silent;

    impl LoadProgress for Silent {
        fn on_start(&self, _: &str, _: usize, _: usize) {}
        fn on_complete(&self, _: &str, _: usize, _: usize, _: &Result<usize, DataError>) {}
        fn on_batch_complete(&self, _: &LoadSummary) {}
    }

    fn request() -> LoadRequest {
        LoadRequest {
            start: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            timeframe: Timeframe::Hour,
        }
    }

    fn store() -> (tempfile::TempDir, TableStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TableStore::open(dir.path()).unwrap();
        init_pipeline_tables(&store).unwrap();
        (dir, store)
    }

    #[test]
    fn failure_is_recorded_and_batch_continues() {
        let (_dir, store) = store();
        let provider = Scripted::new(Some("BAD"), false);

        let summary = load_symbols(&provider, &store, &["AAPL", "BAD", "MSFT"], &request(), &Silent);

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.inserted, 4);
        assert_eq!(summary.errors[0].0, "BAD");
        assert_eq!(store.rows(STOCK_DATA).unwrap().len(), 4);
    }

    #[test]
    fn reload_updates_instead_of_duplicating() {
        let (_dir, store) = store();
        let provider = Scripted::new(None, false);

        load_symbols(&provider, &store, &["AAPL"], &request(), &Silent);
        let again = load_symbols(&provider, &store, &["AAPL"], &request(), &Silent);

        assert_eq!(again.inserted, 0);
        assert_eq!(again.updated, 2);
        assert_eq!(store.rows(STOCK_DATA).unwrap().len(), 2);
    }

    #[test]
    fn blocked_provider_fails_remaining_symbols() {
        let (_dir, store) = store();
        let provider = Scripted::new(Some("BAN"), true);

        let summary = load_symbols(&provider, &store, &["AAPL", "BAN", "MSFT", "NVDA"], &request(), &Silent);

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 3);
        assert!(matches!(
            summary.errors.last().unwrap().1,
            DataError::CircuitBreakerTripped
        ));
        assert!(!summary.all_succeeded());
    }
}
