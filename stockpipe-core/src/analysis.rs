//! Per-symbol aggregates over `stock_data`.

use crate::store::{StoreError, TableStore, STOCK_DATA};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("aggregation failed: {0}")]
    Frame(#[from] PolarsError),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolAverages {
    pub symbol: String,
    pub bar_count: u64,
    pub avg_open: f64,
    pub avg_close: f64,
    pub avg_volume: f64,
}

/// Mean open, close and volume per symbol, ordered by symbol.
pub fn symbol_averages(store: &TableStore) -> Result<Vec<SymbolAverages>, AnalysisError> {
    let df = store.frame(STOCK_DATA)?;
    if df.height() == 0 {
        return Ok(Vec::new());
    }

    let out = df
        .lazy()
        .group_by([col("symbol")])
        .agg([
            col("close").count().alias("bar_count"),
            col("open").mean().alias("avg_open"),
            col("close").mean().alias("avg_close"),
            col("volume").cast(DataType::Float64).mean().alias("avg_volume"),
        ])
        .sort(["symbol"], SortMultipleOptions::default())
        .collect()?;

    let symbols = out.column("symbol")?.str()?;
    let counts = out.column("bar_count")?.cast(&DataType::UInt64)?;
    let counts = counts.u64()?;
    let opens = out.column("avg_open")?.f64()?;
    let closes = out.column("avg_close")?.f64()?;
    let volumes = out.column("avg_volume")?.f64()?;

    let mut rows = Vec::with_capacity(out.height());
    for i in 0..out.height() {
        let Some(symbol) = symbols.get(i) else {
            continue;
        };
        rows.push(SymbolAverages {
            symbol: symbol.to_string(),
            bar_count: counts.get(i).unwrap_or(0),
            avg_open: opens.get(i).unwrap_or(f64::NAN),
            avg_close: closes.get(i).unwrap_or(f64::NAN),
            avg_volume: volumes.get(i).unwrap_or(f64::NAN),
        });
    }
    Ok(rows)
}

/// Averages for one symbol, if it has any bars.
pub fn averages_for(
    store: &TableStore,
    symbol: &str,
) -> Result<Option<SymbolAverages>, AnalysisError> {
    Ok(symbol_averages(store)?
        .into_iter()
        .find(|a| a.symbol == symbol))
}

pub fn write_averages_csv<W: Write>(
    rows: &[SymbolAverages],
    writer: W,
) -> Result<(), AnalysisError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
