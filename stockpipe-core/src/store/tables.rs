//! The pipeline's tables and their record builders.

use super::schema::{ColumnDef, ColumnType, TableSchema};
use super::table_store::{InsertOutcome, InsertSummary, TableStore};
use super::value::Row;
use super::StoreError;
use crate::domain::Bar;
use crate::row;

pub const STOCK_DATA: &str = "stock_data";
pub const STOCK_AI_SUMMARY: &str = "stock_ai_summary";

/// Longest summary `stock_ai_summary` accepts.
pub const AI_SUMMARY_MAX_LEN: usize = 4500;

/// Hourly/daily bars, one row per `(symbol, timestamp)`.
pub fn stock_data_schema() -> TableSchema {
    let price = || ColumnType::decimal(12, 4);
    TableSchema::new(STOCK_DATA)
        .column(ColumnDef::new("id", ColumnType::Serial).primary_key())
        .column(ColumnDef::new("symbol", ColumnType::varchar(10)).not_null())
        .column(ColumnDef::new("timestamp", ColumnType::TimestampTz).not_null())
        .column(ColumnDef::new("open", price()).not_null())
        .column(ColumnDef::new("high", price()).not_null())
        .column(ColumnDef::new("low", price()).not_null())
        .column(ColumnDef::new("close", price()).not_null())
        .column(ColumnDef::new("volume", ColumnType::BigInt).not_null())
        .column(ColumnDef::new("last_updated", ColumnType::TimestampTz).default_now())
        .unique_key(["symbol", "timestamp"])
}

/// Latest model-written summary per symbol.
pub fn stock_ai_summary_schema() -> TableSchema {
    TableSchema::new(STOCK_AI_SUMMARY)
        .column(ColumnDef::new("id", ColumnType::Serial).primary_key())
        .column(
            ColumnDef::new("symbol", ColumnType::varchar(10))
                .not_null()
                .unique(),
        )
        .column(ColumnDef::new(
            "ai_summary",
            ColumnType::varchar(AI_SUMMARY_MAX_LEN),
        ))
        .column(ColumnDef::new("last_updated", ColumnType::Timestamp).default_now())
}

/// Create any missing pipeline table. Returns the names that were created.
pub fn init_pipeline_tables(store: &TableStore) -> Result<Vec<String>, StoreError> {
    let mut created = Vec::new();
    for schema in [stock_data_schema(), stock_ai_summary_schema()] {
        if store.create_if_missing(&schema)? {
            created.push(schema.name.clone());
        }
    }
    Ok(created)
}

pub fn bar_record(bar: &Bar) -> Row {
    row! {
        "symbol" => bar.symbol.as_str(),
        "timestamp" => bar.timestamp,
        "open" => bar.open,
        "high" => bar.high,
        "low" => bar.low,
        "close" => bar.close,
        // BIGINT is signed; volumes beyond i64 saturate.
        "volume" => i64::try_from(bar.volume).unwrap_or(i64::MAX),
    }
}

/// Upsert bars into `stock_data` in one write.
pub fn insert_bars(store: &TableStore, bars: &[Bar]) -> Result<InsertSummary, StoreError> {
    if bars.is_empty() {
        return Ok(InsertSummary::default());
    }
    store.insert_many(STOCK_DATA, bars.iter().map(bar_record).collect())
}

/// Upsert the summary for `symbol`, truncated to the column limit.
pub fn upsert_summary(
    store: &TableStore,
    symbol: &str,
    summary: &str,
) -> Result<InsertOutcome, StoreError> {
    let text: String = summary.chars().take(AI_SUMMARY_MAX_LEN).collect();
    store.insert(
        STOCK_AI_SUMMARY,
        row! { "symbol" => symbol, "ai_summary" => text },
    )
}
