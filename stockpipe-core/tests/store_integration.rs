//! Integration tests for the table store through the pipeline tables.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashSet;
use stockpipe_core::domain::Bar;
use stockpipe_core::row;
use stockpipe_core::store::tables::insert_bars;
use stockpipe_core::store::{init_pipeline_tables, StoreError, TableStore, Value, STOCK_DATA};

fn bar(symbol: &str, hour: u32, close: f64) -> Bar {
    Bar {
        symbol: symbol.into(),
        timestamp: Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap(),
        open: 100.0,
        high: close.max(100.0) + 1.0,
        low: close.min(100.0) - 1.0,
        close,
        volume: 2_500,
    }
}

fn pipeline_store() -> (tempfile::TempDir, TableStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = TableStore::open(dir.path().join("db")).unwrap();
    init_pipeline_tables(&store).unwrap();
    (dir, store)
}

#[test]
fn data_survives_reopen() {
    let (dir, store) = pipeline_store();
    insert_bars(&store, &[bar("AAPL", 14, 101.23456), bar("AAPL", 15, 102.0)]).unwrap();
    let meta = store.meta(STOCK_DATA).unwrap().unwrap();
    drop(store);

    let reopened = TableStore::open(dir.path().join("db")).unwrap();
    let rows = reopened.rows(STOCK_DATA).unwrap();
    assert_eq!(rows.len(), 2);
    // DECIMAL(12,4)
    assert_eq!(rows[0]["close"], Value::Float(101.2346));
    assert_eq!(rows[0]["symbol"].as_str(), Some("AAPL"));
    assert!(rows[0]["last_updated"].as_timestamp().is_some());
    assert_eq!(reopened.meta(STOCK_DATA).unwrap().unwrap(), meta);
    assert_eq!(meta.row_count, 2);
}

#[test]
fn content_hash_tracks_changes() {
    let (_dir, store) = pipeline_store();
    insert_bars(&store, &[bar("MSFT", 14, 400.0)]).unwrap();
    let before = store.meta(STOCK_DATA).unwrap().unwrap().data_hash;

    insert_bars(&store, &[bar("MSFT", 14, 401.0)]).unwrap();
    let after = store.meta(STOCK_DATA).unwrap().unwrap().data_hash;

    assert_ne!(before, after);
}

#[test]
fn rejected_record_leaves_table_unchanged() {
    let (_dir, store) = pipeline_store();
    insert_bars(&store, &[bar("NVDA", 14, 120.0)]).unwrap();
    let before = store.rows(STOCK_DATA).unwrap();

    let err = store
        .insert(
            STOCK_DATA,
            row! {
                "symbol" => "TOOLONGSYMBOL",
                "timestamp" => Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap(),
                "open" => 1.0, "high" => 1.0, "low" => 1.0, "close" => 1.0,
                "volume" => 1i64,
            },
        )
        .unwrap_err();

    assert!(matches!(err, StoreError::ValueTooLong { .. }));
    assert_eq!(store.rows(STOCK_DATA).unwrap(), before);
}

#[test]
fn dropped_table_can_be_recreated() {
    let (_dir, store) = pipeline_store();
    insert_bars(&store, &[bar("AMD", 14, 150.0)]).unwrap();

    assert!(store.delete_table(STOCK_DATA).unwrap());
    assert!(!store.delete_table(STOCK_DATA).unwrap());
    assert!(matches!(store.rows(STOCK_DATA), Err(StoreError::NoSuchTable(_))));

    assert_eq!(init_pipeline_tables(&store).unwrap(), vec![STOCK_DATA]);
    assert!(store.rows(STOCK_DATA).unwrap().is_empty());
    assert_eq!(store.delete_all_tables().unwrap(), 2);
    assert!(store.list_tables().unwrap().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// One row per (symbol, timestamp) no matter how often a bar is loaded.
    #[test]
    fn upsert_keeps_one_row_per_key(
        entries in prop::collection::vec((0usize..3, 0u32..6, 50.0..150.0_f64), 1..20)
    ) {
        let symbols = ["AAPL", "MSFT", "GOOGL"];
        let (_dir, store) = pipeline_store();

        let mut distinct = HashSet::new();
        for (s, h, close) in &entries {
            insert_bars(&store, &[bar(symbols[*s], *h, *close)]).unwrap();
            distinct.insert((*s, *h));
        }

        let rows = store.rows(STOCK_DATA).unwrap();
        prop_assert_eq!(rows.len(), distinct.len());

        let ids: HashSet<i64> = rows.iter().filter_map(|r| r["id"].as_i64()).collect();
        prop_assert_eq!(ids.len(), rows.len());
    }
}
