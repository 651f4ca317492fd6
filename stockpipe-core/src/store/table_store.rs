//! Parquet-backed table store.
//!
//! Layout: `{root}/table={NAME}/`
//! - `schema.json`: the [`TableSchema`]
//! - `data.parquet`: all rows (absent while the table is empty)
//! - `meta.json`: row count, content hash, last write time
//!
//! Every write rewrites the table atomically (write `.tmp`, rename into
//! place), so a rejected batch leaves the previous contents untouched.

use super::schema::{validate_name, ColumnType, TableSchema};
use super::value::{Row, Value};
use super::StoreError;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const SCHEMA_FILE: &str = "schema.json";
const DATA_FILE: &str = "data.parquet";
const META_FILE: &str = "meta.json";

/// Sidecar describing the last write to a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    pub table: String,
    pub row_count: usize,
    pub data_hash: String,
    pub updated_at: DateTime<Utc>,
}

/// What happened to a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Replaced the row it collided with on a unique key.
    Updated,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    pub inserted: usize,
    pub updated: usize,
}

impl InsertSummary {
    fn record(&mut self, outcome: InsertOutcome) {
        match outcome {
            InsertOutcome::Inserted => self.inserted += 1,
            InsertOutcome::Updated => self.updated += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableStore {
    root: PathBuf,
}

impl TableStore {
    /// Open the store at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        tracing::debug!(root = %root.display(), "table store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True while the store root is still a reachable directory.
    pub fn is_connected(&self) -> bool {
        self.root.is_dir()
    }

    fn ensure_connected(&self) -> Result<(), StoreError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(StoreError::NotConnected(self.root.display().to_string()))
        }
    }

    fn table_dir(&self, name: &str) -> PathBuf {
        self.root.join(format!("table={name}"))
    }

    pub fn has_table(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.table_dir(name).join(SCHEMA_FILE).is_file()
    }

    /// Names of all tables, sorted.
    pub fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        self.ensure_connected()?;
        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            if let Some(name) = file_name.strip_prefix("table=") {
                if self.has_table(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn schema(&self, name: &str) -> Result<TableSchema, StoreError> {
        validate_name(name)?;
        let path = self.table_dir(name).join(SCHEMA_FILE);
        let content = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NoSuchTable(name.to_string())
            } else {
                StoreError::io(&path, e)
            }
        })?;
        serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))
    }

    /// Create a table. Fails with `TableExists` if it is already there.
    pub fn create_table(&self, schema: &TableSchema) -> Result<(), StoreError> {
        self.ensure_connected()?;
        schema.validate()?;
        if self.has_table(&schema.name) {
            return Err(StoreError::TableExists(schema.name.clone()));
        }

        let dir = self.table_dir(&schema.name);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        let json = serde_json::to_vec_pretty(schema)
            .map_err(|e| StoreError::Corrupt(format!("schema serialization: {e}")))?;
        write_atomic(&dir.join(SCHEMA_FILE), &json)?;
        self.write_meta(&schema.name, &[])?;

        tracing::info!(table = %schema.name, "table created");
        Ok(())
    }

    /// Create the table unless it exists. Returns whether it was created.
    pub fn create_if_missing(&self, schema: &TableSchema) -> Result<bool, StoreError> {
        if self.has_table(&schema.name) {
            return Ok(false);
        }
        self.create_table(schema)?;
        Ok(true)
    }

    /// Drop a table if it exists. Returns whether it existed.
    pub fn delete_table(&self, name: &str) -> Result<bool, StoreError> {
        self.ensure_connected()?;
        validate_name(name)?;
        let dir = self.table_dir(name);
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        tracing::info!(table = name, "table deleted");
        Ok(true)
    }

    /// Drop every table. Returns how many were dropped.
    pub fn delete_all_tables(&self) -> Result<usize, StoreError> {
        let names = self.list_tables()?;
        for name in &names {
            self.delete_table(name)?;
        }
        Ok(names.len())
    }

    pub fn insert(&self, table: &str, record: Row) -> Result<InsertOutcome, StoreError> {
        let summary = self.insert_many(table, vec![record])?;
        Ok(if summary.updated > 0 {
            InsertOutcome::Updated
        } else {
            InsertOutcome::Inserted
        })
    }

    /// Insert or upsert a batch of records in one write.
    ///
    /// Either every record is applied or, on the first invalid record, none
    /// are. Later records in the batch see the earlier ones.
    pub fn insert_many(&self, table: &str, records: Vec<Row>) -> Result<InsertSummary, StoreError> {
        self.ensure_connected()?;
        let schema = self.schema(table)?;
        let mut rows = self.load_rows(&schema)?;
        let keys = schema.conflict_keys();
        let now = Utc::now();

        let mut index = KeyIndex::build(&keys, &rows);
        let mut serials = SerialCounter::new(&schema, &rows);
        let mut summary = InsertSummary::default();

        for record in records {
            let mut prepared = prepare(&schema, record, now)?;

            match index.find(&schema.name, &prepared)? {
                Some(pos) => {
                    for col in schema.columns.iter().filter(|c| c.ty == ColumnType::Serial) {
                        if prepared.get(&col.name).map_or(true, Value::is_null) {
                            let old = rows[pos].get(&col.name).cloned().unwrap_or(Value::Null);
                            prepared.insert(col.name.clone(), old);
                        }
                    }
                    serials.observe(&prepared);
                    index.remove(&rows[pos]);
                    rows[pos] = prepared;
                    index.add(&rows[pos], pos);
                    summary.record(InsertOutcome::Updated);
                }
                None => {
                    serials.assign(&mut prepared);
                    let pos = rows.len();
                    rows.push(prepared);
                    index.add(&rows[pos], pos);
                    summary.record(InsertOutcome::Inserted);
                }
            }
        }

        self.write_rows(&schema, &rows)?;
        tracing::debug!(
            table,
            inserted = summary.inserted,
            updated = summary.updated,
            "batch written"
        );
        Ok(summary)
    }

    /// All rows, in insertion order. Every schema column is present.
    pub fn rows(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        let schema = self.schema(table)?;
        self.load_rows(&schema)
    }

    /// The table as a DataFrame. Timestamp columns hold microseconds since
    /// the Unix epoch.
    pub fn frame(&self, table: &str) -> Result<DataFrame, StoreError> {
        let schema = self.schema(table)?;
        let path = self.table_dir(table).join(DATA_FILE);
        if !path.exists() {
            return rows_to_frame(&schema, &[]);
        }
        read_parquet(&path)
    }

    pub fn meta(&self, table: &str) -> Result<Option<TableMeta>, StoreError> {
        validate_name(table)?;
        let path = self.table_dir(table).join(META_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    fn load_rows(&self, schema: &TableSchema) -> Result<Vec<Row>, StoreError> {
        let path = self.table_dir(&schema.name).join(DATA_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let df = read_parquet(&path)?;
        frame_to_rows(schema, &df)
    }

    fn write_rows(&self, schema: &TableSchema, rows: &[Row]) -> Result<(), StoreError> {
        let path = self.table_dir(&schema.name).join(DATA_FILE);
        if rows.is_empty() {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
            }
        } else {
            let mut df = rows_to_frame(schema, rows)?;
            let tmp = path.with_extension("parquet.tmp");
            let file = fs::File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
            if let Err(e) = ParquetWriter::new(file).finish(&mut df) {
                let _ = fs::remove_file(&tmp);
                return Err(StoreError::Parquet(format!("write {}: {e}", path.display())));
            }
            fs::rename(&tmp, &path).map_err(|e| {
                let _ = fs::remove_file(&tmp);
                StoreError::io(&path, e)
            })?;
        }
        self.write_meta(&schema.name, rows)
    }

    fn write_meta(&self, table: &str, rows: &[Row]) -> Result<(), StoreError> {
        let payload = serde_json::to_vec(rows)
            .map_err(|e| StoreError::Corrupt(format!("hash serialization: {e}")))?;
        let meta = TableMeta {
            table: table.to_string(),
            row_count: rows.len(),
            data_hash: blake3::hash(&payload).to_hex().to_string(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&meta)
            .map_err(|e| StoreError::Corrupt(format!("meta serialization: {e}")))?;
        write_atomic(&self.table_dir(table).join(META_FILE), &json)
    }
}

/// Validate a record against the schema: reject unknown columns, coerce
/// values, fill `DEFAULT CURRENT_TIMESTAMP` columns. Serial columns left out
/// stay null until assigned.
fn prepare(schema: &TableSchema, mut record: Row, now: DateTime<Utc>) -> Result<Row, StoreError> {
    if let Some(unknown) = record.keys().find(|k| schema.get(k).is_none()) {
        return Err(StoreError::UnknownColumn {
            table: schema.name.clone(),
            column: unknown.clone(),
        });
    }

    let mut out = Row::new();
    for col in &schema.columns {
        let value = record.remove(&col.name).unwrap_or(Value::Null);
        let value = if value.is_null() && col.default_now {
            Value::Timestamp(now)
        } else {
            value
        };
        let value = if value.is_null() && col.ty == ColumnType::Serial {
            Value::Null
        } else {
            col.coerce(&schema.name, value)?
        };
        out.insert(col.name.clone(), value);
    }
    Ok(out)
}

/// Lookup from unique-key values to row position, one map per key.
struct KeyIndex {
    keys: Vec<Vec<String>>,
    maps: Vec<HashMap<String, usize>>,
}

impl KeyIndex {
    fn build(keys: &[Vec<&str>], rows: &[Row]) -> Self {
        let mut index = Self {
            keys: keys
                .iter()
                .map(|k| k.iter().map(|s| s.to_string()).collect())
                .collect(),
            maps: vec![HashMap::new(); keys.len()],
        };
        for (pos, row) in rows.iter().enumerate() {
            index.add(row, pos);
        }
        index
    }

    /// Key values rendered as a lookup string; `None` if any part is null,
    /// since nulls never collide.
    fn repr(key: &[String], row: &Row) -> Option<String> {
        let mut parts = Vec::with_capacity(key.len());
        for col in key {
            match row.get(col) {
                Some(v) if !v.is_null() => parts.push(format!("{v:?}")),
                _ => return None,
            }
        }
        Some(parts.join("\u{1f}"))
    }

    fn add(&mut self, row: &Row, pos: usize) {
        for (key, map) in self.keys.iter().zip(self.maps.iter_mut()) {
            if let Some(r) = Self::repr(key, row) {
                map.insert(r, pos);
            }
        }
    }

    fn remove(&mut self, row: &Row) {
        for (key, map) in self.keys.iter().zip(self.maps.iter_mut()) {
            if let Some(r) = Self::repr(key, row) {
                map.remove(&r);
            }
        }
    }

    /// The single row `record` collides with, if any. Colliding with two
    /// different rows through different keys is an error.
    fn find(&self, table: &str, record: &Row) -> Result<Option<usize>, StoreError> {
        let mut hit = None;
        for (key, map) in self.keys.iter().zip(self.maps.iter()) {
            let Some(pos) = Self::repr(key, record).and_then(|r| map.get(&r).copied()) else {
                continue;
            };
            match hit {
                None => hit = Some(pos),
                Some(prev) if prev == pos => {}
                Some(_) => return Err(StoreError::AmbiguousConflict(table.to_string())),
            }
        }
        Ok(hit)
    }
}

/// Next value per `SERIAL` column.
struct SerialCounter {
    next: Vec<(String, i64)>,
}

impl SerialCounter {
    fn new(schema: &TableSchema, rows: &[Row]) -> Self {
        let next = schema
            .columns
            .iter()
            .filter(|c| c.ty == ColumnType::Serial)
            .map(|c| {
                let max = rows
                    .iter()
                    .filter_map(|r| r.get(&c.name).and_then(Value::as_i64))
                    .max()
                    .unwrap_or(0);
                (c.name.clone(), max + 1)
            })
            .collect();
        Self { next }
    }

    /// Advance past any serial value `record` already carries.
    fn observe(&mut self, record: &Row) {
        for (name, next) in &mut self.next {
            if let Some(v) = record.get(name.as_str()).and_then(Value::as_i64) {
                *next = (*next).max(v + 1);
            }
        }
    }

    fn assign(&mut self, record: &mut Row) {
        for (name, next) in &mut self.next {
            match record.get(name.as_str()).and_then(Value::as_i64) {
                Some(explicit) => *next = (*next).max(explicit + 1),
                None => {
                    record.insert(name.clone(), Value::Int(*next));
                    *next += 1;
                }
            }
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::io(path, e)
    })
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn timestamp_micros(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

fn from_micros(micros: i64) -> Option<DateTime<Utc>> {
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos)
}

fn rows_to_frame(schema: &TableSchema, rows: &[Row]) -> Result<DataFrame, StoreError> {
    let mut columns = Vec::with_capacity(schema.columns.len());

    for col in &schema.columns {
        let name: PlSmallStr = col.name.as_str().into();
        let cell = |r: &Row| r.get(&col.name).cloned().unwrap_or(Value::Null);

        let column = match col.ty {
            ColumnType::Serial | ColumnType::BigInt => {
                let values: Vec<Option<i64>> = rows.iter().map(|r| cell(r).as_i64()).collect();
                Column::new(name, values)
            }
            ColumnType::Decimal { .. } => {
                let values: Vec<Option<f64>> = rows.iter().map(|r| cell(r).as_f64()).collect();
                Column::new(name, values)
            }
            ColumnType::Varchar { .. } => {
                let values: Vec<Option<String>> = rows
                    .iter()
                    .map(|r| cell(r).as_str().map(str::to_string))
                    .collect();
                Column::new(name, values)
            }
            ColumnType::Timestamp | ColumnType::TimestampTz => {
                let values: Vec<Option<i64>> = rows
                    .iter()
                    .map(|r| cell(r).as_timestamp().as_ref().map(timestamp_micros))
                    .collect();
                Column::new(name, values)
            }
        };
        columns.push(column);
    }

    DataFrame::new(columns).map_err(|e| StoreError::Parquet(format!("dataframe creation: {e}")))
}

fn frame_to_rows(schema: &TableSchema, df: &DataFrame) -> Result<Vec<Row>, StoreError> {
    let n = df.height();
    let mut rows = vec![Row::new(); n];
    let type_err = |col: &str, e: PolarsError| {
        StoreError::Corrupt(format!("column '{col}' in '{}': {e}", schema.name))
    };

    for col in &schema.columns {
        let series = df.column(&col.name).map_err(|_| {
            StoreError::Corrupt(format!(
                "table '{}' data is missing column '{}'",
                schema.name, col.name
            ))
        })?;

        match col.ty {
            ColumnType::Serial | ColumnType::BigInt => {
                let ca = series.i64().map_err(|e| type_err(&col.name, e))?;
                for (i, row) in rows.iter_mut().enumerate() {
                    row.insert(col.name.clone(), ca.get(i).into());
                }
            }
            ColumnType::Decimal { .. } => {
                let ca = series.f64().map_err(|e| type_err(&col.name, e))?;
                for (i, row) in rows.iter_mut().enumerate() {
                    row.insert(col.name.clone(), ca.get(i).into());
                }
            }
            ColumnType::Varchar { .. } => {
                let ca = series.str().map_err(|e| type_err(&col.name, e))?;
                for (i, row) in rows.iter_mut().enumerate() {
                    row.insert(col.name.clone(), ca.get(i).into());
                }
            }
            ColumnType::Timestamp | ColumnType::TimestampTz => {
                let ca = series.i64().map_err(|e| type_err(&col.name, e))?;
                for (i, row) in rows.iter_mut().enumerate() {
                    let ts = ca.get(i).and_then(from_micros);
                    row.insert(col.name.clone(), ts.into());
                }
            }
        }
    }
    Ok(rows)
}

fn read_parquet(path: &Path) -> Result<DataFrame, StoreError> {
    let file = fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
    ParquetReader::new(file)
        .finish()
        .map_err(|e| StoreError::Parquet(format!("read {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::store::schema::ColumnDef;
    use chrono::TimeZone;

    fn crypto() -> TableSchema {
        TableSchema::new("crypto")
            .column(ColumnDef::new("id", ColumnType::Serial).primary_key())
            .column(ColumnDef::new("symbol", ColumnType::varchar(10)).not_null().unique())
            .column(ColumnDef::new("price", ColumnType::decimal(12, 4)))
            .column(ColumnDef::new("seen_at", ColumnType::TimestampTz).default_now())
    }

    fn store() -> (tempfile::TempDir, TableStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TableStore::open(dir.path().join("db")).unwrap();
        (dir, store)
    }

    #[test]
    fn create_list_delete() {
        let (_dir, store) = store();
        assert!(store.list_tables().unwrap().is_empty());

        store.create_table(&crypto()).unwrap();
        assert!(matches!(
            store.create_table(&crypto()),
            Err(StoreError::TableExists(_))
        ));
        assert!(!store.create_if_missing(&crypto()).unwrap());
        assert_eq!(store.list_tables().unwrap(), vec!["crypto"]);

        assert!(store.delete_table("crypto").unwrap());
        assert!(!store.delete_table("crypto").unwrap());
        assert!(store.list_tables().unwrap().is_empty());
    }

    #[test]
    fn serial_ids_and_defaults_are_filled() {
        let (_dir, store) = store();
        store.create_table(&crypto()).unwrap();

        store.insert("crypto", row! { "symbol" => "BTC", "price" => 1.5 }).unwrap();
        store.insert("crypto", row! { "symbol" => "ETH" }).unwrap();

        let rows = store.rows("crypto").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], Value::Int(1));
        assert_eq!(rows[1]["id"], Value::Int(2));
        assert_eq!(rows[1]["price"], Value::Null);
        assert!(rows[0]["seen_at"].as_timestamp().is_some());
    }

    #[test]
    fn unique_collision_upserts_and_keeps_id() {
        let (_dir, store) = store();
        store.create_table(&crypto()).unwrap();

        store.insert("crypto", row! { "symbol" => "BTC", "price" => 1.0 }).unwrap();
        store.insert("crypto", row! { "symbol" => "ETH", "price" => 2.0 }).unwrap();
        let outcome = store
            .insert("crypto", row! { "symbol" => "BTC", "price" => 3.0 })
            .unwrap();

        assert_eq!(outcome, InsertOutcome::Updated);
        let rows = store.rows("crypto").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], Value::Int(1));
        assert_eq!(rows[0]["price"], Value::Float(3.0));
    }

    #[test]
    fn explicit_id_on_upsert_is_not_reused() {
        let (_dir, store) = store();
        store.create_table(&crypto()).unwrap();
        store.insert("crypto", row! { "symbol" => "BTC" }).unwrap();
        store.insert("crypto", row! { "symbol" => "ETH" }).unwrap();

        let summary = store
            .insert_many(
                "crypto",
                vec![
                    row! { "id" => 3i64, "symbol" => "BTC", "price" => 9.0 },
                    row! { "symbol" => "SOL" },
                ],
            )
            .unwrap();

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.inserted, 1);
        let rows = store.rows("crypto").unwrap();
        let ids: Vec<i64> = rows.iter().filter_map(|r| r["id"].as_i64()).collect();
        assert_eq!(ids, vec![3, 2, 4]);
    }

    #[test]
    fn rejected_batch_leaves_table_unchanged() {
        let (_dir, store) = store();
        store.create_table(&crypto()).unwrap();
        store.insert("crypto", row! { "symbol" => "BTC" }).unwrap();
        let before = store.meta("crypto").unwrap().unwrap();

        let err = store
            .insert_many(
                "crypto",
                vec![
                    row! { "symbol" => "ETH" },
                    row! { "symbol" => "WAYTOOLONGSYMBOL" },
                ],
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::ValueTooLong { .. }));

        assert_eq!(store.rows("crypto").unwrap().len(), 1);
        assert_eq!(store.meta("crypto").unwrap().unwrap().data_hash, before.data_hash);
    }

    #[test]
    fn unknown_column_and_table_are_errors() {
        let (_dir, store) = store();
        store.create_table(&crypto()).unwrap();
        assert!(matches!(
            store.insert("crypto", row! { "symbol" => "BTC", "colour" => "red" }),
            Err(StoreError::UnknownColumn { .. })
        ));
        assert!(matches!(
            store.insert("nope", row! { "symbol" => "BTC" }),
            Err(StoreError::NoSuchTable(_))
        ));
    }

    #[test]
    fn explicit_timestamp_survives_roundtrip() {
        let (_dir, store) = store();
        store.create_table(&crypto()).unwrap();
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 15, 30, 0).unwrap();
        store
            .insert("crypto", row! { "symbol" => "SOL", "seen_at" => ts })
            .unwrap();
        assert_eq!(store.rows("crypto").unwrap()[0]["seen_at"], Value::Timestamp(ts));
    }

    #[test]
    fn micros_conversion_handles_pre_epoch() {
        let ts = Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(from_micros(timestamp_micros(&ts)), Some(ts));
    }

    #[test]
    fn empty_table_frame_has_schema_columns() {
        let (_dir, store) = store();
        store.create_table(&crypto()).unwrap();
        let df = store.frame("crypto").unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 4);
    }

    #[test]
    fn removed_root_reports_not_connected() {
        let (dir, store) = store();
        std::fs::remove_dir_all(dir.path().join("db")).unwrap();
        assert!(!store.is_connected());
        assert!(matches!(store.list_tables(), Err(StoreError::NotConnected(_))));
    }
}
