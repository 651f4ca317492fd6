//! Embedded table store for the pipeline's persistent data.

pub mod schema;
pub mod table_store;
pub mod tables;
pub mod value;

pub use schema::{ColumnDef, ColumnType, TableSchema};
pub use table_store::{InsertOutcome, InsertSummary, TableMeta, TableStore};
pub use tables::{init_pipeline_tables, STOCK_AI_SUMMARY, STOCK_DATA};
pub use value::{Row, Value};

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store not connected: {0} is not a directory")]
    NotConnected(String),

    #[error("invalid identifier '{0}'")]
    InvalidName(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("table '{0}' already exists")]
    TableExists(String),

    #[error("table '{0}' does not exist")]
    NoSuchTable(String),

    #[error("column '{column}' does not exist in '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("null value in column '{column}' of '{table}' violates not-null constraint")]
    NotNull { table: String, column: String },

    #[error("column '{column}' of '{table}' is {expected}, got {found}")]
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        found: String,
    },

    #[error("value too long for column '{column}' (max {max_len} chars)")]
    ValueTooLong { column: String, max_len: usize },

    #[error("numeric value out of range for column '{column}' DECIMAL({precision},{scale})")]
    NumericOverflow {
        column: String,
        precision: u8,
        scale: u8,
    },

    #[error("record collides with more than one row in '{0}'")]
    AmbiguousConflict(String),

    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("corrupt table data: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
