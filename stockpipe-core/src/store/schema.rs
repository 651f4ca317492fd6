//! Table schemas: column types, constraints, and value coercion.

use super::value::Value;
use super::StoreError;
use crate::domain::parse_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnType {
    /// Auto-assigned 64-bit integer, one more than the current maximum.
    Serial,
    BigInt,
    Decimal { precision: u8, scale: u8 },
    Varchar { max_len: usize },
    Timestamp,
    TimestampTz,
}

impl ColumnType {
    pub fn decimal(precision: u8, scale: u8) -> Self {
        ColumnType::Decimal { precision, scale }
    }

    pub fn varchar(max_len: usize) -> Self {
        ColumnType::Varchar { max_len }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, ColumnType::Serial | ColumnType::BigInt)
    }

    pub fn is_timestamp(&self) -> bool {
        matches!(self, ColumnType::Timestamp | ColumnType::TimestampTz)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Serial => f.write_str("SERIAL"),
            ColumnType::BigInt => f.write_str("BIGINT"),
            ColumnType::Decimal { precision, scale } => write!(f, "DECIMAL({precision},{scale})"),
            ColumnType::Varchar { max_len } => write!(f, "VARCHAR({max_len})"),
            ColumnType::Timestamp => f.write_str("TIMESTAMP"),
            ColumnType::TimestampTz => f.write_str("TIMESTAMPTZ"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary_key: bool,
    /// Filled with the current time when absent, and refreshed on upsert.
    #[serde(default)]
    pub default_now: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            not_null: false,
            unique: false,
            primary_key: false,
            default_now: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    pub fn default_now(mut self) -> Self {
        self.default_now = true;
        self
    }

    /// Coerce `value` into this column's storage form, enforcing type, length,
    /// precision and NOT NULL.
    pub fn coerce(&self, table: &str, value: Value) -> Result<Value, StoreError> {
        if value.is_null() {
            if self.not_null {
                return Err(StoreError::NotNull {
                    table: table.to_string(),
                    column: self.name.clone(),
                });
            }
            return Ok(Value::Null);
        }

        let mismatch = |found: &Value| StoreError::TypeMismatch {
            table: table.to_string(),
            column: self.name.clone(),
            expected: self.ty.to_string(),
            found: found.kind().to_string(),
        };

        match self.ty {
            ColumnType::Serial | ColumnType::BigInt => match value {
                Value::Int(_) => Ok(value),
                other => Err(mismatch(&other)),
            },
            ColumnType::Decimal { precision, scale } => {
                let v = value.as_f64().ok_or_else(|| mismatch(&value))?;
                let factor = 10f64.powi(i32::from(scale));
                let rounded = (v * factor).round() / factor;
                let limit = 10f64.powi(i32::from(precision.saturating_sub(scale)));
                if !rounded.is_finite() || rounded.abs() >= limit {
                    return Err(StoreError::NumericOverflow {
                        column: self.name.clone(),
                        precision,
                        scale,
                    });
                }
                Ok(Value::Float(rounded))
            }
            ColumnType::Varchar { max_len } => match value {
                Value::Text(ref s) if s.chars().count() > max_len => Err(StoreError::ValueTooLong {
                    column: self.name.clone(),
                    max_len,
                }),
                Value::Text(_) => Ok(value),
                other => Err(mismatch(&other)),
            },
            ColumnType::Timestamp | ColumnType::TimestampTz => match value {
                Value::Timestamp(_) => Ok(value),
                Value::Text(ref s) => parse_timestamp(s)
                    .map(Value::Timestamp)
                    .ok_or_else(|| mismatch(&value)),
                other => Err(mismatch(&other)),
            },
        }
    }

    fn ddl(&self) -> String {
        let mut out = format!("{} {}", self.name, self.ty);
        if self.primary_key {
            out.push_str(" PRIMARY KEY");
        } else if self.not_null {
            out.push_str(" NOT NULL");
        }
        if self.unique {
            out.push_str(" UNIQUE");
        }
        if self.default_now {
            out.push_str(" DEFAULT CURRENT_TIMESTAMP");
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// Table-level UNIQUE constraints over several columns.
    #[serde(default)]
    pub unique_keys: Vec<Vec<String>>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            unique_keys: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn unique_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_keys
            .push(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Every key an incoming record can collide on: primary key and UNIQUE
    /// columns, then the table-level keys.
    pub fn conflict_keys(&self) -> Vec<Vec<&str>> {
        let mut keys: Vec<Vec<&str>> = self
            .columns
            .iter()
            .filter(|c| c.primary_key || c.unique)
            .map(|c| vec![c.name.as_str()])
            .collect();
        keys.extend(
            self.unique_keys
                .iter()
                .map(|k| k.iter().map(String::as_str).collect()),
        );
        keys
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        validate_name(&self.name)?;
        if self.columns.is_empty() {
            return Err(StoreError::InvalidSchema(format!(
                "table '{}' has no columns",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for c in &self.columns {
            validate_name(&c.name)?;
            if !seen.insert(c.name.as_str()) {
                return Err(StoreError::InvalidSchema(format!(
                    "duplicate column '{}' in '{}'",
                    c.name, self.name
                )));
            }
            if c.default_now && !c.ty.is_timestamp() {
                return Err(StoreError::InvalidSchema(format!(
                    "DEFAULT CURRENT_TIMESTAMP on non-timestamp column '{}'",
                    c.name
                )));
            }
        }

        if self.columns.iter().filter(|c| c.primary_key).count() > 1 {
            return Err(StoreError::InvalidSchema(format!(
                "table '{}' declares more than one primary key",
                self.name
            )));
        }

        for key in &self.unique_keys {
            if key.is_empty() {
                return Err(StoreError::InvalidSchema("empty UNIQUE key".into()));
            }
            for col in key {
                if self.get(col).is_none() {
                    return Err(StoreError::InvalidSchema(format!(
                        "UNIQUE key references unknown column '{col}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// `CREATE TABLE` statement describing this schema.
    pub fn ddl(&self) -> String {
        let mut parts: Vec<String> = self.columns.iter().map(ColumnDef::ddl).collect();
        parts.extend(
            self.unique_keys
                .iter()
                .map(|k| format!("UNIQUE ({})", k.join(", "))),
        );
        format!("CREATE TABLE {} ({});", self.name, parts.join(", "))
    }
}

/// Identifiers are `[A-Za-z_][A-Za-z0-9_]*`, which also keeps table names
/// safe to use as directory names.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let ok = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn price() -> ColumnDef {
        ColumnDef::new("close", ColumnType::decimal(12, 4)).not_null()
    }

    #[test]
    fn decimal_rounds_to_scale() {
        let v = price().coerce("t", Value::Float(187.123456)).unwrap();
        assert_eq!(v, Value::Float(187.1235));
        assert_eq!(price().coerce("t", Value::Int(5)).unwrap(), Value::Float(5.0));
    }

    #[test]
    fn decimal_overflow_is_rejected() {
        assert!(matches!(
            price().coerce("t", Value::Float(1e8)),
            Err(StoreError::NumericOverflow { .. })
        ));
    }

    #[test]
    fn not_null_rejects_null() {
        assert!(matches!(
            price().coerce("t", Value::Null),
            Err(StoreError::NotNull { .. })
        ));
    }

    #[test]
    fn varchar_length_counts_chars() {
        let col = ColumnDef::new("symbol", ColumnType::varchar(4));
        assert!(col.coerce("t", "ÄÄÄÄ".into()).is_ok());
        assert!(matches!(
            col.coerce("t", "TOOLONG".into()),
            Err(StoreError::ValueTooLong { max_len: 4, .. })
        ));
    }

    #[test]
    fn timestamp_accepts_display_text() {
        let col = ColumnDef::new("timestamp", ColumnType::TimestampTz);
        let v = col.coerce("t", "2026-01-02 15:00:00 UTC".into()).unwrap();
        assert_eq!(
            v,
            Value::Timestamp(Utc.with_ymd_and_hms(2026, 1, 2, 15, 0, 0).unwrap())
        );
        assert!(matches!(
            col.coerce("t", Value::Int(1)),
            Err(StoreError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn names_are_identifiers() {
        assert!(validate_name("stock_data").is_ok());
        assert!(validate_name("_tmp1").is_ok());
        assert!(validate_name("../etc").is_err());
        assert!(validate_name("1abc").is_err());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn schema_validation_catches_bad_keys() {
        let schema = TableSchema::new("t")
            .column(ColumnDef::new("a", ColumnType::BigInt))
            .unique_key(["a", "b"]);
        assert!(matches!(schema.validate(), Err(StoreError::InvalidSchema(_))));

        let dup = TableSchema::new("t")
            .column(ColumnDef::new("a", ColumnType::BigInt))
            .column(ColumnDef::new("a", ColumnType::BigInt));
        assert!(dup.validate().is_err());
    }

    #[test]
    fn ddl_lists_constraints() {
        let schema = TableSchema::new("crypto")
            .column(ColumnDef::new("id", ColumnType::Serial).primary_key())
            .column(ColumnDef::new("symbol", ColumnType::varchar(10)).not_null().unique());
        assert_eq!(
            schema.ddl(),
            "CREATE TABLE crypto (id SERIAL PRIMARY KEY, symbol VARCHAR(10) NOT NULL UNIQUE);"
        );
    }
}
