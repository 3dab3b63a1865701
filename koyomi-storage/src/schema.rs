//! # Table Schemas
//!
//! Column layouts for the two series kinds and the generic row values the
//! storage engine moves around. One fixed row layout per kind; there is no
//! schema evolution.

use serde::{Deserialize, Serialize};

use koyomi_core::error::{Error, Result};
use koyomi_core::types::{COMMENT_MAX_LEN, SOURCE_MAX_LEN, STATUS_MAX_LEN};

/// Column names shared by the stores and the catalog.
pub mod col {
    pub const TIME: &str = "time";
    pub const VALUE: &str = "value";
    pub const BEGIN_TIME: &str = "begin_time";
    pub const END_TIME: &str = "end_time";
    pub const TIMESTAMP: &str = "timestamp";
    pub const CONFIDENCE: &str = "confidence";
    pub const STATUS: &str = "status";
    pub const SOURCE: &str = "source";
    pub const COMMENT: &str = "comment";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Int64,
    Float64,
    /// Fixed-width string column; values longer than `max_len` characters
    /// are truncated on write.
    Str { max_len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub ty: ColumnType,
}

impl ColumnSpec {
    fn new(name: &str, ty: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }
}

/// Cell value in a generic row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// One generic row, aligned with a table's column order.
pub type Row = Vec<Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Layout for point series: (time: i64, value: f64).
    pub fn point() -> Self {
        Self {
            columns: vec![
                ColumnSpec::new(col::TIME, ColumnType::Int64),
                ColumnSpec::new(col::VALUE, ColumnType::Float64),
            ],
        }
    }

    /// Layout for interval observations.
    pub fn interval() -> Self {
        Self {
            columns: vec![
                ColumnSpec::new(col::BEGIN_TIME, ColumnType::Int64),
                ColumnSpec::new(col::END_TIME, ColumnType::Int64),
                ColumnSpec::new(col::TIMESTAMP, ColumnType::Int64),
                ColumnSpec::new(
                    col::CONFIDENCE,
                    ColumnType::Float64,
                ),
                ColumnSpec::new(col::STATUS, ColumnType::Str { max_len: STATUS_MAX_LEN }),
                ColumnSpec::new(col::SOURCE, ColumnType::Str { max_len: SOURCE_MAX_LEN }),
                ColumnSpec::new(col::COMMENT, ColumnType::Str { max_len: COMMENT_MAX_LEN }),
            ],
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Validate a row against this schema, truncating over-long strings to
    /// their column bound. Arity or type mismatches are storage faults.
    pub fn conform_row(&self, mut row: Row) -> Result<Row> {
        if row.len() != self.columns.len() {
            return Err(Error::storage(format!(
                "row has {} values, schema has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        for (value, spec) in row.iter_mut().zip(&self.columns) {
            match (&spec.ty, &mut *value) {
                (ColumnType::Int64, Value::Int(_)) => {}
                (ColumnType::Float64, Value::Float(_)) => {}
                (ColumnType::Str { max_len }, Value::Str(s)) => {
                    if s.chars().count() > *max_len {
                        *s = s.chars().take(*max_len).collect();
                    }
                }
                _ => {
                    return Err(Error::storage(format!(
                        "type mismatch in column '{}'",
                        spec.name
                    )));
                }
            }
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_schema_layout() {
        let schema = TableSchema::point();
        assert_eq!(schema.column_index(col::TIME), Some(0));
        assert_eq!(schema.column_index(col::VALUE), Some(1));
        assert_eq!(schema.column_index("nope"), None);
    }

    #[test]
    fn conform_truncates_long_strings() {
        let schema = TableSchema::interval();
        let row = vec![
            Value::Int(0),
            Value::Int(1),
            Value::Int(2),
            Value::Float(0.5),
            Value::Str("x".repeat(40)),
            Value::Str("src".into()),
            Value::Str("c".into()),
        ];
        let row = schema.conform_row(row).unwrap();
        assert_eq!(row[4].as_str().unwrap().len(), STATUS_MAX_LEN);
    }

    #[test]
    fn conform_rejects_type_mismatch() {
        let schema = TableSchema::point();
        let err = schema
            .conform_row(vec![Value::Float(1.0), Value::Float(2.0)])
            .unwrap_err();
        assert_eq!(err.error_code(), "STORAGE_FAULT");
    }
}
