//! # Predicate Expressions
//!
//! Queries against the storage engine are restricted to conjunctions of
//! comparisons on named columns against integer/float literals, e.g.
//! `time >= 5 & time < 9`. The expression is a typed value rather than a
//! string, so the stores cannot build a syntactically invalid query.

use std::fmt;

use koyomi_core::error::{Error, Result};

use crate::schema::{Row, TableSchema, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Eq => "==",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub column: String,
    pub op: CmpOp,
    pub literal: Value,
}

/// Conjunction of comparisons. An empty predicate matches every row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Predicate {
    terms: Vec<Comparison>,
}

impl Predicate {
    /// Predicate matching all rows.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn cmp(column: impl Into<String>, op: CmpOp, literal: Value) -> Self {
        Self::default().and(column, op, literal)
    }

    pub fn and(mut self, column: impl Into<String>, op: CmpOp, literal: Value) -> Self {
        self.terms.push(Comparison {
            column: column.into(),
            op,
            literal,
        });
        self
    }

    pub fn terms(&self) -> &[Comparison] {
        &self.terms
    }

    /// Evaluate against one row. Unknown column names are caller errors
    /// and are not retried by the session.
    pub fn matches(&self, schema: &TableSchema, row: &Row) -> Result<bool> {
        for term in &self.terms {
            let idx = schema.column_index(&term.column).ok_or_else(|| Error::InvalidKey {
                message: format!("unknown predicate column '{}'", term.column),
            })?;
            let cell = row.get(idx).ok_or_else(|| {
                Error::storage(format!("row missing column '{}'", term.column))
            })?;
            if !compare(cell, term.op, &term.literal)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn compare(cell: &Value, op: CmpOp, literal: &Value) -> Result<bool> {
    let ordering = match (cell, literal) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => {
            a.partial_cmp(b).ok_or_else(|| Error::storage("NaN in comparison"))?
        }
        // Mixed numeric comparisons go through f64.
        (Value::Int(a), Value::Float(b)) => (*a as f64)
            .partial_cmp(b)
            .ok_or_else(|| Error::storage("NaN in comparison"))?,
        (Value::Float(a), Value::Int(b)) => a
            .partial_cmp(&(*b as f64))
            .ok_or_else(|| Error::storage("NaN in comparison"))?,
        (Value::Str(a), Value::Str(b)) => a.as_str().cmp(b.as_str()),
        _ => {
            return Err(Error::InvalidKey {
                message: "type mismatch between column and literal".to_string(),
            });
        }
    };
    Ok(match op {
        CmpOp::Eq => ordering.is_eq(),
        CmpOp::Lt => ordering.is_lt(),
        CmpOp::Le => ordering.is_le(),
        CmpOp::Gt => ordering.is_gt(),
        CmpOp::Ge => ordering.is_ge(),
    })
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "true");
        }
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " & ")?;
            }
            match &term.literal {
                Value::Int(v) => write!(f, "{} {} {}", term.column, term.op, v)?,
                Value::Float(v) => write!(f, "{} {} {}", term.column, term.op, v)?,
                Value::Str(v) => write!(f, "{} {} '{}'", term.column, term.op, v)?,
            }
        }
        Ok(())
    }
}
