use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::SqlMiddlewareDbError;

/// Scalar values handed back by the native client or encoded into SQL text.
///
/// The client returns these positionally; names come from the
/// [`FieldMap`](crate::field_map::FieldMap).
/// ```rust
/// use sql_middleware_oracle::prelude::*;
///
/// let fields = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Null,
/// ];
/// # let _ = fields;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view; NUMBER columns often come back as text, so numeric text is accepted.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            RowValues::Int(value) => Some(*value),
            RowValues::Text(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Session date format is pinned to YYYY-MM-DD HH24:MI:SS on connect
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            RowValues::Int(value) => Some(*value as f64),
            RowValues::Text(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

/// Whether statements commit as they run or wait for an explicit commit/rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    #[default]
    AutoCommit,
    Explicit,
}

impl TransactionMode {
    /// Commit flag handed to the native client for the next statement.
    #[must_use]
    pub fn commit_mode(self) -> CommitMode {
        match self {
            TransactionMode::AutoCommit => CommitMode::CommitOnSuccess,
            TransactionMode::Explicit => CommitMode::Deferred,
        }
    }
}

/// Per-statement commit flag understood by the native client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Commit as soon as the statement succeeds
    CommitOnSuccess,
    /// Leave the work pending until commit/rollback
    Deferred,
}

/// Statement type as reported by the native client after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeStatementType {
    Select,
    Describe,
    Insert,
    Update,
    Delete,
    Merge,
    Create,
    Alter,
    Drop,
    Begin,
    Declare,
    Call,
    Unknown,
}

/// Row-producing statements versus everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// SELECT or DESCRIBE; carries a result buffer
    Rows,
    /// DML/DDL/PL-SQL; no result buffer
    Other,
}

impl From<NativeStatementType> for StatementKind {
    fn from(value: NativeStatementType) -> Self {
        match value {
            NativeStatementType::Select | NativeStatementType::Describe => StatementKind::Rows,
            _ => StatementKind::Other,
        }
    }
}

/// Abstract column types exposed to the query framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbstractType {
    PrimaryKey,
    String,
    Text,
    Integer,
    Float,
    Datetime,
    Timestamp,
    Time,
    Date,
    Binary,
    Boolean,
    Number,
    Inet,
}

impl AbstractType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AbstractType::PrimaryKey => "primary_key",
            AbstractType::String => "string",
            AbstractType::Text => "text",
            AbstractType::Integer => "integer",
            AbstractType::Float => "float",
            AbstractType::Datetime => "datetime",
            AbstractType::Timestamp => "timestamp",
            AbstractType::Time => "time",
            AbstractType::Date => "date",
            AbstractType::Binary => "binary",
            AbstractType::Boolean => "boolean",
            AbstractType::Number => "number",
            AbstractType::Inet => "inet",
        }
    }
}

impl fmt::Display for AbstractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What `truncate_table` does with the table's sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TruncateMode {
    /// Walk the sequence back to its minimum value
    #[default]
    Reset,
    /// Drop the sequence. Currently a no-op.
    Drop,
    /// Leave the sequence untouched
    Leave,
}

/// Operation applied by [`OracleSource::constraint`](crate::OracleSource::constraint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConstraintAction {
    Enable,
    Disable,
    List,
}

impl FromStr for ConstraintAction {
    type Err = SqlMiddlewareDbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "enable" => Ok(ConstraintAction::Enable),
            "disable" => Ok(ConstraintAction::Disable),
            "list" => Ok(ConstraintAction::List),
            other => Err(SqlMiddlewareDbError::PreconditionViolation(format!(
                "constraint() accepts only enable, disable, or list (got {other:?})"
            ))),
        }
    }
}
