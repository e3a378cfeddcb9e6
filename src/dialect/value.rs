use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

use super::name::name;
use crate::types::{AbstractType, RowValues};

/// Framework placeholders substituted after encoding; never quoted.
pub const PLACEHOLDER_TOKENS: [&str; 2] = ["{$__cakeID__$}", "{$__cakeForeignKey__$}"];

lazy_static! {
    static ref NUMERIC: Regex =
        Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$").expect("valid numeric");
    static ref FUNCTION_CALL: Regex = Regex::new(r"^[a-zA-Z_]+\(").expect("valid function call");
}

/// A value headed for SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Application data; quoted and escaped as needed
    Value(RowValues),
    /// Identifier; goes through [`name`](super::name)
    Identifier(String),
    /// Raw SQL fragment; emitted verbatim
    Expression(String),
}

impl From<RowValues> for SqlValue {
    fn from(value: RowValues) -> Self {
        SqlValue::Value(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Value(RowValues::Text(value.to_string()))
    }
}

/// Numeric in the loose sense the framework uses: sign, digits, decimals, exponent.
#[must_use]
pub fn is_numeric(text: &str) -> bool {
    NUMERIC.is_match(text)
}

/// Encode `data` as an Oracle literal.
///
/// `column` is the abstract type of the target column; when absent the type is
/// inferred from the value itself.
#[must_use]
pub fn value(data: &SqlValue, column: Option<AbstractType>) -> String {
    match data {
        SqlValue::Identifier(ident) => name(ident),
        SqlValue::Expression(expr) => expr.clone(),
        SqlValue::Value(row_value) => encode(row_value, column),
    }
}

/// Encode every element of `data` against the same column type.
#[must_use]
pub fn values(data: &[SqlValue], column: Option<AbstractType>) -> Vec<String> {
    data.iter().map(|item| value(item, column)).collect()
}

fn introspect_type(data: &RowValues) -> AbstractType {
    match data {
        RowValues::Int(_) => AbstractType::Integer,
        RowValues::Float(_) => AbstractType::Float,
        RowValues::Bool(_) => AbstractType::Boolean,
        _ => AbstractType::String,
    }
}

fn encode(data: &RowValues, column: Option<AbstractType>) -> String {
    match data {
        RowValues::Text(text) if PLACEHOLDER_TOKENS.contains(&text.as_str()) => {
            return text.clone();
        }
        RowValues::Null => return "NULL".to_string(),
        RowValues::Text(text) if text.is_empty() => return "''".to_string(),
        RowValues::Blob(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
            return format!("HEXTORAW('{hex}')");
        }
        _ => {}
    }

    let column = column.unwrap_or_else(|| introspect_type(data));
    let raw: Cow<'_, str> = match data {
        RowValues::Int(i) => Cow::Owned(i.to_string()),
        RowValues::Float(f) => Cow::Owned(f.to_string()),
        RowValues::Text(text) => Cow::Borrowed(text.as_str()),
        RowValues::Bool(b) => Cow::Borrowed(if *b { "1" } else { "0" }),
        RowValues::Timestamp(dt) => Cow::Owned(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        RowValues::JSON(json) => Cow::Owned(json.to_string()),
        RowValues::Null | RowValues::Blob(_) => Cow::Borrowed(""),
    };

    match column {
        AbstractType::Integer | AbstractType::Float | AbstractType::Number
            if is_numeric(&raw) =>
        {
            raw.into_owned()
        }
        _ => quote(&raw),
    }
}

fn quote(raw: &str) -> String {
    // eg. UPPER(name)
    if FUNCTION_CALL.is_match(raw) {
        raw.to_string()
    } else {
        format!("'{}'", raw.replace('\'', "''"))
    }
}
