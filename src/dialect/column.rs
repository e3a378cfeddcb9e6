use crate::types::AbstractType;

/// Map a native column type (`VARCHAR2(255)`, `NUMBER(10,2)`, ...) to its abstract type.
///
/// Unrecognised types fall back to [`AbstractType::Text`].
#[must_use]
pub fn column(real: &str) -> AbstractType {
    let real = real.trim().to_lowercase().replace(')', "");
    let col = real.split_once('(').map_or(real.as_str(), |(col, _limit)| col);
    let col = col.trim();

    match col {
        "date" => return AbstractType::Date,
        "timestamp" => return AbstractType::Timestamp,
        _ => {}
    }
    if col.contains("number") || col.contains("integer") {
        return AbstractType::Integer;
    }
    if col.contains("char") {
        return AbstractType::String;
    }
    if col.contains("text") || col.contains("clob") {
        return AbstractType::Text;
    }
    if col.contains("blob") || col == "raw" || col == "long raw" || col == "bfile" {
        return AbstractType::Binary;
    }
    if matches!(
        col,
        "float" | "double" | "decimal" | "binary_float" | "binary_double"
    ) {
        return AbstractType::Float;
    }
    if col == "boolean" {
        return AbstractType::Boolean;
    }
    AbstractType::Text
}

/// Native column type used when generating DDL for an abstract type.
///
/// `limit` overrides the default length where the type carries one.
#[must_use]
pub fn native_column_type(kind: AbstractType, limit: Option<u32>) -> String {
    let (native, default_limit) = match kind {
        AbstractType::PrimaryKey => ("", None),
        AbstractType::String => ("varchar2", Some(255)),
        AbstractType::Text => ("varchar2", Some(4000)),
        AbstractType::Integer | AbstractType::Number => ("number", None),
        AbstractType::Float => ("float", None),
        AbstractType::Datetime
        | AbstractType::Timestamp
        | AbstractType::Time
        | AbstractType::Date => ("date", None),
        AbstractType::Binary => ("blob", None),
        AbstractType::Boolean => ("boolean", None),
        AbstractType::Inet => ("inet", None),
    };
    match limit.or(default_limit) {
        Some(limit) if !native.is_empty() => format!("{native}({limit})"),
        _ => native.to_string(),
    }
}
