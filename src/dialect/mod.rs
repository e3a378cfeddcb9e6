//! Oracle literal encoding, identifier quoting and column-type mapping.

mod column;
mod name;
mod value;

pub use column::{column, native_column_type};
pub use name::name;
pub use value::{PLACEHOLDER_TOKENS, SqlValue, is_numeric, value, values};
