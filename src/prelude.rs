//! Convenient imports for common functionality.

pub use crate::config::{OracleOptions, OracleOptionsBuilder};
pub use crate::constraints::{ConstraintOutcome, ConstraintRef};
pub use crate::ddl::{ColumnSpec, StatementParts, StatementType, TableChanges, render_statement};
pub use crate::dialect::SqlValue;
pub use crate::driver::{NativeDriver, NativeSession};
pub use crate::error::{NativeError, SqlMiddlewareDbError};
pub use crate::field_map::{FieldMap, TableKey, scrape_field_map};
pub use crate::results::{FetchWindow, MappedRow, StatementInfo};
pub use crate::schema::{ColumnDef, ColumnSet, TableIndexes, TableRef};
pub use crate::source::OracleSource;
pub use crate::types::{
    AbstractType, CommitMode, ConstraintAction, RowValues, StatementKind, TransactionMode,
    TruncateMode,
};
