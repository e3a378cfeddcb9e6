use std::collections::HashMap;

use crate::config::OracleOptions;
use crate::constraints::ConstraintCache;
use crate::dialect::{self, SqlValue};
use crate::driver::NativeSession;
use crate::error::NativeError;
use crate::results::{FetchWindow, Statement};
use crate::schema::ColumnSet;
use crate::types::{AbstractType, StatementKind, TransactionMode};

/// Oracle data source: one native session plus the adapter state layered on it.
///
/// Caches (sequence map, constraint cache, describe results) belong to the
/// instance and are never rebuilt mid-session; drop the source to invalidate
/// them. The source is not internally synchronized.
pub struct OracleSource<S: NativeSession> {
    pub(crate) session: Option<S>,
    pub(crate) options: OracleOptions,
    pub(crate) default_schema: Option<String>,
    pub(crate) transaction_mode: TransactionMode,
    pub(crate) window: FetchWindow,
    pub(crate) statement: Option<Statement<S::Statement>>,
    pub(crate) num_rows: Option<usize>,
    pub(crate) affected: Option<u64>,
    pub(crate) last_error: Option<NativeError>,
    /// Unqualified table name → sequence name, `None` for "no sequence"
    pub(crate) sequence_map: HashMap<String, Option<String>>,
    /// Lower-cased names from `all_sequences`, built on first truncate
    pub(crate) sequence_catalog: Option<Vec<String>>,
    pub(crate) constraint_cache: ConstraintCache,
    pub(crate) describe_cache: HashMap<String, ColumnSet>,
    pub(crate) sources_cache: Option<Vec<String>>,
}

impl<S: NativeSession> OracleSource<S> {
    pub(crate) fn with_session(session: S, options: OracleOptions) -> Self {
        Self {
            session: Some(session),
            options,
            default_schema: None,
            transaction_mode: TransactionMode::AutoCommit,
            window: FetchWindow::default(),
            statement: None,
            num_rows: None,
            affected: None,
            last_error: None,
            sequence_map: HashMap::new(),
            sequence_catalog: None,
            constraint_cache: ConstraintCache::default(),
            describe_cache: HashMap::new(),
            sources_cache: None,
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn options(&self) -> &OracleOptions {
        &self.options
    }

    #[must_use]
    pub fn transaction_mode(&self) -> TransactionMode {
        self.transaction_mode
    }

    /// Default schema set on connect, upper-cased.
    #[must_use]
    pub fn schema_name(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    /// Most recent native diagnostic; cleared by each successful execute.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_ref().map(|e| e.message.as_str())
    }

    /// Kind of the statement currently held, if any.
    #[must_use]
    pub fn statement_kind(&self) -> Option<StatementKind> {
        self.statement.as_ref().map(|s| s.kind)
    }

    /// Sequence associated with `table` by `describe_table`.
    ///
    /// `None` when the table was never described; `Some(None)` when it has no sequence.
    #[must_use]
    pub fn sequence_for(&self, table: &str) -> Option<Option<&str>> {
        self.sequence_map
            .get(&table.to_lowercase())
            .map(|seq| seq.as_deref())
    }

    /// Encode a value as an Oracle literal.
    #[must_use]
    pub fn value(&self, data: &SqlValue, column: Option<AbstractType>) -> String {
        dialect::value(data, column)
    }

    /// Quote an identifier.
    #[must_use]
    pub fn name(&self, name: &str) -> String {
        dialect::name(name)
    }

    /// Abstract type for a native column type.
    #[must_use]
    pub fn column(&self, real: &str) -> AbstractType {
        dialect::column(real)
    }
}
