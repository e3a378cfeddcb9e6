use crate::connection::text_of;
use crate::dialect;
use crate::driver::NativeSession;
use crate::error::SqlMiddlewareDbError;
use crate::source::OracleSource;
use crate::types::{AbstractType, RowValues};

/// A table as the framework names it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableRef {
    /// Unqualified table name
    pub table: String,
    /// Explicit owner schema
    pub schema: Option<String>,
    /// Sequence declared by the caller for this table's keys
    pub sequence: Option<String>,
}

impl TableRef {
    /// Parse `table` or `schema.table`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        match name.split_once('.') {
            Some((schema, table)) => Self {
                table: table.to_string(),
                schema: Some(schema.to_string()),
                sequence: None,
            },
            None => Self {
                table: name.to_string(),
                schema: None,
                sequence: None,
            },
        }
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: Option<String>) -> Self {
        self.sequence = sequence;
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Option<String>) -> Self {
        self.schema = schema;
        self
    }
}

impl From<&str> for TableRef {
    fn from(value: &str) -> Self {
        TableRef::new(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Lower-cased column name
    pub name: String,
    pub kind: AbstractType,
    /// Native type as reported by the catalog
    pub native_type: String,
    pub length: Option<i64>,
    pub nullable: bool,
    /// Inferred from a single-column unique index
    pub primary: bool,
}

/// Columns of a table in catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSet {
    columns: Vec<ColumnDef>,
}

impl ColumnSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter()
    }

    /// Column marked as the inferred primary key.
    #[must_use]
    pub fn primary_key(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary)
    }

    fn mark_primary(&mut self, name: &str) {
        if let Some(column) = self.columns.iter_mut().find(|c| c.name == name) {
            column.primary = true;
        }
    }
}

/// Primary-key index of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub columns: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableIndexes {
    pub primary: Option<IndexDef>,
}

fn owner_clause(column: &str, schema: Option<&str>) -> String {
    schema
        .map(|s| format!(" AND {column} = '{}'", s.to_uppercase()))
        .unwrap_or_default()
}

impl<S: NativeSession> OracleSource<S> {
    /// Schema a table lives in: explicit prefix, then the owner of a declared
    /// `owner.sequence`, then the session default.
    #[must_use]
    pub fn table_schema(&self, table: &TableRef) -> Option<String> {
        if let Some(schema) = table.schema.as_deref().filter(|s| !s.is_empty()) {
            return Some(schema.to_string());
        }
        if let Some((owner, _)) = table.sequence.as_deref().and_then(|s| s.split_once('.')) {
            return Some(owner.to_string());
        }
        self.default_schema.clone()
    }

    /// Table name for generated SQL, schema-qualified only when the reference is.
    #[must_use]
    pub fn full_table_name(&self, table: &TableRef) -> String {
        match table.schema.as_deref().filter(|s| !s.is_empty()) {
            Some(schema) => dialect::name(&format!("{schema}.{}", table.table)),
            None => dialect::name(&table.table),
        }
    }

    /// Names of the tables owned by the session user, lower-cased.
    ///
    /// Read once per source.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError::IntrospectionError` if the catalog query fails.
    pub async fn list_tables(&mut self) -> Result<Vec<String>, SqlMiddlewareDbError> {
        if let Some(cached) = &self.sources_cache {
            return Ok(cached.clone());
        }
        let rows = self
            .query("SELECT object_name AS name FROM user_objects WHERE object_type = 'TABLE'")
            .await
            .map_err(SqlMiddlewareDbError::into_introspection)?;
        let tables: Vec<String> = rows
            .iter()
            .filter_map(|row| row.ungrouped("name").and_then(text_of))
            .map(|name| name.to_lowercase())
            .collect();
        self.sources_cache = Some(tables.clone());
        Ok(tables)
    }

    /// Column definitions of `table`, with the primary key inferred.
    ///
    /// Also settles the table's sequence association: a declared sequence is
    /// trusted, otherwise `<table>_seq` is probed in the resolved schema. The
    /// association is keyed by the unqualified table name.
    ///
    /// A table without columns yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError::PreconditionViolation` for an empty table
    /// name and `SqlMiddlewareDbError::IntrospectionError` if a catalog query fails.
    pub async fn describe_table(
        &mut self,
        table: &TableRef,
    ) -> Result<ColumnSet, SqlMiddlewareDbError> {
        if table.table.trim().is_empty() {
            return Err(SqlMiddlewareDbError::PreconditionViolation(
                "describe_table requires a table name".to_string(),
            ));
        }
        let schema = self.table_schema(table);
        self.associate_sequence(table, schema.as_deref()).await?;

        let cache_key = match schema.as_deref() {
            Some(schema) => format!("{}.{}", schema.to_uppercase(), table.table.to_uppercase()),
            None => table.table.to_uppercase(),
        };
        if let Some(cached) = self.describe_cache.get(&cache_key) {
            return Ok(cached.clone());
        }

        let table_upper = table.table.to_uppercase();
        let sql = format!(
            "SELECT COLUMN_NAME, DATA_TYPE, DATA_LENGTH, NULLABLE FROM all_tab_columns WHERE table_name = '{table_upper}'{} ORDER BY column_id",
            owner_clause("owner", schema.as_deref())
        );
        let rows = self
            .query(&sql)
            .await
            .map_err(SqlMiddlewareDbError::into_introspection)?;

        let mut columns = ColumnSet::default();
        for row in &rows {
            let Some(name) = row.ungrouped("column_name").and_then(text_of) else {
                continue;
            };
            let native_type = row
                .ungrouped("data_type")
                .and_then(text_of)
                .unwrap_or_default();
            columns.columns.push(ColumnDef {
                name: name.to_lowercase(),
                kind: dialect::column(&native_type),
                native_type,
                length: row.ungrouped("data_length").and_then(RowValues::as_int),
                nullable: row
                    .ungrouped("nullable")
                    .and_then(RowValues::as_text)
                    .is_none_or(|n| n != "N"),
                primary: false,
            });
        }
        if columns.is_empty() {
            return Ok(columns);
        }

        let sql = format!(
            "SELECT MAX(ic.column_name) COLUMN_NAME, ic.index_name INDEX_NAME, COUNT(*) FROM all_ind_columns ic JOIN all_indexes ix ON (ix.index_name = ic.index_name AND ix.owner = ic.index_owner) WHERE ix.uniqueness = 'UNIQUE' AND ix.table_name = '{table_upper}'{} GROUP BY ic.index_name HAVING COUNT(*) = 1",
            owner_clause("ix.owner", schema.as_deref())
        );
        let rows = self
            .query(&sql)
            .await
            .map_err(SqlMiddlewareDbError::into_introspection)?;
        let candidates: Vec<String> = rows
            .iter()
            .filter_map(|row| row.ungrouped("column_name").and_then(text_of))
            .map(|name| name.to_lowercase())
            .collect();
        let primary = candidates
            .iter()
            .find(|name| *name == "id")
            .or_else(|| candidates.first());
        if let Some(primary) = primary {
            columns.mark_primary(primary);
        }

        self.describe_cache.insert(cache_key, columns.clone());
        Ok(columns)
    }

    /// Primary-key constraint columns of `table`.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError::IntrospectionError` if the catalog query fails.
    pub async fn index(&mut self, table: &TableRef) -> Result<TableIndexes, SqlMiddlewareDbError> {
        if table.table.trim().is_empty() {
            return Ok(TableIndexes::default());
        }
        let schema = self.table_schema(table);
        let sql = format!(
            "SELECT cc.table_name, cc.column_name, cc.constraint_name, c.constraint_type, i.index_name, i.uniqueness FROM all_cons_columns cc LEFT JOIN all_indexes i ON (cc.constraint_name = i.index_name) LEFT JOIN all_constraints c ON (c.constraint_name = cc.constraint_name) WHERE cc.table_name = '{}'{} ORDER BY cc.position",
            table.table.to_uppercase(),
            owner_clause("cc.owner", schema.as_deref())
        );
        let rows = self
            .query(&sql)
            .await
            .map_err(SqlMiddlewareDbError::into_introspection)?;

        let mut indexes = TableIndexes::default();
        for row in &rows {
            if row.get("c", "constraint_type").and_then(RowValues::as_text) != Some("P") {
                continue;
            }
            let Some(column) = row.get("cc", "column_name").and_then(text_of) else {
                continue;
            };
            let unique = row.get("i", "uniqueness").and_then(RowValues::as_text) == Some("UNIQUE");
            let primary = indexes.primary.get_or_insert_with(|| IndexDef {
                columns: Vec::new(),
                unique,
            });
            primary.columns.push(column.to_lowercase());
        }
        Ok(indexes)
    }

    async fn associate_sequence(
        &mut self,
        table: &TableRef,
        schema: Option<&str>,
    ) -> Result<(), SqlMiddlewareDbError> {
        let key = table.table.to_lowercase();
        if let Some(sequence) = table.sequence.as_deref().filter(|s| !s.is_empty()) {
            self.sequence_map.insert(key, Some(sequence.to_string()));
            return Ok(());
        }
        if self.sequence_map.contains_key(&key) {
            return Ok(());
        }
        let candidate = format!("{}_seq", table.table);
        let exists = self
            .sequence_exists(&candidate, schema)
            .await
            .map_err(SqlMiddlewareDbError::into_introspection)?;
        tracing::debug!(table = %table.table, sequence = %candidate, exists, "sequence probe");
        self.sequence_map.insert(key, exists.then_some(candidate));
        Ok(())
    }
}
