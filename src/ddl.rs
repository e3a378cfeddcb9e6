//! String templating for framework-generated SQL and schema changes.

use std::str::FromStr;

use crate::dialect::{self, SqlValue};
use crate::driver::NativeSession;
use crate::error::SqlMiddlewareDbError;
use crate::schema::TableRef;
use crate::source::OracleSource;
use crate::types::AbstractType;

/// Statement shapes the framework asks to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Create,
    Update,
    Delete,
    Schema,
    /// Accepted but never rendered
    Alter,
}

impl FromStr for StatementType {
    type Err = SqlMiddlewareDbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "select" => Ok(StatementType::Select),
            "create" => Ok(StatementType::Create),
            "update" => Ok(StatementType::Update),
            "delete" => Ok(StatementType::Delete),
            "schema" => Ok(StatementType::Schema),
            "alter" => Ok(StatementType::Alter),
            other => Err(SqlMiddlewareDbError::PreconditionViolation(format!(
                "unknown statement type: {other}"
            ))),
        }
    }
}

/// Pre-rendered clauses for [`render_statement`]; empty clauses are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementParts {
    pub table: String,
    pub alias: String,
    pub fields: String,
    pub values: String,
    pub joins: String,
    pub conditions: String,
    pub group: String,
    pub order: String,
    pub limit: String,
    /// Column definitions for `Schema`
    pub columns: Vec<String>,
    /// Index/constraint definitions for `Schema`
    pub indexes: Vec<String>,
}

fn join_clauses(clauses: &[&str]) -> String {
    clauses
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Assemble a statement from its clauses. `Alter` renders nothing.
#[must_use]
pub fn render_statement(kind: StatementType, parts: &StatementParts) -> Option<String> {
    let sql = match kind {
        StatementType::Select => join_clauses(&[
            "SELECT",
            &parts.fields,
            "FROM",
            &parts.table,
            &parts.alias,
            &parts.joins,
            &parts.conditions,
            &parts.group,
            &parts.order,
            &parts.limit,
        ]),
        StatementType::Create => format!(
            "INSERT INTO {} ({}) VALUES ({})",
            parts.table, parts.fields, parts.values
        ),
        StatementType::Update => join_clauses(&[
            "UPDATE",
            &parts.table,
            &parts.alias,
            "SET",
            &parts.fields,
            &parts.conditions,
        ]),
        StatementType::Delete => join_clauses(&[
            "DELETE FROM",
            &parts.table,
            &parts.alias,
            &parts.conditions,
        ]),
        StatementType::Schema => {
            let body: Vec<&str> = parts
                .columns
                .iter()
                .chain(parts.indexes.iter())
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            format!("CREATE TABLE {} (\n\t{}\n)", parts.table, body.join(",\n\t"))
        }
        StatementType::Alter => return None,
    };
    Some(sql)
}

/// Column definition used for DDL generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: AbstractType,
    pub length: Option<u32>,
    pub null: bool,
    pub default: Option<SqlValue>,
}

impl ColumnSpec {
    #[must_use]
    pub fn new(name: &str, kind: AbstractType) -> Self {
        Self {
            name: name.to_string(),
            kind,
            length: None,
            null: true,
            default: None,
        }
    }

    #[must_use]
    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.null = false;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: SqlValue) -> Self {
        self.default = Some(value);
        self
    }
}

/// Render one column definition, e.g. `title varchar2(255) DEFAULT 'x' NOT NULL`.
///
/// # Errors
///
/// Returns `SqlMiddlewareDbError::PreconditionViolation` when the column has no name.
pub fn build_column(spec: &ColumnSpec) -> Result<String, SqlMiddlewareDbError> {
    if spec.name.trim().is_empty() {
        return Err(SqlMiddlewareDbError::PreconditionViolation(
            "column definition requires a name".to_string(),
        ));
    }
    let name = dialect::name(&spec.name);
    if spec.kind == AbstractType::PrimaryKey {
        return Ok(format!("{name} number NOT NULL"));
    }

    let mut out = format!(
        "{name} {}",
        dialect::native_column_type(spec.kind, spec.length)
    );
    if let Some(default) = &spec.default {
        out.push_str(" DEFAULT ");
        out.push_str(&dialect::value(default, Some(spec.kind)));
    }
    if !spec.null {
        out.push_str(" NOT NULL");
    }
    Ok(out)
}

/// Column changes for one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableChanges {
    pub table: String,
    pub add: Vec<ColumnSpec>,
    pub drop: Vec<String>,
    /// Existing column name and its new definition; a differing name renames it
    pub change: Vec<(String, ColumnSpec)>,
}

impl<S: NativeSession> OracleSource<S> {
    /// ALTER statements for `changes`, restricted to `only` when given.
    ///
    /// # Errors
    ///
    /// Returns the error from [`build_column`].
    pub fn alter_schema(
        &self,
        changes: &[TableChanges],
        only: Option<&str>,
    ) -> Result<String, SqlMiddlewareDbError> {
        let mut out = String::new();
        for table in changes {
            if only.is_some_and(|name| name != table.table) {
                continue;
            }
            let full_name = self.full_table_name(&TableRef::new(&table.table));

            let mut statements = Vec::new();
            for column in &table.add {
                statements.push(format!("ADD ({})", build_column(column)?));
            }
            for column in &table.drop {
                statements.push(format!("DROP COLUMN {}", dialect::name(column)));
            }
            for (existing, column) in &table.change {
                if *existing != column.name {
                    statements.push(format!(
                        "RENAME COLUMN {} TO {}",
                        dialect::name(existing),
                        dialect::name(&column.name)
                    ));
                }
                statements.push(format!("MODIFY ({})", build_column(column)?));
            }

            for statement in statements {
                out.push_str(&format!("ALTER TABLE {full_name} {statement};\n"));
            }
            out.push('\n');
        }
        Ok(out)
    }

    /// DROP TABLE statements for `tables`, restricted to `only` when given.
    #[must_use]
    pub fn drop_schema(&self, tables: &[&str], only: Option<&str>) -> String {
        tables
            .iter()
            .filter(|table| only.is_none_or(|name| name == **table))
            .map(|table| format!("DROP TABLE {};\n", self.full_table_name(&TableRef::new(table))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RowValues;

    #[test]
    fn renders_select_without_empty_clauses() {
        let parts = StatementParts {
            table: "orders".into(),
            alias: "o".into(),
            fields: "o.id, o.total".into(),
            conditions: "WHERE o.id = 1".into(),
            ..StatementParts::default()
        };
        assert_eq!(
            render_statement(StatementType::Select, &parts).as_deref(),
            Some("SELECT o.id, o.total FROM orders o WHERE o.id = 1")
        );
    }

    #[test]
    fn renders_insert_and_delete() {
        let parts = StatementParts {
            table: "orders".into(),
            fields: "id, total".into(),
            values: "1, 9.5".into(),
            ..StatementParts::default()
        };
        assert_eq!(
            render_statement(StatementType::Create, &parts).as_deref(),
            Some("INSERT INTO orders (id, total) VALUES (1, 9.5)")
        );
        assert_eq!(
            render_statement(StatementType::Delete, &parts).as_deref(),
            Some("DELETE FROM orders")
        );
        assert_eq!(render_statement(StatementType::Alter, &parts), None);
    }

    #[test]
    fn renders_create_table() {
        let parts = StatementParts {
            table: "tags".into(),
            columns: vec!["id number NOT NULL".into(), "name varchar2(255)".into()],
            indexes: vec!["PRIMARY KEY (id)".into()],
            ..StatementParts::default()
        };
        assert_eq!(
            render_statement(StatementType::Schema, &parts).as_deref(),
            Some("CREATE TABLE tags (\n\tid number NOT NULL,\n\tname varchar2(255),\n\tPRIMARY KEY (id)\n)")
        );
    }

    #[test]
    fn builds_column_definitions() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(
            build_column(&ColumnSpec::new("id", AbstractType::PrimaryKey))?,
            "id number NOT NULL"
        );
        let title = ColumnSpec::new("title", AbstractType::String)
            .default_value(SqlValue::Value(RowValues::Text("untitled".into())))
            .not_null();
        assert_eq!(
            build_column(&title)?,
            "title varchar2(255) DEFAULT 'untitled' NOT NULL"
        );
        assert_eq!(
            build_column(&ColumnSpec::new("code", AbstractType::String).length(3))?,
            "code varchar2(3)"
        );
        assert!(build_column(&ColumnSpec::new("", AbstractType::Text)).is_err());
        Ok(())
    }

    #[test]
    fn statement_type_parses_case_insensitively() {
        assert_eq!("SELECT".parse::<StatementType>().ok(), Some(StatementType::Select));
        assert!("merge".parse::<StatementType>().is_err());
    }
}
