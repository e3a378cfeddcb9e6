use crate::connection::text_of;
use crate::driver::NativeSession;
use crate::error::SqlMiddlewareDbError;
use crate::source::OracleSource;
use crate::types::ConstraintAction;

const KEY_CONSTRAINTS_SQL: &str = "SELECT cc.table_name, c.constraint_name FROM all_cons_columns cc LEFT JOIN all_indexes i ON (cc.constraint_name = i.index_name) LEFT JOIN all_constraints c ON (c.constraint_name = cc.constraint_name) WHERE c.constraint_type IN ('P', 'U')";
const ALL_CONSTRAINTS_SQL: &str =
    "SELECT table_name, constraint_name, r_constraint_name FROM all_constraints";

/// A constraint and the table that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintRef {
    pub table: String,
    pub constraint: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConstraintEdge {
    table: String,
    constraint: String,
    referenced: Option<String>,
}

/// Catalog snapshot read on first use and kept for the source's lifetime.
#[derive(Debug, Default)]
pub(crate) struct ConstraintCache {
    key_constraints: Option<Vec<ConstraintRef>>,
    constraints: Option<Vec<ConstraintEdge>>,
}

/// Result of [`OracleSource::constraint`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintOutcome {
    /// Constraints referencing the table's primary/unique keys
    pub constraints: Vec<ConstraintRef>,
    /// ALTER statements that failed, with the error text
    pub failures: Vec<(ConstraintRef, String)>,
}

impl ConstraintOutcome {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<S: NativeSession> OracleSource<S> {
    /// List, enable or disable the constraints of other tables that reference
    /// `table`'s primary or unique keys.
    ///
    /// Enabling and disabling is best-effort: a failing ALTER is recorded in
    /// [`ConstraintOutcome::failures`] and the remaining statements still run.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError::PreconditionViolation` for an empty table
    /// name and `SqlMiddlewareDbError::IntrospectionError` if the catalog
    /// snapshot cannot be read.
    pub async fn constraint(
        &mut self,
        action: ConstraintAction,
        table: &str,
    ) -> Result<ConstraintOutcome, SqlMiddlewareDbError> {
        if table.trim().is_empty() {
            return Err(SqlMiddlewareDbError::PreconditionViolation(
                "Must specify table to operate on constraints".to_string(),
            ));
        }
        let table = table.to_uppercase();
        let dependents = self.dependent_constraints(&table).await?;

        let mut outcome = ConstraintOutcome::default();
        let verb = match action {
            ConstraintAction::List => {
                outcome.constraints = dependents;
                return Ok(outcome);
            }
            ConstraintAction::Enable => "ENABLE",
            ConstraintAction::Disable => "DISABLE",
        };

        for dependent in &dependents {
            let sql = format!(
                "ALTER TABLE {} {verb} CONSTRAINT {}",
                dependent.table, dependent.constraint
            );
            if let Err(e) = self.execute(&sql).await {
                tracing::warn!(table = %dependent.table, constraint = %dependent.constraint, error = %e, "constraint change failed");
                outcome.failures.push((dependent.clone(), e.to_string()));
            }
        }
        outcome.constraints = dependents;
        Ok(outcome)
    }

    async fn dependent_constraints(
        &mut self,
        table: &str,
    ) -> Result<Vec<ConstraintRef>, SqlMiddlewareDbError> {
        if self.constraint_cache.key_constraints.is_none() {
            let rows = self
                .query(KEY_CONSTRAINTS_SQL)
                .await
                .map_err(SqlMiddlewareDbError::into_introspection)?;
            let keys = rows
                .iter()
                .filter_map(|row| {
                    Some(ConstraintRef {
                        table: row.get("cc", "table_name").and_then(text_of)?,
                        constraint: row.get("c", "constraint_name").and_then(text_of)?,
                    })
                })
                .collect();
            self.constraint_cache.key_constraints = Some(keys);
        }
        if self.constraint_cache.constraints.is_none() {
            let rows = self
                .query(ALL_CONSTRAINTS_SQL)
                .await
                .map_err(SqlMiddlewareDbError::into_introspection)?;
            let edges = rows
                .iter()
                .filter_map(|row| {
                    Some(ConstraintEdge {
                        table: row.ungrouped("table_name").and_then(text_of)?,
                        constraint: row.ungrouped("constraint_name").and_then(text_of)?,
                        referenced: row.ungrouped("r_constraint_name").and_then(text_of),
                    })
                })
                .collect();
            self.constraint_cache.constraints = Some(edges);
        }

        let cache = &self.constraint_cache;
        let related: Vec<&str> = cache
            .key_constraints
            .iter()
            .flatten()
            .filter(|key| key.table == table)
            .map(|key| key.constraint.as_str())
            .collect();

        let mut dependents: Vec<ConstraintRef> = Vec::new();
        for edge in cache.constraints.iter().flatten() {
            let Some(referenced) = edge.referenced.as_deref() else {
                continue;
            };
            if !related.contains(&referenced) {
                continue;
            }
            let dependent = ConstraintRef {
                table: edge.table.clone(),
                constraint: edge.constraint.clone(),
            };
            if !dependents.contains(&dependent) {
                dependents.push(dependent);
            }
        }
        Ok(dependents)
    }
}
