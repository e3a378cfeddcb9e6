use crate::connection::text_of;
use crate::driver::NativeSession;
use crate::error::SqlMiddlewareDbError;
use crate::schema::TableRef;
use crate::source::OracleSource;
use crate::types::{RowValues, TruncateMode};

/// ORA-08002: sequence CURRVAL is not yet defined in this session.
const CURRVAL_UNDEFINED: i32 = 8002;

/// `owner.name` → `name`.
fn bare_sequence(sequence: &str) -> &str {
    sequence.rsplit_once('.').map_or(sequence, |(_, name)| name)
}

impl<S: NativeSession> OracleSource<S> {
    /// Whether `name` exists as a sequence, in `owner` when given, otherwise in
    /// the session user's own sequences.
    ///
    /// # Errors
    ///
    /// Returns the execution error if the catalog query fails.
    pub async fn sequence_exists(
        &mut self,
        name: &str,
        owner: Option<&str>,
    ) -> Result<bool, SqlMiddlewareDbError> {
        let name = name.to_uppercase();
        let sql = match owner.filter(|o| !o.is_empty()) {
            Some(owner) => format!(
                "SELECT sequence_name FROM all_sequences WHERE sequence_name = '{name}' AND sequence_owner = '{}'",
                owner.to_uppercase()
            ),
            None => format!("SELECT sequence_name FROM user_sequences WHERE sequence_name = '{name}'"),
        };
        let rows = self.query(&sql).await?;
        Ok(!rows.is_empty())
    }

    /// # Errors
    ///
    /// Returns the execution error if the DDL fails.
    pub async fn create_sequence(&mut self, name: &str) -> Result<(), SqlMiddlewareDbError> {
        self.execute(&format!("CREATE SEQUENCE {name}")).await?;
        Ok(())
    }

    /// Install the `BEFORE INSERT` trigger that fills `ID` from `pk_<table>`.
    ///
    /// # Errors
    ///
    /// Returns the execution error if the DDL fails.
    pub async fn create_trigger(&mut self, table: &str) -> Result<(), SqlMiddlewareDbError> {
        let sql = format!(
            "CREATE OR REPLACE TRIGGER pk_{table}_trigger BEFORE INSERT ON {table} FOR EACH ROW BEGIN SELECT pk_{table}.NEXTVAL INTO :NEW.ID FROM DUAL; END;"
        );
        self.execute(&sql).await?;
        Ok(())
    }

    /// Current value of the sequence mapped to `table`.
    ///
    /// `Ok(None)` when no sequence is mapped (the table was never described or
    /// has none). Reading the current value requires a `NEXTVAL` earlier in the
    /// same session.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError::PreconditionViolation` when the sequence
    /// has not been advanced in this session, or the execution error otherwise.
    pub async fn last_insert_id(&mut self, table: &str) -> Result<Option<i64>, SqlMiddlewareDbError> {
        let table = TableRef::new(table);
        let Some(sequence) = self.sequence_for(&table.table).flatten().map(str::to_string) else {
            return Ok(None);
        };

        if let Err(e) = self.execute(&format!("SELECT {sequence}.currval FROM dual")).await {
            if self.last_error.as_ref().and_then(|n| n.code) == Some(CURRVAL_UNDEFINED) {
                return Err(SqlMiddlewareDbError::PreconditionViolation(format!(
                    "{sequence}.NEXTVAL has not been called in this session: {e}"
                )));
            }
            return Err(e);
        }
        let id = self
            .fetch_row()
            .and_then(|row| row.first().and_then(RowValues::as_int));
        self.finish().await?;
        Ok(id)
    }

    /// Delete every row of `table`, then handle its sequence per `mode`.
    ///
    /// Uses `DELETE` rather than `TRUNCATE`. Only sequences present in the
    /// sequence catalog are touched. With [`TruncateMode::Reset`] the sequence
    /// is walked back so the next generated id equals its minimum value (a
    /// minimum of 1 is treated as 0, so the next id is 1).
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError::PreconditionViolation` for an empty table
    /// name, or the execution error of the first failing statement.
    pub async fn truncate_table(
        &mut self,
        table: &TableRef,
        mode: TruncateMode,
    ) -> Result<(), SqlMiddlewareDbError> {
        if table.table.trim().is_empty() {
            return Err(SqlMiddlewareDbError::PreconditionViolation(
                "truncate_table requires a table name".to_string(),
            ));
        }
        self.load_sequence_catalog().await?;

        let full_name = self.full_table_name(table);
        self.execute(&format!("DELETE FROM {full_name}")).await?;

        let Some(sequence) = self.sequence_for(&table.table).flatten().map(str::to_string) else {
            return Ok(());
        };
        if !self.catalog_contains(&sequence) {
            tracing::debug!(%sequence, "sequence not in catalog, left untouched");
            return Ok(());
        }

        match mode {
            TruncateMode::Reset => self.reset_sequence(&sequence).await,
            TruncateMode::Drop => {
                tracing::debug!(%sequence, "drop mode leaves the sequence in place");
                Ok(())
            }
            TruncateMode::Leave => Ok(()),
        }
    }

    async fn reset_sequence(&mut self, sequence: &str) -> Result<(), SqlMiddlewareDbError> {
        let current = self
            .single_int(&format!("SELECT {sequence}.nextval FROM dual"))
            .await?;

        let owner_clause = sequence
            .rsplit_once('.')
            .map(|(owner, _)| format!(" AND sequence_owner = '{}'", owner.to_uppercase()))
            .unwrap_or_default();
        let mut min_value = self
            .single_int(&format!(
                "SELECT min_value FROM all_sequences WHERE sequence_name = '{}'{owner_clause}",
                bare_sequence(sequence).to_uppercase()
            ))
            .await?;
        if min_value == 1 {
            min_value = 0;
        }

        let offset = -(current - min_value);
        tracing::debug!(%sequence, current, min_value, offset, "resetting sequence");
        if offset == 0 {
            return Ok(());
        }
        self.execute(&format!(
            "ALTER SEQUENCE {sequence} INCREMENT BY {offset} MINVALUE {min_value}"
        ))
        .await?;
        self.execute(&format!("SELECT {sequence}.nextval FROM dual"))
            .await?;
        self.finish().await?;
        self.execute(&format!("ALTER SEQUENCE {sequence} INCREMENT BY 1"))
            .await?;
        Ok(())
    }

    async fn load_sequence_catalog(&mut self) -> Result<(), SqlMiddlewareDbError> {
        if self.sequence_catalog.is_some() {
            return Ok(());
        }
        let rows = self.query("SELECT sequence_name FROM all_sequences").await?;
        let names = rows
            .iter()
            .filter_map(|row| row.ungrouped("sequence_name").and_then(text_of))
            .map(|name| name.to_lowercase())
            .collect();
        self.sequence_catalog = Some(names);
        Ok(())
    }

    fn catalog_contains(&self, sequence: &str) -> bool {
        let wanted = bare_sequence(sequence).to_lowercase();
        self.sequence_catalog
            .as_ref()
            .is_some_and(|names| names.iter().any(|name| *name == wanted))
    }

    async fn single_int(&mut self, sql: &str) -> Result<i64, SqlMiddlewareDbError> {
        self.execute(sql).await?;
        let value = self
            .fetch_row()
            .and_then(|row| row.first().and_then(RowValues::as_int));
        self.finish().await?;
        value.ok_or_else(|| {
            SqlMiddlewareDbError::ExecutionError(format!("no numeric value returned by: {sql}"))
        })
    }
}
