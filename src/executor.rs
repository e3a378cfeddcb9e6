use crate::driver::NativeSession;
use crate::error::{NativeError, SqlMiddlewareDbError};
use crate::field_map::scrape_field_map;
use crate::results::{FetchWindow, MappedRow, ResultBuffer, Statement, StatementInfo};
use crate::source::OracleSource;
use crate::types::StatementKind;

impl<S: NativeSession> OracleSource<S> {
    /// Limit (and offset) the rows buffered by the next `execute` call.
    ///
    /// Applies to exactly one execution; every `execute` resets it, so set it
    /// again before each statement that needs it. `limit < 1` means no limit.
    pub fn limit(&mut self, limit: i64, offset: i64) {
        self.window = FetchWindow {
            limit,
            offset: usize::try_from(offset).unwrap_or(0),
        };
    }

    /// Parse and run `sql`, buffering its rows when it produces any.
    ///
    /// The statement commits immediately in auto-commit mode and waits for
    /// `commit`/`rollback` in explicit mode. Row-producing statements get a
    /// field map scraped from `sql` and their rows fetched under the pending
    /// limit/offset. The limit/offset is reset whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError::ConnectionError` when not connected,
    /// `SqlMiddlewareDbError::PrepareError` if parsing fails and
    /// `SqlMiddlewareDbError::ExecutionError` if execution or fetching fails.
    pub async fn execute(&mut self, sql: &str) -> Result<StatementInfo, SqlMiddlewareDbError> {
        let window = std::mem::take(&mut self.window);
        let mode = self.transaction_mode.commit_mode();
        self.release_statement();
        self.num_rows = None;
        self.affected = None;

        let Some(session) = self.session.as_mut() else {
            return Err(SqlMiddlewareDbError::ConnectionError(
                "not connected".to_string(),
            ));
        };

        let mut handle = match session.parse(sql).await {
            Ok(handle) => handle,
            Err(e) => {
                let msg = format!("{e}");
                self.last_error = Some(e);
                return Err(SqlMiddlewareDbError::PrepareError(msg));
            }
        };

        if let Err(e) = session.execute(&mut handle, mode).await {
            session.free(handle);
            return Err(self.execution_failed(sql, e));
        }

        let kind = StatementKind::from(session.statement_type(&handle));
        let mut statement = Statement::new(handle, kind);
        let mut info = StatementInfo {
            kind,
            row_count: None,
            prefetch: None,
            affected: 0,
        };

        if kind == StatementKind::Rows {
            let field_map = scrape_field_map(sql);
            let prefetch = window.prefetch();
            session.set_prefetch(&mut statement.handle, prefetch);

            let fetched = session
                .fetch_all(&mut statement.handle, window.offset, window.max_rows())
                .await;
            let rows = match fetched {
                Ok(rows) => rows,
                Err(e) => {
                    session.free(statement.handle);
                    return Err(self.execution_failed(sql, e));
                }
            };

            let buffer = ResultBuffer::new(field_map, rows);
            info.row_count = Some(buffer.row_count());
            info.prefetch = Some(prefetch);
            self.num_rows = Some(buffer.row_count());
            statement.buffer = Some(buffer);
        }

        info.affected = session.num_rows(&statement.handle);
        self.affected = Some(info.affected);
        self.last_error = None;
        self.statement = Some(statement);
        Ok(info)
    }

    /// Next row of the current result set, reshaped by table.
    ///
    /// `None` is end-of-results: the buffer and field map are released and the
    /// statement is done. Further calls keep returning `None` until the next
    /// `execute`.
    pub fn fetch_row(&mut self) -> Option<MappedRow> {
        let statement = self.statement.as_mut()?;
        if let Some(buffer) = statement.buffer.as_mut()
            && let Some(row) = buffer.next_row()
        {
            return Some(row);
        }
        self.release_statement();
        None
    }

    /// Alias of [`fetch_row`](Self::fetch_row).
    pub fn fetch_result(&mut self) -> Option<MappedRow> {
        self.fetch_row()
    }

    /// Abandon the current statement, cancelling an unfinished cursor.
    ///
    /// Safe to call repeatedly; without a statement it does nothing.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError::Native` if the client fails to cancel.
    pub async fn finish(&mut self) -> Result<(), SqlMiddlewareDbError> {
        let Some(mut statement) = self.statement.take() else {
            return Ok(());
        };
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let open = statement
            .buffer
            .as_ref()
            .is_some_and(|buffer| !buffer.is_exhausted());
        let outcome = if open {
            session.cancel(&mut statement.handle).await
        } else {
            Ok(())
        };
        session.free(statement.handle);
        outcome.map_err(Into::into)
    }

    /// Execute `sql` and drain every row.
    ///
    /// # Errors
    ///
    /// Returns the error from [`execute`](Self::execute).
    pub async fn query(&mut self, sql: &str) -> Result<Vec<MappedRow>, SqlMiddlewareDbError> {
        self.execute(sql).await?;
        let mut rows = Vec::with_capacity(self.num_rows.unwrap_or(0));
        while let Some(row) = self.fetch_row() {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Rows buffered by the last row-producing `execute`.
    #[must_use]
    pub fn last_num_rows(&self) -> Option<usize> {
        self.num_rows
    }

    /// Rows affected by (or fetched for) the last statement.
    #[must_use]
    pub fn last_affected(&self) -> Option<u64> {
        self.affected
    }

    /// Whether the last statement touched any rows.
    #[must_use]
    pub fn has_result(&self) -> bool {
        self.affected.is_some_and(|n| n > 0)
    }

    pub(crate) fn release_statement(&mut self) {
        if let Some(statement) = self.statement.take()
            && let Some(session) = self.session.as_mut()
        {
            session.free(statement.handle);
        }
    }

    fn execution_failed(&mut self, sql: &str, error: NativeError) -> SqlMiddlewareDbError {
        tracing::error!(sql = %sql, code = ?error.code, error = %error, "oracle statement failed");
        let msg = format!("{error}");
        self.last_error = Some(error);
        SqlMiddlewareDbError::ExecutionError(msg)
    }
}
