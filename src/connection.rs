use crate::config::OracleOptions;
use crate::driver::{NativeDriver, NativeSession};
use crate::error::SqlMiddlewareDbError;
use crate::source::OracleSource;
use crate::types::{RowValues, TransactionMode};

impl<S: NativeSession> OracleSource<S> {
    /// Open a session and apply the session settings from `options`.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError::ConfigError` for unusable options and
    /// `SqlMiddlewareDbError::ConnectionError` carrying the native message if the
    /// session cannot be opened or any session statement fails.
    pub async fn connect<D>(driver: &D, options: OracleOptions) -> Result<Self, SqlMiddlewareDbError>
    where
        D: NativeDriver<Session = S>,
    {
        options.validate()?;

        let session = driver.open(&options).await.map_err(|e| {
            SqlMiddlewareDbError::ConnectionError(format!(
                "Failed to open Oracle session to {}: {e}",
                options.database
            ))
        })?;

        let statements = options.session_statements();
        let schema = options
            .schema
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_uppercase);

        let mut source = OracleSource::with_session(session, options);
        for sql in statements {
            if let Err(e) = source.execute(&sql).await {
                if let Err(close_err) = source.disconnect().await {
                    tracing::warn!(error = %close_err, "closing session after failed setup");
                }
                return Err(SqlMiddlewareDbError::ConnectionError(format!(
                    "Session setup failed ({sql}): {e}"
                )));
            }
        }
        source.default_schema = schema;

        tracing::debug!(
            database = %source.options.database,
            persistent = source.options.persistent,
            schema = ?source.default_schema,
            "oracle session ready"
        );
        Ok(source)
    }

    /// Close the session.
    ///
    /// Returns whether the session is now closed; `Ok(true)` when there was none.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError::Native` if the client fails to close.
    pub async fn disconnect(&mut self) -> Result<bool, SqlMiddlewareDbError> {
        let Some(mut session) = self.session.take() else {
            return Ok(true);
        };
        if let Some(statement) = self.statement.take() {
            session.free(statement.handle);
        }
        match session.close().await {
            Ok(true) => Ok(true),
            Ok(false) => {
                self.session = Some(session);
                Ok(false)
            }
            Err(e) => {
                self.session = Some(session);
                Err(e.into())
            }
        }
    }

    /// Switch to explicit mode: later statements wait for `commit`/`rollback`.
    ///
    /// Oracle has no BEGIN; this only changes the commit flag of later statements.
    pub fn begin(&mut self) -> bool {
        self.transaction_mode = TransactionMode::Explicit;
        true
    }

    /// Return to auto-commit mode and commit pending work.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError::ConnectionError` when not connected and
    /// `SqlMiddlewareDbError::Native` if the commit fails.
    pub async fn commit(&mut self) -> Result<(), SqlMiddlewareDbError> {
        self.transaction_mode = TransactionMode::AutoCommit;
        self.session_mut()?.commit().await?;
        Ok(())
    }

    /// Roll back pending work and return to auto-commit mode.
    ///
    /// Unlike a bare client rollback, this ends the explicit transaction too;
    /// a new `begin` is needed before deferring commits again.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError::ConnectionError` when not connected and
    /// `SqlMiddlewareDbError::Native` if the rollback fails.
    pub async fn rollback(&mut self) -> Result<(), SqlMiddlewareDbError> {
        self.transaction_mode = TransactionMode::AutoCommit;
        self.session_mut()?.rollback().await?;
        Ok(())
    }

    /// Set `NLS_LANGUAGE` for the session.
    ///
    /// # Errors
    ///
    /// Returns the execution error if the statement fails.
    pub async fn set_encoding(&mut self, language: &str) -> Result<(), SqlMiddlewareDbError> {
        self.execute(&format!("ALTER SESSION SET NLS_LANGUAGE={language}"))
            .await?;
        Ok(())
    }

    /// Current `NLS_LANGUAGE` of the session.
    ///
    /// # Errors
    ///
    /// Returns the execution error if the lookup fails.
    pub async fn encoding(&mut self) -> Result<Option<String>, SqlMiddlewareDbError> {
        self.execute("SELECT VALUE FROM NLS_SESSION_PARAMETERS WHERE PARAMETER='NLS_LANGUAGE'")
            .await?;
        let language = self
            .fetch_row()
            .and_then(|row| row.ungrouped("value").and_then(text_of));
        self.finish().await?;
        Ok(language)
    }

    /// Server banner from `V$VERSION`.
    ///
    /// # Errors
    ///
    /// Returns the execution error if the lookup fails.
    pub async fn version(&mut self) -> Result<Option<String>, SqlMiddlewareDbError> {
        self.execute("SELECT BANNER FROM SYS.V_$VERSION").await?;
        let banner = self
            .fetch_row()
            .and_then(|row| row.ungrouped("banner").and_then(text_of));
        self.finish().await?;
        Ok(banner)
    }

    pub(crate) fn session_mut(&mut self) -> Result<&mut S, SqlMiddlewareDbError> {
        self.session
            .as_mut()
            .ok_or_else(|| SqlMiddlewareDbError::ConnectionError("not connected".to_string()))
    }
}

pub(crate) fn text_of(value: &RowValues) -> Option<String> {
    match value {
        RowValues::Null => None,
        RowValues::Text(text) => Some(text.clone()),
        RowValues::Int(i) => Some(i.to_string()),
        RowValues::Float(f) => Some(f.to_string()),
        RowValues::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        RowValues::Timestamp(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        RowValues::JSON(json) => Some(json.to_string()),
        RowValues::Blob(_) => None,
    }
}
