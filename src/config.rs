use serde::Deserialize;

use crate::error::SqlMiddlewareDbError;

/// Connection settings for an Oracle session.
///
/// Loaded by the caller (the framework's config layer); every field is consumed
/// verbatim. Session settings map 1:1 onto `ALTER SESSION` statements issued by
/// [`OracleSource::connect`](crate::OracleSource::connect).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OracleOptions {
    /// Connect target (TNS alias or easy-connect string)
    pub database: String,
    pub login: String,
    pub password: String,
    /// Reuse a cached session across adapter instances
    pub persistent: bool,
    /// Client character set, e.g. `AL32UTF8`
    pub encoding: Option<String>,
    /// `NLS_SORT` for the session
    pub nls_sort: Option<String>,
    /// `NLS_COMP` for the session
    pub nls_comp: Option<String>,
    /// Default schema; becomes `CURRENT_SCHEMA`
    pub schema: Option<String>,
}

impl Default for OracleOptions {
    fn default() -> Self {
        Self {
            database: "cake".to_string(),
            login: "system".to_string(),
            password: String::new(),
            persistent: true,
            encoding: None,
            nls_sort: None,
            nls_comp: None,
            schema: None,
        }
    }
}

impl OracleOptions {
    #[must_use]
    pub fn new(database: String, login: String, password: String) -> Self {
        Self {
            database,
            login,
            password,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Option<String>) -> Self {
        self.schema = schema;
        self
    }

    #[must_use]
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Check the fields `connect` cannot do without.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError::ConfigError` if the connect target or login is empty.
    pub fn validate(&self) -> Result<(), SqlMiddlewareDbError> {
        if self.database.trim().is_empty() {
            return Err(SqlMiddlewareDbError::ConfigError(
                "database (connect target) must not be empty".to_string(),
            ));
        }
        if self.login.trim().is_empty() {
            return Err(SqlMiddlewareDbError::ConfigError(
                "login must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Session statements implied by these options, in the order they run.
    pub(crate) fn session_statements(&self) -> Vec<String> {
        let mut statements = Vec::with_capacity(4);
        if let Some(sort) = non_empty(self.nls_sort.as_deref()) {
            statements.push(format!("ALTER SESSION SET NLS_SORT={sort}"));
        }
        if let Some(comp) = non_empty(self.nls_comp.as_deref()) {
            statements.push(format!("ALTER SESSION SET NLS_COMP={comp}"));
        }
        if let Some(schema) = non_empty(self.schema.as_deref()) {
            statements.push(format!("ALTER SESSION SET CURRENT_SCHEMA={schema}"));
        }
        statements.push("ALTER SESSION SET NLS_DATE_FORMAT='YYYY-MM-DD HH24:MI:SS'".to_string());
        statements
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Fluent builder for Oracle options.
#[derive(Debug, Clone)]
pub struct OracleOptionsBuilder {
    opts: OracleOptions,
}

impl OracleOptionsBuilder {
    #[must_use]
    pub fn new(database: String, login: String, password: String) -> Self {
        Self {
            opts: OracleOptions::new(database, login, password),
        }
    }

    #[must_use]
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.opts.persistent = persistent;
        self
    }

    #[must_use]
    pub fn encoding(mut self, encoding: Option<String>) -> Self {
        self.opts.encoding = encoding;
        self
    }

    #[must_use]
    pub fn nls_sort(mut self, nls_sort: Option<String>) -> Self {
        self.opts.nls_sort = nls_sort;
        self
    }

    #[must_use]
    pub fn nls_comp(mut self, nls_comp: Option<String>) -> Self {
        self.opts.nls_comp = nls_comp;
        self
    }

    #[must_use]
    pub fn schema(mut self, schema: Option<String>) -> Self {
        self.opts.schema = schema;
        self
    }

    #[must_use]
    pub fn finish(self) -> OracleOptions {
        self.opts
    }
}
