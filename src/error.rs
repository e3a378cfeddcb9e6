use thiserror::Error;

/// Diagnostic reported by the native client (`ORA-nnnnn: ...`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NativeError {
    /// Numeric ORA code, when the client reported one
    pub code: Option<i32>,
    /// Full message text as produced by the client
    pub message: String,
}

impl NativeError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SqlMiddlewareDbError {
    #[error(transparent)]
    Native(#[from] NativeError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL prepare error: {0}")]
    PrepareError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Introspection error: {0}")]
    IntrospectionError(String),

    #[error("Precondition violation: {0}")]
    PreconditionViolation(String),
}

impl SqlMiddlewareDbError {
    /// Re-tag an execution failure raised while querying catalog views.
    pub(crate) fn into_introspection(self) -> Self {
        match self {
            SqlMiddlewareDbError::ExecutionError(msg) | SqlMiddlewareDbError::PrepareError(msg) => {
                SqlMiddlewareDbError::IntrospectionError(msg)
            }
            other => other,
        }
    }
}
