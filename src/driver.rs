//! Boundary to the native Oracle client.
//!
//! The adapter never talks to the network itself. A driver opens sessions and a
//! session parses, executes and fetches statements the way the OCI call interface
//! does: rows come back as positional scalars with no column names, and the
//! commit behaviour is a flag passed to every execute call.

use async_trait::async_trait;

use crate::config::OracleOptions;
use crate::error::NativeError;
use crate::types::{CommitMode, NativeStatementType, RowValues};

/// Opens native sessions.
#[async_trait]
pub trait NativeDriver: Send + Sync {
    type Session: NativeSession;

    /// Open a session. `options.persistent` selects a cached (pconnect-style)
    /// session over a fresh one; `options.encoding` is the client character set.
    async fn open(&self, options: &OracleOptions) -> Result<Self::Session, NativeError>;
}

/// One live session; one statement in flight at a time.
#[async_trait]
pub trait NativeSession: Send {
    /// Parsed statement handle
    type Statement: Send;

    /// Parse SQL text against the session.
    async fn parse(&mut self, sql: &str) -> Result<Self::Statement, NativeError>;

    /// Run a parsed statement with the given commit flag.
    async fn execute(
        &mut self,
        statement: &mut Self::Statement,
        mode: CommitMode,
    ) -> Result<(), NativeError>;

    /// Statement type, valid once parsed.
    fn statement_type(&self, statement: &Self::Statement) -> NativeStatementType;

    /// Row-buffering hint for subsequent fetches.
    fn set_prefetch(&mut self, statement: &mut Self::Statement, rows: u32);

    /// Fetch every remaining row, skipping `skip` rows first and stopping after
    /// `max_rows` when given.
    async fn fetch_all(
        &mut self,
        statement: &mut Self::Statement,
        skip: usize,
        max_rows: Option<usize>,
    ) -> Result<Vec<Vec<RowValues>>, NativeError>;

    /// Rows affected (DML) or fetched so far (queries).
    fn num_rows(&self, statement: &Self::Statement) -> u64;

    /// Cancel further fetches on an open cursor.
    async fn cancel(&mut self, statement: &mut Self::Statement) -> Result<(), NativeError>;

    /// Release the statement's client-side resources.
    fn free(&mut self, statement: Self::Statement);

    async fn commit(&mut self) -> Result<(), NativeError>;

    async fn rollback(&mut self) -> Result<(), NativeError>;

    /// Close the session; `Ok(true)` once it is closed.
    async fn close(&mut self) -> Result<bool, NativeError>;
}
