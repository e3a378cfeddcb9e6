//! Oracle dialect adapter for a database-agnostic query framework.
//!
//! [`OracleSource`] wraps one native session and supplies what the OCI-style
//! client lacks: table-keyed rows scraped from the SELECT text, sequence-backed
//! primary keys, cached constraint introspection and a per-statement commit flag.
//! The native client sits behind [`driver::NativeDriver`]/[`driver::NativeSession`].

pub mod config;
mod connection;
pub mod constraints;
pub mod ddl;
pub mod dialect;
pub mod driver;
pub mod error;
mod executor;
pub mod field_map;
pub mod prelude;
pub mod results;
pub mod schema;
mod sequence;
mod source;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;

pub use config::{OracleOptions, OracleOptionsBuilder};
pub use error::{NativeError, SqlMiddlewareDbError};
pub use source::OracleSource;
pub use types::RowValues;
