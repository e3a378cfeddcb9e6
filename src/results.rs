//! Result buffering and row reshaping.

mod cursor;
mod row;

pub(crate) use cursor::{ResultBuffer, Statement};
pub use cursor::{FetchWindow, StatementInfo};
pub use row::{MappedRow, TableGroup};
