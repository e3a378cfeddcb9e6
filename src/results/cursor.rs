use crate::field_map::FieldMap;
use crate::types::{RowValues, StatementKind};

use super::row::MappedRow;

/// Prefetch hint used when no limit is pending.
pub const DEFAULT_PREFETCH: u32 = 3000;

/// Limit/offset for the next `execute` call only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    /// Row limit; anything below 1 means "all rows"
    pub limit: i64,
    /// Rows to skip before the first returned row
    pub offset: usize,
}

impl Default for FetchWindow {
    fn default() -> Self {
        Self {
            limit: -1,
            offset: 0,
        }
    }
}

impl FetchWindow {
    /// Maximum rows to fetch, `None` when unlimited.
    #[must_use]
    pub fn max_rows(&self) -> Option<usize> {
        if self.limit >= 1 {
            usize::try_from(self.limit).ok()
        } else {
            None
        }
    }

    /// Prefetch hint: the limit when one is set, otherwise [`DEFAULT_PREFETCH`].
    #[must_use]
    pub fn prefetch(&self) -> u32 {
        if self.limit >= 1 {
            u32::try_from(self.limit).unwrap_or(u32::MAX)
        } else {
            DEFAULT_PREFETCH
        }
    }
}

/// What `execute` reports about the statement it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementInfo {
    pub kind: StatementKind,
    /// Buffered rows, for row-producing statements
    pub row_count: Option<usize>,
    /// Prefetch hint applied, for row-producing statements
    pub prefetch: Option<u32>,
    /// Rows affected (DML) or fetched (queries) as reported by the client
    pub affected: u64,
}

/// Materialized rows plus the cursor over them.
#[derive(Debug)]
pub(crate) struct ResultBuffer {
    field_map: FieldMap,
    rows: Vec<Vec<RowValues>>,
    cursor: usize,
}

impl ResultBuffer {
    pub(crate) fn new(mut field_map: FieldMap, rows: Vec<Vec<RowValues>>) -> Self {
        if let Some(first) = rows.first() {
            field_map.fit_to(first.len());
        }
        Self {
            field_map,
            rows,
            cursor: 0,
        }
    }

    pub(crate) fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub(crate) fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.cursor >= self.rows.len()
    }

    /// Reshape the row under the cursor and advance; `None` at the end.
    pub(crate) fn next_row(&mut self) -> Option<MappedRow> {
        if self.is_exhausted() {
            return None;
        }
        let fields = std::mem::take(&mut self.rows[self.cursor]);
        self.cursor += 1;
        Some(MappedRow::from_fields(&self.field_map, fields))
    }
}

/// One executed statement and its artifacts.
pub(crate) struct Statement<H> {
    pub(crate) handle: H,
    pub(crate) kind: StatementKind,
    pub(crate) buffer: Option<ResultBuffer>,
}

impl<H> Statement<H> {
    pub(crate) fn new(handle: H, kind: StatementKind) -> Self {
        Self {
            handle,
            kind,
            buffer: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_map::scrape_field_map;

    #[test]
    fn window_defaults_to_unlimited() {
        let window = FetchWindow::default();
        assert_eq!(window.max_rows(), None);
        assert_eq!(window.prefetch(), DEFAULT_PREFETCH);

        let window = FetchWindow {
            limit: 25,
            offset: 50,
        };
        assert_eq!(window.max_rows(), Some(25));
        assert_eq!(window.prefetch(), 25);
    }

    #[test]
    fn buffer_yields_each_row_once() {
        let map = scrape_field_map("SELECT a.x, a.y FROM a");
        let mut buffer = ResultBuffer::new(
            map,
            vec![
                vec![RowValues::Int(1), RowValues::Int(2)],
                vec![RowValues::Int(3), RowValues::Int(4)],
            ],
        );
        assert_eq!(buffer.row_count(), 2);
        assert_eq!(buffer.field_map().len(), 2);
        assert_eq!(
            buffer.next_row().unwrap().get("a", "y"),
            Some(&RowValues::Int(2))
        );
        assert_eq!(
            buffer.next_row().unwrap().get("a", "x"),
            Some(&RowValues::Int(3))
        );
        assert!(buffer.next_row().is_none());
        assert!(buffer.is_exhausted());
    }

    #[test]
    fn map_is_fitted_to_row_width() {
        let map = scrape_field_map("SELECT NVL(a.x, 0) AS x FROM a");
        let buffer = ResultBuffer::new(map, vec![vec![RowValues::Int(0)]]);
        assert_eq!(buffer.field_map().len(), 1);
    }
}
