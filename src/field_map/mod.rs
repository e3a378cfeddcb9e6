//! Reconstructs column provenance from SELECT text.
//!
//! The native client hands back rows as bare positional values, so the table
//! alias and column name for each position are scraped from the field list of
//! the statement that produced them. This is a lexical pass over the field list
//! only. Known blind spot: the list is split on `,` followed by whitespace, so a
//! function call such as `NVL(a, 0)` in the field list is split in two.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

mod scanner;

use scanner::{strip_select, top_level_from};

/// Aggregate item emitted by the framework for `find('count')`.
pub const COUNT_MARKER: &str = "COUNT(*) AS count";

lazy_static! {
    static ref FIELD_SEPARATOR: Regex = Regex::new(r",\s+").expect("valid field separator");
    static ref TRAILING_IDENT: Regex =
        Regex::new(r"\s+(\w+(?:\.\w+)*)$").expect("valid trailing identifier");
    static ref LEADING_ALIAS: Regex = Regex::new(r"^(\w+\.)").expect("valid leading alias");
}

/// Table grouping for a mapped field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableKey {
    /// The `0` bucket: unqualified fields and aggregates
    Ungrouped,
    /// A table alias taken from an `alias.column` item
    Alias(String),
}

impl TableKey {
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        match self {
            TableKey::Ungrouped => None,
            TableKey::Alias(alias) => Some(alias),
        }
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKey::Ungrouped => f.write_str("0"),
            TableKey::Alias(alias) => f.write_str(alias),
        }
    }
}

/// One position of the field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEntry {
    Column { table: TableKey, column: String },
    /// Item whose name contains `" count"`; lands in the `0`/`count` slot
    CountAggregate { column: String },
}

impl FieldEntry {
    fn from_token(token: &str) -> Self {
        let parts: Vec<&str> = token.split('.').collect();
        let (table, column) = if parts.len() > 1 {
            (TableKey::Alias(parts[0].to_string()), parts[1].to_lowercase())
        } else {
            (TableKey::Ungrouped, parts[0].to_lowercase())
        };

        // Substring match kept for compatibility with the framework's count items
        if column.find(" count").is_some_and(|pos| pos > 0) {
            FieldEntry::CountAggregate { column }
        } else {
            FieldEntry::Column { table, column }
        }
    }

    /// Placeholder for a row position the field list did not account for.
    pub(crate) fn positional(index: usize) -> Self {
        FieldEntry::Column {
            table: TableKey::Ungrouped,
            column: index.to_string(),
        }
    }

    #[must_use]
    pub fn table(&self) -> &TableKey {
        match self {
            FieldEntry::Column { table, .. } => table,
            FieldEntry::CountAggregate { .. } => &TableKey::Ungrouped,
        }
    }

    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            FieldEntry::Column { column, .. } | FieldEntry::CountAggregate { column } => column,
        }
    }
}

/// Ordered (table-key, column) pairs, parallel to a row's fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<FieldEntry>,
    last_alias: Option<String>,
}

impl FieldMap {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[FieldEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&FieldEntry> {
        self.entries.get(index)
    }

    /// Alias of the last qualified item in the field list.
    #[must_use]
    pub fn last_alias(&self) -> Option<&str> {
        self.last_alias.as_deref()
    }

    /// Make the map exactly `width` long.
    ///
    /// Extra entries are dropped; missing ones become positional `0` bucket entries.
    pub(crate) fn fit_to(&mut self, width: usize) {
        if self.entries.len() > width {
            tracing::debug!(
                scraped = self.entries.len(),
                width,
                "field list longer than fetched row"
            );
            self.entries.truncate(width);
        }
        while self.entries.len() < width {
            let index = self.entries.len();
            self.entries.push(FieldEntry::positional(index));
        }
    }
}

/// Build the field map for a SELECT-class statement.
#[must_use]
pub fn scrape_field_map(sql: &str) -> FieldMap {
    let sql = sql.replace('"', "");
    let pre_from = match top_level_from(&sql) {
        Some(idx) => &sql[..idx],
        None => sql.as_str(),
    };
    let field_list = strip_select(pre_from).trim();

    let mut last_alias = None;
    let entries = FIELD_SEPARATOR
        .split(field_list)
        .map(|item| {
            let token = if item == COUNT_MARKER {
                item.to_string()
            } else {
                field_token(item)
            };
            if let Some((alias, _)) = token.split_once('.') {
                last_alias = Some(alias.to_string());
            }
            FieldEntry::from_token(&token)
        })
        .collect();

    FieldMap {
        entries,
        last_alias,
    }
}

/// Trailing identifier of a field-list item, re-qualified with the item's leading alias.
fn field_token(item: &str) -> String {
    let Some(trailing) = TRAILING_IDENT.captures(item) else {
        return item.to_string();
    };
    let mut token = trailing[1].to_string();
    if let Some(prefix) = LEADING_ALIAS.captures(item) {
        token = format!("{}{token}", &prefix[1]);
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(table: Option<&str>, column: &str) -> FieldEntry {
        FieldEntry::Column {
            table: table.map_or(TableKey::Ungrouped, |t| TableKey::Alias(t.to_string())),
            column: column.to_string(),
        }
    }

    #[test]
    fn qualified_columns_keep_their_alias() {
        let map = scrape_field_map("SELECT orders.total, orders.ID FROM orders WHERE 1 = 1");
        assert_eq!(
            map.entries(),
            &[column(Some("orders"), "total"), column(Some("orders"), "id")]
        );
        assert_eq!(map.last_alias(), Some("orders"));
    }

    #[test]
    fn unqualified_columns_go_to_ungrouped_bucket() {
        let map = scrape_field_map("SELECT COLUMN_NAME, DATA_TYPE FROM all_tab_columns");
        assert_eq!(
            map.entries(),
            &[column(None, "column_name"), column(None, "data_type")]
        );
        assert_eq!(map.last_alias(), None);
    }

    #[test]
    fn count_marker_becomes_aggregate_slot() {
        let map = scrape_field_map("SELECT COUNT(*) AS count FROM orders Order");
        assert_eq!(map.len(), 1);
        assert!(matches!(
            map.get(0),
            Some(FieldEntry::CountAggregate { column }) if column == "count(*) as count"
        ));
        assert_eq!(map.get(0).unwrap().table(), &TableKey::Ungrouped);
    }

    #[test]
    fn aliased_items_take_trailing_identifier() {
        let sql = r#"SELECT "Order"."id" AS "Order__id", MAX(COLUMN_NAME) COLUMN_NAME FROM x"#;
        let map = scrape_field_map(sql);
        assert_eq!(
            map.entries(),
            &[
                column(Some("Order"), "order__id"),
                column(None, "column_name")
            ]
        );
    }

    #[test]
    fn multiline_field_lists_split_on_comma_whitespace() {
        let sql = "\n\tSELECT table_name,\n\t\tc.constraint_name\n\tFROM all_cons_columns cc";
        let map = scrape_field_map(sql);
        assert_eq!(
            map.entries(),
            &[column(None, "table_name"), column(Some("c"), "constraint_name")]
        );
    }

    #[test]
    fn sequence_pseudo_columns_are_qualified_by_sequence() {
        let map = scrape_field_map("SELECT orders_seq.nextval FROM dual");
        assert_eq!(map.entries(), &[column(Some("orders_seq"), "nextval")]);
    }

    #[test]
    fn function_call_commas_split_the_item() {
        // documented limitation: one select item becomes two entries
        let map = scrape_field_map("SELECT NVL(a.x, 0) AS x FROM a");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn fit_to_pads_and_truncates() {
        let mut map = scrape_field_map("SELECT a.x FROM a");
        map.fit_to(3);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(2), Some(&column(None, "2")));
        map.fit_to(1);
        assert_eq!(map.entries(), &[column(Some("a"), "x")]);
    }
}
