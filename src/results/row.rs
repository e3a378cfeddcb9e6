use serde_json::{Map, Value as JsonValue};

use crate::field_map::{FieldEntry, FieldMap, TableKey};
use crate::types::RowValues;

/// Columns of one table key within a row, in field-list order.
#[derive(Debug, Clone, PartialEq)]
pub struct TableGroup {
    pub table: TableKey,
    pub columns: Vec<(String, RowValues)>,
}

impl TableGroup {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&RowValues> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

/// A fetched row keyed by table, then by column.
///
/// Unqualified fields live under [`TableKey::Ungrouped`] (the `0` bucket);
/// the framework's `COUNT(*) AS count` item lands at `0`/`count`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedRow {
    groups: Vec<TableGroup>,
}

impl MappedRow {
    /// Reshape positional `fields` using `map`.
    ///
    /// Positions beyond the map fall into the `0` bucket under their index.
    #[must_use]
    pub fn from_fields(map: &FieldMap, fields: Vec<RowValues>) -> Self {
        let mut row = MappedRow::default();
        for (index, value) in fields.into_iter().enumerate() {
            match map.get(index) {
                Some(FieldEntry::CountAggregate { .. }) => {
                    row.insert(TableKey::Ungrouped, "count".to_string(), value);
                }
                Some(FieldEntry::Column { table, column }) => {
                    row.insert(table.clone(), column.clone(), value);
                }
                None => row.insert(TableKey::Ungrouped, index.to_string(), value),
            }
        }
        row
    }

    /// Set `table`/`column`, replacing an earlier value for the same pair.
    pub fn insert(&mut self, table: TableKey, column: String, value: RowValues) {
        let group = match self.groups.iter().position(|g| g.table == table) {
            Some(idx) => &mut self.groups[idx],
            None => {
                self.groups.push(TableGroup {
                    table,
                    columns: Vec::new(),
                });
                let last = self.groups.len() - 1;
                &mut self.groups[last]
            }
        };
        match group.columns.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => group.columns.push((column, value)),
        }
    }

    #[must_use]
    pub fn group(&self, table: &TableKey) -> Option<&TableGroup> {
        self.groups.iter().find(|g| &g.table == table)
    }

    #[must_use]
    pub fn groups(&self) -> &[TableGroup] {
        &self.groups
    }

    /// Value of `alias.column`.
    #[must_use]
    pub fn get(&self, alias: &str, column: &str) -> Option<&RowValues> {
        self.groups
            .iter()
            .find(|g| g.table.alias() == Some(alias))
            .and_then(|g| g.get(column))
    }

    /// Value of an unqualified column.
    #[must_use]
    pub fn ungrouped(&self, column: &str) -> Option<&RowValues> {
        self.group(&TableKey::Ungrouped).and_then(|g| g.get(column))
    }

    /// First value of the row in field-list order.
    #[must_use]
    pub fn first(&self) -> Option<&RowValues> {
        self.groups
            .first()
            .and_then(|g| g.columns.first())
            .map(|(_, value)| value)
    }

    /// The aggregate `count` slot.
    #[must_use]
    pub fn count(&self) -> Option<&RowValues> {
        self.ungrouped("count")
    }

    /// Nested JSON object, `{"0": {...}, "Alias": {...}}`.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut outer = Map::new();
        for group in &self.groups {
            let inner: Map<String, JsonValue> = group
                .columns
                .iter()
                .map(|(name, value)| (name.clone(), value_to_json(value)))
                .collect();
            outer.insert(group.table.to_string(), JsonValue::Object(inner));
        }
        JsonValue::Object(outer)
    }
}

fn value_to_json(value: &RowValues) -> JsonValue {
    match value {
        RowValues::Int(i) => JsonValue::from(*i),
        RowValues::Float(f) => JsonValue::from(*f),
        RowValues::Text(s) => JsonValue::from(s.as_str()),
        RowValues::Bool(b) => JsonValue::from(*b),
        RowValues::Timestamp(dt) => JsonValue::from(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        RowValues::Null => JsonValue::Null,
        RowValues::JSON(json) => json.clone(),
        RowValues::Blob(bytes) => JsonValue::from(
            bytes
                .iter()
                .map(|b| format!("{b:02X}"))
                .collect::<String>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_map::scrape_field_map;

    #[test]
    fn reshapes_by_alias_and_bucket() {
        let map = scrape_field_map("SELECT o.id, o.total, COUNT(*) AS count FROM orders o");
        let row = MappedRow::from_fields(
            &map,
            vec![
                RowValues::Int(7),
                RowValues::Float(9.5),
                RowValues::Int(3),
            ],
        );
        assert_eq!(row.get("o", "id"), Some(&RowValues::Int(7)));
        assert_eq!(row.get("o", "total"), Some(&RowValues::Float(9.5)));
        assert_eq!(row.count(), Some(&RowValues::Int(3)));
        assert_eq!(row.groups().len(), 2);
    }

    #[test]
    fn later_duplicate_replaces_earlier() {
        let mut row = MappedRow::default();
        row.insert(TableKey::Ungrouped, "a".into(), RowValues::Int(1));
        row.insert(TableKey::Ungrouped, "a".into(), RowValues::Int(2));
        assert_eq!(row.ungrouped("a"), Some(&RowValues::Int(2)));
        assert_eq!(row.groups()[0].columns.len(), 1);
    }

    #[test]
    fn json_uses_zero_for_ungrouped() {
        let map = scrape_field_map("SELECT name, u.id FROM users u");
        let row = MappedRow::from_fields(
            &map,
            vec![RowValues::Text("ann".into()), RowValues::Int(1)],
        );
        assert_eq!(
            row.to_json(),
            serde_json::json!({"0": {"name": "ann"}, "u": {"id": 1}})
        );
    }
}
