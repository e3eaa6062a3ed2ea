//! Folding flat joined rows into nested records.
//!
//! A SELECT over `post LEFT JOIN tag` returns one row per tag. The formatter
//! groups those rows by the main table's key and collects each joined table's
//! columns into a list, using the column provenance reported by the driver:
//!
//! ```text
//! post.id  post.name  tag.id  tag.label          1 => { id: 1, name: "A",
//!       1  "A"            10  "x"          =>           tag: [ {id: 10, label: "x"},
//!       1  "A"            11  "y"                              {id: 11, label: "y"} ] }
//! ```

use crate::error::{SqlError, SqlResult};
use crate::result::{Column, RecordSet, free_key, insert_column};
use crate::value::Value;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One folded record: main-table scalars plus one list per joined table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub fields: IndexMap<String, Value>,
    pub relations: IndexMap<String, Vec<IndexMap<String, Value>>>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Rows collected for a joined table; `None` if the table never appeared.
    pub fn relation(&self, table: &str) -> Option<&[IndexMap<String, Value>]> {
        self.relations.get(table).map(Vec::as_slice)
    }

    /// Move fields named like a relation to `main_table.field` so both survive.
    fn qualify_shadowed(&mut self, main_table: &str) {
        if !self.fields.keys().any(|name| self.relations.contains_key(name)) {
            return;
        }
        for (name, value) in std::mem::take(&mut self.fields) {
            let base = if self.relations.contains_key(&name) {
                format!("{main_table}.{name}")
            } else {
                name
            };
            let key = free_key(&self.fields, base);
            self.fields.insert(key, value);
        }
    }
}

impl Serialize for Record {
    /// Fields first, then relations.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + self.relations.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        for (table, rows) in &self.relations {
            map.serialize_entry(table, rows)?;
        }
        map.end()
    }
}

/// Records keyed by the grouping column, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormattedSet {
    records: IndexMap<Value, Record>,
}

impl FormattedSet {
    pub fn get(&self, key: impl Into<Value>) -> Option<&Record> {
        self.records.get(&key.into())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.records.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Record)> {
        self.records.iter()
    }

    pub fn into_records(self) -> IndexMap<Value, Record> {
        self.records
    }
}

impl Serialize for FormattedSet {
    /// JSON object keys must be strings, so keys are written in their text form.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for (key, record) in &self.records {
            map.serialize_entry(&key_text(key), record)?;
        }
        map.end()
    }
}

fn key_text(key: &Value) -> String {
    match key {
        Value::Null => String::new(),
        Value::Bool(b) => u8::from(*b).to_string(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Text(s) => s.clone(),
        other => crate::value::describe(other),
    }
}

/// Groups a [`RecordSet`] by the key column of a main table.
#[derive(Debug, Clone)]
pub struct ResultFormatter<'a> {
    main_table: &'a str,
    key: &'a str,
}

impl<'a> ResultFormatter<'a> {
    pub fn new(main_table: &'a str, key: &'a str) -> Self {
        Self { main_table, key }
    }

    fn is_main(&self, column: &Column) -> bool {
        column.provenance().is_none() || column.is_from(self.main_table)
    }

    /// Index of the key column: a main-table column named `key` if any, else
    /// the first column with that name.
    fn key_index(&self, columns: &[Column]) -> SqlResult<usize> {
        columns
            .iter()
            .position(|c| c.name == self.key && self.is_main(c))
            .or_else(|| columns.iter().position(|c| c.name == self.key))
            .ok_or_else(|| SqlError::UnknownColumn(self.key.to_string()))
    }

    pub fn format(&self, set: &RecordSet) -> SqlResult<FormattedSet> {
        let key_index = self.key_index(set.columns())?;
        let mut records: IndexMap<Value, Record> = IndexMap::new();

        for row in set.rows() {
            let mut fields = IndexMap::new();
            let mut joined: IndexMap<String, IndexMap<String, Value>> = IndexMap::new();
            let mut key = Value::Null;

            for (index, (column, value)) in row.iter().enumerate() {
                if index == key_index {
                    key = value.clone();
                }
                match column.provenance() {
                    Some(table) if !self.is_main(column) => {
                        let object = joined.entry(table.to_string()).or_default();
                        insert_column(object, column, value.clone());
                    }
                    _ => insert_column(&mut fields, column, value.clone()),
                }
            }

            match records.get_mut(&key) {
                Some(record) => {
                    for (table, object) in joined {
                        record.relations.entry(table).or_default().push(object);
                    }
                }
                None => {
                    let relations = joined
                        .into_iter()
                        .map(|(table, object)| {
                            let rows = if object.values().all(Value::is_empty) {
                                Vec::new()
                            } else {
                                vec![object]
                            };
                            (table, rows)
                        })
                        .collect();
                    records.insert(key, Record { fields, relations });
                }
            }
        }

        for record in records.values_mut() {
            record.qualify_shadowed(self.main_table);
        }
        Ok(FormattedSet { records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tagged_posts() -> RecordSet {
        RecordSet::new(vec![
            Column::from_table("t", "id"),
            Column::from_table("t", "name"),
            Column::from_table("tag", "id"),
            Column::from_table("tag", "label"),
        ])
        .with_row([Value::Int(1), "A".into(), Value::Int(10), "x".into()])
        .with_row([Value::Int(1), "A".into(), Value::Int(11), "y".into()])
    }

    #[test]
    fn folds_joined_rows() {
        let set = ResultFormatter::new("t", "id").format(&tagged_posts()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            json!({
                "1": {
                    "id": 1,
                    "name": "A",
                    "tag": [{"id": 10, "label": "x"}, {"id": 11, "label": "y"}]
                }
            })
        );
    }

    #[test]
    fn unmatched_left_join_yields_empty_list() {
        let rows = RecordSet::new(vec![
            Column::from_table("t", "id"),
            Column::from_table("tag", "id"),
            Column::from_table("tag", "label"),
        ])
        .with_row([Value::Int(2), Value::Null, Value::Null]);

        let set = ResultFormatter::new("t", "id").format(&rows).unwrap();
        let record = set.get(2).unwrap();
        assert_eq!(record.relation("tag"), Some(&[][..]));
        assert_eq!(
            serde_json::to_value(record).unwrap(),
            json!({"id": 2, "tag": []})
        );
    }

    #[test]
    fn empty_text_counts_as_unmatched() {
        let rows = RecordSet::new(vec![
            Column::from_table("t", "id"),
            Column::from_table("tag", "label"),
        ])
        .with_row([Value::Int(3), "".into()]);
        let set = ResultFormatter::new("t", "id").format(&rows).unwrap();
        assert!(set.get(3).unwrap().relation("tag").unwrap().is_empty());
    }

    #[test]
    fn later_rows_append_without_suppression() {
        let rows = RecordSet::new(vec![
            Column::from_table("t", "id"),
            Column::from_table("tag", "id"),
        ])
        .with_row([Value::Int(1), Value::Int(10)])
        .with_row([Value::Int(1), Value::Null]);
        let set = ResultFormatter::new("t", "id").format(&rows).unwrap();
        assert_eq!(set.get(1).unwrap().relation("tag").unwrap().len(), 2);
    }

    #[test]
    fn keys_keep_first_seen_order() {
        let rows = RecordSet::new(vec![Column::from_table("t", "id")])
            .with_row([5])
            .with_row([3])
            .with_row([5])
            .with_row([9]);
        let set = ResultFormatter::new("t", "id").format(&rows).unwrap();
        let keys: Vec<_> = set.keys().cloned().collect();
        assert_eq!(keys, [Value::Int(5), Value::Int(3), Value::Int(9)]);
    }

    #[test]
    fn aliases_and_computed_columns() {
        let rows = RecordSet::new(vec![
            Column::new("id", "p", "post"),
            Column::computed("comments"),
            Column::new("id", "c", "comment"),
            Column::new("body", "c", "comment"),
        ])
        .with_row([Value::Int(1), Value::Int(2), Value::Int(7), "hi".into()]);

        let set = ResultFormatter::new("post", "id").format(&rows).unwrap();
        let record = set.get(1).unwrap();
        assert_eq!(record.get("comments"), Some(&Value::Int(2)));
        assert_eq!(record.relation("c").unwrap()[0]["body"], Value::from("hi"));
    }

    #[test]
    fn collisions_inside_main_object() {
        let rows = RecordSet::new(vec![
            Column::new("id", "t", "t"),
            Column::new("id", "", "t"),
        ])
        .with_row([1, 2]);
        let set = ResultFormatter::new("t", "id").format(&rows).unwrap();
        let record = set.get(1).unwrap();
        assert_eq!(record.get("id"), Some(&Value::Int(1)));
        assert_eq!(record.get("t.id"), Some(&Value::Int(2)));
    }

    #[test]
    fn computed_column_collision_keeps_both_values() {
        let rows = RecordSet::new(vec![
            Column::from_table("t", "id"),
            Column::from_table("t", "name"),
            Column::computed("name"),
            Column::computed("name"),
        ])
        .with_row([Value::Int(1), "A".into(), "computed".into(), "again".into()]);
        let set = ResultFormatter::new("t", "id").format(&rows).unwrap();
        let record = set.get(1).unwrap();
        assert_eq!(record.get("name"), Some(&Value::from("A")));
        assert_eq!(record.get(".name"), Some(&Value::from("computed")));
        assert_eq!(record.get(".name_2"), Some(&Value::from("again")));
    }

    #[test]
    fn qualified_collision_gets_numbered_key() {
        let rows = RecordSet::new(vec![
            Column::new("id", "t", "t"),
            Column::new("id", "", "t"),
            Column::new("id", "t", ""),
        ])
        .with_row([1, 2, 3]);
        let set = ResultFormatter::new("t", "id").format(&rows).unwrap();
        let record = set.get(1).unwrap();
        assert_eq!(record.get("t.id"), Some(&Value::Int(2)));
        assert_eq!(record.get("t.id_2"), Some(&Value::Int(3)));
    }

    #[test]
    fn field_named_like_relation_is_qualified() {
        let rows = RecordSet::new(vec![
            Column::from_table("post", "id"),
            Column::from_table("post", "tag"),
            Column::from_table("tag", "label"),
        ])
        .with_row([Value::Int(1), "featured".into(), "x".into()]);
        let set = ResultFormatter::new("post", "id").format(&rows).unwrap();
        let record = set.get(1).unwrap();
        assert_eq!(record.get("tag"), None);
        assert_eq!(record.get("post.tag"), Some(&Value::from("featured")));
        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            json!({"1": {"id": 1, "post.tag": "featured", "tag": [{"label": "x"}]}})
        );
    }

    #[test]
    fn missing_key_column_fails() {
        assert_eq!(
            ResultFormatter::new("t", "uuid").format(&tagged_posts()),
            Err(SqlError::UnknownColumn("uuid".into()))
        );
    }

    #[test]
    fn empty_set_formats_to_nothing() {
        let rows = RecordSet::new(vec![Column::from_table("t", "id")]);
        assert!(ResultFormatter::new("t", "id").format(&rows).unwrap().is_empty());
    }
}
