//! Result sets and execution results.

use crate::client::RawResult;
use crate::error::SqlResult;
use crate::format::{FormattedSet, Record, ResultFormatter};
use crate::value::Value;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Result column with provenance as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Table name or alias the column was selected through; empty for computed columns.
    pub table: String,
    /// Physical table name; empty for computed columns.
    pub org_table: String,
}

impl Column {
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        org_table: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            org_table: org_table.into(),
        }
    }

    /// Column selected directly from `table` (no alias).
    pub fn from_table(table: &str, name: impl Into<String>) -> Self {
        Self::new(name, table, table)
    }

    /// Computed column without a source table (`count(*)`, literals).
    pub fn computed(name: impl Into<String>) -> Self {
        Self::new(name, "", "")
    }

    /// Alias table if present, else the physical table.
    pub fn provenance(&self) -> Option<&str> {
        [self.table.as_str(), self.org_table.as_str()]
            .into_iter()
            .find(|t| !t.is_empty())
    }

    /// True when the column comes from `table` (by alias or physical name).
    pub fn is_from(&self, table: &str) -> bool {
        self.table == table || self.org_table == table
    }
}

/// Ordered rows plus per-column provenance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl RecordSet {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. Missing trailing cells are NULL, extra cells are dropped.
    pub fn push_row(&mut self, mut values: Vec<Value>) {
        values.resize(self.columns.len(), Value::Null);
        self.rows.push(values);
    }

    /// Builder-style [`RecordSet::push_row`].
    pub fn with_row<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.push_row(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = Row<'_>> + '_ {
        self.rows.iter().map(|values| Row {
            columns: &self.columns,
            values,
        })
    }
}

/// One row borrowed from a [`RecordSet`].
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [Column],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    /// Value of the first column named `name`.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.iter().find(|(c, _)| c.name == name).map(|(_, v)| v)
    }

    /// Value of `name` selected from `table` (alias or physical name).
    pub fn get_qualified(&self, table: &str, name: &str) -> Option<&'a Value> {
        self.iter()
            .find(|(c, _)| c.name == name && c.is_from(table))
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a Column, &'a Value)> + 'a {
        self.columns.iter().zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat name → value map. A repeated column name is stored under
    /// `table.column`; if that is taken too, the first value is kept.
    pub fn to_map(&self) -> IndexMap<String, Value> {
        let mut map = IndexMap::with_capacity(self.values.len());
        for (column, value) in self.iter() {
            insert_column(&mut map, column, value.clone());
        }
        map
    }
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let flat = self.to_map();
        let mut map = serializer.serialize_map(Some(flat.len()))?;
        for (k, v) in &flat {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Insert `value` under the column name. On collision it goes under
/// `table.column` (`.column` for computed columns), then `table.column_2`,
/// `table.column_3` and so on until a free key is found.
pub(crate) fn insert_column(map: &mut IndexMap<String, Value>, column: &Column, value: Value) {
    if !map.contains_key(&column.name) {
        map.insert(column.name.clone(), value);
        return;
    }
    let qualified = format!("{}.{}", column.provenance().unwrap_or(""), column.name);
    let key = free_key(map, qualified);
    map.insert(key, value);
}

/// `base` if unused in `map`, else the first unused `base_N` with N >= 2.
pub(crate) fn free_key<V>(map: &IndexMap<String, V>, base: String) -> String {
    if !map.contains_key(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}_{n}");
        if !map.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Outcome of running a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    sql: String,
    records: RecordSet,
    affected_rows: u64,
    insert_id: u64,
}

impl ExecutionResult {
    pub(crate) fn new(sql: String, raw: RawResult) -> Self {
        Self {
            sql,
            records: raw.records,
            affected_rows: raw.affected_rows,
            insert_id: raw.last_insert_id,
        }
    }

    /// The SQL that produced this result.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Rows affected (UPDATE/DELETE/INSERT) or returned (SELECT), as the driver reports them.
    pub fn num_rows(&self) -> u64 {
        self.affected_rows
    }

    pub fn insert_id(&self) -> u64 {
        self.insert_id
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    pub fn into_records(self) -> RecordSet {
        self.records
    }

    /// First row, if any.
    pub fn fetch_one(&self) -> Option<Row<'_>> {
        self.records.row(0)
    }

    pub fn fetch_all(&self) -> Vec<Row<'_>> {
        self.records.rows().collect()
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = Row<'_>> + '_ {
        self.records.rows()
    }

    /// Fold joined rows into records keyed by `key`, see [`ResultFormatter`].
    pub fn formatted_fetch_all(&self, main_table: &str, key: &str) -> SqlResult<FormattedSet> {
        ResultFormatter::new(main_table, key).format(&self.records)
    }

    /// The last formatted record, if any.
    pub fn formatted_fetch_one(&self, main_table: &str, key: &str) -> SqlResult<Option<Record>> {
        Ok(self
            .formatted_fetch_all(main_table, key)?
            .into_records()
            .pop()
            .map(|(_, record)| record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> RecordSet {
        RecordSet::new(vec![
            Column::from_table("post", "id"),
            Column::new("id", "c", "comment"),
            Column::computed("total"),
        ])
        .with_row([Value::Int(1), Value::Int(9), Value::Int(3)])
        .with_row([Value::Int(2)])
    }

    #[test]
    fn provenance_prefers_alias() {
        assert_eq!(Column::new("id", "c", "comment").provenance(), Some("c"));
        assert_eq!(Column::new("id", "", "comment").provenance(), Some("comment"));
        assert_eq!(Column::computed("n").provenance(), None);
    }

    #[test]
    fn short_rows_are_padded() {
        let set = set();
        let row = set.row(1).unwrap();
        assert_eq!(row.len(), 3);
        assert_eq!(row.get("total"), Some(&Value::Null));
    }

    #[test]
    fn get_and_qualified_get() {
        let set = set();
        let row = set.row(0).unwrap();
        assert_eq!(row.get("id"), Some(&Value::Int(1)));
        assert_eq!(row.get_qualified("c", "id"), Some(&Value::Int(9)));
        assert_eq!(row.get_qualified("comment", "id"), Some(&Value::Int(9)));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn colliding_names_are_qualified() {
        let set = set();
        let map = set.row(0).unwrap().to_map();
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["id", "c.id", "total"]);
        assert_eq!(
            serde_json::to_value(set.row(0).unwrap()).unwrap(),
            serde_json::json!({"id": 1, "c.id": 9, "total": 3})
        );
    }

    #[test]
    fn execution_result_accessors() {
        let result = ExecutionResult::new(
            "SELECT 1".into(),
            RawResult {
                records: set(),
                affected_rows: 2,
                last_insert_id: 0,
            },
        );
        assert_eq!(result.num_rows(), 2);
        assert_eq!(result.fetch_all().len(), 2);
        assert_eq!(result.rows().len(), 2);
        assert_eq!(
            result.fetch_one().and_then(|r| r.get("id").cloned()),
            Some(Value::Int(1))
        );
        assert_eq!(result.sql(), "SELECT 1");
    }
}
