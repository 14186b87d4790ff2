//! Typed values, column sets and tables
//!
//! Extractors return a [`ColumnSet`]: an ordered mapping from column name to
//! either a scalar or a sequence of values. The runner turns a column set
//! into rows of a [`Table`] whose schema is declared up front by the
//! extractor, so placeholder rows and real rows always share one shape.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the key column prepended to every extractor's schema
pub const FILE_NAME_COLUMN: &str = "file_name";

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer,
    /// Short multi-valued field, e.g. several ISBNs
    TextList,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::TextList => "text_list",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ColumnType::Text),
            "integer" => Ok(ColumnType::Integer),
            "text_list" => Ok(ColumnType::TextList),
            other => Err(format!("unknown column type '{}'", other)),
        }
    }
}

/// One cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Missing,
    Text(String),
    Integer(i64),
    List(Vec<String>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Text, or `Missing` for `None`
    pub fn opt_text(s: Option<impl Into<String>>) -> Self {
        s.map(|s| Value::Text(s.into())).unwrap_or(Value::Missing)
    }

    pub fn opt_integer(n: Option<i64>) -> Self {
        n.map(Value::Integer).unwrap_or(Value::Missing)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Missing is compatible with every type
    pub fn fits(&self, column_type: ColumnType) -> bool {
        matches!(
            (self, column_type),
            (Value::Missing, _)
                | (Value::Text(_), ColumnType::Text)
                | (Value::Integer(_), ColumnType::Integer)
                | (Value::List(_), ColumnType::TextList)
        )
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

/// Column name plus declared type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub fn text_list(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::TextList)
    }
}

/// Values for one column of an extraction result
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    /// Broadcast to every row
    Scalar(Value),
    Many(Vec<Value>),
}

/// Ordered column name -> values mapping produced by an extractor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSet {
    columns: Vec<(String, ColumnValues)>,
}

impl ColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar column, replacing any previous value for the name
    pub fn scalar(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name.into(), ColumnValues::Scalar(value));
        self
    }

    pub fn many(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
        self.insert(name.into(), ColumnValues::Many(values));
        self
    }

    pub fn insert(&mut self, name: String, values: ColumnValues) {
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = values,
            None => self.columns.push((name, values)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ColumnValues> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnValues)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

pub type Row = Vec<Value>;

/// Schema plus rows; the in-memory form of one chunk or a re-imported file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub schema: Vec<ColumnSpec>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(schema: Vec<ColumnSpec>) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.iter().position(|c| c.name == name)
    }

    /// All values of one column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|row| row.get(idx)).collect())
    }
}

/// Schema seen by the sink: `file_name` followed by the extractor columns
pub fn output_schema(extractor_schema: &[ColumnSpec]) -> Vec<ColumnSpec> {
    let mut schema = Vec::with_capacity(extractor_schema.len() + 1);
    schema.push(ColumnSpec::text(FILE_NAME_COLUMN));
    schema.extend(extractor_schema.iter().cloned());
    schema
}

/// Row with `file_name` set and every other column missing
pub fn placeholder_row(file_name: &str, width: usize) -> Row {
    let mut row = Vec::with_capacity(width);
    row.push(Value::text(file_name));
    row.resize(width.max(1), Value::Missing);
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_fits_type() {
        assert!(Value::Missing.fits(ColumnType::Integer));
        assert!(Value::Integer(3).fits(ColumnType::Integer));
        assert!(!Value::text("3").fits(ColumnType::Integer));
        assert!(Value::List(vec!["a".into()]).fits(ColumnType::TextList));
        assert!(!Value::List(vec![]).fits(ColumnType::Text));
    }

    #[test]
    fn test_column_set_insert_replaces() {
        let set = ColumnSet::new()
            .scalar("title", Value::text("first"))
            .many("author", vec![Value::text("a")])
            .scalar("title", Value::text("second"));

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("title"), Some(&ColumnValues::Scalar(Value::text("second"))));
        let names: Vec<&str> = set.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["title", "author"]);
    }

    #[test]
    fn test_placeholder_row_shape() {
        let schema = output_schema(&[ColumnSpec::text("title"), ColumnSpec::integer("year")]);
        let row = placeholder_row("doc-1", schema.len());
        assert_eq!(row, vec![Value::text("doc-1"), Value::Missing, Value::Missing]);
        assert_eq!(schema[0].name, FILE_NAME_COLUMN);
    }

    #[test]
    fn test_table_column_lookup() {
        let mut table = Table::new(output_schema(&[ColumnSpec::integer("year")]));
        table.rows.push(vec![Value::text("a"), Value::Integer(1999)]);
        table.rows.push(vec![Value::text("b"), Value::Missing]);

        let years = table.column("year").unwrap();
        assert_eq!(years, vec![&Value::Integer(1999), &Value::Missing]);
        assert!(table.column("month").is_none());
    }
}
