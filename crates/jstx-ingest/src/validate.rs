//! Shape validation for extraction results and chunks
//!
//! An extractor that returns columns of different lengths has a bug. The
//! error is reported for the one entry that triggered it; the batch keeps
//! going.

use thiserror::Error;

use crate::table::{
    placeholder_row, ColumnSet, ColumnSpec, ColumnType, ColumnValues, Row, Table, Value,
    FILE_NAME_COLUMN,
};

/// Shape or type violation in extractor output
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("column lengths disagree: {}", describe_lengths(.columns))]
    ShapeMismatch { columns: Vec<(String, usize)> },

    #[error("column '{column}' declared as {expected} but got {found}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        found: String,
    },

    #[error("column '{0}' is not declared in the extractor schema")]
    UndeclaredColumn(String),

    #[error("row {row} has {found} values, schema has {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

fn describe_lengths(columns: &[(String, usize)]) -> String {
    columns
        .iter()
        .map(|(name, len)| format!("{}={}", name, len))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Row count of a column set
///
/// Every `Many` column must have the same length; scalars broadcast. With no
/// `Many` columns the count is 1.
pub fn validate(set: &ColumnSet) -> Result<usize, ValidationError> {
    let lengths: Vec<(String, usize)> = set
        .iter()
        .filter_map(|(name, values)| match values {
            ColumnValues::Many(v) => Some((name.to_string(), v.len())),
            ColumnValues::Scalar(_) => None,
        })
        .collect();

    match lengths.first() {
        None => Ok(1),
        Some((_, first)) if lengths.iter().all(|(_, len)| len == first) => Ok(*first),
        Some(_) => Err(ValidationError::ShapeMismatch { columns: lengths }),
    }
}

/// Expand a column set into rows aligned with `file_name` + `schema`
///
/// Declared columns absent from the set are missing. A set with zero rows
/// still produces one row so the document keeps its place in the output.
pub fn materialize(
    schema: &[ColumnSpec],
    file_name: &str,
    set: &ColumnSet,
) -> Result<Vec<Row>, ValidationError> {
    let row_count = validate(set)?;

    for (name, values) in set.iter() {
        let spec = schema
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ValidationError::UndeclaredColumn(name.to_string()))?;
        let bad = match values {
            ColumnValues::Scalar(v) => (!v.fits(spec.column_type)).then_some(v),
            ColumnValues::Many(vs) => vs.iter().find(|v| !v.fits(spec.column_type)),
        };
        if let Some(value) = bad {
            return Err(ValidationError::TypeMismatch {
                column: spec.name.clone(),
                expected: spec.column_type,
                found: value_type_name(value).to_string(),
            });
        }
    }

    if row_count == 0 {
        return Ok(vec![placeholder_row(file_name, schema.len() + 1)]);
    }

    let rows = (0..row_count)
        .map(|i| {
            let mut row = Vec::with_capacity(schema.len() + 1);
            row.push(Value::text(file_name));
            for spec in schema {
                let value = match set.get(&spec.name) {
                    Some(ColumnValues::Scalar(v)) => v.clone(),
                    Some(ColumnValues::Many(vs)) => vs[i].clone(),
                    None => Value::Missing,
                };
                row.push(value);
            }
            row
        })
        .collect();

    Ok(rows)
}

/// Check every row of a chunk against its schema width
pub fn validate_table(table: &Table) -> Result<usize, ValidationError> {
    let expected = table.schema.len();
    if let Some((row, values)) = table.rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
        return Err(ValidationError::RowWidth {
            row,
            expected,
            found: values.len(),
        });
    }
    if table.schema.first().map(|c| c.name.as_str()) != Some(FILE_NAME_COLUMN) {
        return Err(ValidationError::UndeclaredColumn(FILE_NAME_COLUMN.to_string()));
    }
    Ok(table.rows.len())
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Missing => "missing",
        Value::Text(_) => "text",
        Value::Integer(_) => "integer",
        Value::List(_) => "text_list",
    }
}
