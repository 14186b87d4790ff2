//! Restricting an import to a subset of documents
//!
//! An allow-list is a set of file stems. It usually comes from an earlier
//! pass: the `file_name` column of a filtered metadata table, or the
//! failures of a previous run that should be retried.

use std::collections::BTreeSet;
use std::path::Path;

use crate::kind::file_stem;
use crate::runner::Failure;
use crate::table::{Table, Value, FILE_NAME_COLUMN};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    stems: BTreeSet<String>,
}

impl AllowList {
    pub fn new<I, S>(stems: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stems: stems.into_iter().map(Into::into).collect(),
        }
    }

    /// One stem per line; blank lines and `#` comments are ignored
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_string),
        ))
    }

    /// Stems from the `file_name` column of a previously imported table
    pub fn from_table(table: &Table) -> Option<Self> {
        let column = table.column(FILE_NAME_COLUMN)?;
        Some(Self::new(column.into_iter().filter_map(|v| match v {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        })))
    }

    /// Stems of every failed entry, for re-running just that subset
    pub fn from_failures(failures: &[Failure]) -> Self {
        Self::new(failures.iter().map(|f| file_stem(&f.entry_name)))
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.stems.contains(stem)
    }

    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }
}
