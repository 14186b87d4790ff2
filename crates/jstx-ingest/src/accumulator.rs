//! Per-(kind, extractor) row buffering
//!
//! Chunk boundaries count documents, not rows, so an extractor producing
//! several rows per document still flushes every `limit` documents.

use serde::Serialize;

use crate::kind::DocumentKind;
use crate::table::{ColumnSpec, Row, Table};

/// A flushed batch of rows for one (kind, extractor) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub kind: DocumentKind,
    pub extractor: String,
    /// 1-based, increasing per (kind, extractor)
    pub index: usize,
    pub table: Table,
}

impl Chunk {
    pub fn rows(&self) -> usize {
        self.table.len()
    }
}

#[derive(Debug)]
pub struct Accumulator {
    kind: DocumentKind,
    extractor: String,
    schema: Vec<ColumnSpec>,
    rows: Vec<Row>,
    documents: usize,
    next_index: usize,
}

impl Accumulator {
    /// `schema` is the full output schema, `file_name` included
    pub fn new(kind: DocumentKind, extractor: impl Into<String>, schema: Vec<ColumnSpec>) -> Self {
        Self {
            kind,
            extractor: extractor.into(),
            schema,
            rows: Vec::new(),
            documents: 0,
            next_index: 1,
        }
    }

    /// Append the rows of one document
    pub fn push(&mut self, document_rows: Vec<Row>) {
        self.rows.extend(document_rows);
        self.documents += 1;
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Index the next emitted chunk will carry
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn flush_if_full(&mut self, limit: usize) -> Option<Chunk> {
        if self.documents > 0 && self.documents >= limit {
            self.take()
        } else {
            None
        }
    }

    /// Emit whatever is buffered; `None` once empty
    pub fn drain(&mut self) -> Option<Chunk> {
        if self.documents == 0 {
            return None;
        }
        self.take()
    }

    fn take(&mut self) -> Option<Chunk> {
        let rows = std::mem::take(&mut self.rows);
        let chunk = Chunk {
            kind: self.kind,
            extractor: self.extractor.clone(),
            index: self.next_index,
            table: Table {
                schema: self.schema.clone(),
                rows,
            },
        };
        self.documents = 0;
        self.next_index += 1;
        Some(chunk)
    }
}
