//! Chunk persistence and the typed CSV format
//!
//! Every chunk becomes one CSV file named
//! `{prefix}_{kind}_{extractor}-{index}.csv`. The header carries each
//! column's declared type as `name:type`, so a file can be read back into a
//! [`Table`] with its types intact:
//!
//! - a missing value is written as `NA`
//! - text equal to `NA` or starting with `\` gets a leading `\`
//! - list values are JSON arrays of strings

use jstx_common::checksum::sha256_file;
use jstx_common::CommonError;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::accumulator::Chunk;
use crate::kind::DocumentKind;
use crate::runner::Failure;
use crate::table::{ColumnSpec, ColumnType, Row, Table, Value};

const MISSING: &str = "NA";
const ESCAPE: char = '\\';

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid list value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Checksum error: {0}")]
    Checksum(#[from] CommonError),

    #[error("Bad header cell '{cell}' in '{}'", .path.display())]
    BadHeader { path: PathBuf, cell: String },

    #[error("Bad value '{value}' for {column_type} column '{column}' in '{}' row {row}", .path.display())]
    BadValue {
        path: PathBuf,
        row: usize,
        column: String,
        column_type: ColumnType,
        value: String,
    },

    #[error("Row of width {found} written to '{}', expected {expected}", .path.display())]
    RowWidth {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("File name '{}' is not a chunk file name", .0.display())]
    BadFileName(PathBuf),

    #[error("Schema of '{}' does not match earlier files", .path.display())]
    SchemaMismatch { path: PathBuf },
}

/// Descriptor of one chunk on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenChunk {
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub extractor: String,
    pub chunk_index: usize,
    pub rows: usize,
    pub sha256: String,
}

/// Destination for flushed chunks and the failure log
///
/// Called from the runner's single consumer only; implementations need no
/// internal ordering of their own.
pub trait OutputSink: Send + Sync {
    fn write(&self, chunk: &Chunk) -> Result<WrittenChunk, SinkError>;

    fn write_failures(&self, failures: &[Failure]) -> Result<PathBuf, SinkError>;

    /// Where a chunk ends up, for error reports when the write fails
    fn chunk_location(&self, chunk: &Chunk) -> PathBuf {
        PathBuf::from(format!("{}_{}-{}", chunk.kind, chunk.extractor, chunk.index))
    }
}

/// Writes typed CSV files next to a path prefix
#[derive(Debug, Clone)]
pub struct CsvSink {
    prefix: PathBuf,
}

impl CsvSink {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn chunk_path(&self, kind: DocumentKind, extractor: &str, index: usize) -> PathBuf {
        self.with_suffix(&format!("_{}_{}-{}.csv", kind.as_str(), extractor, index))
    }

    pub fn failures_path(&self) -> PathBuf {
        self.with_suffix("_failures.csv")
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self.prefix.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }
}

impl OutputSink for CsvSink {
    fn write(&self, chunk: &Chunk) -> Result<WrittenChunk, SinkError> {
        let path = self.chunk_path(chunk.kind, &chunk.extractor, chunk.index);
        write_table(&path, &chunk.table)?;
        let sha256 = sha256_file(&path)?;

        debug!(path = %path.display(), rows = chunk.rows(), "Wrote chunk file");

        Ok(WrittenChunk {
            path,
            kind: chunk.kind,
            extractor: chunk.extractor.clone(),
            chunk_index: chunk.index,
            rows: chunk.rows(),
            sha256,
        })
    }

    fn write_failures(&self, failures: &[Failure]) -> Result<PathBuf, SinkError> {
        let path = self.failures_path();
        write_table(&path, &failure_table(failures))?;
        Ok(path)
    }

    fn chunk_location(&self, chunk: &Chunk) -> PathBuf {
        self.chunk_path(chunk.kind, &chunk.extractor, chunk.index)
    }
}

/// Failure log as a table: archive, entry, kind, extractor, reason
pub fn failure_table(failures: &[Failure]) -> Table {
    let mut table = Table::new(vec![
        ColumnSpec::text("archive"),
        ColumnSpec::text("entry"),
        ColumnSpec::text("kind"),
        ColumnSpec::text("extractor"),
        ColumnSpec::text("reason"),
    ]);
    table.rows = failures
        .iter()
        .map(|f| {
            vec![
                Value::text(f.archive_path.display().to_string()),
                Value::text(f.entry_name.as_str()),
                Value::text(f.kind.as_str()),
                Value::text(f.extractor.as_str()),
                Value::text(f.reason.as_str()),
            ]
        })
        .collect();
    table
}

/// Incremental writer for the typed CSV format
///
/// Rows go to a `.part` sibling that is renamed into place by
/// [`TypedCsvWriter::finish`], so a crash mid-write never leaves a
/// truncated file under the final name.
pub struct TypedCsvWriter {
    writer: csv::Writer<fs::File>,
    path: PathBuf,
    part_path: PathBuf,
    width: usize,
    rows: usize,
}

impl TypedCsvWriter {
    pub fn create(path: impl Into<PathBuf>, schema: &[ColumnSpec]) -> Result<Self, SinkError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut part_name = path.as_os_str().to_os_string();
        part_name.push(".part");
        let part_path = PathBuf::from(part_name);

        let mut writer = csv::WriterBuilder::new().from_path(&part_path)?;
        writer.write_record(schema.iter().map(|c| format!("{}:{}", c.name, c.column_type)))?;

        Ok(Self {
            writer,
            path,
            part_path,
            width: schema.len(),
            rows: 0,
        })
    }

    pub fn write_row(&mut self, row: &[Value]) -> Result<(), SinkError> {
        if row.len() != self.width {
            return Err(SinkError::RowWidth {
                path: self.path.clone(),
                expected: self.width,
                found: row.len(),
            });
        }
        let cells = row.iter().map(encode_value).collect::<Result<Vec<_>, _>>()?;
        self.writer.write_record(&cells)?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and move the file to its final name
    pub fn finish(mut self) -> Result<PathBuf, SinkError> {
        self.writer.flush()?;
        drop(self.writer);
        fs::rename(&self.part_path, &self.path)?;
        Ok(self.path)
    }
}

/// Write a whole table in the typed CSV format
pub fn write_table(path: &Path, table: &Table) -> Result<(), SinkError> {
    let mut writer = TypedCsvWriter::create(path, &table.schema)?;
    for row in &table.rows {
        writer.write_row(row)?;
    }
    writer.finish()?;
    Ok(())
}

fn encode_value(value: &Value) -> Result<String, SinkError> {
    Ok(match value {
        Value::Missing => MISSING.to_string(),
        Value::Text(s) if s == MISSING || s.starts_with(ESCAPE) => format!("{ESCAPE}{s}"),
        Value::Text(s) => s.clone(),
        Value::Integer(n) => n.to_string(),
        Value::List(items) => serde_json::to_string(items)?,
    })
}

fn decode_value(
    cell: &str,
    column: &ColumnSpec,
    path: &Path,
    row: usize,
) -> Result<Value, SinkError> {
    if cell == MISSING {
        return Ok(Value::Missing);
    }
    let value = match column.column_type {
        ColumnType::Text => Value::Text(cell.strip_prefix(ESCAPE).unwrap_or(cell).to_string()),
        ColumnType::Integer => match cell.parse::<i64>() {
            Ok(n) => Value::Integer(n),
            Err(_) => {
                return Err(SinkError::BadValue {
                    path: path.to_path_buf(),
                    row,
                    column: column.name.clone(),
                    column_type: column.column_type,
                    value: cell.to_string(),
                })
            },
        },
        ColumnType::TextList => Value::List(serde_json::from_str(cell)?),
    };
    Ok(value)
}

fn parse_header(path: &Path, cell: &str) -> Result<ColumnSpec, SinkError> {
    let bad = || SinkError::BadHeader {
        path: path.to_path_buf(),
        cell: cell.to_string(),
    };
    let (name, column_type) = cell.rsplit_once(':').ok_or_else(bad)?;
    if name.is_empty() {
        return Err(bad());
    }
    let column_type = column_type.parse::<ColumnType>().map_err(|_| bad())?;
    Ok(ColumnSpec::new(name, column_type))
}

/// Read one typed CSV file back into a table
pub fn read_typed(path: impl AsRef<Path>) -> Result<Table, SinkError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let schema = reader
        .headers()?
        .iter()
        .map(|cell| parse_header(path, cell))
        .collect::<Result<Vec<_>, _>>()?;

    let mut table = Table::new(schema);
    for (row_number, record) in reader.records().enumerate() {
        let record = record?;
        let row: Row = record
            .iter()
            .zip(&table.schema)
            .map(|(cell, column)| decode_value(cell, column, path, row_number + 1))
            .collect::<Result<_, _>>()?;
        table.rows.push(row);
    }

    Ok(table)
}

/// Read a chunk file, recovering kind, extractor and index from its name
pub fn read_chunk(path: impl AsRef<Path>) -> Result<Chunk, SinkError> {
    let path = path.as_ref();
    let (kind, extractor, index) =
        parse_chunk_file_name(path).ok_or_else(|| SinkError::BadFileName(path.to_path_buf()))?;
    Ok(Chunk {
        kind,
        extractor,
        index,
        table: read_typed(path)?,
    })
}

/// Split `{prefix}_{kind}_{extractor}-{index}.csv`
///
/// The leftmost `_{kind}_` match wins, so extractor names may themselves
/// contain a kind identifier.
pub fn parse_chunk_file_name(path: &Path) -> Option<(DocumentKind, String, usize)> {
    let name = path.file_name()?.to_str()?.strip_suffix(".csv")?;
    let (rest, index) = name.rsplit_once('-')?;
    let index = index.parse::<usize>().ok().filter(|i| *i > 0)?;

    let (position, kind) = DocumentKind::ALL
        .iter()
        .filter(|k| k.is_document())
        .filter_map(|k| rest.find(&format!("_{}_", k.as_str())).map(|pos| (pos, *k)))
        .min_by_key(|(pos, _)| *pos)?;

    let extractor = &rest[position + kind.as_str().len() + 2..];
    if extractor.is_empty() {
        return None;
    }
    Some((kind, extractor.to_string(), index))
}

/// Concatenate typed files with identical schemas, in the order given
pub fn re_import<P: AsRef<Path>>(paths: &[P]) -> Result<Table, SinkError> {
    let mut combined: Option<Table> = None;

    for path in paths {
        let path = path.as_ref();
        let table = read_typed(path)?;
        if let Some(acc) = combined.as_mut() {
            if acc.schema != table.schema {
                return Err(SinkError::SchemaMismatch {
                    path: path.to_path_buf(),
                });
            }
            acc.rows.extend(table.rows);
        } else {
            combined = Some(table);
        }
        debug!(path = %path.display(), "Re-imported file");
    }

    Ok(combined.unwrap_or_else(|| Table::new(Vec::new())))
}
