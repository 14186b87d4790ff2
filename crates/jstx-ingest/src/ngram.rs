//! N-gram files and their combination into one table
//!
//! Each n-gram entry is plain text with one `term<TAB>count` pair per line.
//! [`combine`] streams every entry of one order into a single typed CSV
//! file, so memory stays at one entry regardless of archive size.

use jstx_common::checksum::sha256_file;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::archive::{ArchiveEntry, EntryReader};
use crate::error::{ImportError, Result};
use crate::extract::ExtractionError;
use crate::kind::DocumentKind;
use crate::runner::Failure;
use crate::sink::{failure_table, write_table, TypedCsvWriter};
use crate::table::{ColumnSpec, Value, FILE_NAME_COLUMN};

/// Parse one n-gram file into `(term, count)` pairs
pub fn parse(raw: &[u8]) -> std::result::Result<Vec<(String, i64)>, ExtractionError> {
    let text = std::str::from_utf8(raw).map_err(|_| ExtractionError::Encoding)?;
    let mut pairs = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let (term, count) = line.rsplit_once('\t').ok_or_else(|| {
            ExtractionError::Malformed(format!("line {}: expected term<TAB>count", line_no + 1))
        })?;
        let count = count.trim().parse::<i64>().map_err(|_| ExtractionError::MalformedField {
            field: format!("count on line {}", line_no + 1),
            value: count.to_string(),
        })?;
        pairs.push((term.to_string(), count));
    }

    Ok(pairs)
}

/// Output columns of a combined n-gram table
pub fn ngram_schema() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::text(FILE_NAME_COLUMN),
        ColumnSpec::text("ngram"),
        ColumnSpec::integer("n"),
    ]
}

#[derive(Debug, Clone, Serialize)]
pub struct NgramSummary {
    pub order: u8,
    pub path: PathBuf,
    pub documents: usize,
    pub rows: usize,
    /// Entries of another kind in the sequence
    pub skipped: usize,
    pub failures: Vec<Failure>,
    /// Failures written next to the output, present even when empty
    pub failure_log: PathBuf,
    pub sha256: String,
}

/// `dir/ngram1.csv` -> `dir/ngram1_failures.csv`
pub fn failure_log_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("{}_failures.csv", stem))
}

/// Stream all entries of one n-gram order into `output`
///
/// Entries of other kinds are skipped. Unreadable or malformed files are
/// recorded as failures and contribute no rows.
pub fn combine<I>(entries: I, reader: &EntryReader, order: u8, output: &Path) -> Result<NgramSummary>
where
    I: IntoIterator<Item = ArchiveEntry>,
{
    let kind = DocumentKind::from_ngram_order(order)
        .ok_or_else(|| ImportError::config(format!("n-gram order must be 1, 2 or 3, got {}", order)))?;

    let mut writer = TypedCsvWriter::create(output, &ngram_schema())?;
    let mut documents = 0;
    let mut skipped = 0;
    let mut failures = Vec::new();

    for entry in entries {
        if entry.kind != kind {
            skipped += 1;
            continue;
        }

        let parsed = reader
            .read(&entry)
            .map_err(|e| e.reason)
            .and_then(|raw| parse(&raw).map_err(|e| e.to_string()));

        let pairs = match parsed {
            Ok(pairs) => pairs,
            Err(reason) => {
                warn!(entry = %entry.entry_name, reason = %reason, "Skipping n-gram file");
                failures.push(Failure {
                    archive_path: entry.archive_path.clone(),
                    entry_name: entry.entry_name.clone(),
                    kind,
                    extractor: String::new(),
                    reason,
                });
                continue;
            },
        };

        let stem = entry.stem();
        for (term, count) in pairs {
            writer.write_row(&[Value::text(stem.as_str()), Value::Text(term), Value::Integer(count)])?;
        }
        documents += 1;
        debug!(entry = %entry.entry_name, "Combined n-gram file");
    }

    let rows = writer.rows();
    let path = writer.finish()?;
    let sha256 = sha256_file(&path).map_err(crate::sink::SinkError::from)?;

    let failure_log = failure_log_path(&path);
    write_table(&failure_log, &failure_table(&failures))?;

    info!(order, documents, rows, failures = failures.len(), path = %path.display(), "Combined n-grams");

    Ok(NgramSummary {
        order,
        path,
        documents,
        rows,
        skipped,
        failures,
        failure_log,
        sha256,
    })
}
