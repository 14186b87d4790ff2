//! Batch runner: the import pipeline proper
//!
//! Entries are processed on the blocking pool through an order-preserving
//! window of `parallelism` tasks. Results come back in enumeration order and
//! are applied by a single consumer that owns every accumulator, so output
//! files do not depend on the worker count.
//!
//! A bad entry never aborts a run. Read failures, extractor errors, shape
//! mismatches and type mismatches are recorded as [`Failure`]s and the
//! document keeps its place in each affected output as a placeholder row.
//! Only archive and output errors are fatal.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::accumulator::{Accumulator, Chunk};
use crate::allow_list::AllowList;
use crate::archive::{ArchiveEntry, ArchiveIndex, EntryReader, IndexStats};
use crate::config::{default_parallelism, DEFAULT_CHUNK_SIZE};
use crate::error::{ImportError, Result};
use crate::extract::{ExtractionSpec, Extractor};
use crate::kind::DocumentKind;
use crate::sink::{OutputSink, WrittenChunk};
use crate::table::{output_schema, placeholder_row, Row};
use crate::validate::{materialize, validate_table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunOptions {
    /// Documents per chunk file
    pub chunk_size: usize,
    /// Entries processed concurrently
    pub parallelism: usize,
}

impl RunOptions {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ImportError::config("chunk size must be greater than 0"));
        }
        if self.parallelism == 0 {
            return Err(ImportError::config("parallelism must be greater than 0"));
        }
        Ok(())
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            parallelism: default_parallelism(),
        }
    }
}

/// Reported once per chunk written to the sink
#[derive(Debug, Clone)]
pub struct FlushEvent {
    pub kind: DocumentKind,
    pub extractor: String,
    pub chunk_index: usize,
    pub rows: usize,
    pub path: PathBuf,
    /// Chunks written so far in this run, this one included
    pub chunks_written: usize,
    /// Entries taken from the entry sequence when the chunk was flushed
    pub entries_processed: usize,
}

/// Receives progress notifications from the consumer loop, once per
/// flushed chunk
pub trait ProgressObserver: Send + Sync {
    fn on_chunk_flushed(&self, event: &FlushEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_chunk_flushed(&self, _event: &FlushEvent) {}
}

/// One entry (or one extractor on one entry) that did not produce data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub archive_path: PathBuf,
    pub entry_name: String,
    pub kind: DocumentKind,
    /// Empty when the entry could not be read at all
    pub extractor: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub succeeded: usize,
    pub failed: usize,
}

/// Outcome of a run
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Entries taken from the entry sequence
    pub entries_seen: usize,
    /// Entries whose kind has no extractor
    pub entries_skipped: usize,
    pub entries_unknown: usize,
    /// Skip counts from the archive index, when the run enumerated archives
    pub index: IndexStats,
    pub per_kind: BTreeMap<DocumentKind, KindCounts>,
    pub failures: Vec<Failure>,
    pub chunks: Vec<WrittenChunk>,
    pub failure_log: Option<PathBuf>,
    /// Dispatch stopped early; every entry taken before that was still written
    pub cancelled: bool,
}

impl ImportResult {
    pub fn rows_written(&self) -> usize {
        self.chunks.iter().map(|c| c.rows).sum()
    }

    pub fn succeeded(&self) -> usize {
        self.per_kind.values().map(|c| c.succeeded).sum()
    }

    pub fn failed(&self) -> usize {
        self.per_kind.values().map(|c| c.failed).sum()
    }

    /// Chunks written for one (kind, extractor) pair, in index order
    pub fn chunks_for<'a>(
        &'a self,
        kind: DocumentKind,
        extractor: &'a str,
    ) -> impl Iterator<Item = &'a WrittenChunk> + 'a {
        self.chunks
            .iter()
            .filter(move |c| c.kind == kind && c.extractor == extractor)
    }

    pub fn summary(&self) -> String {
        let mut out = format!(
            "Run {}: {} entries seen, {} succeeded, {} failed, {} skipped, {} unknown",
            self.run_id,
            self.entries_seen,
            self.succeeded(),
            self.failed(),
            self.entries_skipped,
            self.entries_unknown,
        );
        if self.index.filtered > 0 {
            out.push_str(&format!(", {} outside allow-list", self.index.filtered));
        }
        if self.index.unreadable > 0 {
            out.push_str(&format!(", {} unreadable zip record(s)", self.index.unreadable));
        }
        out.push_str(&format!(
            "\nWrote {} rows in {} chunk(s) in {:.1}s",
            self.rows_written(),
            self.chunks.len(),
            (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0,
        ));
        for (kind, counts) in &self.per_kind {
            out.push_str(&format!(
                "\n  {:<16} {:>8} ok {:>8} failed",
                kind.as_str(),
                counts.succeeded,
                counts.failed
            ));
        }
        if let Some(ref path) = self.failure_log {
            out.push_str(&format!("\nFailure log: {}", path.display()));
        }
        if self.cancelled {
            out.push_str("\nCancelled; remaining entries were not dispatched");
        }
        out
    }
}

/// Result of processing one entry on a worker
struct ProcessedEntry {
    entry: ArchiveEntry,
    stem: String,
    /// One result per extractor of the entry's kind, or the read error
    outcome: std::result::Result<Vec<std::result::Result<Vec<Row>, String>>, String>,
}

enum Processed {
    Skipped(ArchiveEntry),
    Done(ProcessedEntry),
}

fn run_extractor(extractor: &dyn Extractor, stem: &str, raw: &[u8]) -> std::result::Result<Vec<Row>, String> {
    let set = extractor.extract(raw).map_err(|e| e.to_string())?;
    materialize(extractor.schema(), stem, &set).map_err(|e| e.to_string())
}

fn process_entry(spec: &ExtractionSpec, reader: &EntryReader, entry: ArchiveEntry) -> ProcessedEntry {
    let stem = entry.stem();
    let outcome = reader.read(&entry).map_err(|e| e.reason).map(|raw| {
        spec.extractors_for(entry.kind)
            .iter()
            .map(|extractor| run_extractor(extractor.as_ref(), &stem, &raw))
            .collect()
    });
    ProcessedEntry {
        entry,
        stem,
        outcome,
    }
}

/// Run-scoped mutable state, owned by the consumer loop
struct BatchState {
    accumulators: BTreeMap<DocumentKind, Vec<Accumulator>>,
    entries_seen: usize,
    entries_skipped: usize,
    entries_unknown: usize,
    per_kind: BTreeMap<DocumentKind, KindCounts>,
    failures: Vec<Failure>,
    chunks: Vec<WrittenChunk>,
}

impl BatchState {
    fn new(spec: &ExtractionSpec) -> Self {
        let accumulators = spec
            .kinds()
            .map(|kind| {
                let accs = spec
                    .extractors_for(kind)
                    .iter()
                    .map(|e| Accumulator::new(kind, e.name(), output_schema(e.schema())))
                    .collect();
                (kind, accs)
            })
            .collect();

        Self {
            accumulators,
            entries_seen: 0,
            entries_skipped: 0,
            entries_unknown: 0,
            per_kind: BTreeMap::new(),
            failures: Vec::new(),
            chunks: Vec::new(),
        }
    }

    /// Apply one entry's outcome
    fn apply(&mut self, spec: &ExtractionSpec, processed: ProcessedEntry) {
        let ProcessedEntry {
            entry,
            stem,
            outcome,
        } = processed;
        let extractors = spec.extractors_for(entry.kind);
        let Some(accumulators) = self.accumulators.get_mut(&entry.kind) else {
            return;
        };

        let mut failed = false;
        match outcome {
            Err(reason) => {
                warn!(
                    archive = %entry.archive_path.display(),
                    entry = %entry.entry_name,
                    reason = %reason,
                    "Failed to read entry"
                );
                self.failures.push(Failure {
                    archive_path: entry.archive_path.clone(),
                    entry_name: entry.entry_name.clone(),
                    kind: entry.kind,
                    extractor: String::new(),
                    reason,
                });
                for (extractor, acc) in extractors.iter().zip(accumulators.iter_mut()) {
                    acc.push(vec![placeholder_row(&stem, extractor.schema().len() + 1)]);
                }
                failed = true;
            },
            Ok(results) => {
                for ((extractor, acc), result) in
                    extractors.iter().zip(accumulators.iter_mut()).zip(results)
                {
                    match result {
                        Ok(rows) => acc.push(rows),
                        Err(reason) => {
                            warn!(
                                archive = %entry.archive_path.display(),
                                entry = %entry.entry_name,
                                extractor = extractor.name(),
                                reason = %reason,
                                "Extraction failed"
                            );
                            self.failures.push(Failure {
                                archive_path: entry.archive_path.clone(),
                                entry_name: entry.entry_name.clone(),
                                kind: entry.kind,
                                extractor: extractor.name().to_string(),
                                reason,
                            });
                            acc.push(vec![placeholder_row(&stem, extractor.schema().len() + 1)]);
                            failed = true;
                        },
                    }
                }
            },
        }

        let counts = self.per_kind.entry(entry.kind).or_default();
        if failed {
            counts.failed += 1;
        } else {
            counts.succeeded += 1;
        }
    }

    fn full_chunks(&mut self, kind: DocumentKind, limit: usize) -> Vec<Chunk> {
        self.accumulators
            .get_mut(&kind)
            .map(|accs| accs.iter_mut().filter_map(|a| a.flush_if_full(limit)).collect())
            .unwrap_or_default()
    }

    fn drain_all(&mut self) -> Vec<Chunk> {
        self.accumulators
            .values_mut()
            .flat_map(|accs| accs.iter_mut())
            .filter_map(Accumulator::drain)
            .collect()
    }
}

/// Drives one import over an entry sequence
pub struct BatchRunner {
    spec: Arc<ExtractionSpec>,
    sink: Arc<dyn OutputSink>,
    options: RunOptions,
    observer: Arc<dyn ProgressObserver>,
    cancel: CancellationToken,
    reader: EntryReader,
}

impl BatchRunner {
    pub fn new(spec: ExtractionSpec, sink: Arc<dyn OutputSink>, options: RunOptions) -> Self {
        Self {
            spec: Arc::new(spec),
            sink,
            options,
            observer: Arc::new(NoopObserver),
            cancel: CancellationToken::new(),
            reader: EntryReader::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_reader(mut self, reader: EntryReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    /// Token that stops dispatch of further entries when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run<I>(&self, entries: I) -> Result<ImportResult>
    where
        I: IntoIterator<Item = ArchiveEntry>,
    {
        self.options.validate()?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            run_id = %run_id,
            chunk_size = self.options.chunk_size,
            parallelism = self.options.parallelism,
            spec = ?self.spec,
            "Starting import"
        );

        let mut state = BatchState::new(&self.spec);

        let cancel = self.cancel.clone();
        let spec = Arc::clone(&self.spec);
        let reader = self.reader.clone();
        let outcomes = stream::iter(entries)
            .take_while(move |_| futures::future::ready(!cancel.is_cancelled()))
            .map(move |entry| {
                let spec = Arc::clone(&spec);
                let reader = reader.clone();
                async move {
                    if !spec.handles(entry.kind) {
                        return Ok(Processed::Skipped(entry));
                    }
                    tokio::task::spawn_blocking(move || process_entry(&spec, &reader, entry))
                        .await
                        .map(Processed::Done)
                }
            })
            .buffered(self.options.parallelism);
        futures::pin_mut!(outcomes);

        while let Some(next) = outcomes.next().await {
            let processed = next.map_err(|e| ImportError::Task(e.to_string()))?;
            state.entries_seen += 1;

            match processed {
                Processed::Skipped(entry) => {
                    if entry.kind == DocumentKind::Unknown {
                        state.entries_unknown += 1;
                    } else {
                        state.entries_skipped += 1;
                    }
                },
                Processed::Done(processed) => {
                    let kind = processed.entry.kind;
                    state.apply(&self.spec, processed);
                    for chunk in state.full_chunks(kind, self.options.chunk_size) {
                        self.write_chunk(&mut state, chunk).await?;
                    }
                },
            }
        }

        let cancelled = self.cancel.is_cancelled();
        if cancelled {
            warn!(
                run_id = %run_id,
                entries = state.entries_seen,
                "Import cancelled; flushing completed entries"
            );
        }
        for chunk in state.drain_all() {
            self.write_chunk(&mut state, chunk).await?;
        }

        let failure_log = self.write_failures(&state.failures).await?;

        let result = ImportResult {
            run_id,
            started_at,
            finished_at: Utc::now(),
            entries_seen: state.entries_seen,
            entries_skipped: state.entries_skipped,
            entries_unknown: state.entries_unknown,
            index: IndexStats::default(),
            per_kind: state.per_kind,
            failures: state.failures,
            chunks: state.chunks,
            failure_log: Some(failure_log),
            cancelled,
        };

        info!(
            run_id = %run_id,
            entries = result.entries_seen,
            succeeded = result.succeeded(),
            failed = result.failed(),
            chunks = result.chunks.len(),
            rows = result.rows_written(),
            cancelled,
            "Import finished"
        );

        Ok(result)
    }

    async fn write_chunk(&self, state: &mut BatchState, chunk: Chunk) -> Result<()> {
        validate_table(&chunk.table)?;

        let location = self.sink.chunk_location(&chunk);
        let sink = Arc::clone(&self.sink);
        let written = tokio::task::spawn_blocking(move || sink.write(&chunk))
            .await
            .map_err(|e| ImportError::Task(e.to_string()))?
            .map_err(|source| ImportError::OutputWrite {
                path: location,
                chunks_written: state.chunks.len(),
                source,
            })?;

        debug!(
            kind = %written.kind,
            extractor = %written.extractor,
            chunk = written.chunk_index,
            rows = written.rows,
            path = %written.path.display(),
            "Flushed chunk"
        );

        state.chunks.push(written);
        if let Some(written) = state.chunks.last() {
            self.observer.on_chunk_flushed(&FlushEvent {
                kind: written.kind,
                extractor: written.extractor.clone(),
                chunk_index: written.chunk_index,
                rows: written.rows,
                path: written.path.clone(),
                chunks_written: state.chunks.len(),
                entries_processed: state.entries_seen,
            });
        }
        Ok(())
    }

    async fn write_failures(&self, failures: &[Failure]) -> Result<PathBuf> {
        let sink = Arc::clone(&self.sink);
        let failures = failures.to_vec();
        let count = failures.len();
        let path = tokio::task::spawn_blocking(move || sink.write_failures(&failures))
            .await
            .map_err(|e| ImportError::Task(e.to_string()))??;
        debug!(failures = count, path = %path.display(), "Wrote failure log");
        Ok(path)
    }
}

/// Open archives, enumerate them and run the import in one call
pub async fn import_archives<P: AsRef<Path>>(
    runner: &BatchRunner,
    archives: &[P],
    allow_list: Option<AllowList>,
) -> Result<ImportResult> {
    let entries = ArchiveIndex::open(archives, allow_list)?.entries();
    let counters = entries.counters();

    let mut result = runner.run(entries).await?;
    result.index = counters.snapshot();
    result.entries_unknown += result.index.unknown;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractionError, FnExtractor};
    use crate::sink::SinkError;
    use crate::table::{ColumnSet, ColumnSpec, Value};
    use std::io::Write;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySink {
        chunks: Mutex<Vec<Chunk>>,
        failures: Mutex<Vec<Failure>>,
        fail_after: Option<usize>,
    }

    impl OutputSink for MemorySink {
        fn write(&self, chunk: &Chunk) -> std::result::Result<WrittenChunk, SinkError> {
            let mut chunks = self.chunks.lock().unwrap();
            if self.fail_after.is_some_and(|n| chunks.len() >= n) {
                return Err(SinkError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")));
            }
            chunks.push(chunk.clone());
            Ok(WrittenChunk {
                path: self.chunk_location(chunk),
                kind: chunk.kind,
                extractor: chunk.extractor.clone(),
                chunk_index: chunk.index,
                rows: chunk.rows(),
                sha256: String::new(),
            })
        }

        fn write_failures(&self, failures: &[Failure]) -> std::result::Result<PathBuf, SinkError> {
            *self.failures.lock().unwrap() = failures.to_vec();
            Ok(PathBuf::from("failures"))
        }
    }

    fn title_spec() -> ExtractionSpec {
        let title = FnExtractor::new("title", vec![ColumnSpec::text("title")], |raw: &[u8]| {
            let text = std::str::from_utf8(raw).map_err(|_| ExtractionError::Encoding)?;
            if text.starts_with("bad") {
                return Err(ExtractionError::Malformed(text.to_string()));
            }
            Ok(ColumnSet::new().scalar("title", Value::text(text)))
        });
        let words = FnExtractor::new("words", vec![ColumnSpec::text("word")], |raw: &[u8]| {
            let text = String::from_utf8_lossy(raw);
            let words = text.split_whitespace().map(Value::text).collect();
            Ok(ColumnSet::new().many("word", words))
        });
        ExtractionSpec::builder()
            .register(DocumentKind::JournalArticle, title)
            .and_then(|b| b.register(DocumentKind::JournalArticle, words))
            .unwrap()
            .build()
    }

    fn write_zip(dir: &Path, files: &[(&str, &str)]) -> PathBuf {
        let path = dir.join("input.zip");
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
        for (name, content) in files {
            writer.start_file(*name, zip::write::FileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    fn options(chunk_size: usize, parallelism: usize) -> RunOptions {
        RunOptions {
            chunk_size,
            parallelism,
        }
    }

    #[tokio::test]
    async fn test_failed_extractor_keeps_row_alignment() {
        let dir = tempfile::tempdir().unwrap();
        let zip = write_zip(
            dir.path(),
            &[
                ("metadata/journal-article-a.xml", "alpha beta"),
                ("metadata/journal-article-b.xml", "bad doc"),
                ("metadata/book-chapter-c.xml", "skipped"),
                ("readme.md", "unknown"),
            ],
        );
        let sink = Arc::new(MemorySink::default());
        let runner = BatchRunner::new(title_spec(), sink.clone(), options(10, 2));

        let result = import_archives(&runner, &[&zip], None).await.unwrap();

        assert_eq!(result.entries_seen, 3);
        assert_eq!(result.entries_skipped, 1);
        assert_eq!(result.entries_unknown, 1);
        assert_eq!(
            result.per_kind[&DocumentKind::JournalArticle],
            KindCounts { succeeded: 1, failed: 1 }
        );
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].extractor, "title");

        let chunks = sink.chunks.lock().unwrap();
        let title = chunks.iter().find(|c| c.extractor == "title").unwrap();
        assert_eq!(
            title.table.rows,
            vec![
                vec![Value::text("journal-article-a"), Value::text("alpha beta")],
                vec![Value::text("journal-article-b"), Value::Missing],
            ]
        );
        // the other extractor still sees the malformed document
        let words = chunks.iter().find(|c| c.extractor == "words").unwrap();
        assert_eq!(words.table.len(), 4);
        assert_eq!(sink.failures.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_read_failure_records_empty_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let zip = write_zip(dir.path(), &[("metadata/journal-article-a.xml", "alpha")]);
        let ghost = ArchiveEntry::new(&zip, "metadata/journal-article-ghost.xml", 7);

        let sink = Arc::new(MemorySink::default());
        let runner = BatchRunner::new(title_spec(), sink.clone(), options(10, 1));
        let result = runner.run(vec![ghost]).await.unwrap();

        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].extractor, "");
        let chunks = sink.chunks.lock().unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.table.rows[0][1] == Value::Missing));
    }

    #[tokio::test]
    async fn test_sink_failure_is_fatal_and_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<(String, String)> = (0..4)
            .map(|i| (format!("metadata/journal-article-{i}.xml"), format!("doc {i}")))
            .collect();
        let refs: Vec<(&str, &str)> = files.iter().map(|(n, c)| (n.as_str(), c.as_str())).collect();
        let zip = write_zip(dir.path(), &refs);

        let sink = Arc::new(MemorySink {
            fail_after: Some(2),
            ..Default::default()
        });
        let runner = BatchRunner::new(title_spec(), sink, options(1, 1));
        let err = import_archives(&runner, &[&zip], None).await.unwrap_err();

        match err {
            ImportError::OutputWrite { chunks_written, .. } => assert_eq!(chunks_written, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    /// Yields the given entries and cancels the token once exhausted
    struct CancelOnExhaustion {
        entries: std::vec::IntoIter<ArchiveEntry>,
        token: CancellationToken,
    }

    impl Iterator for CancelOnExhaustion {
        type Item = ArchiveEntry;

        fn next(&mut self) -> Option<ArchiveEntry> {
            let next = self.entries.next();
            if next.is_none() {
                self.token.cancel();
            }
            next
        }
    }

    #[tokio::test]
    async fn test_cancel_after_last_entry_still_flushes_open_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let zip = write_zip(
            dir.path(),
            &[
                ("metadata/journal-article-a.xml", "one"),
                ("metadata/journal-article-b.xml", "two"),
                ("metadata/journal-article-c.xml", "three"),
            ],
        );
        let entries: Vec<ArchiveEntry> = ArchiveIndex::open(&[&zip], None)
            .unwrap()
            .entries()
            .collect();
        let token = CancellationToken::new();

        let sink = Arc::new(MemorySink::default());
        let runner = BatchRunner::new(title_spec(), sink.clone(), options(10, 2))
            .with_cancellation(token.clone());
        let result = runner
            .run(CancelOnExhaustion {
                entries: entries.into_iter(),
                token,
            })
            .await
            .unwrap();

        assert!(result.cancelled);
        assert_eq!(result.entries_seen, 3);
        assert_eq!(result.succeeded(), 3);
        let titles: Vec<&WrittenChunk> = result
            .chunks_for(DocumentKind::JournalArticle, "title")
            .collect();
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].rows, 3);
        assert_eq!(result.rows_written(), 6);
        assert_eq!(sink.chunks.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_summary_reports_index_skips() {
        let runner = BatchRunner::new(title_spec(), Arc::new(MemorySink::default()), options(10, 1));
        let mut result = runner.run(Vec::<ArchiveEntry>::new()).await.unwrap();
        result.index = IndexStats {
            unknown: 0,
            filtered: 2,
            unreadable: 1,
        };

        let summary = result.summary();
        assert!(summary.contains("2 outside allow-list"));
        assert!(summary.contains("1 unreadable zip record(s)"));
    }

    #[tokio::test]
    async fn test_zero_chunk_size_rejected() {
        let runner = BatchRunner::new(title_spec(), Arc::new(MemorySink::default()), options(0, 1));
        let err = runner.run(Vec::<ArchiveEntry>::new()).await.unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
    }
}
