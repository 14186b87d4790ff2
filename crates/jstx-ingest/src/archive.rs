//! Zip archive enumeration and entry reading
//!
//! [`ArchiveIndex`] opens every archive up front (a bad archive is fatal
//! before any work starts) and then enumerates entries lazily, in archive
//! order and central-directory order within an archive. Entry content is
//! read separately through an [`EntryReader`] so enumeration never touches
//! compressed data.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::allow_list::AllowList;
use crate::error::{EntryReadError, ImportError, Result};
use crate::kind::{file_stem, DocumentKind};

/// Handles kept open per archive once a reader is done with them
const MAX_IDLE_HANDLES_PER_ARCHIVE: usize = 16;

/// Largest entry [`EntryReader`] will load by default
pub const DEFAULT_MAX_ENTRY_BYTES: u64 = 256 * 1024 * 1024;

/// Upper bound on the buffer reserved from a header's declared size
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

/// One file inside a zip container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    pub archive_path: PathBuf,
    pub entry_name: String,
    /// Position in the archive's central directory
    pub index: usize,
    pub kind: DocumentKind,
}

impl ArchiveEntry {
    pub fn new(archive_path: impl Into<PathBuf>, entry_name: impl Into<String>, index: usize) -> Self {
        let entry_name = entry_name.into();
        Self {
            archive_path: archive_path.into(),
            kind: DocumentKind::classify(&entry_name),
            entry_name,
            index,
        }
    }

    /// Value of the `file_name` column for this entry
    pub fn stem(&self) -> String {
        file_stem(&self.entry_name)
    }
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| ImportError::ArchiveOpen {
        path: path.to_path_buf(),
        source: zip::result::ZipError::Io(e),
    })?;
    ZipArchive::new(file).map_err(|source| ImportError::ArchiveOpen {
        path: path.to_path_buf(),
        source,
    })
}

/// Entries of one or more zip archives, optionally restricted by stem
pub struct ArchiveIndex {
    archives: Vec<(PathBuf, ZipArchive<File>)>,
    allow_list: Option<AllowList>,
}

impl ArchiveIndex {
    /// Open every archive; fails on the first missing or corrupt one
    pub fn open<P: AsRef<Path>>(paths: &[P], allow_list: Option<AllowList>) -> Result<Self> {
        let mut archives = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let archive = open_archive(path)?;
            debug!(archive = %path.display(), entries = archive.len(), "Opened archive");
            archives.push((path.to_path_buf(), archive));
        }

        if let Some(ref list) = allow_list {
            info!(stems = list.len(), "Restricting enumeration to allow-list");
        }

        Ok(Self {
            archives,
            allow_list,
        })
    }

    /// Total number of central-directory records, directories included
    pub fn raw_len(&self) -> usize {
        self.archives.iter().map(|(_, a)| a.len()).sum()
    }

    /// Consume the index into its entry sequence
    ///
    /// The sequence is not restartable; open the archives again to
    /// re-enumerate.
    pub fn entries(self) -> ArchiveEntries {
        ArchiveEntries {
            archives: self.archives.into(),
            next_index: 0,
            allow_list: self.allow_list,
            counters: Arc::new(IndexCounters::default()),
        }
    }
}

/// Counters for entries the index chose not to yield
#[derive(Debug, Default)]
pub struct IndexCounters {
    unknown: AtomicUsize,
    filtered: AtomicUsize,
    unreadable: AtomicUsize,
}

impl IndexCounters {
    pub fn snapshot(&self) -> IndexStats {
        IndexStats {
            unknown: self.unknown.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            unreadable: self.unreadable.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Files whose path did not match any document kind
    pub unknown: usize,
    /// Classified files outside the allow-list
    pub filtered: usize,
    /// Central-directory records whose header could not be read
    pub unreadable: usize,
}

/// Lazy entry sequence produced by [`ArchiveIndex::entries`]
pub struct ArchiveEntries {
    archives: VecDeque<(PathBuf, ZipArchive<File>)>,
    next_index: usize,
    allow_list: Option<AllowList>,
    counters: Arc<IndexCounters>,
}

impl ArchiveEntries {
    /// Shared handle to the skip counters, readable after the sequence is consumed
    pub fn counters(&self) -> Arc<IndexCounters> {
        Arc::clone(&self.counters)
    }
}

impl Iterator for ArchiveEntries {
    type Item = ArchiveEntry;

    fn next(&mut self) -> Option<ArchiveEntry> {
        loop {
            let (path, archive) = self.archives.front_mut()?;

            if self.next_index >= archive.len() {
                self.archives.pop_front();
                self.next_index = 0;
                continue;
            }

            let index = self.next_index;
            self.next_index += 1;

            let name = match archive.by_index_raw(index) {
                Ok(file) if file.is_dir() => continue,
                Ok(file) => file.name().to_string(),
                Err(e) => {
                    warn!(archive = %path.display(), index, error = %e, "Skipping unreadable zip record");
                    self.counters.unreadable.fetch_add(1, Ordering::Relaxed);
                    continue;
                },
            };

            let entry = ArchiveEntry::new(path.clone(), name, index);
            if entry.kind == DocumentKind::Unknown {
                self.counters.unknown.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            if let Some(ref list) = self.allow_list {
                if !list.contains(&entry.stem()) {
                    self.counters.filtered.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            }

            return Some(entry);
        }
    }
}

/// Reads entry content, keeping a pool of open handles per archive
///
/// A `ZipArchive` needs exclusive access while reading, so every read checks
/// a handle out of the pool (opening a new one when none is idle) and
/// returns it afterwards. Parallel workers never share a handle.
///
/// Entries larger than the size limit, whether by their header or by what
/// they actually decompress to, are read failures.
#[derive(Clone)]
pub struct EntryReader {
    idle: Arc<Mutex<HashMap<PathBuf, Vec<ZipArchive<File>>>>>,
    max_entry_bytes: u64,
}

impl Default for EntryReader {
    fn default() -> Self {
        Self {
            idle: Arc::default(),
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
        }
    }
}

impl EntryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entry_bytes(mut self, max: u64) -> Self {
        self.max_entry_bytes = max;
        self
    }

    pub fn read(&self, entry: &ArchiveEntry) -> std::result::Result<Vec<u8>, EntryReadError> {
        let fail = |reason: String| EntryReadError {
            archive_path: entry.archive_path.clone(),
            entry_name: entry.entry_name.clone(),
            reason,
        };

        let mut archive = match self.checkout(&entry.archive_path) {
            Some(archive) => archive,
            None => open_archive(&entry.archive_path).map_err(|e| fail(e.to_string()))?,
        };

        let result = read_entry(&mut archive, entry, self.max_entry_bytes).map_err(fail);
        self.checkin(&entry.archive_path, archive);
        result
    }

    fn checkout(&self, path: &Path) -> Option<ZipArchive<File>> {
        let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        idle.get_mut(path).and_then(Vec::pop)
    }

    fn checkin(&self, path: &Path, archive: ZipArchive<File>) {
        let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        let handles = idle.entry(path.to_path_buf()).or_default();
        if handles.len() < MAX_IDLE_HANDLES_PER_ARCHIVE {
            handles.push(archive);
        }
    }
}

fn read_entry(
    archive: &mut ZipArchive<File>,
    entry: &ArchiveEntry,
    max_bytes: u64,
) -> std::result::Result<Vec<u8>, String> {
    let matches_index = archive
        .by_index_raw(entry.index)
        .map(|f| f.name() == entry.entry_name)
        .unwrap_or(false);

    let mut file = if matches_index {
        archive.by_index(entry.index)
    } else {
        archive.by_name(&entry.entry_name)
    }
    .map_err(|e| e.to_string())?;

    let declared = file.size();
    if declared > max_bytes {
        return Err(format!(
            "entry declares {} bytes, limit is {}",
            declared, max_bytes
        ));
    }

    let mut buffer = Vec::with_capacity(declared.min(MAX_PREALLOCATION) as usize);
    file.by_ref()
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut buffer)
        .map_err(|e| e.to_string())?;
    if buffer.len() as u64 > max_bytes {
        return Err(format!("entry is larger than {} bytes", max_bytes));
    }
    Ok(buffer)
}

/// Entry counts by kind, computed without reading entry content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub archives: usize,
    pub counts: BTreeMap<DocumentKind, usize>,
}

impl Preview {
    pub fn count(&self, kind: DocumentKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Dry run: classify every file entry of the given archives
pub fn preview<P: AsRef<Path>>(paths: &[P]) -> Result<Preview> {
    let mut preview = Preview::default();

    for path in paths {
        let archive = open_archive(path.as_ref())?;
        for name in archive.file_names().filter(|n| !n.ends_with('/')) {
            *preview.counts.entry(DocumentKind::classify(name)).or_insert(0) += 1;
        }
        preview.archives += 1;
    }

    info!(archives = preview.archives, files = preview.total(), "Previewed archives");
    Ok(preview)
}
