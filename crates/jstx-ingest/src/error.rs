//! Error types for the import pipeline
//!
//! Fatal errors abort a run and surface as [`ImportError`]. Per-entry
//! problems ([`EntryReadError`], extraction and validation failures) are
//! recorded as failures and never leave the runner as errors.

use std::path::PathBuf;
use thiserror::Error;

use crate::sink::SinkError;
use crate::validate::ValidationError;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ImportError>;

/// Fatal pipeline errors
#[derive(Error, Debug)]
pub enum ImportError {
    /// An archive could not be opened or its central directory is corrupt
    #[error("Cannot open archive '{}': {source}", .path.display())]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// A flushed chunk could not be written; earlier chunks remain on disk
    #[error("Failed to write chunk '{}' ({chunks_written} chunks already written): {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        chunks_written: usize,
        #[source]
        source: SinkError,
    },

    #[error("Chunk failed validation: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Output error: {0}")]
    Sink(#[from] SinkError),

    #[error("Worker task failed: {0}")]
    Task(String),
}

impl ImportError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// One entry could not be read from an otherwise valid archive
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot read '{entry_name}' from '{}': {reason}", .archive_path.display())]
pub struct EntryReadError {
    pub archive_path: PathBuf,
    pub entry_name: String,
    pub reason: String,
}
