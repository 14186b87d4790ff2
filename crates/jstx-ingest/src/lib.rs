//! jstx ingest library
//!
//! Batch extraction and import of bibliographic archives: zip files of XML
//! metadata and n-gram text files are enumerated, every entry is routed to
//! the extractors registered for its document kind, and the resulting rows
//! are streamed to numbered, typed CSV chunk files.
//!
//! # Pipeline
//!
//! - [`archive`]: archive index, entry reader and preview
//! - [`extract`]: the [`Extractor`](extract::Extractor) trait and [`ExtractionSpec`](extract::ExtractionSpec)
//! - [`validate`]: column set shape and type checks
//! - [`accumulator`]: per (kind, extractor) chunk buffers
//! - [`runner`]: the [`BatchRunner`](runner::BatchRunner)
//! - [`sink`]: the [`OutputSink`](sink::OutputSink) trait, CSV output and re-import
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use jstx_ingest::extractors::default_spec;
//! use jstx_ingest::runner::{import_archives, BatchRunner, RunOptions};
//! use jstx_ingest::sink::CsvSink;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runner = BatchRunner::new(
//!         default_spec()?,
//!         Arc::new(CsvSink::new("out/jstor")),
//!         RunOptions::default(),
//!     );
//!     let result = import_archives(&runner, &["delivery-1.zip"], None).await?;
//!     println!("{}", result.summary());
//!     Ok(())
//! }
//! ```

pub mod accumulator;
pub mod allow_list;
pub mod archive;
pub mod config;
pub mod error;
pub mod extract;
pub mod extractors;
pub mod kind;
pub mod ngram;
pub mod progress;
pub mod runner;
pub mod sink;
pub mod table;
pub mod validate;

pub use error::{ImportError, Result};
pub use kind::DocumentKind;
