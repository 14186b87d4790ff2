//! jstx Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities for the jstx workspace.
//!
//! # Overview
//!
//! - **Error Handling**: the common error type and result alias
//! - **Logging**: tracing subscriber setup for binaries
//! - **Checksums**: file digests used to fingerprint written output
//!
//! # Example
//!
//! ```no_run
//! use jstx_common::checksum::sha256_file;
//! use jstx_common::Result;
//!
//! fn fingerprint(path: &str) -> Result<()> {
//!     let digest = sha256_file(path)?;
//!     tracing::info!(%digest, "fingerprinted output");
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{CommonError, Result};
