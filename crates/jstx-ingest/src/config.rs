//! Import configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ImportError, Result};
use crate::runner::RunOptions;

// ============================================================================
// Import Configuration Constants
// ============================================================================

/// Default number of documents per chunk file.
pub const DEFAULT_CHUNK_SIZE: usize = 25_000;

/// Default output prefix, relative to the working directory.
pub const DEFAULT_OUTPUT_PREFIX: &str = "jstx";

/// Fallback when the available parallelism cannot be determined.
const FALLBACK_PARALLELISM: usize = 4;

/// Default number of entries processed concurrently.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_PARALLELISM)
}

/// Settings for one import, before CLI overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    pub chunk_size: usize,
    pub parallelism: usize,
    pub output_prefix: PathBuf,
}

impl ImportSettings {
    /// Load settings from `.env` and the process environment
    ///
    /// Reads `JSTX_CHUNK_SIZE`, `JSTX_PARALLELISM` and `JSTX_OUTPUT_PREFIX`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from any key lookup; unset keys fall back to defaults
    ///
    /// Values are not range-checked here: call [`validate`](Self::validate)
    /// once command-line overrides have been applied.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key: &str, default: usize| -> Result<usize> {
            match lookup(key) {
                Some(raw) => raw.trim().parse().map_err(|_| {
                    ImportError::config(format!("{} must be a non-negative integer, got '{}'", key, raw))
                }),
                None => Ok(default),
            }
        };

        Ok(Self {
            chunk_size: parse("JSTX_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            parallelism: parse("JSTX_PARALLELISM", default_parallelism())?,
            output_prefix: lookup("JSTX_OUTPUT_PREFIX")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PREFIX)),
        })
    }

    /// Replace each field that has an explicit value
    pub fn with_overrides(
        mut self,
        chunk_size: Option<usize>,
        parallelism: Option<usize>,
        output_prefix: Option<PathBuf>,
    ) -> Self {
        if let Some(size) = chunk_size {
            self.chunk_size = size;
        }
        if let Some(n) = parallelism {
            self.parallelism = n;
        }
        if let Some(prefix) = output_prefix {
            self.output_prefix = prefix;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ImportError::config("chunk size must be greater than 0"));
        }

        if self.parallelism == 0 {
            return Err(ImportError::config("parallelism must be greater than 0"));
        }

        if self.output_prefix.as_os_str().is_empty() {
            return Err(ImportError::config("output prefix cannot be empty"));
        }

        Ok(())
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            chunk_size: self.chunk_size,
            parallelism: self.parallelism,
        }
    }
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            parallelism: default_parallelism(),
            output_prefix: PathBuf::from(DEFAULT_OUTPUT_PREFIX),
        }
    }
}
