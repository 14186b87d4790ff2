//! Checksum utilities for written output
//!
//! Chunk files are fingerprinted after they are written so two runs over the
//! same input can be compared without diffing file contents.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Compute the hex-encoded SHA-256 of any readable source
pub fn sha256_reader<R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the hex-encoded SHA-256 of a file
pub fn sha256_file(path: impl AsRef<Path>) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    sha256_reader(&mut file)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::CommonError;
    use std::io::{Cursor, Write};

    const HELLO_WORLD: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_sha256_reader() {
        let mut cursor = Cursor::new(b"hello world");
        assert_eq!(sha256_reader(&mut cursor).unwrap(), HELLO_WORLD);
    }

    #[test]
    fn test_sha256_file_matches_reader() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        file.flush().unwrap();

        assert_eq!(sha256_file(file.path()).unwrap(), HELLO_WORLD);
        assert!(matches!(
            sha256_file(file.path().with_extension("missing")),
            Err(CommonError::Io(_))
        ));
    }
}
