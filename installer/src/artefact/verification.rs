//! Integrity checks for downloaded artifacts.
//!
//! Every artifact is hashed before anything is unpacked. A file that fails
//! the check is deleted so the next attempt starts from a clean download.

use crate::error::{InstallerError, Result};
use crate::manifest::checksum::Sha256Digest;
use std::path::Path;

/// Outcome of comparing a file against the manifest digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The digests agree.
    Match,
    /// The digests differ.
    Mismatch {
        /// Digest of the file on disk.
        actual: Sha256Digest,
    },
}

/// Hashes `path` and compares it with `expected`.
///
/// # Errors
///
/// Returns [`InstallerError::Io`] if the file cannot be read.
pub fn check_file(path: &Path, expected: &Sha256Digest) -> Result<Verification> {
    let actual = Sha256Digest::of_file(path)?;
    if &actual == expected {
        Ok(Verification::Match)
    } else {
        Ok(Verification::Mismatch { actual })
    }
}

/// Verifies a fresh download, deleting it on mismatch.
///
/// # Errors
///
/// Returns [`InstallerError::ChecksumMismatch`] when the digests differ and
/// [`InstallerError::Io`] if the file cannot be read or removed.
pub fn verify_or_discard(path: &Path, expected: &Sha256Digest, url: &str) -> Result<()> {
    match check_file(path, expected)? {
        Verification::Match => {
            log::debug!("checksum verified for {}", path.display());
            Ok(())
        }
        Verification::Mismatch { actual } => {
            std::fs::remove_file(path)?;
            Err(InstallerError::ChecksumMismatch {
                url: url.to_owned(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(bytes: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("artifact.dmg");
        std::fs::write(&path, bytes).expect("write artifact");
        (dir, path)
    }

    #[test]
    fn matching_file_is_kept() {
        let (_dir, path) = write_temp(b"payload");
        let expected = Sha256Digest::of_bytes(b"payload");
        verify_or_discard(&path, &expected, "https://example.test/a.dmg").expect("verified");
        assert!(path.exists());
    }

    #[test]
    fn mismatching_file_is_deleted() {
        let (_dir, path) = write_temp(b"payload");
        let expected = Sha256Digest::of_bytes(b"other");
        let err = verify_or_discard(&path, &expected, "https://example.test/a.dmg")
            .expect_err("mismatch");
        assert!(matches!(err, InstallerError::ChecksumMismatch { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn check_file_reports_actual_digest() {
        let (_dir, path) = write_temp(b"payload");
        let expected = Sha256Digest::of_bytes(b"other");
        let outcome = check_file(&path, &expected).expect("readable");
        assert_eq!(
            outcome,
            Verification::Mismatch {
                actual: Sha256Digest::of_bytes(b"payload")
            }
        );
    }
}
