//! Error types for the casket installer.
//!
//! [`InstallerError`] covers fatal failures: each aborts the current action
//! and, apart from failures after the bundles are in place, leaves the
//! filesystem as it was. [`Warning`] covers non-fatal problems that are
//! reported to the user while the action still succeeds.

use crate::artefact::download::DownloadError;
use crate::artefact::extraction::ExtractionError;
use crate::manifest::error::ManifestError;
use crate::manifest::manifest_parser::ManifestParseError;
use crate::manifest::token::Token;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that abort an install, uninstall, zap, or livecheck.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The manifest file could not be read or parsed.
    #[error(transparent)]
    ManifestParse(#[from] ManifestParseError),

    /// A manifest value could not be used, e.g. an unresolvable template.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A platform predicate failed; nothing was downloaded or written.
    #[error("{token} cannot be installed on this machine: {reason}")]
    UnsupportedPlatform {
        /// The package being installed.
        token: Token,
        /// Which predicate failed and what the host provides.
        reason: String,
    },

    /// A conflicting package is already installed.
    #[error("{token} conflicts with installed package {conflict}; uninstall it first")]
    ConflictingPackage {
        /// The package being installed.
        token: Token,
        /// The installed package it conflicts with.
        conflict: Token,
    },

    /// The artifact could not be fetched; re-run the action to retry.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The downloaded artifact does not match the manifest checksum.
    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The URL the artifact was fetched from.
        url: String,
        /// The digest recorded in the manifest.
        expected: String,
        /// The digest of the downloaded bytes.
        actual: String,
    },

    /// The container could not be unpacked.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// A declared bundle is not present in the unpacked container.
    #[error("artifact {bundle} not found in downloaded container")]
    ArtifactMissing {
        /// The bundle path relative to the container root.
        bundle: Utf8PathBuf,
    },

    /// Copying bundles into the applications directory failed.
    #[error("staging failed: {reason}")]
    StagingFailed {
        /// Description of the staging failure.
        reason: String,
    },

    /// The applications directory exists but is not writable.
    #[error("applications directory {path} is not writable: {reason}")]
    TargetNotWritable {
        /// Path to the non-writable directory.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// Upstream version detection failed.
    #[error("livecheck failed for {token}: {reason}")]
    Livecheck {
        /// The package being checked.
        token: Token,
        /// Description of the failure.
        reason: String,
    },

    /// Another casket process holds the lock for this token.
    #[error("another operation on {token} is in progress")]
    Locked {
        /// The locked package.
        token: Token,
    },

    /// An installation receipt cannot be read.
    #[error("unreadable receipt {path}: {reason}")]
    CorruptReceipt {
        /// Path of the receipt file.
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// The configuration file is unreadable or invalid.
    #[error("invalid configuration {path}: {reason}")]
    Config {
        /// Path of the configuration file, or the setting at fault.
        path: String,
        /// Description of the problem.
        reason: String,
    },

    /// An external command did not finish within its time limit.
    #[error("{command} timed out after {seconds} seconds")]
    CommandTimedOut {
        /// The program that was run.
        command: String,
        /// The limit that was exceeded.
        seconds: u64,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;

/// Problems reported to the user without failing the action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    /// The post-install command failed after the bundles were installed.
    #[error("post-install command {command} failed: {reason}")]
    PostInstallCommandFailed {
        /// The program that was run.
        command: String,
        /// Exit status or spawn error.
        reason: String,
    },

    /// An installed bundle was already gone during uninstall.
    #[error("{path} was not found; skipping")]
    PathNotFound {
        /// The missing path.
        path: Utf8PathBuf,
    },

    /// An application could not be asked to quit.
    #[error("could not quit {bundle_id}: {reason}")]
    QuitFailed {
        /// The bundle identifier.
        bundle_id: String,
        /// Description of the failure.
        reason: String,
    },

    /// A path could not be removed during uninstall or zap.
    #[error("could not remove {path}: {reason}")]
    RemoveFailed {
        /// The path that was left behind.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },
}
