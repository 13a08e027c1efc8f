//! Error types for manifest field validation.
//!
//! Each variant names the rejected input and the constraint it violated, so
//! that parse failures point authors straight at the offending line.

use thiserror::Error;

/// Errors arising from invalid manifest values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    /// The package token is empty or contains unsupported characters.
    #[error("invalid token \"{value}\": {reason}")]
    InvalidToken {
        /// The rejected token.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// The version string is empty or unusable in file names.
    #[error("invalid version \"{value}\": {reason}")]
    InvalidVersion {
        /// The rejected version.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A SHA-256 digest is not a valid 64-character hex string.
    #[error("invalid SHA-256 digest: {reason}")]
    InvalidSha256Digest {
        /// Description of the validation failure.
        reason: String,
    },

    /// A template string is malformed or uses an unknown placeholder.
    #[error("invalid template \"{value}\": {reason}")]
    InvalidTemplate {
        /// The rejected template.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// The architecture name is not recognised.
    #[error("unsupported architecture \"{value}\"; expected one of: arm64, intel")]
    UnsupportedArch {
        /// The rejected architecture name.
        value: String,
    },

    /// The macOS requirement could not be parsed.
    #[error("invalid macOS requirement \"{value}\": {reason}")]
    InvalidMacosRequirement {
        /// The rejected requirement.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// The livecheck rule is incomplete or its pattern does not compile.
    #[error("invalid livecheck rule: {reason}")]
    InvalidLivecheck {
        /// Description of the validation failure.
        reason: String,
    },

    /// An install artifact path is empty, absolute, or escapes its root.
    #[error("invalid artifact \"{value}\": {reason}")]
    InvalidArtifact {
        /// The rejected artifact path.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// The post-install command is not a fixed absolute invocation.
    #[error("invalid post-install command: {reason}")]
    InvalidCommand {
        /// Description of the validation failure.
        reason: String,
    },

    /// A bundle identifier is empty or malformed.
    #[error("invalid bundle identifier \"{value}\": {reason}")]
    InvalidBundleId {
        /// The rejected identifier.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A zap path is not rooted at the home directory or filesystem root.
    #[error("invalid zap path \"{value}\": {reason}")]
    InvalidZapPath {
        /// The rejected path pattern.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// Fields are individually valid but inconsistent with each other.
    #[error("inconsistent manifest: {reason}")]
    Inconsistent {
        /// Description of the inconsistency.
        reason: String,
    },
}

/// Result type alias using [`ManifestError`].
pub type Result<T> = std::result::Result<T, ManifestError>;
