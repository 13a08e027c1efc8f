//! Manifest deserialization.
//!
//! Parses a TOML document into the validated [`PackageManifest`] type. Field
//! validation runs during deserialization; cross-field rules run afterwards
//! via [`PackageManifest::validate`].

use super::error::ManifestError;
use super::package::PackageManifest;
use camino::{Utf8Path, Utf8PathBuf};

/// Errors arising from manifest parsing.
#[derive(Debug, thiserror::Error)]
pub enum ManifestParseError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {path}: {source}")]
    Read {
        /// Path of the manifest file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or field validation failed.
    #[error("manifest parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The fields are individually valid but inconsistent.
    #[error(transparent)]
    Invalid(#[from] ManifestError),
}

/// Parse a TOML string into a validated [`PackageManifest`].
///
/// # Errors
///
/// Returns an error if the TOML is malformed, a field fails validation, an
/// unknown key is present, or cross-field checks fail.
///
/// # Examples
///
/// ```
/// use casket::manifest::parse_manifest;
///
/// let manifest = parse_manifest(r#"
///     token = "example"
///     version = "0.23.3"
///     sha256 = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
///     url = "https://example.com/app-{version}.dmg"
///     app = "Example.app"
/// "#).expect("valid manifest");
/// assert_eq!(
///     manifest.download_url().expect("resolves"),
///     "https://example.com/app-0.23.3.dmg"
/// );
/// ```
pub fn parse_manifest(source: &str) -> Result<PackageManifest, ManifestParseError> {
    let manifest: PackageManifest = toml::from_str(source)?;
    manifest.validate()?;
    Ok(manifest)
}

/// Read and parse the manifest file at `path`.
///
/// # Errors
///
/// Returns [`ManifestParseError::Read`] when the file cannot be read, and any
/// [`parse_manifest`] error otherwise.
pub fn load_manifest(path: &Utf8Path) -> Result<PackageManifest, ManifestParseError> {
    let source = std::fs::read_to_string(path).map_err(|source| ManifestParseError::Read {
        path: path.to_owned(),
        source,
    })?;
    log::debug!("parsing manifest {path}");
    parse_manifest(&source)
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
