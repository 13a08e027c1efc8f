//! Package manifest model and parser.
//!
//! A manifest is a flat, declarative TOML record describing one installable
//! application bundle: where to download it, how to verify it, which bundles
//! to copy into the applications directory, and what to clean up on
//! uninstall. Every field is validated while deserializing, so a
//! [`PackageManifest`] value is always well formed.
//!
//! # Sub-modules
//!
//! - [`artifact`] - Bundle entries copied into the applications directory.
//! - [`checksum`] - SHA-256 digest newtype (`Sha256Digest`).
//! - [`command`] - The post-install command (`PostInstallCommand`).
//! - [`depends_on`] - Platform constraints (`Arch`, `MacosRequirement`).
//! - [`error`] - Semantic error types for validation failures.
//! - [`livecheck_rule`] - Upstream version detection rule.
//! - [`manifest_parser`] - TOML deserialization and cross-field checks.
//! - [`package`] - The `PackageManifest` record itself.
//! - [`template`] - `{placeholder}` scanning and expansion.
//! - [`token`] - Package token newtype (`Token`).
//! - [`uninstall_rule`] - Quit triggers and zap paths.
//! - [`url_template`] - Download URL template (`UrlTemplate`).
//! - [`version`] - Version newtype and loose ordering.

pub mod artifact;
pub mod checksum;
pub mod command;
pub mod depends_on;
pub mod error;
pub mod livecheck_rule;
pub mod manifest_parser;
pub mod package;
pub mod template;
pub mod token;
pub mod uninstall_rule;
pub mod url_template;
pub mod version;

mod one_or_many;

pub use package::PackageManifest;
pub use manifest_parser::{ManifestParseError, load_manifest, parse_manifest};
