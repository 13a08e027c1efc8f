//! Uninstall quit triggers (`[uninstall]`) and zap cleanup paths (`[zap]`).

use super::error::{ManifestError, Result};
use super::one_or_many;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fmt;

/// A reverse-DNS bundle identifier such as `io.freetubeapp.freetube`.
///
/// # Examples
///
/// ```
/// use casket::manifest::uninstall_rule::BundleId;
///
/// assert!(BundleId::try_from("io.freetubeapp.freetube").is_ok());
/// assert!(BundleId::try_from("freetube").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct BundleId(String);

impl BundleId {
    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for BundleId {
    type Error = ManifestError;

    fn try_from(value: &str) -> Result<Self> {
        Self::try_from(value.to_owned())
    }
}

impl TryFrom<String> for BundleId {
    type Error = ManifestError;

    fn try_from(value: String) -> Result<Self> {
        let well_formed = value.contains('.')
            && value.split('.').all(|part| {
                !part.is_empty()
                    && part
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            });
        if !well_formed {
            return Err(ManifestError::InvalidBundleId {
                value,
                reason: "expected dot-separated alphanumeric labels".to_owned(),
            });
        }
        Ok(Self(value))
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The `[uninstall]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UninstallRule {
    #[serde(default, deserialize_with = "one_or_many::deserialize")]
    quit: Vec<BundleId>,
}

impl UninstallRule {
    /// Applications asked to quit before their bundles are removed.
    #[must_use]
    pub fn quit(&self) -> &[BundleId] {
        &self.quit
    }
}

/// A path pattern rooted at `~` or `/`, possibly containing glob wildcards.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use casket::manifest::uninstall_rule::ZapPath;
///
/// let path = ZapPath::try_from("~/Library/Application Support/FreeTube").expect("valid path");
/// assert_eq!(
///     path.expand(Utf8Path::new("/Users/me")).as_str(),
///     "/Users/me/Library/Application Support/FreeTube"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct ZapPath(String);

impl ZapPath {
    /// Return the unexpanded pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Replace a leading `~` with `home`.
    #[must_use]
    pub fn expand(&self, home: &Utf8Path) -> Utf8PathBuf {
        match self.0.strip_prefix("~/") {
            Some(rest) => home.join(rest),
            None => Utf8PathBuf::from(&self.0),
        }
    }
}

impl TryFrom<&str> for ZapPath {
    type Error = ManifestError;

    fn try_from(value: &str) -> Result<Self> {
        Self::try_from(value.to_owned())
    }
}

impl TryFrom<String> for ZapPath {
    type Error = ManifestError;

    fn try_from(value: String) -> Result<Self> {
        let invalid = |value: String, reason: &str| ManifestError::InvalidZapPath {
            value,
            reason: reason.to_owned(),
        };
        let relative = match value.strip_prefix("~/") {
            Some(rest) => rest,
            None => match value.strip_prefix('/') {
                Some(rest) => rest,
                None => return Err(invalid(value, "path must start with ~/ or /")),
            },
        };
        let path = Utf8Path::new(relative);
        if path.components().any(|c| matches!(c, Utf8Component::ParentDir)) {
            return Err(invalid(value, "path must not contain .."));
        }
        if path.components().next().is_none() {
            return Err(invalid(value, "path must name something below its root"));
        }
        Ok(Self(value))
    }
}

impl fmt::Display for ZapPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The `[zap]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZapRule {
    #[serde(default, deserialize_with = "one_or_many::deserialize")]
    trash: Vec<ZapPath>,
    #[serde(default, deserialize_with = "one_or_many::deserialize")]
    rmdir: Vec<ZapPath>,
}

impl ZapRule {
    /// Paths (or glob patterns) removed outright.
    #[must_use]
    pub fn trash(&self) -> &[ZapPath] {
        &self.trash
    }

    /// Directories removed only when empty.
    #[must_use]
    pub fn rmdir(&self) -> &[ZapPath] {
        &self.rmdir
    }

    /// Return true when nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trash.is_empty() && self.rmdir.is_empty()
    }
}
