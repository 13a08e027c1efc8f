//! Version newtype with component accessors and loose ordering.
//!
//! Upstream version strings are not guaranteed to be semver, so ordering is
//! done segment by segment: numeric segments compare numerically, anything
//! else compares as text, and missing trailing segments count as zero.

use super::error::{ManifestError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Separators that split a version into comparable segments.
const SEGMENT_SEPARATORS: &[char] = &['.', '-', '_', ',', '+'];

/// A validated package version such as `0.23.3`.
///
/// # Examples
///
/// ```
/// use casket::manifest::version::Version;
///
/// let version = Version::try_from("0.23.3").expect("valid version");
/// assert_eq!(version.major(), Some("0"));
/// assert_eq!(version.minor(), Some("23"));
/// assert_eq!(version.patch(), Some("3"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(String);

impl Version {
    /// Return the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the first dot-separated component.
    #[must_use]
    pub fn major(&self) -> Option<&str> {
        self.component(0)
    }

    /// Return the second dot-separated component.
    #[must_use]
    pub fn minor(&self) -> Option<&str> {
        self.component(1)
    }

    /// Return the third dot-separated component.
    #[must_use]
    pub fn patch(&self) -> Option<&str> {
        self.component(2)
    }

    fn component(&self, index: usize) -> Option<&str> {
        self.0.split('.').nth(index).filter(|part| !part.is_empty())
    }
}

impl TryFrom<&str> for Version {
    type Error = ManifestError;

    fn try_from(value: &str) -> Result<Self> {
        validate_version(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Version {
    type Error = ManifestError;

    fn try_from(value: String) -> Result<Self> {
        validate_version(&value)?;
        Ok(Self(value))
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_version(value: &str) -> Result<()> {
    let invalid = |reason: &str| ManifestError::InvalidVersion {
        value: value.to_owned(),
        reason: reason.to_owned(),
    };
    if value.is_empty() {
        return Err(invalid("version must not be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(invalid("version must not contain whitespace"));
    }
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(invalid("version must be usable as a file name component"));
    }
    Ok(())
}

/// Compare two version strings segment by segment.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use casket::manifest::version::compare_loose;
///
/// assert_eq!(compare_loose("0.23.3", "0.23.10"), Ordering::Less);
/// assert_eq!(compare_loose("1.2", "1.2.0"), Ordering::Equal);
/// assert_eq!(compare_loose("v2.0", "1.9"), Ordering::Greater);
/// ```
#[must_use]
pub fn compare_loose(left: &str, right: &str) -> Ordering {
    let mut lhs = segments(left);
    let mut rhs = segments(right);
    loop {
        match (lhs.next(), rhs.next()) {
            (None, None) => return Ordering::Equal,
            (l, r) => {
                let ordering = compare_segment(l.unwrap_or("0"), r.unwrap_or("0"));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

fn segments(value: &str) -> impl Iterator<Item = &str> {
    value
        .trim_start_matches(['v', 'V'])
        .split(SEGMENT_SEPARATORS)
        .filter(|segment| !segment.is_empty())
}

fn compare_segment(left: &str, right: &str) -> Ordering {
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if numeric(left) && numeric(right) {
        let l = left.trim_start_matches('0');
        let r = right.trim_start_matches('0');
        return l.len().cmp(&r.len()).then_with(|| l.cmp(r));
    }
    left.cmp(right)
}
