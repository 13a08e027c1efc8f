//! Platform constraints declared under `[depends_on]`.
//!
//! Constraints are pure values here; checking them against the running host
//! happens in [`crate::platform`], before anything is downloaded or written.

use super::error::{ManifestError, Result};
use super::one_or_many;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// macOS release code names and the versions they denote.
const MACOS_RELEASES: &[(&str, u32, u32)] = &[
    ("sierra", 10, 12),
    ("high_sierra", 10, 13),
    ("mojave", 10, 14),
    ("catalina", 10, 15),
    ("big_sur", 11, 0),
    ("monterey", 12, 0),
    ("ventura", 13, 0),
    ("sonoma", 14, 0),
    ("sequoia", 15, 0),
    ("tahoe", 26, 0),
];

/// A CPU architecture a bundle can run on.
///
/// # Examples
///
/// ```
/// use casket::manifest::depends_on::Arch;
///
/// assert_eq!(Arch::try_from("aarch64"), Ok(Arch::Arm64));
/// assert_eq!(Arch::try_from("x86_64"), Ok(Arch::Intel));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Arch {
    /// Apple silicon (`arm64` / `aarch64`).
    Arm64,
    /// Intel (`intel` / `x86_64`).
    Intel,
}

impl Arch {
    /// Map a Rust `target_arch` name onto a bundle architecture.
    #[must_use]
    pub fn from_target_arch(name: &str) -> Option<Self> {
        Self::try_from(name).ok()
    }
}

impl TryFrom<&str> for Arch {
    type Error = ManifestError;

    fn try_from(value: &str) -> Result<Self> {
        match value.trim_start_matches(':') {
            "arm64" | "aarch64" | "arm" => Ok(Self::Arm64),
            "intel" | "x86_64" => Ok(Self::Intel),
            _ => Err(ManifestError::UnsupportedArch {
                value: value.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for Arch {
    type Error = ManifestError;

    fn try_from(value: String) -> Result<Self> {
        Self::try_from(value.as_str())
    }
}

impl From<Arch> for String {
    fn from(arch: Arch) -> Self {
        arch.to_string()
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arm64 => f.write_str("arm64"),
            Self::Intel => f.write_str("intel"),
        }
    }
}

/// A macOS release, ordered by version.
///
/// # Examples
///
/// ```
/// use casket::manifest::depends_on::MacosRelease;
///
/// let big_sur = MacosRelease::parse("big_sur").expect("known code name");
/// assert_eq!(big_sur, MacosRelease::new(11, 0));
/// assert!(MacosRelease::parse("14.2.1").expect("numeric") > big_sur);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacosRelease {
    major: u32,
    minor: u32,
}

impl MacosRelease {
    /// Create a release from its version numbers.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse a code name (`big_sur`, `:sonoma`) or a dotted version
    /// (`11`, `10.15`, `14.2.1`).
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidMacosRequirement`] when the value is
    /// neither a known code name nor a number.
    pub fn parse(value: &str) -> Result<Self> {
        let name = value.trim().trim_start_matches(':');
        if let Some((_, major, minor)) = MACOS_RELEASES.iter().find(|(n, _, _)| *n == name) {
            return Ok(Self::new(*major, *minor));
        }

        let invalid = || ManifestError::InvalidMacosRequirement {
            value: value.to_owned(),
            reason: "expected a release code name or a version number".to_owned(),
        };
        let mut parts = name.split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        let minor = match parts.next() {
            Some(p) => p.parse::<u32>().map_err(|_| invalid())?,
            None => 0,
        };
        Ok(Self::new(major, minor))
    }

    /// Return the major version number.
    #[must_use]
    pub const fn major(&self) -> u32 {
        self.major
    }
}

impl fmt::Display for MacosRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code_name = MACOS_RELEASES
            .iter()
            .find(|(_, major, minor)| *major == self.major && *minor == self.minor);
        match code_name {
            Some((name, _, _)) => write!(f, "{name} ({}.{})", self.major, self.minor),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

/// A comparison operator in a macOS requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// `>=`
    AtLeast,
    /// `>`
    Above,
    /// `<=`
    AtMost,
    /// `<`
    Below,
    /// `==` (also a bare release)
    Exactly,
}

impl Comparator {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::AtLeast => ordering != Ordering::Less,
            Self::Above => ordering == Ordering::Greater,
            Self::AtMost => ordering != Ordering::Greater,
            Self::Below => ordering == Ordering::Less,
            Self::Exactly => ordering == Ordering::Equal,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::AtLeast => ">=",
            Self::Above => ">",
            Self::AtMost => "<=",
            Self::Below => "<",
            Self::Exactly => "==",
        }
    }
}

/// A minimum (or exact, or maximum) macOS version, e.g. `>= big_sur`.
///
/// # Examples
///
/// ```
/// use casket::manifest::depends_on::{MacosRelease, MacosRequirement};
///
/// let requirement = MacosRequirement::try_from(">= :big_sur").expect("valid requirement");
/// assert!(requirement.is_satisfied_by(MacosRelease::new(14, 5)));
/// assert!(!requirement.is_satisfied_by(MacosRelease::new(10, 15)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct MacosRequirement {
    comparator: Comparator,
    release: MacosRelease,
}

impl MacosRequirement {
    /// Return true when `host` meets this requirement.
    ///
    /// Every comparator looks at major versions only for releases from
    /// macOS 11 onwards, where the major number names the release, so
    /// 11.4 is both `<= big_sur` and `== big_sur`.
    #[must_use]
    pub fn is_satisfied_by(&self, host: MacosRelease) -> bool {
        let ordering = if self.release.major >= 11 {
            host.major.cmp(&self.release.major)
        } else {
            host.cmp(&self.release)
        };
        self.comparator.accepts(ordering)
    }
}

impl TryFrom<&str> for MacosRequirement {
    type Error = ManifestError;

    fn try_from(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let (comparator, rest) = [
            (">=", Comparator::AtLeast),
            ("<=", Comparator::AtMost),
            ("==", Comparator::Exactly),
            (">", Comparator::Above),
            ("<", Comparator::Below),
        ]
        .iter()
        .find_map(|(symbol, comparator)| {
            trimmed
                .strip_prefix(symbol)
                .map(|rest| (*comparator, rest))
        })
        .unwrap_or((Comparator::Exactly, trimmed));

        let release = MacosRelease::parse(rest).map_err(|_| ManifestError::InvalidMacosRequirement {
            value: value.to_owned(),
            reason: "expected a comparator followed by a release, e.g. \">= big_sur\"".to_owned(),
        })?;
        Ok(Self {
            comparator,
            release,
        })
    }
}

impl TryFrom<String> for MacosRequirement {
    type Error = ManifestError;

    fn try_from(value: String) -> Result<Self> {
        Self::try_from(value.as_str())
    }
}

impl fmt::Display for MacosRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "macOS {} {}", self.comparator.symbol(), self.release)
    }
}

/// The `[depends_on]` table: platform predicates that must all hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependsOn {
    #[serde(default, deserialize_with = "one_or_many::deserialize")]
    arch: Vec<Arch>,
    #[serde(default)]
    macos: Option<MacosRequirement>,
}

impl DependsOn {
    /// Architectures the bundle supports; empty means any.
    #[must_use]
    pub fn arch(&self) -> &[Arch] {
        &self.arch
    }

    /// The macOS version requirement, if any.
    #[must_use]
    pub fn macos(&self) -> Option<&MacosRequirement> {
        self.macos.as_ref()
    }

    /// Return true when no constraint is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arch.is_empty() && self.macos.is_none()
    }
}
