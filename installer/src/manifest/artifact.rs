//! Application bundles copied into the applications directory (`app`).

use super::error::{ManifestError, Result};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fmt;

/// One bundle to install: where it lives inside the extracted container and
/// the name it receives in the applications directory.
///
/// Written either as a bare name (`"FreeTube.app"`) or as a table
/// (`{ source = "dist/FreeTube.app", target = "FreeTube Beta.app" }`).
///
/// # Examples
///
/// ```
/// use casket::manifest::artifact::AppArtifact;
///
/// let app = AppArtifact::new("FreeTube.app", None).expect("valid artifact");
/// assert_eq!(app.source().as_str(), "FreeTube.app");
/// assert_eq!(app.target(), "FreeTube.app");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawAppArtifact")]
pub struct AppArtifact {
    source: Utf8PathBuf,
    target: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAppArtifact {
    Name(String),
    Table {
        source: String,
        target: Option<String>,
    },
}

impl AppArtifact {
    /// Validate and build an artifact entry.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidArtifact`] when `source` is empty,
    /// absolute, or contains `..`, or when `target` is not a plain file name.
    pub fn new(source: &str, target: Option<&str>) -> Result<Self> {
        let source_path = Utf8PathBuf::from(source);
        validate_relative(&source_path, source)?;

        let target = match target {
            Some(name) => name.to_owned(),
            None => source_path
                .file_name()
                .map(str::to_owned)
                .ok_or_else(|| invalid(source, "source has no file name"))?,
        };
        let mut components = Utf8Path::new(&target).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Utf8Component::Normal(_)), None)
        );
        if !single_normal {
            return Err(invalid(&target, "target must be a single file name"));
        }

        Ok(Self {
            source: source_path,
            target,
        })
    }

    /// Path of the bundle relative to the extracted container root.
    #[must_use]
    pub fn source(&self) -> &Utf8Path {
        &self.source
    }

    /// File name of the bundle inside the applications directory.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl TryFrom<RawAppArtifact> for AppArtifact {
    type Error = ManifestError;

    fn try_from(raw: RawAppArtifact) -> Result<Self> {
        match raw {
            RawAppArtifact::Name(name) => Self::new(&name, None),
            RawAppArtifact::Table { source, target } => Self::new(&source, target.as_deref()),
        }
    }
}

impl fmt::Display for AppArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.source.as_str() == self.target {
            write!(f, "{}", self.target)
        } else {
            write!(f, "{} -> {}", self.source, self.target)
        }
    }
}

fn validate_relative(path: &Utf8Path, raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(invalid(raw, "path must not be empty"));
    }
    if path.is_absolute() {
        return Err(invalid(raw, "path must be relative to the container root"));
    }
    if path
        .components()
        .any(|c| !matches!(c, Utf8Component::Normal(_) | Utf8Component::CurDir))
    {
        return Err(invalid(raw, "path must not leave the container root"));
    }
    Ok(())
}

fn invalid(value: &str, reason: &str) -> ManifestError {
    ManifestError::InvalidArtifact {
        value: value.to_owned(),
        reason: reason.to_owned(),
    }
}
