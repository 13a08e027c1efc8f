//! Upstream version detection rule (`[livecheck]`).

use super::error::{ManifestError, Result};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::fmt;

/// Where the livecheck page is fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LivecheckSource {
    /// `:url` - the manifest's resolved download URL.
    DownloadUrl,
    /// `:homepage` - the manifest's homepage.
    Homepage,
    /// A literal URL.
    Url(String),
}

impl fmt::Display for LivecheckSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DownloadUrl => f.write_str(":url"),
            Self::Homepage => f.write_str(":homepage"),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// A validated livecheck rule: a page to fetch and a pattern whose first
/// capture group is the upstream version.
///
/// Patterns are matched case-insensitively with `^` and `$` anchoring at line
/// boundaries.
///
/// # Examples
///
/// ```
/// use casket::manifest::livecheck_rule::{LivecheckRule, LivecheckSource};
///
/// let rule: LivecheckRule = toml::from_str(r#"
///     url = ":url"
///     regex = '^v?(\d+(?:\.\d+)+)'
/// "#).expect("valid rule");
/// assert_eq!(rule.source(), &LivecheckSource::DownloadUrl);
/// assert!(rule.skip_reason().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawLivecheckRule")]
pub struct LivecheckRule {
    source: LivecheckSource,
    pattern: Option<String>,
    skip: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLivecheckRule {
    url: Option<String>,
    regex: Option<String>,
    skip: Option<String>,
}

impl LivecheckRule {
    /// Where to fetch the version page from.
    #[must_use]
    pub fn source(&self) -> &LivecheckSource {
        &self.source
    }

    /// The raw pattern, absent only for skipped rules.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Why livecheck is disabled, if it is.
    #[must_use]
    pub fn skip_reason(&self) -> Option<&str> {
        self.skip.as_deref()
    }

    /// Compile the pattern with livecheck matching flags.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidLivecheck`] when the rule is skipped or
    /// the pattern does not compile.
    pub fn compile(&self) -> Result<Regex> {
        let pattern = self
            .pattern
            .as_deref()
            .ok_or_else(|| ManifestError::InvalidLivecheck {
                reason: "rule has no regex".to_owned(),
            })?;
        compile_pattern(pattern)
    }
}

impl TryFrom<RawLivecheckRule> for LivecheckRule {
    type Error = ManifestError;

    fn try_from(raw: RawLivecheckRule) -> Result<Self> {
        let source = match raw.url.as_deref() {
            None | Some(":url") => LivecheckSource::DownloadUrl,
            Some(":homepage") => LivecheckSource::Homepage,
            Some(url) if url.starts_with("https://") || url.starts_with("http://") => {
                LivecheckSource::Url(url.to_owned())
            }
            Some(other) => {
                return Err(ManifestError::InvalidLivecheck {
                    reason: format!("url must be :url, :homepage, or http(s), got \"{other}\""),
                });
            }
        };

        if raw.skip.is_none() {
            let pattern = raw
                .regex
                .as_deref()
                .ok_or_else(|| ManifestError::InvalidLivecheck {
                    reason: "regex is required unless skip is set".to_owned(),
                })?;
            compile_pattern(pattern)?;
        }

        Ok(Self {
            source,
            pattern: raw.regex,
            skip: raw.skip,
        })
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .map_err(|e| ManifestError::InvalidLivecheck {
            reason: e.to_string(),
        })
}
