//! Upstream version detection.
//!
//! Fetches the page named by a manifest's `[livecheck]` rule and extracts
//! the newest version with its pattern. A `:url` rule on a GitHub release
//! asset reads the repository's tags instead of the asset itself. Nothing on
//! disk is touched.

use crate::artefact::download::ArtefactDownloader;
use crate::artefact::extraction::ContainerKind;
use crate::error::{InstallerError, Result};
use crate::manifest::PackageManifest;
use crate::manifest::livecheck_rule::LivecheckSource;
use crate::manifest::token::Token;
use crate::manifest::url_template::url_file_name;
use crate::manifest::version::{Version, compare_loose};
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// What a livecheck rule reads candidate versions from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LivecheckTarget {
    /// A page whose first pattern match is the version.
    Page(String),
    /// The tags of a git repository; the highest matching tag wins.
    GitTags {
        /// Repository URL without the `.git` suffix.
        repository: String,
    },
}

impl LivecheckTarget {
    /// The URL actually requested.
    #[must_use]
    pub fn fetch_url(&self) -> String {
        match self {
            Self::Page(url) => url.clone(),
            Self::GitTags { repository } => {
                format!("{repository}.git/info/refs?service=git-upload-pack")
            }
        }
    }
}

impl fmt::Display for LivecheckTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(url) => f.write_str(url),
            Self::GitTags { repository } => write!(f, "tags of {repository}"),
        }
    }
}

/// Returns the repository behind a GitHub release asset URL.
///
/// # Examples
///
/// ```
/// use casket::livecheck::github_repository;
///
/// assert_eq!(
///     github_repository("https://github.com/owner/app/releases/download/v1.0/app.dmg")
///         .as_deref(),
///     Some("https://github.com/owner/app")
/// );
/// assert_eq!(github_repository("https://example.com/app.dmg"), None);
/// ```
#[must_use]
pub fn github_repository(url: &str) -> Option<String> {
    let rest = url.strip_prefix("https://github.com/")?;
    let mut parts = rest.split('/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), Some("releases"), Some("download"))
            if !owner.is_empty() && !repo.is_empty() =>
        {
            Some(format!("https://github.com/{owner}/{repo}"))
        }
        _ => None,
    }
}

/// Extracts tag names from a git ref advertisement.
///
/// Accepts both the smart protocol's pkt-line listing and the plain
/// `<sha>\t<ref>` form. Peeled entries (`^{}`) collapse onto their tag.
#[must_use]
pub fn tag_names(advertisement: &str) -> BTreeSet<String> {
    advertisement
        .split(['\n', '\0'])
        .filter_map(|line| {
            let (_, tail) = line.split_once("refs/tags/")?;
            let name = tail.split_whitespace().next()?;
            let name = name.strip_suffix("^{}").unwrap_or(name);
            (!name.is_empty()).then(|| name.to_owned())
        })
        .collect()
}

/// Returns the highest version `pattern` extracts from any of `tags`.
#[must_use]
pub fn latest_tag_version<'t>(
    tags: impl IntoIterator<Item = &'t String>,
    pattern: &Regex,
) -> Option<String> {
    tags.into_iter()
        .filter_map(|tag| find_version(tag, pattern))
        .max_by(|a, b| compare_loose(a, b))
}

/// Returns the version found by `pattern` in `body`.
///
/// The first match wins; its first capture group is the version, or the
/// whole match when the pattern has no groups.
///
/// # Examples
///
/// ```
/// use casket::livecheck::find_version;
/// use regex::RegexBuilder;
///
/// let pattern = RegexBuilder::new(r"^v?(\d+(?:\.\d+)+)")
///     .case_insensitive(true)
///     .multi_line(true)
///     .build()
///     .expect("valid pattern");
/// assert_eq!(
///     find_version("v2.3.10 release notes", &pattern).as_deref(),
///     Some("2.3.10")
/// );
/// ```
#[must_use]
pub fn find_version(body: &str, pattern: &Regex) -> Option<String> {
    let captures = pattern.captures(body)?;
    captures
        .get(1)
        .or_else(|| captures.get(0))
        .map(|found| found.as_str().trim().to_owned())
        .filter(|version| !version.is_empty())
}

/// Result of checking one manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LivecheckReport {
    /// The package checked.
    pub token: Token,
    /// The version the manifest installs.
    pub current: Version,
    /// The newest upstream version, unless the check was skipped.
    pub latest: Option<String>,
    /// Why the check was skipped, when it was.
    pub skipped: Option<String>,
}

impl LivecheckReport {
    /// Whether upstream has a newer version than the manifest.
    #[must_use]
    pub fn is_outdated(&self) -> bool {
        self.latest
            .as_deref()
            .is_some_and(|latest| compare_loose(self.current.as_str(), latest) == Ordering::Less)
    }
}

impl fmt::Display for LivecheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.latest, &self.skipped) {
            (_, Some(reason)) => write!(f, "{}: skipped ({reason})", self.token),
            (Some(latest), None) if self.is_outdated() => {
                write!(f, "{}: {} ==> {latest} (outdated)", self.token, self.current)
            }
            (Some(latest), None) => write!(f, "{}: {} ==> {latest}", self.token, self.current),
            (None, None) => write!(f, "{}: {}", self.token, self.current),
        }
    }
}

/// Runs the livecheck rule of `manifest`.
///
/// # Errors
///
/// Returns [`InstallerError::Livecheck`] when the manifest has no rule, the
/// page cannot be fetched, or the pattern matches nothing.
pub fn check(manifest: &PackageManifest, downloader: &dyn ArtefactDownloader) -> Result<LivecheckReport> {
    let failed = |reason: String| InstallerError::Livecheck {
        token: manifest.token().clone(),
        reason,
    };
    let rule = manifest
        .livecheck()
        .ok_or_else(|| failed("manifest has no [livecheck] rule".to_owned()))?;

    let mut report = LivecheckReport {
        token: manifest.token().clone(),
        current: manifest.version().clone(),
        latest: None,
        skipped: None,
    };
    if let Some(reason) = rule.skip_reason() {
        report.skipped = Some(reason.to_owned());
        return Ok(report);
    }

    let target = resolve_target(manifest, rule.source()).map_err(&failed)?;
    let pattern = rule.compile()?;

    let url = target.fetch_url();
    log::debug!("livecheck for {} fetching {url}", manifest.token());
    let body = downloader
        .fetch_text(&url)
        .map_err(|e| failed(e.to_string()))?;
    let latest = match &target {
        LivecheckTarget::Page(_) => find_version(&body, &pattern),
        LivecheckTarget::GitTags { .. } => {
            let tags = tag_names(&body);
            log::trace!("{} tags found at {target}", tags.len());
            latest_tag_version(&tags, &pattern)
        }
    };
    let latest =
        latest.ok_or_else(|| failed(format!("pattern {pattern} matched nothing in {target}")))?;
    report.latest = Some(latest);
    Ok(report)
}

/// Decides what a rule with `source` reads for `manifest`.
///
/// # Errors
///
/// Returns a reason when the source cannot be resolved, including a `:url`
/// that names a binary container outside GitHub releases.
pub fn resolve_target(
    manifest: &PackageManifest,
    source: &LivecheckSource,
) -> std::result::Result<LivecheckTarget, String> {
    match source {
        LivecheckSource::DownloadUrl => {
            let url = manifest.download_url().map_err(|e| e.to_string())?;
            if let Some(repository) = github_repository(&url) {
                return Ok(LivecheckTarget::GitTags { repository });
            }
            let name = url_file_name(&url).unwrap_or(url.as_str());
            if ContainerKind::from_file_name(name).is_some() {
                return Err(format!(
                    "livecheck :url resolves to the binary download {url}; point it at a page"
                ));
            }
            Ok(LivecheckTarget::Page(url))
        }
        LivecheckSource::Homepage => manifest
            .homepage()
            .map(|url| LivecheckTarget::Page(url.to_owned()))
            .ok_or_else(|| "livecheck uses :homepage but no homepage is set".to_owned()),
        LivecheckSource::Url(url) => Ok(LivecheckTarget::Page(url.clone())),
    }
}
