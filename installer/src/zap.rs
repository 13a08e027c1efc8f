//! Removal of the user data a package leaves behind.
//!
//! Zap paths are glob patterns; `~/` is rooted at the user's home
//! directory. Paths that match nothing are skipped without comment, and the
//! home directory and filesystem root are never removed even if a pattern
//! matches them.

use crate::error::Warning;
use crate::manifest::uninstall_rule::ZapPath;
use crate::stager::remove_path;
use camino::{Utf8Path, Utf8PathBuf};

/// What a zap pass removed and what it could not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZapReport {
    /// Paths that were deleted.
    pub removed: Vec<Utf8PathBuf>,
    /// Problems encountered along the way.
    pub warnings: Vec<Warning>,
}

impl ZapReport {
    fn merge(&mut self, other: Self) {
        self.removed.extend(other.removed);
        self.warnings.extend(other.warnings);
    }
}

/// Builds the glob pattern for `path`, escaping the home directory so its
/// own characters are matched literally.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use casket::manifest::uninstall_rule::ZapPath;
/// use casket::zap::glob_pattern;
///
/// let path = ZapPath::try_from("~/Library/Preferences/io.example.*.plist")
///     .expect("valid zap path");
/// assert_eq!(
///     glob_pattern(&path, Utf8Path::new("/Users/[me]")),
///     "/Users/[[]me[]]/Library/Preferences/io.example.*.plist"
/// );
/// ```
#[must_use]
pub fn glob_pattern(path: &ZapPath, home: &Utf8Path) -> String {
    match path.as_str().strip_prefix("~/") {
        Some(rest) => format!(
            "{}/{rest}",
            glob::Pattern::escape(home.as_str().trim_end_matches('/'))
        ),
        None => path.as_str().to_owned(),
    }
}

/// Existing paths matching `path`, in sorted order.
fn matches(path: &ZapPath, home: &Utf8Path) -> Result<Vec<Utf8PathBuf>, Warning> {
    let pattern = glob_pattern(path, home);
    let entries = glob::glob(&pattern).map_err(|e| Warning::RemoveFailed {
        path: Utf8PathBuf::from(&pattern),
        reason: e.to_string(),
    })?;

    let mut found = Vec::new();
    for entry in entries {
        match entry {
            Ok(found_path) => match Utf8PathBuf::try_from(found_path) {
                Ok(utf8) => found.push(utf8),
                Err(e) => log::debug!("skipping non-UTF-8 path {}", e.as_path().display()),
            },
            Err(e) => log::debug!("skipping unreadable match: {e}"),
        }
    }
    Ok(found)
}

/// Whether `path` must never be removed.
#[must_use]
pub fn is_protected(path: &Utf8Path, home: &Utf8Path) -> bool {
    let trimmed = Utf8Path::new(path.as_str().trim_end_matches('/'));
    trimmed.as_str().is_empty() || trimmed.parent().is_none() || trimmed == home
}

/// Removes everything matching each pattern in `paths`.
#[must_use]
pub fn trash(paths: &[ZapPath], home: &Utf8Path) -> ZapReport {
    let mut report = ZapReport::default();
    for path in paths {
        report.merge(remove_matches(path, home, false));
    }
    report
}

/// Removes each matching directory that is empty.
#[must_use]
pub fn rmdir(paths: &[ZapPath], home: &Utf8Path) -> ZapReport {
    let mut report = ZapReport::default();
    for path in paths {
        report.merge(remove_matches(path, home, true));
    }
    report
}

fn remove_matches(path: &ZapPath, home: &Utf8Path, only_empty_dirs: bool) -> ZapReport {
    let mut report = ZapReport::default();
    let found = match matches(path, home) {
        Ok(found) => found,
        Err(warning) => {
            report.warnings.push(warning);
            return report;
        }
    };
    if found.is_empty() {
        log::debug!("nothing matches {path}");
    }

    for target in found {
        if is_protected(&target, home) {
            log::warn!("refusing to remove {target}");
            continue;
        }
        let removed = if only_empty_dirs {
            remove_if_empty_dir(&target)
        } else {
            remove_path(target.as_std_path()).map(|()| true)
        };
        match removed {
            Ok(true) => {
                log::info!("removed {target}");
                report.removed.push(target);
            }
            Ok(false) => log::debug!("keeping non-empty {target}"),
            Err(e) => report.warnings.push(Warning::RemoveFailed {
                path: target,
                reason: e.to_string(),
            }),
        }
    }
    report
}

fn remove_if_empty_dir(path: &Utf8Path) -> std::io::Result<bool> {
    let metadata = std::fs::symlink_metadata(path)?;
    if !metadata.is_dir() || std::fs::read_dir(path)?.next().is_some() {
        return Ok(false);
    }
    std::fs::remove_dir(path)?;
    Ok(true)
}
