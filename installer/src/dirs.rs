//! Platform directory lookup.
//!
//! Wraps `directories-next` behind [`BaseDirs`] so configuration resolution
//! can be tested without touching the real home directory.

use std::path::PathBuf;

/// Locations casket reads from and writes to by default.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// The user's home directory, used to expand `~` in zap paths.
    fn home_dir(&self) -> Option<PathBuf>;

    /// Directory holding `config.toml`.
    fn config_dir(&self) -> Option<PathBuf>;

    /// Directory holding the Caskroom (receipts and locks).
    fn data_dir(&self) -> Option<PathBuf>;

    /// Directory holding downloaded artifacts.
    fn cache_dir(&self) -> Option<PathBuf>;
}

/// [`BaseDirs`] backed by the operating system's conventions.
///
/// # Examples
///
/// ```no_run
/// use casket::dirs::{BaseDirs, SystemBaseDirs};
///
/// let dirs = SystemBaseDirs::new().expect("failed to initialise directories");
/// println!("{:?}", dirs.cache_dir());
/// ```
#[derive(Debug, Clone)]
pub struct SystemBaseDirs {
    base: directories_next::BaseDirs,
    project: Option<directories_next::ProjectDirs>,
}

impl SystemBaseDirs {
    /// Looks up the platform directories; `None` when no home directory exists.
    #[must_use]
    pub fn new() -> Option<Self> {
        let base = directories_next::BaseDirs::new()?;
        let project = directories_next::ProjectDirs::from("", "", "casket");
        Some(Self { base, project })
    }
}

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        Some(self.base.home_dir().to_path_buf())
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.project
            .as_ref()
            .map(|project| project.config_dir().to_path_buf())
    }

    fn data_dir(&self) -> Option<PathBuf> {
        self.project
            .as_ref()
            .map(|project| project.data_dir().to_path_buf())
    }

    fn cache_dir(&self) -> Option<PathBuf> {
        self.project
            .as_ref()
            .map(|project| project.cache_dir().to_path_buf())
    }
}
