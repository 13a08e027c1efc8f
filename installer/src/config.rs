//! Configuration loading and settings resolution.
//!
//! Settings come from, in order of precedence: command-line flags, the
//! `CASKET_APPDIR` environment variable, `config.toml`, and built-in
//! defaults.

use crate::dirs::BaseDirs;
use crate::error::{InstallerError, Result};
use crate::exec::DEFAULT_COMMAND_TIMEOUT;
use crate::artefact::download::DEFAULT_DOWNLOAD_TIMEOUT;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the applications directory.
pub const APPDIR_ENV: &str = "CASKET_APPDIR";

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Where application bundles are installed.
    pub appdir: Option<Utf8PathBuf>,
    /// Where receipts and locks are kept.
    pub caskroom: Option<Utf8PathBuf>,
    /// Where downloads are cached.
    pub cache_dir: Option<Utf8PathBuf>,
    /// Whole-request download time limit in seconds.
    pub download_timeout_secs: Option<u64>,
    /// Time limit for external commands in seconds.
    pub command_timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] for malformed TOML or unknown keys.
    pub fn parse(text: &str, origin: &Utf8Path) -> Result<Self> {
        toml::from_str(text).map_err(|err| InstallerError::Config {
            path: origin.to_string(),
            reason: err.message().to_owned(),
        })
    }

    /// Loads configuration from `path`.
    ///
    /// A missing file yields the defaults unless `required` is set, which is
    /// the case when the path was given explicitly with `--config`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] when the file cannot be read or
    /// parsed.
    pub fn load(path: &Utf8Path, required: bool) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                log::debug!("loaded configuration from {path}");
                Self::parse(&text, path)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
                log::trace!("no configuration at {path}; using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(InstallerError::Config {
                path: path.to_string(),
                reason: err.to_string(),
            }),
        }
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// `--appdir`.
    pub appdir: Option<Utf8PathBuf>,
    /// `--config`.
    pub config_path: Option<Utf8PathBuf>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Where application bundles are installed.
    pub appdir: Utf8PathBuf,
    /// The user's home directory.
    pub home: Utf8PathBuf,
    /// Where receipts and locks are kept.
    pub caskroom: Utf8PathBuf,
    /// Where downloads are cached.
    pub cache_dir: Utf8PathBuf,
    /// Whole-request download time limit.
    pub download_timeout: Duration,
    /// Time limit for external commands.
    pub command_timeout: Duration,
}

impl Settings {
    /// Resolves settings from flags, the environment, the config file and
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] when the config file is invalid or
    /// a required directory cannot be determined.
    pub fn resolve(overrides: &Overrides, dirs: &dyn BaseDirs) -> Result<Self> {
        let home = required_dir(dirs.home_dir(), "home directory")?;
        let config_path = match &overrides.config_path {
            Some(path) => Some((path.clone(), true)),
            None => optional_dir(dirs.config_dir())?
                .map(|dir| (dir.join(CONFIG_FILE_NAME), false)),
        };
        let file = match config_path {
            Some((path, required)) => ConfigFile::load(&path, required)?,
            None => ConfigFile::default(),
        };

        let env_appdir = std::env::var(APPDIR_ENV)
            .ok()
            .filter(|value| !value.is_empty())
            .map(Utf8PathBuf::from);
        let appdir = overrides
            .appdir
            .clone()
            .or(env_appdir)
            .or(file.appdir)
            .unwrap_or_else(|| default_appdir(&home));

        let caskroom = match file.caskroom {
            Some(path) => path,
            None => required_dir(dirs.data_dir(), "data directory")?.join("Caskroom"),
        };
        let cache_dir = match file.cache_dir {
            Some(path) => path,
            None => required_dir(dirs.cache_dir(), "cache directory")?,
        };

        Ok(Self {
            appdir,
            home,
            caskroom,
            cache_dir,
            download_timeout: file
                .download_timeout_secs
                .map_or(DEFAULT_DOWNLOAD_TIMEOUT, Duration::from_secs),
            command_timeout: file
                .command_timeout_secs
                .map_or(DEFAULT_COMMAND_TIMEOUT, Duration::from_secs),
        })
    }
}

/// `/Applications` on macOS; `~/Applications` elsewhere.
fn default_appdir(home: &Utf8Path) -> Utf8PathBuf {
    if cfg!(target_os = "macos") {
        Utf8PathBuf::from("/Applications")
    } else {
        home.join("Applications")
    }
}

fn optional_dir(dir: Option<PathBuf>) -> Result<Option<Utf8PathBuf>> {
    dir.map(|path| {
        Utf8PathBuf::try_from(path).map_err(|err| InstallerError::Config {
            path: err.as_path().display().to_string(),
            reason: "path is not valid UTF-8".to_owned(),
        })
    })
    .transpose()
}

fn required_dir(dir: Option<PathBuf>, what: &str) -> Result<Utf8PathBuf> {
    optional_dir(dir)?.ok_or_else(|| InstallerError::Config {
        path: what.to_owned(),
        reason: format!("could not determine {what}"),
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
