//! The post-install command (`[postflight]`).
//!
//! The command is a fixed program path with a literal argument list. The only
//! substitutions are `{appdir}` and `{token}`, so nothing user-supplied ever
//! reaches a shell.

use super::error::{ManifestError, Result};
use super::template::{self, TemplateVars};
use serde::Deserialize;
use std::fmt;

/// Placeholders post-install arguments may use.
pub const COMMAND_PLACEHOLDERS: &[&str] = &["appdir", "token"];

/// A single program invocation run after the bundles are installed.
///
/// # Examples
///
/// ```
/// use casket::manifest::command::PostInstallCommand;
/// use casket::manifest::template::TemplateVars;
///
/// let command: PostInstallCommand = toml::from_str(r#"
///     command = "/usr/bin/xattr"
///     args = ["-d", "com.apple.quarantine", "{appdir}/FreeTube.app"]
/// "#).expect("valid command");
///
/// let vars = TemplateVars {
///     appdir: Some("/Applications".to_owned()),
///     ..TemplateVars::default()
/// };
/// let args = command.resolve_args(&vars).expect("resolves");
/// assert_eq!(args[2], "/Applications/FreeTube.app");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawPostInstallCommand")]
pub struct PostInstallCommand {
    command: String,
    args: Vec<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPostInstallCommand {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    message: Option<String>,
}

impl PostInstallCommand {
    /// Absolute path of the program to run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.command
    }

    /// Unresolved argument templates.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Progress message shown before the command runs.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Substitute `{appdir}` and `{token}` into every argument.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidTemplate`] if a needed value is unset.
    pub fn resolve_args(&self, vars: &TemplateVars) -> Result<Vec<String>> {
        self.args
            .iter()
            .map(|arg| template::expand(arg, vars))
            .collect()
    }
}

impl TryFrom<RawPostInstallCommand> for PostInstallCommand {
    type Error = ManifestError;

    fn try_from(raw: RawPostInstallCommand) -> Result<Self> {
        if !raw.command.starts_with('/') {
            return Err(ManifestError::InvalidCommand {
                reason: format!("command must be an absolute path, got \"{}\"", raw.command),
            });
        }
        if raw.command.contains(['{', '}']) {
            return Err(ManifestError::InvalidCommand {
                reason: "command path must not contain placeholders".to_owned(),
            });
        }
        for arg in &raw.args {
            template::validate(arg, COMMAND_PLACEHOLDERS).map_err(|e| {
                ManifestError::InvalidCommand {
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(Self {
            command: raw.command,
            args: raw.args,
            message: raw.message,
        })
    }
}

impl fmt::Display for PostInstallCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)?;
        for arg in &self.args {
            write!(f, " {arg:?}")?;
        }
        Ok(())
    }
}
