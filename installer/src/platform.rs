//! Host platform detection and `depends_on` checks.
//!
//! The check runs before any network or filesystem activity, so a package
//! that cannot run here is rejected without downloading anything.

use crate::error::{InstallerError, Result};
use crate::exec::CommandExecutor;
use crate::manifest::PackageManifest;
use crate::manifest::depends_on::{Arch, MacosRelease};
use std::fmt;

/// The machine casket is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostPlatform {
    arch: Option<Arch>,
    macos: Option<MacosRelease>,
}

impl HostPlatform {
    /// Describes a host explicitly; `macos` is `None` off macOS.
    #[must_use]
    pub const fn new(arch: Option<Arch>, macos: Option<MacosRelease>) -> Self {
        Self { arch, macos }
    }

    /// Detects the running host.
    ///
    /// The architecture comes from the compile target; the macOS release
    /// from `sw_vers -productVersion`. Detection failures leave the
    /// corresponding field empty, which fails any predicate that needs it.
    #[must_use]
    pub fn detect(executor: &dyn CommandExecutor) -> Self {
        let arch = Arch::from_target_arch(std::env::consts::ARCH);
        let macos = if std::env::consts::OS == "macos" {
            detect_macos_release(executor)
        } else {
            None
        };
        log::debug!("detected host {arch:?} {macos:?}");
        Self { arch, macos }
    }

    /// Host CPU architecture, when it is one bundles are built for.
    #[must_use]
    pub const fn arch(&self) -> Option<Arch> {
        self.arch
    }

    /// Host macOS release, when running on macOS.
    #[must_use]
    pub const fn macos(&self) -> Option<MacosRelease> {
        self.macos
    }

    /// Checks `manifest`'s `depends_on` predicates against this host.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::UnsupportedPlatform`] naming the first
    /// predicate that fails.
    pub fn check(&self, manifest: &PackageManifest) -> Result<()> {
        let depends_on = manifest.depends_on();
        let unsupported = |reason: String| InstallerError::UnsupportedPlatform {
            token: manifest.token().clone(),
            reason,
        };

        let wanted = depends_on.arch();
        if !wanted.is_empty() && !self.arch.is_some_and(|arch| wanted.contains(&arch)) {
            let wanted = wanted
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(unsupported(format!(
                "requires {wanted}; host is {}",
                describe(self.arch)
            )));
        }

        if let Some(requirement) = depends_on.macos() {
            match self.macos {
                Some(host) if requirement.is_satisfied_by(host) => {}
                Some(host) => {
                    return Err(unsupported(format!(
                        "requires {requirement}; host is macOS {host}"
                    )));
                }
                None => {
                    return Err(unsupported(format!(
                        "requires {requirement}; host is not macOS"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.macos {
            Some(release) => write!(f, "macOS {release} on {}", describe(self.arch)),
            None => write!(f, "{} on {}", std::env::consts::OS, describe(self.arch)),
        }
    }
}

fn describe(arch: Option<Arch>) -> String {
    arch.map_or_else(|| std::env::consts::ARCH.to_owned(), |arch| arch.to_string())
}

fn detect_macos_release(executor: &dyn CommandExecutor) -> Option<MacosRelease> {
    let output = executor
        .run("/usr/bin/sw_vers", &["-productVersion"])
        .ok()
        .filter(|output| output.status.success())?;
    let text = String::from_utf8_lossy(&output.stdout);
    MacosRelease::parse(text.trim()).ok()
}
