//! Translating a manifest into the ordered steps of an action.
//!
//! Plans are plain data: the interpreter walks them in order, and
//! `--dry-run` prints them instead.

use crate::artefact::cache::DownloadCache;
use crate::artefact::extraction::ContainerKind;
use crate::context::InstallContext;
use crate::error::Result;
use crate::manifest::PackageManifest;
use crate::manifest::artifact::AppArtifact;
use crate::manifest::checksum::Sha256Digest;
use crate::manifest::token::Token;
use crate::manifest::uninstall_rule::{BundleId, ZapPath};
use camino::Utf8PathBuf;
use std::fmt;

/// One unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Check `depends_on` against the host.
    CheckPlatform,
    /// Fail if any of these packages is installed.
    CheckConflicts {
        /// Conflicting tokens.
        tokens: Vec<Token>,
    },
    /// Download the artifact, or reuse a cached copy.
    Fetch {
        /// Resolved download URL.
        url: String,
        /// Cache location.
        destination: Utf8PathBuf,
    },
    /// Compare the artifact's digest with the manifest.
    Verify {
        /// Expected digest.
        sha256: Sha256Digest,
    },
    /// Unpack the container and check every bundle is present.
    Extract {
        /// Container format.
        kind: ContainerKind,
    },
    /// Copy one bundle into the applications directory.
    InstallArtifact {
        /// The bundle.
        app: AppArtifact,
        /// Where it ends up.
        destination: Utf8PathBuf,
    },
    /// Run the post-install command.
    RunCommand {
        /// Heading shown before running.
        message: Option<String>,
        /// Absolute path of the program.
        program: String,
        /// Arguments with placeholders resolved.
        args: Vec<String>,
    },
    /// Write the receipt.
    RecordReceipt {
        /// Receipt location.
        path: Utf8PathBuf,
    },
    /// Display the caveats.
    ShowCaveats {
        /// Rendered text.
        text: String,
    },
    /// Ask a running application to quit.
    QuitApplication {
        /// Its bundle identifier.
        bundle_id: BundleId,
    },
    /// Remove an installed bundle.
    RemoveArtifact {
        /// Installed path.
        path: Utf8PathBuf,
    },
    /// Remove the receipt.
    RemoveReceipt {
        /// Receipt location.
        path: Utf8PathBuf,
    },
    /// Remove everything matching a zap pattern.
    Trash {
        /// The pattern.
        path: ZapPath,
    },
    /// Remove matching directories that are empty.
    RemoveEmptyDir {
        /// The pattern.
        path: ZapPath,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CheckPlatform => f.write_str("check platform requirements"),
            Self::CheckConflicts { tokens } => {
                let tokens = tokens
                    .iter()
                    .map(Token::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "check that {tokens} is not installed")
            }
            Self::Fetch { url, destination } => write!(f, "download {url} to {destination}"),
            Self::Verify { sha256 } => write!(f, "verify SHA-256 {sha256}"),
            Self::Extract { kind } => write!(f, "extract {kind} container"),
            Self::InstallArtifact { app, destination } => {
                write!(f, "install {} to {destination}", app.source())
            }
            Self::RunCommand { program, args, .. } => {
                write!(f, "run {program}")?;
                for arg in args {
                    write!(f, " {arg:?}")?;
                }
                Ok(())
            }
            Self::RecordReceipt { path } => write!(f, "record receipt {path}"),
            Self::ShowCaveats { .. } => f.write_str("show caveats"),
            Self::QuitApplication { bundle_id } => write!(f, "quit {bundle_id}"),
            Self::RemoveArtifact { path } => write!(f, "remove {path}"),
            Self::RemoveReceipt { path } => write!(f, "remove receipt {path}"),
            Self::Trash { path } => write!(f, "remove {path}"),
            Self::RemoveEmptyDir { path } => write!(f, "remove {path} if empty"),
        }
    }
}

/// Ordered steps for one action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    /// The steps, in execution order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    fn push(&mut self, step: Step) {
        self.steps.push(step);
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, step) in self.steps.iter().enumerate() {
            writeln!(f, "{:>2}. {step}", index + 1)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Steps to install `manifest`.
///
/// # Errors
///
/// Fails when the URL or post-install arguments cannot be resolved, or the
/// URL does not name a supported container.
pub fn install_plan(manifest: &PackageManifest, context: &InstallContext) -> Result<Plan> {
    let mut plan = Plan::default();
    plan.push(Step::CheckPlatform);
    if !manifest.conflicts_with().is_empty() {
        plan.push(Step::CheckConflicts {
            tokens: manifest.conflicts_with().to_vec(),
        });
    }

    let url = manifest.download_url()?;
    let kind = DownloadCache::container_kind(&url)?;
    plan.push(Step::Fetch {
        destination: context.cache().path_for(manifest, kind),
        url,
    });
    plan.push(Step::Verify {
        sha256: manifest.sha256().clone(),
    });
    plan.push(Step::Extract { kind });

    let stager = context.stager();
    for app in manifest.apps() {
        plan.push(Step::InstallArtifact {
            app: app.clone(),
            destination: stager.target_path(app),
        });
    }

    if let Some(command) = manifest.postflight() {
        let vars = context.template_vars(manifest);
        plan.push(Step::RunCommand {
            message: command
                .message()
                .map(|message| crate::manifest::template::expand_lenient(message, &vars)),
            program: command.program().to_owned(),
            args: command.resolve_args(&vars)?,
        });
    }

    plan.push(Step::RecordReceipt {
        path: context.receipts().path_for(manifest.token()),
    });
    if let Some(text) = manifest.rendered_caveats() {
        plan.push(Step::ShowCaveats { text });
    }
    Ok(plan)
}

/// Steps to uninstall `manifest`.
///
/// Bundle paths come from the receipt when there is one, so a package
/// installed under a different applications directory is still found.
///
/// # Errors
///
/// Fails when an existing receipt cannot be read.
pub fn uninstall_plan(manifest: &PackageManifest, context: &InstallContext) -> Result<Plan> {
    let mut plan = Plan::default();
    for bundle_id in manifest.uninstall().quit() {
        plan.push(Step::QuitApplication {
            bundle_id: bundle_id.clone(),
        });
    }

    let receipts = context.receipts();
    let stager = context.stager();
    let paths = match receipts.load(manifest.token())? {
        Some(receipt) if !receipt.artifacts.is_empty() => receipt.artifacts,
        _ => manifest
            .apps()
            .iter()
            .map(|app| stager.target_path(app))
            .collect(),
    };
    for path in paths {
        plan.push(Step::RemoveArtifact { path });
    }

    plan.push(Step::RemoveReceipt {
        path: receipts.path_for(manifest.token()),
    });
    Ok(plan)
}

/// Steps to zap `manifest`: uninstall, then remove its user data.
///
/// # Errors
///
/// Fails when an existing receipt cannot be read.
pub fn zap_plan(manifest: &PackageManifest, context: &InstallContext) -> Result<Plan> {
    let mut plan = uninstall_plan(manifest, context)?;
    for path in manifest.zap().trash() {
        plan.push(Step::Trash { path: path.clone() });
    }
    for path in manifest.zap().rmdir() {
        plan.push(Step::RemoveEmptyDir { path: path.clone() });
    }
    Ok(plan)
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
