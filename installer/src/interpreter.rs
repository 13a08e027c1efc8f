//! Executes install, uninstall, zap and livecheck for one manifest.
//!
//! The interpreter walks a [`Plan`] step by step. Collaborators that touch
//! the outside world (HTTP, container unpacking, external programs) are
//! injected so tests can observe every call.

use crate::artefact::cache::{CachedArtifact, DownloadCache};
use crate::artefact::download::ArtefactDownloader;
use crate::artefact::extraction::ArtefactExtractor;
use crate::context::InstallContext;
use crate::error::{InstallerError, Result, Warning};
use crate::exec::{CommandExecutor, failure_reason};
use crate::livecheck::{self, LivecheckReport};
use crate::lock::TokenLock;
use crate::manifest::PackageManifest;
use crate::output::{caveats_block, write_heading, write_stderr_line};
use crate::plan::{self, Plan, Step};
use crate::receipts::Receipt;
use crate::stager::{Staged, Stager, remove_path};
use crate::uninstall::Quitter;
use crate::zap;
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;
use tempfile::TempDir;

/// What a completed action did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Bundles installed, or paths removed.
    pub paths: Vec<Utf8PathBuf>,
    /// Non-fatal problems.
    pub warnings: Vec<Warning>,
}

/// External collaborators for an action.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Fetches artifacts and livecheck pages.
    pub downloader: &'a dyn ArtefactDownloader,
    /// Unpacks containers.
    pub extractor: &'a dyn ArtefactExtractor,
    /// Runs external programs.
    pub executor: &'a dyn CommandExecutor,
}

/// Sequential executor for manifest actions.
pub struct Interpreter<'a> {
    context: &'a InstallContext,
    collaborators: Collaborators<'a>,
    quitter: Quitter<'a>,
    quiet: bool,
}

/// Values carried between install steps.
#[derive(Default)]
struct InstallState {
    artifact: Option<CachedArtifact>,
    unpacked: Option<TempDir>,
    url: String,
    prepared: bool,
    staged: Vec<Staged>,
}

impl<'a> Interpreter<'a> {
    /// Creates an interpreter acting on `context`.
    #[must_use]
    pub fn new(context: &'a InstallContext, collaborators: Collaborators<'a>) -> Self {
        Self {
            context,
            collaborators,
            quitter: Quitter::new(collaborators.executor),
            quiet: false,
        }
    }

    /// Suppresses progress headings. Warnings and caveats are still shown.
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Replaces the quitter, e.g. to shorten its wait in tests.
    #[must_use]
    pub fn with_quitter(mut self, quitter: Quitter<'a>) -> Self {
        self.quitter = quitter;
        self
    }

    /// Installs `manifest`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; see [`InstallerError`]. Nothing is
    /// written to the applications directory unless the artifact verified
    /// and every bundle was found.
    pub fn install(&self, manifest: &PackageManifest, stderr: &mut dyn Write) -> Result<Outcome> {
        let plan = plan::install_plan(manifest, self.context)?;
        let _lock = TokenLock::acquire(&self.context.caskroom, manifest.token())?;
        log::info!("installing {} {}", manifest.token(), manifest.version());

        let mut state = InstallState::default();
        let mut outcome = Outcome::default();
        let stager = self.context.stager();
        for step in &plan {
            log::trace!("step: {step}");
            let result = self.install_step(manifest, step, &stager, &mut state, &mut outcome, stderr);
            if let Err(e) = result {
                roll_back(&state.staged);
                return Err(e);
            }
        }
        Ok(outcome)
    }

    fn install_step(
        &self,
        manifest: &PackageManifest,
        step: &Step,
        stager: &Stager,
        state: &mut InstallState,
        outcome: &mut Outcome,
        stderr: &mut dyn Write,
    ) -> Result<()> {
        match step {
            Step::CheckPlatform => self.context.host.check(manifest),
            Step::CheckConflicts { tokens } => {
                let receipts = self.context.receipts();
                match tokens.iter().find(|token| receipts.is_installed(token)) {
                    Some(conflict) => Err(InstallerError::ConflictingPackage {
                        token: manifest.token().clone(),
                        conflict: conflict.clone(),
                    }),
                    None => Ok(()),
                }
            }
            Step::Fetch { url, .. } => {
                write_heading(stderr, self.quiet, format!("Downloading {url}"));
                let artifact =
                    self.context
                        .cache()
                        .fetch(self.collaborators.downloader, manifest, url)?;
                state.url.clone_from(url);
                state.artifact = Some(artifact);
                Ok(())
            }
            Step::Verify { .. } => {
                let artifact = fetched(state)?;
                DownloadCache::verify(artifact, manifest, &state.url)
            }
            Step::Extract { kind } => {
                let artifact = fetched(state)?;
                std::fs::create_dir_all(&self.context.cache_dir)?;
                let unpacked = tempfile::Builder::new()
                    .prefix("casket-unpack")
                    .tempdir_in(&self.context.cache_dir)?;
                self.collaborators.extractor.extract(
                    artifact.path.as_std_path(),
                    *kind,
                    unpacked.path(),
                )?;
                Stager::ensure_present(&utf8_dir(&unpacked)?, manifest.apps())?;
                state.unpacked = Some(unpacked);
                Ok(())
            }
            Step::InstallArtifact { app, destination } => {
                let unpacked = state.unpacked.as_ref().ok_or_else(|| out_of_order(step))?;
                if !state.prepared {
                    stager.prepare()?;
                    state.prepared = true;
                }
                write_heading(
                    stderr,
                    self.quiet,
                    format!("Moving App '{}' to '{destination}'", app.source()),
                );
                let staged = stager.stage(&utf8_dir(unpacked)?, app)?;
                outcome.paths.push(staged.path.clone());
                state.staged.push(staged);
                Ok(())
            }
            Step::RunCommand {
                message,
                program,
                args,
            } => {
                if let Some(message) = message {
                    write_heading(stderr, self.quiet, message);
                }
                if let Some(warning) = self.run_post_install(program, args) {
                    outcome.warnings.push(warning);
                }
                Ok(())
            }
            Step::RecordReceipt { .. } => {
                state.unpacked = None;
                self.context.receipts().save(&Receipt::new(
                    manifest.token().clone(),
                    manifest.version().clone(),
                    outcome.paths.clone(),
                ))?;
                for staged in state.staged.drain(..) {
                    staged.commit();
                }
                Ok(())
            }
            Step::ShowCaveats { text } => {
                write_stderr_line(stderr, caveats_block(text));
                Ok(())
            }
            other => Err(out_of_order(other)),
        }
    }

    fn run_post_install(&self, program: &str, args: &[String]) -> Option<Warning> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let failed = |reason: String| {
            Some(Warning::PostInstallCommandFailed {
                command: program.to_owned(),
                reason,
            })
        };
        match self.collaborators.executor.run(program, &args) {
            Ok(output) if output.status.success() => None,
            Ok(output) => failed(failure_reason(&output)),
            Err(e) => failed(e.to_string()),
        }
    }

    /// Uninstalls `manifest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is held, the receipt is unreadable, or an
    /// installed bundle cannot be removed.
    pub fn uninstall(&self, manifest: &PackageManifest, stderr: &mut dyn Write) -> Result<Outcome> {
        let plan = plan::uninstall_plan(manifest, self.context)?;
        self.run_removal(manifest, &plan, stderr)
    }

    /// Uninstalls `manifest` and removes its user data.
    ///
    /// # Errors
    ///
    /// As for [`Interpreter::uninstall`]; zap paths that cannot be removed
    /// are reported as warnings.
    pub fn zap(&self, manifest: &PackageManifest, stderr: &mut dyn Write) -> Result<Outcome> {
        let plan = plan::zap_plan(manifest, self.context)?;
        self.run_removal(manifest, &plan, stderr)
    }

    fn run_removal(
        &self,
        manifest: &PackageManifest,
        plan: &Plan,
        stderr: &mut dyn Write,
    ) -> Result<Outcome> {
        let _lock = TokenLock::acquire(&self.context.caskroom, manifest.token())?;
        log::info!("removing {}", manifest.token());

        let mut outcome = Outcome::default();
        for step in plan {
            log::trace!("step: {step}");
            match step {
                Step::QuitApplication { bundle_id } => {
                    if let Some(warning) = self.quitter.quit(bundle_id) {
                        outcome.warnings.push(warning);
                    }
                }
                Step::RemoveArtifact { path } => {
                    if std::fs::symlink_metadata(path).is_err() {
                        outcome
                            .warnings
                            .push(Warning::PathNotFound { path: path.clone() });
                        continue;
                    }
                    write_heading(stderr, self.quiet, format!("Removing App '{path}'"));
                    remove_path(path.as_std_path())?;
                    outcome.paths.push(path.clone());
                }
                Step::RemoveReceipt { .. } => self.context.receipts().remove(manifest.token())?,
                Step::Trash { path } => {
                    write_heading(stderr, self.quiet, format!("Removing {path}"));
                    let report = zap::trash(std::slice::from_ref(path), &self.context.home);
                    outcome.paths.extend(report.removed);
                    outcome.warnings.extend(report.warnings);
                }
                Step::RemoveEmptyDir { path } => {
                    let report = zap::rmdir(std::slice::from_ref(path), &self.context.home);
                    outcome.paths.extend(report.removed);
                    outcome.warnings.extend(report.warnings);
                }
                other => return Err(out_of_order(other)),
            }
        }
        Ok(outcome)
    }

    /// Checks upstream for a newer version of `manifest`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Livecheck`] when the check cannot complete.
    pub fn livecheck(&self, manifest: &PackageManifest) -> Result<LivecheckReport> {
        livecheck::check(manifest, self.collaborators.downloader)
    }
}

fn fetched(state: &InstallState) -> Result<&CachedArtifact> {
    state.artifact.as_ref().ok_or_else(|| InstallerError::StagingFailed {
        reason: "artifact used before it was fetched".to_owned(),
    })
}

fn out_of_order(step: &Step) -> InstallerError {
    InstallerError::StagingFailed {
        reason: format!("step out of order: {step}"),
    }
}

fn utf8_dir(dir: &TempDir) -> Result<Utf8PathBuf> {
    Utf8Path::from_path(dir.path())
        .map(Utf8Path::to_path_buf)
        .ok_or_else(|| InstallerError::StagingFailed {
            reason: format!("{} is not valid UTF-8", dir.path().display()),
        })
}

/// Removes bundles staged by a failed install.
fn roll_back(staged: &[Staged]) {
    for bundle in staged.iter().rev() {
        bundle.restore();
    }
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod tests;
