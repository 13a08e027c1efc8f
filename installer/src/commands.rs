//! Command handlers behind the `casket` binary.
//!
//! Each handler takes its collaborators explicitly and writes to injected
//! streams, so the binary only wires real implementations together.

use std::io::Write;

use crate::cli::{ActionArgs, InfoArgs, LivecheckArgs};
use crate::context::InstallContext;
use crate::error::{InstallerError, Result};
use crate::info::format_info;
use crate::interpreter::{Collaborators, Interpreter};
use crate::manifest::load_manifest;
use crate::output::{success_message, write_stderr_line, write_warnings};
use crate::plan;

/// Which removal or install action to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Download and install.
    Install,
    /// Quit and remove the installed bundles.
    Uninstall,
    /// Uninstall, then delete user data.
    Zap,
}

impl Action {
    fn past_tense(self) -> &'static str {
        match self {
            Self::Install => "installed",
            Self::Uninstall => "uninstalled",
            Self::Zap => "zapped",
        }
    }
}

/// Everything a handler needs besides its arguments.
#[derive(Clone, Copy)]
pub struct Session<'a> {
    /// Locations and host facts.
    pub context: &'a InstallContext,
    /// External collaborators.
    pub collaborators: Collaborators<'a>,
    /// Whether progress headings are suppressed.
    pub quiet: bool,
}

impl<'a> Session<'a> {
    fn interpreter(&self) -> Interpreter<'a> {
        Interpreter::new(self.context, self.collaborators).quiet(self.quiet)
    }
}

/// Runs install, uninstall or zap for one manifest.
///
/// With `--dry-run` the plan is printed to `stdout` and nothing else happens.
///
/// # Errors
///
/// Returns the first fatal error from loading the manifest or running the
/// action. Warnings are printed to `stderr` and do not fail the command.
pub fn run_action(
    action: Action,
    args: &ActionArgs,
    session: &Session<'_>,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    let manifest = load_manifest(&args.manifest)?;

    if args.dry_run {
        let plan = match action {
            Action::Install => plan::install_plan(&manifest, session.context)?,
            Action::Uninstall => plan::uninstall_plan(&manifest, session.context)?,
            Action::Zap => plan::zap_plan(&manifest, session.context)?,
        };
        write!(stdout, "{plan}").map_err(|e| InstallerError::WriteFailed { source: e })?;
        return Ok(());
    }

    let interpreter = session.interpreter();
    let outcome = match action {
        Action::Install => interpreter.install(&manifest, stderr)?,
        Action::Uninstall => interpreter.uninstall(&manifest, stderr)?,
        Action::Zap => interpreter.zap(&manifest, stderr)?,
    };
    write_warnings(stderr, &outcome.warnings);
    if !session.quiet {
        write_stderr_line(
            stderr,
            success_message(
                manifest.token().as_str(),
                manifest.version().as_str(),
                action.past_tense(),
            ),
        );
    }
    Ok(())
}

/// Checks each manifest's upstream for a newer version.
///
/// # Errors
///
/// Returns the first manifest that fails to load or check, or a write
/// failure.
pub fn run_livecheck(
    args: &LivecheckArgs,
    session: &Session<'_>,
    stdout: &mut dyn Write,
) -> Result<()> {
    let interpreter = session.interpreter();
    let mut reports = Vec::with_capacity(args.manifests.len());
    for path in &args.manifests {
        let manifest = load_manifest(path)?;
        let report = interpreter.livecheck(&manifest)?;
        if !args.json {
            writeln!(stdout, "{report}").map_err(|e| InstallerError::WriteFailed { source: e })?;
        }
        reports.push(report);
    }

    if args.json {
        let entries: Vec<serde_json::Value> = reports
            .iter()
            .map(|report| {
                serde_json::json!({
                    "token": report.token,
                    "current": report.current,
                    "latest": report.latest,
                    "skipped": report.skipped,
                    "outdated": report.is_outdated(),
                })
            })
            .collect();
        let json = serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_owned());
        writeln!(stdout, "{json}").map_err(|e| InstallerError::WriteFailed { source: e })?;
    }
    Ok(())
}

/// Prints what a manifest describes and whether it is installed.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, the receipt is
/// corrupt, or writing fails.
pub fn run_info(args: &InfoArgs, context: &InstallContext, stdout: &mut dyn Write) -> Result<()> {
    let manifest = load_manifest(&args.manifest)?;
    let receipt = context.receipts().load(manifest.token())?;
    let text = format_info(&manifest, receipt.as_ref())?;
    writeln!(stdout, "{text}").map_err(|e| InstallerError::WriteFailed { source: e })?;
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
