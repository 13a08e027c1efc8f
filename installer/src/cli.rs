//! CLI argument definitions for casket.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Install and remove macOS application bundles from declarative manifests.
#[derive(Parser, Debug)]
#[command(name = "casket")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install and remove macOS application bundles from declarative manifests.\n\n",
    "A manifest names a download URL, its SHA-256 checksum, the bundles to copy ",
    "into the applications directory, an optional post-install command, and the ",
    "paths to clean up when the package is zapped.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install a package:\n",
    "    $ casket install manifests/pikachuexe-freetube.toml\n\n",
    "  Preview an install without touching the system:\n",
    "    $ casket install --dry-run manifests/pikachuexe-freetube.toml\n\n",
    "  Remove the package and its preferences:\n",
    "    $ casket zap manifests/pikachuexe-freetube.toml\n\n",
    "  Check upstream for a newer version:\n",
    "    $ casket livecheck manifests/pikachuexe-freetube.toml\n\n",
    "  List installed packages as JSON:\n",
    "    $ casket list --json",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Applications directory [default: /Applications].
    #[arg(long, global = true, value_name = "DIR")]
    pub appdir: Option<Utf8PathBuf>,

    /// Configuration file [default: platform config directory].
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors and warnings still shown).
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Download, verify and install a package.
    Install(ActionArgs),

    /// Quit and remove an installed package.
    Uninstall(ActionArgs),

    /// Uninstall a package and delete its user data.
    Zap(ActionArgs),

    /// Check upstream for newer versions.
    Livecheck(LivecheckArgs),

    /// Show what a manifest describes.
    Info(InfoArgs),

    /// List installed packages.
    List(ListArgs),
}

/// Arguments for install, uninstall and zap.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct ActionArgs {
    /// Path to the package manifest.
    #[arg(value_name = "MANIFEST")]
    pub manifest: Utf8PathBuf,

    /// Print the steps that would run and exit.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the livecheck command.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct LivecheckArgs {
    /// Paths to package manifests.
    #[arg(value_name = "MANIFEST", required = true)]
    pub manifests: Vec<Utf8PathBuf>,

    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the info command.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct InfoArgs {
    /// Path to the package manifest.
    #[arg(value_name = "MANIFEST")]
    pub manifest: Utf8PathBuf,
}

/// Arguments for the list command.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Log level implied by `-v` and `-q`.
    ///
    /// # Examples
    ///
    /// ```
    /// use casket::cli::Cli;
    /// use clap::Parser;
    ///
    /// let cli = Cli::parse_from(["casket", "-vv", "list"]);
    /// assert_eq!(cli.log_level(), log::LevelFilter::Debug);
    /// ```
    #[must_use]
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
