//! casket CLI entrypoint.
//!
//! This binary installs, removes and checks application bundles described by
//! TOML manifests. It resolves settings, wires the real downloader, extractor
//! and command runner together, and hands off to the library's command
//! handlers.

use clap::Parser;
use std::io::Write;

use casket::artefact::download::HttpDownloader;
use casket::artefact::extraction::ContainerExtractor;
use casket::cli::{Cli, Command};
use casket::commands::{Action, Session, run_action, run_info, run_livecheck};
use casket::config::{Overrides, Settings};
use casket::context::InstallContext;
use casket::dirs::SystemBaseDirs;
use casket::error::{InstallerError, Result};
use casket::exec::SystemCommandExecutor;
use casket::interpreter::Collaborators;
use casket::list::run_list;
use casket::output::write_stderr_line;
use casket::platform::HostPlatform;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Installs `env_logger` at the level implied by `-v`/`-q`. `RUST_LOG`
/// takes precedence when set.
fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(cli.log_level())
        .format_timestamp(None)
        .parse_default_env();
    if let Err(e) = builder.try_init() {
        log::debug!("keeping the existing logger: {e}");
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let settings = resolve_settings(cli)?;
    log::debug!("settings: {settings:?}");

    let executor = SystemCommandExecutor::with_timeout(settings.command_timeout);
    let host = HostPlatform::detect(&executor);
    log::debug!("host: {host}");
    let context = InstallContext::from_settings(&settings, host);

    let downloader = HttpDownloader::new(settings.download_timeout);
    let extractor = ContainerExtractor::new(&executor);
    let session = Session {
        context: &context,
        collaborators: Collaborators {
            downloader: &downloader,
            extractor: &extractor,
            executor: &executor,
        },
        quiet: cli.quiet,
    };

    match &cli.command {
        Command::Install(args) => run_action(Action::Install, args, &session, stdout, stderr),
        Command::Uninstall(args) => run_action(Action::Uninstall, args, &session, stdout, stderr),
        Command::Zap(args) => run_action(Action::Zap, args, &session, stdout, stderr),
        Command::Livecheck(args) => run_livecheck(args, &session, stdout),
        Command::Info(args) => run_info(args, &context, stdout),
        Command::List(args) => run_list(args, &context.receipts(), stdout),
    }
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let dirs = SystemBaseDirs::new().ok_or_else(|| InstallerError::Config {
        path: String::from("<platform directories>"),
        reason: String::from("could not determine the home directory"),
    })?;
    let overrides = Overrides {
        appdir: cli.appdir.clone(),
        config_path: cli.config.clone(),
    };
    Settings::resolve(&overrides, &dirs)
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("Error: {err}"));
            1
        }
    }
}
