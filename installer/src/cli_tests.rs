//! Unit tests for CLI argument parsing.

use super::*;
use rstest::rstest;

#[test]
fn install_takes_manifest_path() {
    let cli = Cli::parse_from(["casket", "install", "manifests/demo.toml"]);
    assert_eq!(
        cli.command,
        Command::Install(ActionArgs {
            manifest: Utf8PathBuf::from("manifests/demo.toml"),
            dry_run: false,
        })
    );
}

#[rstest]
#[case::install("install")]
#[case::uninstall("uninstall")]
#[case::zap("zap")]
fn actions_accept_dry_run(#[case] action: &str) {
    let cli = Cli::parse_from(["casket", action, "--dry-run", "demo.toml"]);
    let (Command::Install(args) | Command::Uninstall(args) | Command::Zap(args)) = cli.command
    else {
        panic!("expected an action command");
    };
    assert!(args.dry_run);
}

#[test]
fn global_flags_follow_subcommand() {
    let cli = Cli::parse_from(["casket", "install", "demo.toml", "--appdir", "/tmp/apps", "-q"]);
    assert_eq!(cli.appdir, Some(Utf8PathBuf::from("/tmp/apps")));
    assert!(cli.quiet);
}

#[test]
fn livecheck_accepts_several_manifests() {
    let cli = Cli::parse_from(["casket", "livecheck", "--json", "a.toml", "b.toml"]);
    let Command::Livecheck(args) = cli.command else {
        panic!("expected livecheck");
    };
    assert_eq!(args.manifests.len(), 2);
    assert!(args.json);
}

#[test]
fn livecheck_requires_a_manifest() {
    assert!(Cli::try_parse_from(["casket", "livecheck"]).is_err());
}

#[test]
fn verbose_conflicts_with_quiet() {
    assert!(Cli::try_parse_from(["casket", "-v", "-q", "list"]).is_err());
}

#[rstest]
#[case::default(&["casket", "list"], log::LevelFilter::Warn)]
#[case::one(&["casket", "-v", "list"], log::LevelFilter::Info)]
#[case::three(&["casket", "-vvv", "list"], log::LevelFilter::Trace)]
#[case::quiet(&["casket", "-q", "list"], log::LevelFilter::Error)]
fn verbosity_maps_to_log_level(#[case] args: &[&str], #[case] expected: log::LevelFilter) {
    assert_eq!(Cli::parse_from(args).log_level(), expected);
}

#[test]
fn cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
