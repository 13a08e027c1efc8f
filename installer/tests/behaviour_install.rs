//! Behaviour-driven tests for install, uninstall and zap.
//!
//! Scenarios run the interpreter against a temporary applications directory
//! with an in-memory downloader and a recording command executor. Tests use
//! the rstest-bdd v0.5.0 mutable world pattern.

mod support;

use camino::Utf8PathBuf;
use casket::artefact::extraction::ContainerExtractor;
use casket::context::InstallContext;
use casket::error::{InstallerError, Result as InstallerResult};
use casket::interpreter::{Collaborators, Interpreter, Outcome};
use casket::manifest::depends_on::Arch;
use casket::platform::HostPlatform;
use casket::test_utils::{FakeDownloader, ManifestBuilder, RecordingExecutor, zip_bundles};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::collections::BTreeSet;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

struct InstallWorld {
    _temp: TempDir,
    context: InstallContext,
    appdir_before: BTreeSet<String>,
    manifest: Option<ManifestBuilder>,
    served: Vec<u8>,
    downloader: Option<FakeDownloader>,
    failing_commands: Vec<String>,
    last_result: Option<InstallerResult<Outcome>>,
}

#[fixture]
fn world() -> InstallWorld {
    let temp = TempDir::new().expect("temp dir");
    let context = support::isolated_context(&temp);
    let appdir_before = support::listing(&context.appdir);
    InstallWorld {
        _temp: temp,
        context,
        appdir_before,
        manifest: None,
        served: Vec::new(),
        downloader: None,
        failing_commands: Vec::new(),
        last_result: None,
    }
}

fn update_manifest(world: &mut InstallWorld, change: impl FnOnce(ManifestBuilder) -> ManifestBuilder) {
    let builder = world.manifest.take().expect("package declared");
    world.manifest = Some(change(builder));
}

fn download_url(world: &InstallWorld) -> String {
    let manifest = world.manifest.as_ref().expect("package declared").build();
    manifest.download_url().expect("URL resolves")
}

#[derive(Clone, Copy)]
enum Action {
    Install,
    Uninstall,
    Zap,
}

/// Runs `action` with fresh collaborators and records the result.
fn run_action(world: &mut InstallWorld, action: Action) {
    let manifest = world.manifest.as_ref().expect("package declared").build();
    if world.downloader.is_none() {
        let url = download_url(world);
        world.downloader = Some(FakeDownloader::new().with_artifact(&url, world.served.clone()));
    }
    let executor = world
        .failing_commands
        .iter()
        .fold(RecordingExecutor::new(), |executor, cmd| executor.failing(cmd));
    let extractor = ContainerExtractor::new(&executor);
    let downloader = world.downloader.as_ref().expect("downloader set");
    let interpreter = Interpreter::new(
        &world.context,
        Collaborators {
            downloader,
            extractor: &extractor,
            executor: &executor,
        },
    )
    .quiet(true);
    let mut stderr = std::io::sink();
    let result = match action {
        Action::Install => interpreter.install(&manifest, &mut stderr),
        Action::Uninstall => interpreter.uninstall(&manifest, &mut stderr),
        Action::Zap => interpreter.zap(&manifest, &mut stderr),
    };
    world.last_result = Some(result);
}

fn last_outcome(world: &InstallWorld) -> &Outcome {
    match world.last_result.as_ref().expect("an action ran") {
        Ok(outcome) => outcome,
        Err(e) => panic!("expected success, got {e}"),
    }
}

fn last_error(world: &InstallWorld) -> &InstallerError {
    match world.last_result.as_ref().expect("an action ran") {
        Ok(outcome) => panic!("expected failure, got {outcome:?}"),
        Err(e) => e,
    }
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a package \"{token}\" whose archive contains \"{app}\"")]
fn given_package(world: &mut InstallWorld, token: String, app: String) {
    let payload = zip_bundles(&[app.as_str()]);
    world.manifest = Some(
        ManifestBuilder::new(&token)
            .payload(&payload)
            .app(&format!("\"{app}\"")),
    );
    world.served = payload;
}

#[given("one bit of the served archive is flipped")]
fn given_corrupted_archive(world: &mut InstallWorld) {
    let middle = world.served.len() / 2;
    let byte = world.served.get_mut(middle).expect("archive is not empty");
    *byte ^= 0x01;
}

#[given("the package requires the \"{arch}\" architecture")]
fn given_required_arch(world: &mut InstallWorld, arch: String) {
    update_manifest(world, |builder| builder.depends_on(&format!("arch = \"{arch}\"")));
}

#[given("the host architecture is \"{arch}\"")]
fn given_host_arch(world: &mut InstallWorld, arch: String) {
    let arch = match arch.as_str() {
        "arm64" => Arch::Arm64,
        "intel" => Arch::Intel,
        other => panic!("unknown architecture {other}"),
    };
    world.context.host = HostPlatform::new(Some(arch), world.context.host.macos());
}

#[given("the package runs \"{program}\" after install")]
fn given_postflight(world: &mut InstallWorld, program: String) {
    update_manifest(world, |builder| {
        builder.postflight(&format!(
            "command = \"{program}\"\nargs = [\"-d\", \"com.apple.quarantine\", \"{{appdir}}/Demo.app\"]"
        ))
    });
}

#[given("\"{program}\" exits with an error")]
fn given_failing_command(world: &mut InstallWorld, program: String) {
    world.failing_commands.push(program);
}

#[given("the package zaps \"{path}\"")]
fn given_zap_path(world: &mut InstallWorld, path: String) {
    update_manifest(world, |builder| builder.zap(&format!("trash = [\"{path}\"]")));
}

#[given("the user has \"{relative}\" in their home")]
fn given_home_file(world: &mut InstallWorld, relative: String) {
    let path = world.context.home.join(&relative);
    std::fs::create_dir_all(path.parent().expect("nested path")).expect("create parents");
    std::fs::write(&path, b"<plist/>").expect("write user data");
}

#[when("the package is installed")]
fn when_installed(world: &mut InstallWorld) {
    run_action(world, Action::Install);
}

#[when("the package is uninstalled")]
fn when_uninstalled(world: &mut InstallWorld) {
    run_action(world, Action::Uninstall);
}

#[when("the package is zapped")]
fn when_zapped(world: &mut InstallWorld) {
    run_action(world, Action::Zap);
}

#[then("the install succeeds")]
fn then_install_succeeds(world: &mut InstallWorld) {
    let _ = last_outcome(world);
}

#[then("the install fails with a checksum mismatch")]
fn then_checksum_mismatch(world: &mut InstallWorld) {
    let err = last_error(world);
    assert!(
        matches!(err, InstallerError::ChecksumMismatch { .. }),
        "unexpected error: {err}"
    );
}

#[then("the install fails because the platform is unsupported")]
fn then_unsupported_platform(world: &mut InstallWorld) {
    let err = last_error(world);
    assert!(
        matches!(err, InstallerError::UnsupportedPlatform { .. }),
        "unexpected error: {err}"
    );
}

#[then("no download was attempted")]
fn then_no_download(world: &mut InstallWorld) {
    let downloader = world.downloader.as_ref().expect("downloader set");
    assert_eq!(downloader.call_count(), 0);
}

#[then("\"{app}\" is in the applications directory")]
fn then_app_installed(world: &mut InstallWorld, app: String) {
    let bundle = world.context.appdir.join(&app);
    assert!(bundle.join("Contents/Info.plist").is_file(), "{bundle} missing");
}

#[then("the applications directory is unchanged")]
fn then_appdir_unchanged(world: &mut InstallWorld) {
    assert_eq!(support::listing(&world.context.appdir), world.appdir_before);
}

#[then("\"{token}\" has a receipt")]
fn then_has_receipt(world: &mut InstallWorld, token: String) {
    assert!(receipt_path(world, &token).is_file());
}

#[then("\"{token}\" has no receipt")]
fn then_has_no_receipt(world: &mut InstallWorld, token: String) {
    assert!(!receipt_path(world, &token).exists());
}

#[then("a warning names \"{program}\"")]
fn then_warning_names(world: &mut InstallWorld, program: String) {
    let outcome = last_outcome(world);
    assert!(
        outcome
            .warnings
            .iter()
            .any(|warning| warning.to_string().contains(&program)),
        "warnings: {:?}",
        outcome.warnings
    );
}

#[then("\"{relative}\" is gone from the home directory")]
fn then_home_path_gone(world: &mut InstallWorld, relative: String) {
    let _ = last_outcome(world);
    assert!(!world.context.home.join(&relative).exists());
}

fn receipt_path(world: &InstallWorld, token: &str) -> Utf8PathBuf {
    world.context.caskroom.join(token).join("receipt.json")
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/install.feature",
    name = "A verified package is installed with its receipt"
)]
fn scenario_install_succeeds(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "A corrupted archive is rejected before anything is copied"
)]
fn scenario_checksum_mismatch(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "A package for another architecture is rejected before download"
)]
fn scenario_unsupported_platform(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "A failing post-install command is reported as a warning"
)]
fn scenario_postflight_warning(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "Install followed by uninstall leaves the applications directory as it was"
)]
fn scenario_round_trip(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "Zap removes the same bundles as uninstall plus user data"
)]
fn scenario_zap_superset(world: InstallWorld) {
    let _ = world;
}
