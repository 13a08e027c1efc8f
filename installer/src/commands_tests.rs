//! Unit tests for the command handlers.

use super::*;
use crate::artefact::extraction::ContainerExtractor;
use crate::cli::LivecheckArgs;
use crate::manifest::depends_on::{Arch, MacosRelease};
use crate::platform::HostPlatform;
use crate::test_utils::{FakeDownloader, ManifestBuilder, RecordingExecutor, zip_bundles};
use camino::Utf8PathBuf;
use rstest::{fixture, rstest};

struct Fixture {
    _temp: tempfile::TempDir,
    root: Utf8PathBuf,
    context: InstallContext,
}

impl Fixture {
    fn write_manifest(&self, builder: &ManifestBuilder) -> Utf8PathBuf {
        let path = self.root.join("manifest.toml");
        std::fs::write(&path, builder.toml()).expect("write manifest");
        path
    }
}

#[fixture]
fn fixture() -> Fixture {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8");
    let context = InstallContext {
        appdir: root.join("Applications"),
        home: root.join("home"),
        caskroom: root.join("Caskroom"),
        cache_dir: root.join("cache"),
        host: HostPlatform::new(Some(Arch::Arm64), Some(MacosRelease::new(14, 0))),
    };
    Fixture {
        _temp: temp,
        root,
        context,
    }
}

struct Streams {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

fn run(
    fixture: &Fixture,
    action: Action,
    args: &ActionArgs,
    downloader: &FakeDownloader,
    quiet: bool,
) -> (Result<()>, Streams) {
    let executor = RecordingExecutor::new();
    let extractor = ContainerExtractor::new(&executor);
    let session = Session {
        context: &fixture.context,
        collaborators: Collaborators {
            downloader,
            extractor: &extractor,
            executor: &executor,
        },
        quiet,
    };
    let mut streams = Streams {
        stdout: Vec::new(),
        stderr: Vec::new(),
    };
    let result = run_action(action, args, &session, &mut streams.stdout, &mut streams.stderr);
    (result, streams)
}

#[rstest]
fn dry_run_prints_plan_without_fetching(fixture: Fixture) {
    let path = fixture.write_manifest(&ManifestBuilder::new("demo"));
    let downloader = FakeDownloader::new();
    let args = ActionArgs {
        manifest: path,
        dry_run: true,
    };

    let (result, streams) = run(&fixture, Action::Install, &args, &downloader, false);

    result.expect("dry run succeeds");
    let stdout = String::from_utf8_lossy(&streams.stdout);
    assert!(stdout.starts_with(" 1. check platform requirements\n"));
    assert!(stdout.contains("download https://example.com/demo-1.0.0.zip"));
    assert_eq!(downloader.call_count(), 0);
    assert!(!fixture.context.appdir.exists());
}

#[rstest]
#[case::loud(false, true)]
#[case::quiet(true, false)]
fn install_reports_success(fixture: Fixture, #[case] quiet: bool, #[case] announced: bool) {
    let payload = zip_bundles(&["Demo.app"]);
    let path = fixture.write_manifest(&ManifestBuilder::new("demo").payload(&payload));
    let downloader =
        FakeDownloader::new().with_artifact("https://example.com/demo-1.0.0.zip", payload);
    let args = ActionArgs {
        manifest: path,
        dry_run: false,
    };

    let (result, streams) = run(&fixture, Action::Install, &args, &downloader, quiet);

    result.expect("install succeeds");
    let stderr = String::from_utf8_lossy(&streams.stderr);
    assert_eq!(
        stderr.contains("demo 1.0.0 was successfully installed!"),
        announced
    );
    assert!(fixture.context.appdir.join("Demo.app").is_dir());
}

#[rstest]
fn uninstall_of_missing_bundle_warns_and_succeeds(fixture: Fixture) {
    let path = fixture.write_manifest(&ManifestBuilder::new("demo"));
    let args = ActionArgs {
        manifest: path,
        dry_run: false,
    };

    let (result, streams) = run(&fixture, Action::Uninstall, &args, &FakeDownloader::new(), false);

    result.expect("uninstall succeeds");
    let stderr = String::from_utf8_lossy(&streams.stderr);
    assert!(stderr.contains("Warning: "));
    assert!(stderr.contains("was not found; skipping"));
    assert!(stderr.contains("demo 1.0.0 was successfully uninstalled!"));
}

#[rstest]
fn missing_manifest_is_an_error(fixture: Fixture) {
    let args = ActionArgs {
        manifest: fixture.root.join("absent.toml"),
        dry_run: false,
    };
    let (result, _) = run(&fixture, Action::Install, &args, &FakeDownloader::new(), false);
    assert!(matches!(result, Err(InstallerError::ManifestParse(_))));
}

#[rstest]
#[case::human(false)]
#[case::json(true)]
fn livecheck_reports_latest_version(fixture: Fixture, #[case] json: bool) {
    let path = fixture.write_manifest(
        &ManifestBuilder::new("demo")
            .livecheck("url = \"https://example.com/releases\"\nregex = '^v?(\\d+(?:\\.\\d+)+)'"),
    );
    let downloader =
        FakeDownloader::new().with_page("https://example.com/releases", "v2.3.10 release notes");
    let executor = RecordingExecutor::new();
    let extractor = ContainerExtractor::new(&executor);
    let session = Session {
        context: &fixture.context,
        collaborators: Collaborators {
            downloader: &downloader,
            extractor: &extractor,
            executor: &executor,
        },
        quiet: false,
    };
    let mut stdout = Vec::new();

    run_livecheck(
        &LivecheckArgs {
            manifests: vec![path],
            json,
        },
        &session,
        &mut stdout,
    )
    .expect("livecheck succeeds");

    let stdout = String::from_utf8_lossy(&stdout);
    if json {
        let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
        assert_eq!(value[0]["latest"], "2.3.10");
        assert_eq!(value[0]["outdated"], true);
    } else {
        assert_eq!(stdout, "demo: 1.0.0 ==> 2.3.10 (outdated)\n");
    }
}

#[rstest]
fn info_describes_manifest(fixture: Fixture) {
    let path = fixture.write_manifest(&ManifestBuilder::new("demo"));
    let mut stdout = Vec::new();

    run_info(&InfoArgs { manifest: path }, &fixture.context, &mut stdout).expect("info");

    let stdout = String::from_utf8_lossy(&stdout);
    assert!(stdout.starts_with("==> demo: 1.0.0\nNot installed\n"));
}
