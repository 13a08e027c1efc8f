//! Unit tests for plan construction.

use super::*;
use crate::manifest::depends_on::{Arch, MacosRelease};
use crate::platform::HostPlatform;
use crate::receipts::Receipt;
use crate::test_utils::ManifestBuilder;
use rstest::{fixture, rstest};

struct Fixture {
    _temp: tempfile::TempDir,
    context: InstallContext,
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
        context,
    }
}

fn full_manifest() -> PackageManifest {
    ManifestBuilder::new("demo")
        .version("0.23.3")
        .url("https://example.com/demo-{version}.dmg")
        .conflicts_with("demo-legacy")
        .postflight(
            "message = \"Releasing {token} from quarantine\"\ncommand = \"/usr/bin/xattr\"\nargs = [\"-d\", \"com.apple.quarantine\", \"{appdir}/Demo.app\"]",
        )
        .uninstall("quit = \"io.example.demo\"")
        .zap("trash = [\"~/Library/Preferences/io.example.demo.plist\"]\nrmdir = \"~/Library/Demo\"")
        .caveats("Gatekeeper may block {token}.")
        .build()
}

#[rstest]
fn install_plan_follows_fixed_order(fixture: Fixture) {
    let plan = install_plan(&full_manifest(), &fixture.context).expect("plan");
    let kinds: Vec<&str> = plan
        .steps()
        .iter()
        .map(|step| match step {
            Step::CheckPlatform => "platform",
            Step::CheckConflicts { .. } => "conflicts",
            Step::Fetch { .. } => "fetch",
            Step::Verify { .. } => "verify",
            Step::Extract { .. } => "extract",
            Step::InstallArtifact { .. } => "install",
            Step::RunCommand { .. } => "command",
            Step::RecordReceipt { .. } => "receipt",
            Step::ShowCaveats { .. } => "caveats",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "platform", "conflicts", "fetch", "verify", "extract", "install", "command",
            "receipt", "caveats"
        ]
    );
}

#[rstest]
fn install_plan_resolves_templates(fixture: Fixture) {
    let plan = install_plan(&full_manifest(), &fixture.context).expect("plan");
    let appdir = fixture.context.appdir.clone();

    assert!(plan.steps().contains(&Step::Fetch {
        url: "https://example.com/demo-0.23.3.dmg".to_owned(),
        destination: fixture.context.cache_dir.join("downloads/demo--0.23.3.dmg"),
    }));
    assert!(plan.steps().contains(&Step::RunCommand {
        message: Some("Releasing demo from quarantine".to_owned()),
        program: "/usr/bin/xattr".to_owned(),
        args: vec![
            "-d".to_owned(),
            "com.apple.quarantine".to_owned(),
            format!("{appdir}/Demo.app"),
        ],
    }));
    assert!(plan.steps().contains(&Step::ShowCaveats {
        text: "Gatekeeper may block demo.".to_owned(),
    }));
}

#[rstest]
fn minimal_manifest_has_no_optional_steps(fixture: Fixture) {
    let plan = install_plan(&ManifestBuilder::new("plain").build(), &fixture.context)
        .expect("plan");
    assert!(!plan.steps().iter().any(|step| matches!(
        step,
        Step::CheckConflicts { .. } | Step::RunCommand { .. } | Step::ShowCaveats { .. }
    )));
}

#[rstest]
fn uninstall_plan_uses_manifest_targets_without_receipt(fixture: Fixture) {
    let plan = uninstall_plan(&full_manifest(), &fixture.context).expect("plan");
    assert_eq!(
        plan.steps(),
        &[
            Step::QuitApplication {
                bundle_id: BundleId::try_from("io.example.demo").expect("bundle id"),
            },
            Step::RemoveArtifact {
                path: fixture.context.appdir.join("Demo.app"),
            },
            Step::RemoveReceipt {
                path: fixture.context.caskroom.join("demo/receipt.json"),
            },
        ]
    );
}

#[rstest]
fn uninstall_plan_prefers_receipt_paths(fixture: Fixture) {
    let manifest = full_manifest();
    let elsewhere = Utf8PathBuf::from("/Volumes/Apps/Demo.app");
    fixture
        .context
        .receipts()
        .save(&Receipt::new(
            manifest.token().clone(),
            manifest.version().clone(),
            vec![elsewhere.clone()],
        ))
        .expect("save receipt");

    let plan = uninstall_plan(&manifest, &fixture.context).expect("plan");
    assert!(plan.steps().contains(&Step::RemoveArtifact { path: elsewhere }));
}

#[rstest]
fn zap_plan_extends_uninstall_plan(fixture: Fixture) {
    let manifest = full_manifest();
    let uninstall = uninstall_plan(&manifest, &fixture.context).expect("plan");
    let zap = zap_plan(&manifest, &fixture.context).expect("plan");

    assert!(zap.steps().starts_with(uninstall.steps()));
    assert_eq!(zap.steps().len(), uninstall.steps().len() + 2);
}

#[rstest]
fn plan_display_is_numbered(fixture: Fixture) {
    let plan = uninstall_plan(&full_manifest(), &fixture.context).expect("plan");
    let text = plan.to_string();
    assert!(text.starts_with(" 1. quit io.example.demo\n"));
}
