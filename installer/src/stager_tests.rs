//! Unit tests for bundle staging.

use super::*;
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct Workspace {
    _temp: TempDir,
    source_root: Utf8PathBuf,
    appdir: Utf8PathBuf,
}

#[fixture]
fn workspace() -> Workspace {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 temp dir");
    let source_root = root.join("unpacked");
    let bundle = source_root.join("Demo.app/Contents");
    fs::create_dir_all(bundle.join("MacOS")).expect("create bundle");
    fs::write(bundle.join("Info.plist"), b"<plist/>").expect("write plist");
    fs::write(bundle.join("MacOS/Demo"), b"binary").expect("write binary");
    Workspace {
        _temp: temp,
        source_root,
        appdir: root.join("Applications"),
    }
}

fn app(source: &str, target: &str) -> AppArtifact {
    AppArtifact::new(source, Some(target)).expect("valid artifact")
}

#[rstest]
fn stages_bundle_under_target_name(workspace: Workspace) {
    let stager = Stager::new(workspace.appdir.clone());
    stager.prepare().expect("prepare");

    let staged = stager
        .stage(&workspace.source_root, &app("Demo.app", "Renamed.app"))
        .expect("stage");

    assert_eq!(staged.path, workspace.appdir.join("Renamed.app"));
    assert_eq!(staged.previous, None);
    assert!(staged.path.join("Contents/MacOS/Demo").is_file());
    assert!(!workspace.appdir.join(".casket-Renamed.app.partial").exists());
}

#[rstest]
fn replaces_existing_bundle(workspace: Workspace) {
    let stager = Stager::new(workspace.appdir.clone());
    stager.prepare().expect("prepare");
    let stale = workspace.appdir.join("Demo.app/Contents/Stale");
    fs::create_dir_all(stale.parent().expect("parent")).expect("mkdir");
    fs::write(&stale, b"old").expect("write stale");

    let staged = stager
        .stage(&workspace.source_root, &app("Demo.app", "Demo.app"))
        .expect("stage");

    assert!(!stale.exists());
    assert!(workspace.appdir.join("Demo.app/Contents/Info.plist").is_file());
    let aside = workspace.appdir.join(".casket-Demo.app.previous");
    assert_eq!(staged.previous.as_ref(), Some(&aside));
    assert!(aside.join("Contents/Stale").is_file());

    staged.commit();
    assert!(!aside.exists());
}

#[rstest]
fn restore_puts_displaced_bundle_back(workspace: Workspace) {
    let stager = Stager::new(workspace.appdir.clone());
    stager.prepare().expect("prepare");
    let marker = workspace.appdir.join("Demo.app/Contents/Marker");
    fs::create_dir_all(marker.parent().expect("parent")).expect("mkdir");
    fs::write(&marker, b"old").expect("write marker");

    let staged = stager
        .stage(&workspace.source_root, &app("Demo.app", "Demo.app"))
        .expect("stage");
    staged.restore();

    assert_eq!(fs::read(&marker).expect("marker restored"), b"old");
    assert!(!workspace.appdir.join("Demo.app/Contents/Info.plist").exists());
    assert!(!workspace.appdir.join(".casket-Demo.app.previous").exists());
}

#[rstest]
fn restore_without_previous_removes_new_bundle(workspace: Workspace) {
    let stager = Stager::new(workspace.appdir.clone());
    stager.prepare().expect("prepare");

    let staged = stager
        .stage(&workspace.source_root, &app("Demo.app", "Demo.app"))
        .expect("stage");
    staged.restore();

    assert!(!staged.path.exists());
}

#[rstest]
fn missing_bundle_is_reported(workspace: Workspace) {
    let err = Stager::ensure_present(
        &workspace.source_root,
        &[app("Demo.app", "Demo.app"), app("Other.app", "Other.app")],
    )
    .expect_err("Other.app is missing");

    let InstallerError::ArtifactMissing { bundle } = err else {
        panic!("expected ArtifactMissing");
    };
    assert_eq!(bundle, Utf8PathBuf::from("Other.app"));
}

#[cfg(unix)]
#[rstest]
fn copy_tree_preserves_symlinks(workspace: Workspace) {
    let link = workspace.source_root.join("Demo.app/Contents/Current");
    std::os::unix::fs::symlink("MacOS", &link).expect("create symlink");

    let dest = workspace.source_root.join("Copy.app");
    copy_tree(
        workspace.source_root.join("Demo.app").as_std_path(),
        dest.as_std_path(),
    )
    .expect("copy");

    let copied = dest.join("Contents/Current");
    assert!(
        fs::symlink_metadata(&copied)
            .expect("metadata")
            .file_type()
            .is_symlink()
    );
    assert_eq!(
        fs::read_link(&copied).expect("read link"),
        std::path::PathBuf::from("MacOS")
    );
}

#[rstest]
fn remove_path_ignores_missing(workspace: Workspace) {
    remove_path(workspace.appdir.join("Nope.app").as_std_path()).expect("missing is fine");
}

#[cfg(unix)]
#[rstest]
fn prepare_reports_unwritable_appdir(workspace: Workspace) {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(&workspace.appdir).expect("mkdir");
    fs::set_permissions(&workspace.appdir, fs::Permissions::from_mode(0o555)).expect("chmod");
    let check = workspace.appdir.join("check");
    let writable = fs::write(&check, b"x").is_ok();
    let _ = fs::remove_file(&check);

    let result = Stager::new(workspace.appdir.clone()).prepare();
    fs::set_permissions(&workspace.appdir, fs::Permissions::from_mode(0o755)).expect("chmod");

    // Root ignores directory permissions.
    if !writable {
        assert!(matches!(
            result,
            Err(InstallerError::TargetNotWritable { .. })
        ));
    }
}
