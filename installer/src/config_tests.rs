//! Unit tests for configuration resolution.

use super::*;
use crate::dirs::MockBaseDirs;
use rstest::{fixture, rstest};
use std::path::Path;
use tempfile::TempDir;

struct Fixture {
    temp: TempDir,
    dirs: MockBaseDirs,
}

impl Fixture {
    fn root(&self) -> Utf8PathBuf {
        Utf8PathBuf::try_from(self.temp.path().to_path_buf()).expect("UTF-8 temp dir")
    }

    fn write_config(&self, text: &str) {
        let dir = self.temp.path().join("config");
        std::fs::create_dir_all(&dir).expect("create config dir");
        std::fs::write(dir.join(CONFIG_FILE_NAME), text).expect("write config");
    }
}

fn mock_dirs(root: &Path) -> MockBaseDirs {
    let mut dirs = MockBaseDirs::new();
    let home = root.join("home");
    let config = root.join("config");
    let data = root.join("data");
    let cache = root.join("cache");
    dirs.expect_home_dir().returning(move || Some(home.clone()));
    dirs.expect_config_dir().returning(move || Some(config.clone()));
    dirs.expect_data_dir().returning(move || Some(data.clone()));
    dirs.expect_cache_dir().returning(move || Some(cache.clone()));
    dirs
}

#[fixture]
fn fixture() -> Fixture {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dirs = mock_dirs(temp.path());
    Fixture { temp, dirs }
}

#[rstest]
fn defaults_without_config_file(fixture: Fixture) {
    let settings = temp_env::with_var_unset(APPDIR_ENV, || {
        Settings::resolve(&Overrides::default(), &fixture.dirs)
    })
    .expect("resolve settings");

    let root = fixture.root();
    assert_eq!(settings.home, root.join("home"));
    assert_eq!(settings.caskroom, root.join("data").join("Caskroom"));
    assert_eq!(settings.cache_dir, root.join("cache"));
    assert_eq!(settings.download_timeout, DEFAULT_DOWNLOAD_TIMEOUT);
    assert_eq!(settings.command_timeout, DEFAULT_COMMAND_TIMEOUT);
    if cfg!(target_os = "macos") {
        assert_eq!(settings.appdir, Utf8PathBuf::from("/Applications"));
    } else {
        assert_eq!(settings.appdir, root.join("home").join("Applications"));
    }
}

#[rstest]
fn config_file_values_apply(fixture: Fixture) {
    fixture.write_config(
        "appdir = \"/tmp/apps\"\ncaskroom = \"/tmp/room\"\ndownload_timeout_secs = 5\n",
    );
    let settings = temp_env::with_var_unset(APPDIR_ENV, || {
        Settings::resolve(&Overrides::default(), &fixture.dirs)
    })
    .expect("resolve settings");

    assert_eq!(settings.appdir, Utf8PathBuf::from("/tmp/apps"));
    assert_eq!(settings.caskroom, Utf8PathBuf::from("/tmp/room"));
    assert_eq!(settings.download_timeout, Duration::from_secs(5));
}

#[rstest]
fn environment_beats_config_file(fixture: Fixture) {
    fixture.write_config("appdir = \"/tmp/from-file\"\n");
    let settings = temp_env::with_var(APPDIR_ENV, Some("/tmp/from-env"), || {
        Settings::resolve(&Overrides::default(), &fixture.dirs)
    })
    .expect("resolve settings");

    assert_eq!(settings.appdir, Utf8PathBuf::from("/tmp/from-env"));
}

#[rstest]
fn flag_beats_environment(fixture: Fixture) {
    let overrides = Overrides {
        appdir: Some(Utf8PathBuf::from("/tmp/from-flag")),
        config_path: None,
    };
    let settings = temp_env::with_var(APPDIR_ENV, Some("/tmp/from-env"), || {
        Settings::resolve(&overrides, &fixture.dirs)
    })
    .expect("resolve settings");

    assert_eq!(settings.appdir, Utf8PathBuf::from("/tmp/from-flag"));
}

#[rstest]
fn explicit_missing_config_is_an_error(fixture: Fixture) {
    let overrides = Overrides {
        appdir: None,
        config_path: Some(fixture.root().join("nope.toml")),
    };
    let err = Settings::resolve(&overrides, &fixture.dirs).expect_err("missing config");
    assert!(matches!(err, InstallerError::Config { .. }));
}

#[rstest]
fn unknown_config_key_is_rejected(fixture: Fixture) {
    fixture.write_config("colour = \"always\"\n");
    let err = Settings::resolve(&Overrides::default(), &fixture.dirs)
        .expect_err("unknown key should fail");
    assert!(err.to_string().contains("colour"));
}

#[test]
fn missing_home_is_reported() {
    let mut dirs = MockBaseDirs::new();
    dirs.expect_home_dir().returning(|| None);
    let err = Settings::resolve(&Overrides::default(), &dirs).expect_err("no home");
    assert!(err.to_string().contains("home directory"));
}
