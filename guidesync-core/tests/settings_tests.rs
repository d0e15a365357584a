use std::fs;

use guidesync_core::{
    config::{self, settings_path_at},
    CoreError, Settings,
};
use tempfile::TempDir;

fn write_settings(home: &TempDir, yaml: &str) {
    let path = settings_path_at(home.path());
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, yaml).unwrap();
}

#[test]
fn missing_file_yields_defaults() {
    let home = TempDir::new().unwrap();
    let settings = config::load_at(home.path()).expect("load");
    assert_eq!(settings, Settings::default());
}

#[test]
fn explicit_missing_file_is_an_error() {
    let home = TempDir::new().unwrap();
    let err = config::load_from(&home.path().join("nope.yaml")).unwrap_err();
    assert!(matches!(err, CoreError::SettingsNotFound { .. }));
}

#[test]
fn partial_file_keeps_other_defaults() {
    let home = TempDir::new().unwrap();
    write_settings(
        &home,
        "remote:\n  url: https://docs.example.com\n  max_attempts: 9\n\
         publish:\n  permission_group: Editors\n\
         directives:\n  category_name: cat.name\n",
    );
    let settings = config::load_at(home.path()).expect("load");
    assert_eq!(settings.remote.url.as_deref(), Some("https://docs.example.com"));
    assert_eq!(settings.remote.max_attempts, 9);
    assert_eq!(settings.remote.rate_limit_wait_secs, 60);
    assert_eq!(settings.publish.permission_group.as_deref(), Some("Editors"));
    assert_eq!(settings.directives.category_name, "cat.name");
    assert_eq!(settings.directives.section_name, "section.title");
    assert_eq!(settings.headers.title, "title");
}

#[test]
fn empty_file_yields_defaults() {
    let home = TempDir::new().unwrap();
    write_settings(&home, "\n");
    assert_eq!(config::load_at(home.path()).unwrap(), Settings::default());
}

#[test]
fn malformed_yaml_reports_path() {
    let home = TempDir::new().unwrap();
    write_settings(&home, "remote: [unterminated\n");
    let err = config::load_at(home.path()).unwrap_err();
    match err {
        CoreError::Parse { path, .. } => assert!(path.ends_with("config.yaml")),
        other => panic!("expected parse error, got {other:?}"),
    }
}
