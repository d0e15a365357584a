use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `guidesync` with HOME pointed at an empty directory so no real settings
/// file leaks into the run.
fn guidesync(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("guidesync").expect("guidesync binary");
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("GUIDESYNC_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, contents).expect("write");
}

fn content_tree() -> TempDir {
    let root = TempDir::new().expect("root");
    write(root.path(), "guides/.properties", "category.title=Guides\nsection.title=Setup\n");
    write(
        root.path(),
        "guides/Install.adoc",
        "// title: Install\n// tags: setup\n= Install\n\nRun the installer.\n",
    );
    root
}

#[test]
fn render_prints_header_and_body() {
    let home = TempDir::new().unwrap();
    let root = content_tree();

    guidesync(home.path())
        .arg("render")
        .arg(root.path().join("guides/Install.adoc"))
        .assert()
        .success()
        .stdout(predicate::str::contains("title     : Install"))
        .stdout(predicate::str::contains("tags      : setup"))
        .stdout(predicate::str::contains("Run the installer."));
}

#[test]
fn render_rejects_untitled_document() {
    let home = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    write(root.path(), "loose.adoc", "just text\n");

    guidesync(home.path())
        .arg("render")
        .arg(root.path().join("loose.adoc"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("has no title"));
}

#[test]
fn print_only_writes_html_without_credentials() {
    let home = TempDir::new().unwrap();
    let root = content_tree();
    let out = TempDir::new().unwrap();

    guidesync(home.path())
        .args(["sync", "--print-only", "--dir"])
        .arg(root.path())
        .arg("--out-dir")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("printed"));

    let html = fs::read_to_string(out.path().join("guides/Install.html")).expect("html");
    assert!(html.contains("Run the installer."));
}

#[test]
fn print_only_to_stdout_shows_rule_and_body() {
    let home = TempDir::new().unwrap();
    let root = content_tree();

    guidesync(home.path())
        .args(["sync", "--print-only", "--dir"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("-----"))
        .stdout(predicate::str::contains("section   : Setup"))
        .stdout(predicate::str::contains("Run the installer."));
}

#[test]
fn json_summary_reports_tally() {
    let home = TempDir::new().unwrap();
    let root = content_tree();
    let out = TempDir::new().unwrap();

    let output = guidesync(home.path())
        .args(["--json", "sync", "--print-only", "--dir"])
        .arg(root.path())
        .arg("--out-dir")
        .arg(out.path())
        .output()
        .expect("run");
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(summary["tally"]["printed"], 1);
    assert!(summary["elapsed"].as_str().is_some_and(|e| e.len() == 8));
}

#[test]
fn profile_selects_alternate_directive_file() {
    let home = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    write(root.path(), ".properties.staging", "category.title=C\nsection.title=Staged\n");
    write(root.path(), "Doc.adoc", "// title: Doc\n\nbody text\n");

    guidesync(home.path())
        .args(["sync", "--print-only", "--profile", "staging", "--dir"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("section   : Staged"));

    guidesync(home.path())
        .args(["sync", "--print-only", "--dir"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped-directory"));
}

#[test]
fn publishing_without_credentials_is_a_config_error() {
    let home = TempDir::new().unwrap();
    let root = content_tree();

    guidesync(home.path())
        .args(["sync", "--dir"])
        .arg(root.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("url, user and token are required"));
}

#[test]
fn partial_credentials_are_a_config_error() {
    let home = TempDir::new().unwrap();
    let root = content_tree();

    guidesync(home.path())
        .args(["sync", "--print-only", "--url", "https://docs.example.com", "--dir"])
        .arg(root.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must be given together"));
}

#[test]
fn unusable_endpoint_exits_with_two() {
    let home = TempDir::new().unwrap();
    let root = content_tree();

    guidesync(home.path())
        .args(["sync", "--url", "ftp://docs.example.com", "--user", "me"])
        .env("GUIDESYNC_TOKEN", "secret")
        .arg("--dir")
        .arg(root.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot initialise remote client"))
        .stderr(predicate::str::contains("secret").not());
}

#[test]
fn delete_all_requires_confirmation() {
    let home = TempDir::new().unwrap();

    guidesync(home.path())
        .arg("delete-all")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn settings_file_supplies_defaults() {
    let home = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    write(root.path(), "meta.props", "category.title=C\nsection.title=FromConfig\n");
    write(root.path(), "Doc.txt", "// title: Doc\n\nbody text\n");
    let config = home.path().join("custom.yaml");
    fs::write(
        &config,
        "content:\n  directive_file: meta.props\n  extensions: [txt]\n",
    )
    .unwrap();

    guidesync(home.path())
        .arg("--config")
        .arg(&config)
        .args(["sync", "--print-only", "--dir"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("section   : FromConfig"));
}

#[test]
fn missing_settings_file_is_a_config_error() {
    let home = TempDir::new().unwrap();

    guidesync(home.path())
        .args(["--config", "/no/such/config.yaml", "render", "x.adoc"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to load settings"));
}
