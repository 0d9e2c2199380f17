use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn graft_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("graft").unwrap();
    cmd.env("GRAFT_HOME", home).env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
        .join(name)
}

/// Copy a fixture project into a fresh temp dir.
fn project(name: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for entry in fs::read_dir(fixture(name)).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), tmp.path().join(entry.file_name())).unwrap();
    }
    tmp
}

#[test]
fn test_resolve_applies_force_and_exclusions() {
    let tmp = project("happ");
    let home = TempDir::new().unwrap();

    graft_cmd(home.path())
        .current_dir(tmp.path())
        .args(["resolve"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "com.google.firebase:firebase-messaging = 24.1.1 (forced)",
        ))
        .stdout(predicate::str::contains(
            "com.google.firebase:firebase-common = 21.0.0 (requested 20.4.2, 21.0.0)",
        ))
        .stdout(predicate::str::contains(
            "com.google.firebase:firebase-installations = 18.0.0",
        ))
        .stdout(predicate::str::contains("com.google.firebase:firebase-auth = 22.3.1"))
        .stdout(predicate::str::contains("com.google.mlkit:vision-common = 17.3.0"))
        .stdout(predicate::str::contains("firebase-iid").not())
        .stderr(predicate::str::contains("Resolved 12 modules"));
}

#[test]
fn test_resolve_json() {
    let tmp = project("happ");
    let home = TempDir::new().unwrap();

    graft_cmd(home.path())
        .current_dir(tmp.path())
        .args(["resolve", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"selection\": \"forced\""))
        .stdout(predicate::str::contains("\"module\": \"text-recognition-korean\""));
}

#[test]
fn test_resolve_with_manifest_path() {
    let tmp = project("happ");
    let home = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();

    graft_cmd(home.path())
        .current_dir(elsewhere.path())
        .arg("resolve")
        .arg("--manifest-path")
        .arg(tmp.path().join("Graft.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("com.android.tools:desugar_jdk_libs = 2.1.4"));
}

#[test]
fn test_resolve_reports_conflict() {
    let tmp = project("conflict");
    let home = TempDir::new().unwrap();

    graft_cmd(home.path())
        .current_dir(tmp.path())
        .args(["resolve"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "unsatisfiable version constraints for lib:x",
        ));
}

#[test]
fn test_global_force_resolves_conflict() {
    let tmp = project("conflict");
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("config.toml"),
        "[resolution]\nforce = [\"lib:x:2.0\"]\n",
    )
    .unwrap();

    graft_cmd(home.path())
        .current_dir(tmp.path())
        .args(["resolve"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lib:x = 2.0 (forced)"));
}

#[test]
fn test_resolve_without_manifest_fails() {
    let tmp = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    graft_cmd(home.path())
        .current_dir(tmp.path())
        .args(["resolve"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find"));
}
