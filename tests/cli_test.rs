//! Tests for command-line behaviour of the update-arginfo binary.

use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_update-arginfo")));
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn cli_help_prints_usage_and_fails() {
    cmd()
        .arg("--help")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("<extension-name> <extension-source-path> <extension-build-dir>"));
}

#[test]
fn cli_short_help_fails() {
    cmd().arg("-h").assert().code(2);
}

#[test]
fn cli_wrong_argument_count_fails() {
    cmd()
        .args(["swow", "ext/src"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn cli_missing_source_dir_is_fatal() {
    let temp = TempDir::new().unwrap();
    let cache = temp.path().join("cache");

    cmd()
        .arg(format!("--cache-path={}", cache.display()))
        .arg("swow")
        .arg(temp.path().join("missing"))
        .arg(temp.path().join("build"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Stub cache path is"));

    assert!(cache.join("stub/swow").is_dir());
}

#[test]
fn cli_empty_source_dir_reports_done() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(src.join("swow_plain.c"), "int x;\n").unwrap();

    cmd()
        .arg("--cache-path")
        .arg(temp.path().join("cache"))
        .arg("--clear-cache")
        .arg("swow")
        .arg(&src)
        .arg(temp.path().join("build"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Done with 0 functions and 0 methods, 0 replaced",
        ))
        .stderr(predicate::str::contains("Run without cache"))
        .stderr(predicate::str::contains("There is no arginfo in"));

    assert!(!temp.path().join("build").exists());
}

#[test]
fn cli_json_format() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    std::fs::create_dir_all(&src).unwrap();

    let output = cmd()
        .args(["--format", "json"])
        .arg(format!("--cache-path={}", temp.path().join("cache").display()))
        .arg("swow")
        .arg(&src)
        .arg(temp.path().join("build"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["extension"], "swow");
    assert_eq!(json["replaced"], 0);
    assert!(json["files"].as_array().unwrap().is_empty());
}

#[test]
fn cli_invalid_format_fails() {
    let temp = TempDir::new().unwrap();
    cmd()
        .args(["--format", "sarif", "swow"])
        .arg(temp.path())
        .arg(temp.path().join("build"))
        .assert()
        .code(2);
}
