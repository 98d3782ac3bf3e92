//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;

/// Build command for the capbank-cli binary.
fn capbank_cli() -> Command {
    cargo_bin_cmd!("capbank-cli")
}

/// Path to capbank library test fixtures (relative to workspace).
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("capbank")
        .join("tests")
        .join("fixtures")
}

#[test]
fn test_cli_help() {
    let mut cmd = capbank_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Capacitor network"));
}

#[test]
fn test_cli_version() {
    let mut cmd = capbank_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_packages_builtin() {
    let mut cmd = capbank_cli();

    cmd.arg("packages");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0805"))
        .stdout(predicate::str::contains("0402"));
}

#[test]
fn test_cli_packages_json_from_fixture() {
    let mut cmd = capbank_cli();

    cmd.arg("packages")
        .arg("--catalog")
        .arg(fixtures_dir().join("small_catalog.json"))
        .arg("--format")
        .arg("json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let packages: Vec<String> = serde_json::from_slice(&output).unwrap();
    assert_eq!(packages, vec!["0603", "0805", "1206"]);
}

#[test]
fn test_cli_catalog_filter() {
    let mut cmd = capbank_cli();

    cmd.arg("catalog")
        .arg("--catalog")
        .arg(fixtures_dir().join("small_catalog.json"))
        .arg("--package")
        .arg("0603")
        .arg("--verbose");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("SCN-330N-0603-50V"))
        .stdout(predicate::str::contains("ESR"))
        .stdout(predicate::str::contains("SCN-1U-0805-50V").not());
}

#[test]
fn test_cli_optimize_human() {
    let mut cmd = capbank_cli();

    cmd.arg("optimize")
        .arg("--target")
        .arg("1u")
        .arg("--max-count")
        .arg("3")
        .arg("--min-volt")
        .arg("25")
        .arg("--min-temp")
        .arg("85")
        .arg("--package")
        .arg("0805")
        .arg("--catalog")
        .arg(fixtures_dir().join("small_catalog.json"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("[1p]"))
        .stdout(predicate::str::contains("SCN-1U-0805-50V"));
}

#[test]
fn test_cli_optimize_json_output() {
    let mut cmd = capbank_cli();

    cmd.arg("optimize")
        .arg("--target")
        .arg("1e-6")
        .arg("--package")
        .arg("0805")
        .arg("--format")
        .arg("json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let results = json.as_array().expect("results should be a JSON array");
    assert!(!results.is_empty());
    assert!(results[0].get("Type").is_some());
    assert!(results[0].get("Cfg").is_some());
}

#[test]
fn test_cli_run_request_file() {
    let mut cmd = capbank_cli();

    cmd.arg("run")
        .arg(fixtures_dir().join("scenario_request.json"))
        .arg("--catalog")
        .arg(fixtures_dir().join("small_catalog.json"))
        .arg("--format")
        .arg("json");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("SCN-1U-0805-50V"));
}

#[test]
fn test_cli_run_invalid_request() {
    let mut cmd = capbank_cli();

    cmd.arg("run")
        .arg(fixtures_dir().join("invalid_request.json"))
        .arg("--catalog")
        .arg(fixtures_dir().join("small_catalog.json"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid constraint"));
}

#[test]
fn test_cli_run_from_stdin() {
    let mut cmd = capbank_cli();
    let body = fs::read_to_string(fixtures_dir().join("scenario_request.json")).unwrap();

    cmd.arg("run")
        .arg("-")
        .arg("--catalog")
        .arg(fixtures_dir().join("small_catalog.json"))
        .write_stdin(body);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("[1p]"));
}

#[test]
fn test_cli_fail_if_empty() {
    let mut cmd = capbank_cli();

    cmd.arg("optimize")
        .arg("--target")
        .arg("3.3u")
        .arg("--tolerance")
        .arg("0.01")
        .arg("--max-count")
        .arg("1")
        .arg("--conn")
        .arg("series")
        .arg("--fail-if-empty");

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("No feasible network"));
}

#[test]
fn test_cli_unknown_connection_type() {
    let mut cmd = capbank_cli();

    cmd.arg("optimize")
        .arg("--target")
        .arg("1u")
        .arg("--conn")
        .arg("ladder");

    cmd.assert().failure();
}

#[test]
fn test_cli_missing_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = capbank_cli();

    cmd.arg("packages")
        .arg("--catalog")
        .arg(dir.path().join("missing.json"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_cli_catalog_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::copy(
        fixtures_dir().join("small_catalog.json"),
        dir.path().join("acme.json"),
    )
    .unwrap();
    let mut cmd = capbank_cli();

    cmd.arg("packages").arg("--catalog").arg(dir.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1206"));
}
