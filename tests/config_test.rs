use assert_cmd::cargo;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_cli_with_valid_config_reaches_analysis() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    let toml_content = r#"
link_timeout_secs = 3
max_concurrent_probes = 8
count_http_errors = true
"#;
    fs::write(&config_path, toml_content).unwrap();

    // Config parses, so the failure comes from the URL check
    let mut cmd = cargo::cargo_bin_cmd!("pageprobe");
    cmd.args(["analyze", "ftp://example.com"])
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("only http and https are supported"));
}

#[test]
fn test_cli_with_invalid_config_fails() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, r#"{ invalid json }"#).unwrap();

    let mut cmd = cargo::cargo_bin_cmd!("pageprobe");
    cmd.args(["analyze", "https://example.com"])
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse JSON config"));
}

#[test]
fn test_cli_with_unsupported_config_format_fails() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.ini");
    fs::write(&config_path, "link_timeout_secs=3").unwrap();

    let mut cmd = cargo::cargo_bin_cmd!("pageprobe");
    cmd.args(["analyze", "https://example.com"])
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported config file format"));
}

#[test]
fn test_cli_with_missing_config_fails() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("missing.yaml");

    let mut cmd = cargo::cargo_bin_cmd!("pageprobe");
    cmd.args(["serve"])
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_config_verbose_enables_debug_logging() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "verbose = true\n").unwrap();

    let mut cmd = cargo::cargo_bin_cmd!("pageprobe");
    cmd.env_remove("RUST_LOG")
        .args(["analyze", "ftp://example.com"])
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsed cli"));
}

#[test]
fn test_default_log_level_hides_debug() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "verbose = false\n").unwrap();

    let mut cmd = cargo::cargo_bin_cmd!("pageprobe");
    cmd.env_remove("RUST_LOG")
        .args(["analyze", "ftp://example.com"])
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsed cli").not());
}
