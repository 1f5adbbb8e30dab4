//! Integration tests for the `cortex-operator` binary exit policy.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::TempDir;

const VALID_DOCUMENT: &str = "\
region: us-west-2
bucket: cortex-models
cluster_name: dev-cluster
instance_type: m5.large
telemetry: false
";

fn operator(config_path: &std::path::Path) -> assert_cmd::Command {
    let mut command = cargo_bin_cmd!("cortex-operator");
    command
        .env("CORTEX_CLUSTER_CONFIG_PATH", config_path)
        .env("CORTEX_LOG_FORMAT", "compact")
        .env_remove("CORTEX_LOG_LEVEL")
        .env_remove("AWS_ACCESS_KEY_ID")
        .env_remove("AWS_SECRET_ACCESS_KEY")
        .env_remove("AWS_SESSION_TOKEN");
    command
}

#[test]
fn unreadable_configuration_exits_with_status_two() {
    let dir = TempDir::new().expect("create temp dir");
    operator(&dir.path().join("missing.yaml"))
        .assert()
        .code(2)
        .stdout(contains("bootstrap_failed"));
}

#[test]
fn invalid_configuration_exits_with_status_two() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("cluster.yaml");
    fs::write(&path, "region: us-west-2\n").expect("write config");
    operator(&path).assert().code(2).stdout(contains("bucket"));
}

#[test]
fn missing_cloud_credentials_exit_with_status_one() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("cluster.yaml");
    fs::write(&path, VALID_DOCUMENT).expect("write config");
    operator(&path)
        .assert()
        .code(1)
        .stderr(contains("AWS_ACCESS_KEY_ID"));
}

#[test]
fn unknown_log_format_exits_with_status_three() {
    let dir = TempDir::new().expect("create temp dir");
    let mut command = operator(&dir.path().join("cluster.yaml"));
    command.env("CORTEX_LOG_FORMAT", "xml");
    command.assert().code(3).stderr(contains("invalid log format"));
}
