//! Smoke tests -- verify the binary runs and rejects bad configuration early.

use std::io::Write;

use assert_cmd::Command;

#[test]
fn test_cli_help() {
    Command::cargo_bin("pipewatch")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("Terminal monitor for pipeline executions"));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("pipewatch")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("pipewatch"));
}

#[test]
fn test_monitor_subcommand_exists() {
    Command::cargo_bin("pipewatch")
        .unwrap()
        .args(["monitor", "--help"])
        .assert()
        .success()
        .stdout(predicates::str::contains("--pipeline"));
}

#[test]
fn test_status_alias() {
    Command::cargo_bin("pipewatch")
        .unwrap()
        .args(["status", "--help"])
        .assert()
        .success();
}

#[test]
fn test_pipelines_subcommand_exists() {
    Command::cargo_bin("pipewatch")
        .unwrap()
        .args(["pipelines", "--help"])
        .assert()
        .success();
}

#[test]
fn test_invalid_endpoint_is_rejected() {
    Command::cargo_bin("pipewatch")
        .unwrap()
        .env_remove("PIPEWATCH_CONFIG")
        .args(["--endpoint", "not a url", "pipelines"])
        .assert()
        .code(3)
        .stderr(predicates::str::contains("failed to create pipeline service client"));
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[retry]\nmax_attempts = 0").unwrap();

    Command::cargo_bin("pipewatch")
        .unwrap()
        .arg("--config")
        .arg(file.path())
        .arg("pipelines")
        .assert()
        .code(3)
        .stderr(predicates::str::contains("failed to load configuration"));
}

#[test]
fn test_configuration_error_exit_code_differs_from_failed_execution() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[retry]\nmax_attempts = 0").unwrap();

    Command::cargo_bin("pipewatch")
        .unwrap()
        .arg("--config")
        .arg(file.path())
        .args(["monitor", "--pipeline", "x"])
        .assert()
        .code(3)
        .stderr(predicates::str::contains("retry.max_attempts must be at least 1"));
}

#[test]
fn test_unreadable_env_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("broken.toml");
    std::fs::write(&config, "[service\nendpoint = ").unwrap();

    Command::cargo_bin("pipewatch")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env("PIPEWATCH_CONFIG", &config)
        .args(["--endpoint", "not a url", "pipelines"])
        .assert()
        .code(3)
        .stderr(predicates::str::contains("PIPEWATCH_CONFIG"))
        .stderr(predicates::str::contains("broken.toml"));
}
