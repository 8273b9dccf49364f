//! CLI smoke tests for the accounts-server binary
//!
//! These tests drive the compiled binary: help output, configuration
//! validation, the create-superuser command and a short-lived server run.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;

/// Helper to run the accounts-server binary with given arguments
fn run_accounts_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_accounts-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute accounts-server")
}

/// Write a config rooted at `dir` with quiet logging and a file-backed SQLite.
fn write_config(dir: &Path) -> String {
    let home = dir.to_string_lossy().replace('\\', "/");
    let yaml = format!(
        r#"
server:
  home_dir: "{home}"
  host: "127.0.0.1"
  port: 0
database:
  url: "sqlite://db/accounts.db"
  max_conns: 2
logging:
  default:
    console_level: "error"
    file: ""
modules:
  accounts:
    min_password_length: 8
  api_ingress:
    enable_docs: true
"#
    );
    let path = dir.join("config.yaml");
    std::fs::write(&path, yaml).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_cli_help_command() {
    let output = run_accounts_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("accounts-server"), "Should contain binary name");
    assert!(
        stdout.contains("Usage:") || stdout.contains("USAGE:"),
        "Should contain usage information"
    );
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(
        stdout.contains("create-superuser"),
        "Should contain 'create-superuser' subcommand"
    );
    assert!(stdout.contains("--config"), "Should mention config option");
}

#[test]
fn test_cli_version_command() {
    let output = run_accounts_server(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("accounts-server"), "Should contain binary name");
    assert!(stdout.contains("0.1.0"), "Should contain version number");
}

#[test]
fn test_cli_invalid_command() {
    let output = run_accounts_server(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error:") || stderr.contains("unrecognized"),
        "Should report the unknown subcommand"
    );
}

#[test]
fn test_cli_missing_config_file() {
    let output = run_accounts_server(&["--config", "/definitely/not/here.yaml", "check"]);

    assert!(!output.status.success(), "Missing config should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Config file not found"),
        "Should name the missing file, got: {stderr}"
    );
}

#[test]
fn test_cli_invalid_yaml_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.yaml");
    std::fs::write(&path, "server: [not, a, mapping\n").unwrap();

    let output = run_accounts_server(&["--config", path.to_str().unwrap(), "check"]);

    assert!(!output.status.success(), "Invalid YAML should fail");
}

#[test]
fn test_cli_invalid_module_section() {
    let temp_dir = TempDir::new().unwrap();
    let home = temp_dir.path().to_string_lossy().replace('\\', "/");
    let path = temp_dir.path().join("config.yaml");
    std::fs::write(
        &path,
        format!(
            "server:\n  home_dir: \"{home}\"\n  host: \"127.0.0.1\"\n  port: 8087\nmodules:\n  accounts:\n    min_pasword_length: 3\n"
        ),
    )
    .unwrap();

    let output = run_accounts_server(&["--config", path.to_str().unwrap(), "check"]);

    assert!(!output.status.success(), "Unknown accounts key should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("accounts"), "Should name the module, got: {stderr}");
}

#[test]
fn test_cli_check_valid_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path());

    let output = run_accounts_server(&["--config", config.as_str(), "check"]);

    assert!(
        output.status.success(),
        "Check should pass: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration check passed"));
    assert!(stdout.contains("min_password_length"));
}

#[test]
fn test_cli_print_config_applies_port_override() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path());

    let output = run_accounts_server(&["--config", config.as_str(), "--port", "9123", "--print-config"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port: 9123"), "got: {stdout}");
}

#[test]
fn test_cli_create_superuser_persists_and_rejects_duplicate() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path());
    let args = [
        "--config",
        config.as_str(),
        "create-superuser",
        "--email",
        "Root@Example.COM",
        "--password",
        "long-enough-pw",
    ];

    let output = run_accounts_server(&args);
    assert!(
        output.status.success(),
        "create-superuser should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Superuser created: root@example.com"), "got: {stdout}");
    assert!(temp_dir.path().join("db").join("accounts.db").is_file());

    let output = run_accounts_server(&args);
    assert!(!output.status.success(), "Duplicate email should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to create superuser"), "got: {stderr}");
}

#[test]
fn test_cli_create_superuser_short_password_with_mock() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path());

    let output = run_accounts_server(&[
        "--config",
        config.as_str(),
        "--mock",
        "create-superuser",
        "--email",
        "admin@example.com",
        "--password",
        "short",
    ]);

    assert!(!output.status.success(), "Short password should be rejected");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to create superuser"), "got: {stderr}");
    assert!(
        !temp_dir.path().join("db").join("accounts.db").exists(),
        "--mock must not touch the configured database"
    );
}

#[tokio::test]
async fn test_cli_run_with_mock_stays_up() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path());

    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_accounts-server"))
        .args(["--config", config.as_str(), "--mock", "run"])
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn accounts-server");

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let status = child.try_wait().expect("Failed to poll accounts-server");
    assert!(status.is_none(), "Server should still be running, exited with {status:?}");

    child.kill().await.expect("Failed to stop accounts-server");
}
