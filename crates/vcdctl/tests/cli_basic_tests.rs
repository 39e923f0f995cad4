use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// vcdctl with an isolated config file and no VCD_* overrides
fn vcdctl(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("vcdctl").unwrap();
    cmd.arg("--config-file")
        .arg(dir.path().join("config.toml"))
        .env_remove("VCDCTL_PROFILE")
        .env_remove("VCDCTL_CONFIG_FILE")
        .env_remove("VCD_URL")
        .env_remove("VCD_ORG")
        .env_remove("VCD_TOKEN")
        .env_remove("VCD_USER")
        .env_remove("VCD_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn config_text(dir: &TempDir) -> String {
    std::fs::read_to_string(dir.path().join("config.toml")).unwrap()
}

#[test]
fn test_help_flag() {
    Command::cargo_bin("vcdctl")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("VMware Cloud Director management CLI"))
        .stdout(predicate::str::contains("EXAMPLES:"));
}

#[test]
fn test_version_flag() {
    Command::cargo_bin("vcdctl")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vcdctl"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_args_shows_help() {
    Command::cargo_bin("vcdctl")
        .unwrap()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_subcommand() {
    Command::cargo_bin("vcdctl")
        .unwrap()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_api_help() {
    Command::cargo_bin("vcdctl")
        .unwrap()
        .args(["api", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Raw API access"))
        .stdout(predicate::str::contains("--min-version"));
}

#[test]
fn test_version_command_json() {
    let dir = TempDir::new().unwrap();
    vcdctl(&dir)
        .args(["version", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"vcdctl\""));
}

#[test]
fn test_invalid_output_format() {
    let dir = TempDir::new().unwrap();
    vcdctl(&dir)
        .args(["profile", "list", "-o", "invalid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_profile_list_empty() {
    let dir = TempDir::new().unwrap();
    vcdctl(&dir)
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No profiles configured"));

    vcdctl(&dir)
        .args(["profile", "list", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_profile_set_show_and_remove() {
    let dir = TempDir::new().unwrap();

    vcdctl(&dir)
        .args([
            "profile", "set", "lab", "--url", "https://vcd.example.com", "--org", "acme",
            "--token", "secret-token", "--max-api-version", "37.2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile 'lab' saved"))
        .stdout(predicate::str::contains("Set as default profile"));

    let saved = config_text(&dir);
    assert!(saved.contains("default_profile = \"lab\""));
    assert!(saved.contains("max_api_version = \"37.2\""));

    vcdctl(&dir)
        .args(["profile", "show", "lab", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"org\": \"acme\""))
        .stdout(predicate::str::contains("\"auth\": \"token\""))
        .stdout(predicate::str::contains("secret-token").not());

    vcdctl(&dir)
        .args(["profile", "list", "-q", "[0].name", "-o", "json"])
        .assert()
        .success();

    vcdctl(&dir)
        .args(["profile", "remove", "lab"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile 'lab' removed"));

    assert!(!config_text(&dir).contains("[profiles.lab]"));
}

#[test]
fn test_provider_profile_with_username() {
    let dir = TempDir::new().unwrap();
    vcdctl(&dir)
        .args([
            "profile", "set", "admin", "--url", "https://vcd.example.com", "--org", "System",
            "--username", "administrator", "--insecure",
        ])
        .assert()
        .success();

    vcdctl(&dir)
        .args(["profile", "show", "admin", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"provider\": true"))
        .stdout(predicate::str::contains("\"insecure\": true"))
        .stdout(predicate::str::contains("(not set)"));
}

#[test]
fn test_profile_default_must_exist() {
    let dir = TempDir::new().unwrap();
    vcdctl(&dir)
        .args(["profile", "default", "ghost"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Profile 'ghost' not found"))
        .stderr(predicate::str::contains("vcdctl profile list"));
}

#[test]
fn test_server_command_without_profiles() {
    let dir = TempDir::new().unwrap();
    vcdctl(&dir)
        .args(["catalog", "list"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No profile configured"));
}

#[test]
fn test_corrupt_config_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[[[broken").unwrap();
    vcdctl(&dir)
        .args(["profile", "list"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}
