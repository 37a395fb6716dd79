//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

fn novelvault() -> Command {
    let mut cmd = Command::cargo_bin("novelvault").unwrap();
    cmd.env_remove("DATABASE_URL")
        .env_remove("NOVELVAULT_CONFIG")
        .env_remove("NOVELVAULT_BIND")
        .env_remove("NOVELVAULT_BASE_URL")
        .env_remove("NOVELVAULT_RATE_LIMIT_BACKEND");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    novelvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_serve_help() {
    novelvault()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Address to bind to"))
        .stdout(predicate::str::contains("--rate-limit-backend"));
}

#[test]
fn test_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    novelvault()
        .args(["config", "init", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config"));
    assert!(path.exists());

    novelvault()
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[rate_limit]"))
        .stdout(predicate::str::contains("max_requests = 30"));
}

#[test]
fn test_config_init_refuses_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "").unwrap();

    novelvault()
        .args(["config", "init", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_config_show_masks_password() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[database]\nurl = \"postgres://reader:hunter2@db/novels\"\n").unwrap();

    novelvault()
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("postgres://reader:***@db/novels"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_missing_explicit_config_fails() {
    novelvault()
        .args(["config", "show", "--config", "/definitely/not/here.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_migrate_requires_database_url() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "").unwrap();

    novelvault()
        .args(["migrate", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("database URL not set"));
}

#[test]
fn test_serve_rejects_unknown_backend() {
    novelvault()
        .args(["serve", "--rate-limit-backend", "redis"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown rate limit backend"));
}
