//! CLI integration tests for mongo-bq-migrate.
//!
//! These tests verify command-line argument parsing, help output,
//! and exit codes for configuration errors.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the mongo-bq-migrate binary.
fn cmd() -> Command {
    Command::cargo_bin("mongo-bq-migrate").unwrap()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("health-check"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_run_subcommand_help() {
    cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--collection"))
        .stdout(predicate::str::contains("--table"))
        .stdout(predicate::str::contains("--batch-size"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mongo-bq-migrate"));
}

// =============================================================================
// Configuration Error Tests
// =============================================================================

#[test]
fn test_run_requires_collection_and_table() {
    cmd().arg("run").assert().failure();
}

#[test]
fn test_missing_env_config_is_a_config_error() {
    cmd()
        .args(["run", "--collection", "orders", "--table", "orders"])
        .env_remove("MONGODB_URI")
        .env_remove("MONGODB_DATABASE_NAME")
        .env_remove("BIGQUERY_PROJECT_ID")
        .env_remove("BIGQUERY_DATASET_ID")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("MONGODB_URI"));
}

#[test]
fn test_invalid_batch_size_env_is_rejected() {
    cmd()
        .args(["health-check"])
        .env("MONGODB_URI", "mongodb://localhost:27017")
        .env("MONGODB_DATABASE_NAME", "appdata")
        .env("BIGQUERY_PROJECT_ID", "p")
        .env("BIGQUERY_DATASET_ID", "d")
        .env("BATCH_INSERT_SIZE", "not-a-number")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("BATCH_INSERT_SIZE"));
}

#[test]
fn test_missing_config_file_fails() {
    cmd()
        .args([
            "--config",
            "/nonexistent/config.yaml",
            "run",
            "--collection",
            "orders",
            "--table",
            "orders",
        ])
        .assert()
        .failure();
}
