//! Integration tests for the `livemap` CLI binary.
//!
//! These tests validate argument parsing, help output, configuration
//! handling, and error exit codes, all without a live map server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

/// Nothing listens here; requests fail fast.
const DEAD_SERVER: &str = "http://127.0.0.1:9";

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `livemap` binary with env isolation.
///
/// Clears all `LIVEMAP_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn livemap_cmd_in(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("livemap");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("LIVEMAP_PROFILE")
        .env_remove("LIVEMAP_SERVER")
        .env_remove("LIVEMAP_SOCKET")
        .env_remove("LIVEMAP_TOKEN")
        .env_remove("LIVEMAP_OUTPUT")
        .env_remove("LIVEMAP_INSECURE")
        .env_remove("LIVEMAP_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn livemap_cmd() -> assert_cmd::Command {
    livemap_cmd_in(Path::new("/tmp/livemap-cli-test-nonexistent"))
}

/// Write a config file where `directories` will look for it.
fn write_config(home: &Path, contents: &str) {
    let dir = home.join(".config").join("livemap");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = livemap_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    livemap_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("watch")
            .and(predicate::str::contains("search"))
            .and(predicate::str::contains("open"))
            .and(predicate::str::contains("regions")),
    );
}

#[test]
fn test_version_flag() {
    livemap_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("livemap"));
}

#[test]
fn test_completions_zsh() {
    livemap_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_subcommand() {
    let output = livemap_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(text.contains("foobar"), "Expected error mentioning foobar:\n{text}");
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_config_path_points_into_config_dir() {
    let home = tempfile::tempdir().unwrap();
    livemap_cmd_in(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("livemap").and(predicate::str::contains("config.toml")));
}

#[test]
fn test_config_show_reads_profile() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        r#"
default_profile = "home"

[profiles.home]
server = "https://map.example.org"
timeout = 7
"#,
    );

    livemap_cmd_in(home.path())
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"profile\": \"home\"")
                .and(predicate::str::contains("https://map.example.org"))
                .and(predicate::str::contains("\"timeout\": 7")),
        );
}

#[test]
fn test_search_without_server_is_a_usage_error() {
    livemap_cmd()
        .args(["search", "spawn"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No map server configured"));
}

#[test]
fn test_unknown_profile_lists_available() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        r#"
[profiles.home]
server = "https://map.example.org"
"#,
    );

    livemap_cmd_in(home.path())
        .args(["--profile", "work", "search", "spawn"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("work").and(predicate::str::contains("home")));
}

// ── Commands against an unreachable server ──────────────────────────

#[test]
fn test_coordinate_search_needs_no_network() {
    livemap_cmd()
        .args(["--server", DEAD_SERVER, "search", "52.52, 13.40", "--no-regions", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Go to coordinates").and(predicate::str::contains("52.52")));
}

#[test]
fn test_open_rejects_path_traversal() {
    livemap_cmd()
        .args(["--server", DEAD_SERVER, "open", "../etc/passwd"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("region"));
}

#[test]
fn test_regions_delete_rejects_bad_id() {
    livemap_cmd()
        .args(["--server", DEAD_SERVER, "regions", "delete", "1234", "--yes"])
        .assert()
        .code(2);
}

#[test]
fn test_regions_delete_requires_confirmation() {
    livemap_cmd()
        .args([
            "--server",
            DEAD_SERVER,
            "regions",
            "delete",
            "550e8400-e29b-41d4-a716-446655440000",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn test_regions_list_without_token_is_an_auth_error() {
    livemap_cmd()
        .args(["--server", DEAD_SERVER, "regions", "list"])
        .assert()
        .code(3);
}
