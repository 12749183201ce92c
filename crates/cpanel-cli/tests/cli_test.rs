//! Integration tests for the `cpapi` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! request generation (`--dry-run`), config management and error handling.
//! The round-trip tests run the binary against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `cpapi` binary with env isolation.
///
/// Clears all `CPAPI_*` env vars and points the config file at `config`
/// so tests never touch the user's real configuration.
fn cpapi_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("cpapi");
    cmd.env("CPAPI_CONFIG", config)
        .env("HOME", "/tmp/cpapi-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/cpapi-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("CPAPI_PROFILE")
        .env_remove("CPAPI_SERVER")
        .env_remove("CPAPI_USER")
        .env_remove("CPAPI_TOKEN")
        .env_remove("CPAPI_OUTPUT")
        .env_remove("CPAPI_INSECURE")
        .env_remove("CPAPI_TIMEOUT");
    cmd
}

/// A command whose config file does not exist.
fn fresh_cmd() -> (tempfile::TempDir, assert_cmd::Command) {
    let dir = tempfile::tempdir().unwrap();
    let cmd = cpapi_cmd(&dir.path().join("config.toml"));
    (dir, cmd)
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
    let (_dir, mut cmd) = fresh_cmd();
    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let (_dir, mut cmd) = fresh_cmd();
    cmd.arg("--help").assert().success().stdout(
        predicate::str::contains("UAPI")
            .and(predicate::str::contains("call"))
            .and(predicate::str::contains("batch"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    let (_dir, mut cmd) = fresh_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cpapi"));
}

#[test]
fn test_config_subcommands_exist() {
    let (_dir, mut cmd) = fresh_cmd();
    cmd.args(["config", "--help"]).assert().success().stdout(
        predicate::str::contains("init")
            .and(predicate::str::contains("show"))
            .and(predicate::str::contains("profiles"))
            .and(predicate::str::contains("set-token")),
    );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let (_dir, mut cmd) = fresh_cmd();
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let (_dir, mut cmd) = fresh_cmd();
    cmd.args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let (_dir, mut cmd) = fresh_cmd();
    let output = cmd.arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_call_without_server_points_at_config_init() {
    let (_dir, mut cmd) = fresh_cmd();
    cmd.args(["call", "Email", "list_pops"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config init"));
}

#[test]
fn test_invalid_output_format() {
    let (_dir, mut cmd) = fresh_cmd();
    let output = cmd
        .args(["--output", "invalid", "call", "Email", "list_pops"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_unknown_filter_operator_is_usage_error() {
    let (_dir, mut cmd) = fresh_cmd();
    cmd.args([
        "call",
        "Email",
        "list_pops",
        "--filter",
        "email:near:info",
        "--dry-run",
    ])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("near"));
}

#[test]
fn test_page_zero_is_usage_error() {
    let (_dir, mut cmd) = fresh_cmd();
    cmd.args(["call", "Email", "list_pops", "--page", "0", "--dry-run"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("page"));
}

#[test]
fn test_page_past_last_record_is_usage_error() {
    let (_dir, mut cmd) = fresh_cmd();
    cmd.args([
        "call",
        "Email",
        "list_pops",
        "--page",
        "9223372036854775807",
        "--page-size",
        "4",
        "--dry-run",
    ])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("addressable record"));
}

// ── Dry run ─────────────────────────────────────────────────────────

#[test]
fn test_dry_run_prints_generated_request() {
    let (_dir, mut cmd) = fresh_cmd();
    let output = cmd
        .args([
            "-o",
            "json",
            "call",
            "Email",
            "list_pops",
            "domain=example.com",
            "--page",
            "2",
            "--page-size",
            "10",
            "--dry-run",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let generated: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(generated["verb"], "POST");
    assert_eq!(generated["url"], "/execute/Email/list_pops");
    assert_eq!(
        generated["body"],
        "domain=example.com&api.paginate=1&api.paginate_start=11&api.paginate_size=10"
    );
    assert_eq!(
        generated["headers"][0],
        json!({ "name": "Content-Type", "value": "application/x-www-form-urlencoded" })
    );
}

#[test]
fn test_dry_run_get_puts_params_in_query() {
    let (_dir, mut cmd) = fresh_cmd();
    cmd.args([
        "call",
        "Mysql",
        "list_databases",
        "--sort",
        "disk_usage:desc:numeric",
        "--verb",
        "get",
        "--dry-run",
    ])
    .assert()
    .success()
    .stdout(
        predicate::str::contains("GET /execute/Mysql/list_databases?api.sort=1")
            .and(predicate::str::contains("api.sort_reverse_0=1"))
            .and(predicate::str::contains("api.sort_method_0=numeric")),
    );
}

#[test]
fn test_dry_run_json_body() {
    let (_dir, mut cmd) = fresh_cmd();
    let output = cmd
        .args([
            "-o",
            "json",
            "call",
            "DNS",
            "mass_edit_zone",
            "zone=example.com",
            "serial:=2024010101",
            "--json-body",
            "--dry-run",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let generated: Value = serde_json::from_slice(&output.stdout).unwrap();
    let body: Value = serde_json::from_str(generated["body"].as_str().unwrap()).unwrap();
    assert_eq!(body, json!({ "zone": "example.com", "serial": 2_024_010_101_i64 }));
}

#[test]
fn test_batch_dry_run_builds_strict_call() {
    let dir = tempfile::tempdir().unwrap();
    let calls = dir.path().join("calls.json");
    std::fs::write(
        &calls,
        r#"[
            {"module": "Email", "function": "list_pops"},
            {"module": "Quota", "function": "get_quota_info"}
        ]"#,
    )
    .unwrap();

    cpapi_cmd(&dir.path().join("config.toml"))
        .args(["batch", calls.to_str().unwrap(), "--dry-run"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("POST /execute/Batch/strict")
                .and(predicate::str::contains("command="))
                .and(predicate::str::contains("command-1=")),
        );
}

// ── Config management ───────────────────────────────────────────────

#[test]
fn test_config_path_honours_env() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    cpapi_cmd(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_set_then_show_masks_token() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    cpapi_cmd(&config)
        .args(["config", "set", "server", "https://host.example.com:2083"])
        .assert()
        .success();
    cpapi_cmd(&config)
        .args(["config", "set", "token", "SUPERSECRET"])
        .assert()
        .success();

    cpapi_cmd(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.default]")
                .and(predicate::str::contains("https://host.example.com:2083"))
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("SUPERSECRET").not()),
        );

    cpapi_cmd(&config)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *"));
}

#[test]
fn test_config_rejects_bad_values() {
    let (_dir, mut cmd) = fresh_cmd();
    cmd.args(["config", "set", "server", "ftp://host"])
        .assert()
        .code(2);

    let (_dir, mut cmd) = fresh_cmd();
    cmd.args(["config", "set", "colour", "blue"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
}

#[test]
fn test_config_use_unknown_profile() {
    let (_dir, mut cmd) = fresh_cmd();
    cmd.args(["config", "use", "prod"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("prod"));
}

// ── Round trips against a mock server ───────────────────────────────

/// Run the binary on a blocking thread so the mock server keeps serving.
async fn run_cpapi(config: std::path::PathBuf, args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || cpapi_cmd(&config).args(args).output().unwrap())
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_call_renders_response_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute/Email/list_pops"))
        .and(header("authorization", "cpanel bob:TOKEN123"))
        .and(body_string("domain=example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "data": [{ "email": "info@example.com" }],
            "messages": ["Listed 1 account."]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = run_cpapi(
        dir.path().join("config.toml"),
        vec![
            "--server".into(),
            server.uri(),
            "--token".into(),
            "bob:TOKEN123".into(),
            "-o".into(),
            "json-compact".into(),
            "call".into(),
            "Email".into(),
            "list_pops".into(),
            "domain=example.com".into(),
        ],
    )
    .await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), r#"[{"email":"info@example.com"}]"#);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("info: Listed 1 account."), "{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_column_flag_projects_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute/Email/list_pops"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "data": [
                { "email": "info@example.com", "login": "info", "suspended_login": 0 },
                { "email": "sales@example.com", "login": "sales", "suspended_login": 1 }
            ]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = run_cpapi(
        dir.path().join("config.toml"),
        vec![
            "--server".into(),
            server.uri(),
            "--token".into(),
            "bob:TOKEN123".into(),
            "-o".into(),
            "json-compact".into(),
            "call".into(),
            "Email".into(),
            "list_pops".into(),
            "--column".into(),
            "email".into(),
        ],
    )
    .await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        r#"[{"email":"info@example.com"},{"email":"sales@example.com"}]"#
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_session_profile_sends_login_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cpsess42/execute/Email/list_pops"))
        .and(header("cookie", "cpsession=bob%3aSESSION"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "data": [{ "email": "info@example.com" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        format!(
            "[profiles.default]\n\
             server = \"{}\"\n\
             security_token = \"cpsess42\"\n\
             session_cookie = \"bob%3aSESSION\"\n",
            server.uri()
        ),
    )
    .unwrap();

    let output = run_cpapi(
        config,
        vec![
            "-o".into(),
            "json-compact".into(),
            "call".into(),
            "Email".into(),
            "list_pops".into(),
        ],
    )
    .await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), r#"[{"email":"info@example.com"}]"#);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_call_exits_with_api_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute/Email/add_pop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 0,
            "data": null,
            "errors": ["The account already exists."]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = run_cpapi(
        dir.path().join("config.toml"),
        vec![
            "--server".into(),
            server.uri(),
            "--token".into(),
            "bob:TOKEN123".into(),
            "call".into(),
            "Email".into(),
            "add_pop".into(),
            "email=info".into(),
        ],
    )
    .await;

    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("The account already exists."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_token_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = run_cpapi(
        dir.path().join("config.toml"),
        vec![
            "--server".into(),
            server.uri(),
            "--token".into(),
            "bob:WRONG".into(),
            "call".into(),
            "Email".into(),
            "list_pops".into(),
        ],
    )
    .await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}
