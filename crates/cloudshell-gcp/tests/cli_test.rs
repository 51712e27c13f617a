//! Integration tests for the `cloudshell-gcp` CLI binary.
//!
//! Argument parsing, help output, completions and error exit codes run
//! without any network; the `rules` test talks to a wiremock Compute API.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `cloudshell-gcp` binary with env isolation.
///
/// Clears all `CLOUDSHELL_GCP_*` env vars and points config directories at
/// a nonexistent path so tests never touch the user's real configuration.
fn gcp_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("cloudshell-gcp");
    cmd.env("HOME", "/tmp/cloudshell-gcp-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/cloudshell-gcp-test-nonexistent")
        .env_remove("CLOUDSHELL_GCP_PROFILE")
        .env_remove("CLOUDSHELL_GCP_PROJECT")
        .env_remove("CLOUDSHELL_GCP_ACCESS_TOKEN")
        .env_remove("CLOUDSHELL_GCP_API_BASE")
        .env_remove("CLOUDSHELL_GCP_OUTPUT")
        .env_remove("CLOUDSHELL_GCP_TIMEOUT")
        .env_remove("CLOUDSHELL_GCP_DEFAULTS__OUTPUT")
        .env_remove("RUST_LOG");
    cmd
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
    let output = gcp_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    gcp_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("prepare")
            .and(predicate::str::contains("inbound"))
            .and(predicate::str::contains("cleanup"))
            .and(predicate::str::contains("rules")),
    );
}

#[test]
fn test_version_flag() {
    gcp_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cloudshell-gcp"));
}

#[test]
fn test_prepare_requires_sandbox_cidr() {
    let output = gcp_cmd()
        .args(["prepare", "--network", "quali-sb"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--sandbox-cidr"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    gcp_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_invalid_shell() {
    gcp_cmd().args(["completions", "tcsh"]).assert().failure();
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_vpc_name_is_derived_from_reservation() {
    gcp_cmd()
        .args(["vpc-name", "3F2A-77B1"])
        .assert()
        .success()
        .stdout("quali-3f2a-77b1\n");
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_rules_without_config_is_usage_error() {
    let output = gcp_cmd()
        .args(["rules", "--network", "quali-sb"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("No project configured"),
        "Expected config hint in output:\n{text}"
    );
}

#[test]
fn test_missing_token_is_auth_error() {
    let output = gcp_cmd()
        .args(["--project", "demo", "rules", "--network", "quali-sb"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_unknown_profile_is_not_found() {
    let output = gcp_cmd()
        .args(["--profile", "nope", "rules", "--network", "quali-sb"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("nope"));
}

#[test]
fn test_inbound_rejects_bad_ports_before_connecting() {
    let output = gcp_cmd()
        .args([
            "--project",
            "demo",
            "--access-token",
            "t",
            "--api-base",
            "http://127.0.0.1:9",
            "inbound",
            "--network",
            "quali-sb",
            "--vm",
            "web-1",
            "--tag",
            "web-1",
            "--ports",
            "70000",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("ports"));
}

// ── Against a mock Compute API ──────────────────────────────────────

/// Two rules on `quali-sb`, returned out of priority order.
async fn mount_firewall_list(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/compute/v1/projects/demo/global/firewalls"))
        .and(header("authorization", "Bearer ya29.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "name": "sentinel",
                    "network": "projects/demo/global/networks/quali-sb",
                    "priority": 4090,
                    "direction": "INGRESS",
                    "denied": [{ "IPProtocol": "all" }],
                    "sourceRanges": ["0.0.0.0/0"]
                },
                {
                    "name": "allow-subnet",
                    "network": "projects/demo/global/networks/quali-sb",
                    "priority": 2001,
                    "direction": "INGRESS",
                    "allowed": [{ "IPProtocol": "all" }],
                    "sourceRanges": ["10.10.0.0/16"]
                }
            ]
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Run `rules --network quali-sb` against `uri` with extra env and args.
async fn run_rules(
    uri: String,
    env: Vec<(&'static str, &'static str)>,
    extra: Vec<&'static str>,
) -> std::process::Output {
    tokio::task::spawn_blocking(move || {
        let mut cmd = gcp_cmd();
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.args([
            "--project",
            "demo",
            "--access-token",
            "ya29.test",
            "--api-base",
            &uri,
        ])
        .args(extra)
        .args(["rules", "--network", "quali-sb"])
        .output()
        .unwrap()
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rules_lists_by_priority() {
    let server = MockServer::start().await;
    mount_firewall_list(&server).await;

    let output = run_rules(server.uri(), vec![], vec!["-o", "plain"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "allow-subnet\nsentinel\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_config_default_output_applies_without_flag() {
    let server = MockServer::start().await;
    mount_firewall_list(&server).await;

    let output = run_rules(
        server.uri(),
        vec![("CLOUDSHELL_GCP_DEFAULTS__OUTPUT", "plain")],
        vec![],
    )
    .await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "allow-subnet\nsentinel\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_output_flag_beats_config_default() {
    let server = MockServer::start().await;
    mount_firewall_list(&server).await;

    let output = run_rules(
        server.uri(),
        vec![("CLOUDSHELL_GCP_DEFAULTS__OUTPUT", "plain")],
        vec!["-o", "json-compact"],
    )
    .await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with('['), "{stdout}");
    assert!(stdout.contains(r#""name":"allow-subnet""#), "{stdout}");
}

#[test]
fn test_invalid_config_default_output_is_usage_error() {
    let output = gcp_cmd()
        .env("CLOUDSHELL_GCP_DEFAULTS__OUTPUT", "xml")
        .args([
            "--project",
            "demo",
            "--access-token",
            "t",
            "--api-base",
            "http://127.0.0.1:9",
            "rules",
            "--network",
            "quali-sb",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("defaults.output"));
}
