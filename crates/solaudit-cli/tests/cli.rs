#![allow(deprecated)]

use assert_cmd::Command;
use chrono::Utc;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Isolated config and state directory for one test.
struct Sandbox {
    dir: TempDir,
    config: PathBuf,
}

impl Sandbox {
    fn new(extra_config: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = dir.path().join("config.toml");
        let state = dir.path().join("state.json").display().to_string();
        std::fs::write(
            &config,
            format!("{extra_config}\n[audit]\nstate_path = {state:?}\n"),
        )
        .expect("write config");
        Self { dir, config }
    }

    fn state_path(&self) -> PathBuf {
        self.dir.path().join("state.json")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("solaudit").expect("binary should be built");
        cmd.arg("--config").arg(&self.config);
        for var in [
            "GEMINI_API_KEY",
            "OPENAI_API_KEY",
            "OLLAMA_MODEL",
            "SOLAUDIT_BACKEND",
            "SOLAUDIT_MODEL",
            "SOLAUDIT_WALLET_URL",
            "SOLAUDIT_COOLDOWN_SECS",
            "RUST_LOG",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }
}

fn fixture(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

fn write_state(path: &Path, last_completed_at: &str) {
    std::fs::write(
        path,
        format!("{{\"last_completed_at\": \"{last_completed_at}\", \"last_audit\": null}}"),
    )
    .expect("write state");
}

#[test]
fn chains_text_lists_all_networks() {
    Sandbox::new("")
        .cmd()
        .arg("chains")
        .assert()
        .success()
        .stdout(predicate::str::contains("lineaSepolia"))
        .stdout(predicate::str::contains("0xE705"))
        .stdout(predicate::str::contains("EDU Chain Testnet"))
        .stdout(predicate::str::contains("0xF887B4D3b17C12C86cc917cF72fb8881f866a847"));
}

#[test]
fn chains_json_has_registry_addresses() {
    let output = Sandbox::new("")
        .cmd()
        .args(["chains", "--format", "json"])
        .output()
        .expect("command should run");

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    let chains = parsed.as_array().unwrap();
    assert_eq!(chains.len(), 8);
    assert_eq!(chains[0]["key"], "lineaSepolia");
    assert_eq!(
        chains[0]["registryAddress"],
        "0x03c4fb7563e593ca0625C1c64959AC56081785cE"
    );
    assert_eq!(chains[6]["blockExplorerUrls"].as_array().unwrap().len(), 2);
}

#[test]
fn templates_lists_every_template() {
    Sandbox::new("")
        .cmd()
        .arg("templates")
        .assert()
        .success()
        .stdout(predicate::str::contains("ERC20 Token"))
        .stdout(predicate::str::contains("NFT Collection"))
        .stdout(predicate::str::contains("Custom Contract"));
}

#[test]
fn sanitize_caps_rating_for_critical_findings() {
    Sandbox::new("")
        .cmd()
        .arg("sanitize")
        .arg(fixture("audit_response.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Rating: ★★☆☆☆ (2/5)"))
        .stdout(predicate::str::contains("Critical:\n  - Reentrancy in withdraw()"))
        .stdout(predicate::str::contains("R-CRIT-01"));
}

#[test]
fn sanitize_json_output_records_policy() {
    let output = Sandbox::new("")
        .cmd()
        .arg("sanitize")
        .arg(fixture("audit_response.txt"))
        .args(["--format", "json"])
        .output()
        .expect("command should run");

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["result"]["stars"], 2);
    assert_eq!(parsed["policy"]["model_stars"], 4);
    assert_eq!(
        parsed["result"]["gasOptimizations"][0],
        "Cache balances[msg.sender] in memory"
    );
}

#[test]
fn sanitize_prose_response_fails() {
    Sandbox::new("")
        .cmd()
        .arg("sanitize")
        .arg(fixture("prose_response.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find valid JSON"));
}

#[test]
fn audit_rejects_non_solidity_before_contacting_service() {
    Sandbox::new("")
        .cmd()
        .arg("audit")
        .arg(fixture("no_pragma.sol"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing pragma directive"))
        .stderr(predicate::str::contains("GEMINI_API_KEY").not());
}

#[test]
fn audit_without_api_key_names_the_variable() {
    Sandbox::new("")
        .cmd()
        .arg("audit")
        .arg(fixture("vault.sol"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn audit_inside_cooldown_is_rejected() {
    let sandbox = Sandbox::new("[ai]\napi_key = \"test-key\"\n");
    write_state(&sandbox.state_path(), &Utc::now().to_rfc3339());

    sandbox
        .cmd()
        .arg("audit")
        .arg(fixture("vault.sol"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cooling down"));
}

#[test]
fn register_without_audit_fails() {
    Sandbox::new("")
        .cmd()
        .arg("register")
        .arg(fixture("vault.sol"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("run an audit first"));
}

#[test]
fn build_falls_back_to_base_code_when_service_unreachable() {
    let sandbox = Sandbox::new(
        "[ai]\napi_key = \"test-key\"\nendpoint = \"http://127.0.0.1:9/\"\ntimeout_secs = 5\n",
    );

    sandbox
        .cmd()
        .args(["build", "--template", "erc20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pragma solidity ^0.8.19;"))
        .stdout(predicate::str::contains("contract CustomToken"))
        .stderr(predicate::str::contains("base code"));
}

#[test]
fn unknown_network_is_rejected_by_parser() {
    Sandbox::new("")
        .cmd()
        .args(["switch-network", "mainnet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lineaSepolia"));
}

#[test]
fn malformed_template_param_is_rejected() {
    Sandbox::new("")
        .cmd()
        .args(["build", "--param", "no-equals-sign"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}
