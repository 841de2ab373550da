//! Integration tests for the `cajero` CLI binary.
//!
//! Parsing, help, completions and config handling run offline; service
//! flows run against a wiremock account service.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `cajero` binary with env isolation.
///
/// Clears all `CAJERO_*` env vars and points the config file into `home`
/// so tests never touch the user's real configuration or keyring.
fn cajero_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("cajero");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env("CAJERO_CONFIG", home.join("config.toml"))
        .env("CAJERO_TOKEN", "test-token")
        .env("NO_COLOR", "1")
        .env_remove("CAJERO_PROFILE")
        .env_remove("CAJERO_URL")
        .env_remove("CAJERO_PROVIDER")
        .env_remove("CAJERO_OUTPUT")
        .env_remove("CAJERO_INSECURE")
        .env_remove("CAJERO_TIMEOUT")
        .env_remove("CAJERO_PIN")
        .env_remove("CAJERO_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = cajero_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("withdrawal")
            .and(predicate::str::contains("atm"))
            .and(predicate::str::contains("code")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cajero"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Validation happens before any request ───────────────────────────

#[test]
fn test_short_pin_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .args(["--url", "http://127.0.0.1:9", "login", "--card", "4000", "--pin", "12"])
        .assert()
        .code(2);
}

#[test]
fn test_odd_amount_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .args([
            "--url",
            "http://127.0.0.1:9",
            "-P",
            "tarjeta",
            "withdraw",
            "--account",
            "4000",
            "--amount",
            "15000",
            "--pin",
            "1234",
            "--yes",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("10"));
}

#[test]
fn test_code_generate_needs_an_account() {
    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .args(["code", "generate", "--pin", "1234"])
        .assert()
        .code(2);
}

#[test]
fn test_cards_do_not_get_codes() {
    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .args(["-P", "card", "code", "generate", "-a", "4000", "--pin", "1234"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("PIN"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_set_show_and_use() {
    let home = tempfile::tempdir().unwrap();

    cajero_cmd(home.path())
        .args(["config", "set", "url", "https://bank.example"])
        .assert()
        .success();
    cajero_cmd(home.path())
        .args(["config", "set", "provider", "nequi"])
        .assert()
        .success();
    cajero_cmd(home.path())
        .args(["-p", "work", "config", "set", "account", "3001234567"])
        .assert()
        .success();

    cajero_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("url = \"https://bank.example\"")
                .and(predicate::str::contains("provider = \"nequi\""))
                .and(predicate::str::contains("******4567")),
        );

    cajero_cmd(home.path())
        .args(["config", "use", "work"])
        .assert()
        .success();
    cajero_cmd(home.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("work *"));

    let raw = std::fs::read_to_string(home.path().join("config.toml")).unwrap();
    assert!(raw.contains("default_profile = \"work\""));
}

#[test]
fn test_config_use_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .args(["config", "use", "nope"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_config_set_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .args(["config", "set", "colour", "red"])
        .assert()
        .code(2);
}

// ── Service flows ───────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_lookup_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/cuentas/4000123412341234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cuenta": {
                "numero": "4000123412341234",
                "nombre": "Luis",
                "tipo": "tarjeta",
                "monto": 90000
            }
        })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .args(["--url", &server.uri(), "-o", "json", "account", "lookup", "4000123412341234"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"nombre\": \"Luis\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_lookup_missing_account() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/cuentas/999"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Cuenta no encontrada" })),
        )
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .args(["--url", &server.uri(), "account", "lookup", "999"])
        .assert()
        .code(4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_transactions_with_expired_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/cuentas/transactions"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Token inválido" })),
        )
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .args(["--url", &server.uri(), "transactions"])
        .assert()
        .code(3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_transactions_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/cuentas/transactions"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [
                { "_id": "t1", "tipo": "retiro", "monto": 50000, "estado": "completado" },
                { "_id": "t2", "tipo": "deposito", "monto": 20000, "fecha": "not-a-date" }
            ]
        })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .args(["--url", &server.uri(), "transactions"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Type")
                .and(predicate::str::contains("retiro"))
                .and(predicate::str::contains("completado"))
                .and(predicate::str::contains("not-a-date")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_card_withdrawal_receipt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/retiros"))
        .and(body_json(json!({ "numero": "4000123412341234", "clave": "1234", "monto": 70000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Retiro exitoso",
            "numero": "4000123412341234",
            "nuevoSaldo": 20000,
            "billetesEntregados": { "billetes": { "50000": 1, "20000": 1 } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .args([
            "--url",
            &server.uri(),
            "-P",
            "tarjeta",
            "-y",
            "withdraw",
            "-a",
            "4000123412341234",
            "--amount",
            "$ 70.000",
            "--pin",
            "1234",
        ])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Retiro exitoso")
                .and(predicate::str::contains("$ 50.000"))
                .and(predicate::str::contains("$ 20.000")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_copy_only_prints_raw_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/cuentas/generar-codigo"))
        .and(body_json(json!({ "numero": "3001234567", "clave": "1234" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "codigo": "482913",
            "message": "Código generado"
        })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let output = cajero_cmd(home.path())
        .args([
            "--url",
            &server.uri(),
            "-P",
            "nequi",
            "code",
            "generate",
            "-a",
            "3001234567",
            "--copy-only",
            "--pin",
            "1234",
        ])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "482913");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_atm_redeems_issued_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/cuentas/generar-codigo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "codigo": "777111" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/retiros"))
        .and(body_json(json!({ "numero": "3001234567", "codigo": "777111", "monto": 10000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Retiro exitoso",
            "nuevoSaldo": 90000,
            "billetesEntregados": { "billetes": { "10000": 1 } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .args([
            "--url",
            &server.uri(),
            "-P",
            "bancolombia",
            "atm",
            "-a",
            "3001234567",
            "--amount",
            "10000",
            "--pin",
            "1234",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("$ 90.000"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_code_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/retiros"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Código inválido" })),
        )
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    cajero_cmd(home.path())
        .args([
            "--url",
            &server.uri(),
            "-P",
            "nequi",
            "-y",
            "withdraw",
            "-a",
            "3001234567",
            "--amount",
            "20000",
            "--code",
            "000000",
        ])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Código inválido"));
}
