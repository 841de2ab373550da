#![allow(clippy::unwrap_used)]
// Integration tests for the `Bank` facade against a mocked account service.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cajero_api::AccountKind;
use cajero_core::{
    Bank, CoreError, Credentials, NewAccount, ServiceConfig, WithdrawalAuth, WithdrawalRequest,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Bank) {
    let server = MockServer::start().await;
    let config = ServiceConfig::new(Url::parse(&server.uri()).unwrap());
    let bank = Bank::new(config).unwrap();
    (server, bank)
}

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_owned())
}

// ── Login / profile ─────────────────────────────────────────────────

#[tokio::test]
async fn test_login_keeps_token_for_profile() {
    let (server, bank) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cuentas/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "jwt-1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cuentas/profile"))
        .and(header("authorization", "Bearer jwt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cuenta": { "numero": "03001234567", "nombre": "Ana", "monto": 90000, "tipo": "nequi" }
        })))
        .mount(&server)
        .await;

    let token = bank
        .login(Credentials::Phone {
            phone: "3001234567".into(),
            pin: secret("1234"),
            kind: AccountKind::Nequi,
        })
        .await
        .unwrap();
    assert_eq!(token.expose_secret(), "jwt-1");
    assert!(bank.is_logged_in());

    let account = bank.profile().await.unwrap();
    assert_eq!(account.name, "Ana");

    bank.logout();
    assert!(matches!(bank.profile().await, Err(CoreError::NotLoggedIn)));
}

#[tokio::test]
async fn test_login_validates_before_sending() {
    let (_server, bank) = setup().await;

    let result = bank
        .login(Credentials::Phone {
            phone: "300".into(),
            pin: secret("1234"),
            kind: AccountKind::Bancolombia,
        })
        .await;
    assert!(matches!(result, Err(CoreError::ValidationFailed { .. })));

    let result = bank
        .login(Credentials::Card {
            number: "4000".into(),
            pin: secret("12"),
        })
        .await;
    assert!(matches!(result, Err(CoreError::ValidationFailed { .. })));
}

#[tokio::test]
async fn test_register_requires_phone_for_nequi() {
    let (_server, bank) = setup().await;

    let result = bank
        .register(NewAccount {
            name: "Ana".into(),
            document: "1020".into(),
            birth_date: "1995-02-03".into(),
            phone: None,
            initial_balance: 50_000,
            pin: secret("1234"),
            kind: AccountKind::Nequi,
        })
        .await;
    assert!(matches!(result, Err(CoreError::ValidationFailed { .. })));
}

// ── Lookup ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_lookup_missing_account_is_not_found() {
    let (server, bank) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/cuentas/777"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "No existe" })))
        .mount(&server)
        .await;

    let result = bank.lookup_account(" 777 ").await;
    assert!(
        matches!(result, Err(CoreError::AccountNotFound { ref number }) if number == "777"),
        "got: {result:?}"
    );
}

// ── Codes and withdrawals ───────────────────────────────────────────

#[tokio::test]
async fn test_generate_code_then_withdraw() {
    let (server, bank) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cuentas/generar-codigo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "codigo": "482913", "message": "Código generado"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/retiros"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Retiro exitoso",
            "numero": "13001234567",
            "nuevoSaldo": 330000,
            "billetesEntregados": { "billetes": { "20000": 1, "50000": 3 } }
        })))
        .mount(&server)
        .await;

    let issued = bank
        .generate_withdrawal_code("13001234567", &secret("1234"))
        .await
        .unwrap();
    assert_eq!(issued.code, "482913");

    let session = bank.code_session();
    session.start(issued.code.clone(), Some(170_000));
    assert_eq!(session.snapshot().remaining_secs, 1800);

    let withdrawal = bank
        .withdraw(WithdrawalRequest {
            account: issued.account,
            auth: WithdrawalAuth::Code(issued.code),
            amount: 170_000,
        })
        .await
        .unwrap();
    session.close();

    assert_eq!(withdrawal.bills, vec![(50_000, 3), (20_000, 1)]);
    assert_eq!(withdrawal.new_balance, Some(330_000.0));
    assert_eq!(withdrawal.message, "Retiro exitoso");
}

#[tokio::test]
async fn test_withdraw_rejects_odd_amounts_locally() {
    let (_server, bank) = setup().await;

    let result = bank
        .withdraw(WithdrawalRequest {
            account: "13001234567".into(),
            auth: WithdrawalAuth::Code("482913".into()),
            amount: 25_000,
        })
        .await;
    assert!(matches!(result, Err(CoreError::ValidationFailed { .. })));
}

#[tokio::test]
async fn test_service_rejection_is_surfaced() {
    let (server, bank) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/retiros"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Código inválido" })),
        )
        .mount(&server)
        .await;

    let result = bank
        .withdraw(WithdrawalRequest {
            account: "13001234567".into(),
            auth: WithdrawalAuth::Pin(secret("1234")),
            amount: 10_000,
        })
        .await;
    assert!(
        matches!(result, Err(CoreError::Rejected { ref message, .. }) if message == "Código inválido")
    );
}
