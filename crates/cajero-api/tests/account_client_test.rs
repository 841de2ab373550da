#![allow(clippy::unwrap_used)]
// Integration tests for `AccountClient` using wiremock.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cajero_api::{
    AccountClient, AccountKind, Credentials, Error, NewAccount, WithdrawalAuth, WithdrawalRequest,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, AccountClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = AccountClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn pin(value: &str) -> SecretString {
    SecretString::from(value.to_owned())
}

// ── Registration ────────────────────────────────────────────────────

#[tokio::test]
async fn test_register_card_account() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cuentas"))
        .and(body_json(json!({
            "nombre": "Luis Pérez",
            "cedula": "1020304050",
            "fechaNacimiento": "1990-04-12",
            "monto": 100000,
            "clave": "1234",
            "tipo": "tarjeta"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Cuenta creada",
            "cuenta": {
                "numero": "4000123412341234",
                "nombre": "Luis Pérez",
                "tipo": "tarjeta",
                "monto": 100000,
                "numeroTarjeta": "4000123412341234",
                "cvv": "321",
                "fechaVencimiento": "10/30"
            }
        })))
        .mount(&server)
        .await;

    let account = client
        .register(&NewAccount {
            name: "Luis Pérez".into(),
            document: "1020304050".into(),
            birth_date: "1990-04-12".into(),
            phone: None,
            initial_balance: 100_000,
            pin: pin("1234"),
            kind: AccountKind::Tarjeta,
        })
        .await
        .unwrap();

    assert_eq!(account.kind, Some(AccountKind::Tarjeta));
    assert_eq!(account.cvv.as_deref(), Some("321"));
}

#[tokio::test]
async fn test_register_duplicate_is_rejected_with_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cuentas"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "La cuenta ya existe" })),
        )
        .mount(&server)
        .await;

    let result = client
        .register(&NewAccount {
            name: "Ana".into(),
            document: "1".into(),
            birth_date: "2000-01-01".into(),
            phone: Some("3001234567".into()),
            initial_balance: 0,
            pin: pin("0000"),
            kind: AccountKind::Nequi,
        })
        .await;

    match result {
        Err(Error::Rejected { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "La cuenta ya existe");
        }
        other => panic!("expected Rejected, got: {other:?}"),
    }
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_with_phone() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cuentas/login"))
        .and(body_json(json!({
            "telefono": "3001234567",
            "clave": "1234",
            "tipo": "nequi"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": "jwt-abc", "message": "Bienvenido" })),
        )
        .mount(&server)
        .await;

    let token = client
        .login(&Credentials::Phone {
            phone: "3001234567".into(),
            pin: pin("1234"),
            kind: AccountKind::Nequi,
        })
        .await
        .unwrap();

    assert_eq!(token.expose_secret(), "jwt-abc");
}

#[tokio::test]
async fn test_login_with_card_sends_number() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cuentas/login"))
        .and(body_json(json!({ "numero": "4000123412341234", "clave": "9876" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t" })))
        .mount(&server)
        .await;

    client
        .login(&Credentials::Card {
            number: "4000123412341234".into(),
            pin: pin("9876"),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_login_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cuentas/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Clave incorrecta" })),
        )
        .mount(&server)
        .await;

    let result = client
        .login(&Credentials::Card {
            number: "1".into(),
            pin: pin("0000"),
        })
        .await;

    assert!(
        matches!(result, Err(Error::Authentication { ref message }) if message == "Clave incorrecta"),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_without_token_is_auth_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cuentas/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .mount(&server)
        .await;

    let result = client
        .login(&Credentials::Card {
            number: "1".into(),
            pin: pin("0000"),
        })
        .await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

// ── Profile & transactions ──────────────────────────────────────────

#[tokio::test]
async fn test_profile_sends_bearer_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/cuentas/profile"))
        .and(header("authorization", "Bearer jwt-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cuenta": {
                "nombre": "Ana",
                "telefono": "3001234567",
                "monto": 480000,
                "tipo": "bancolombia",
                "numero": "13001234567"
            }
        })))
        .mount(&server)
        .await;

    let account = client.profile(&pin("jwt-abc")).await.unwrap();
    assert_eq!(account.number, "13001234567");
    assert_eq!(account.name, "Ana");
}

#[tokio::test]
async fn test_profile_with_expired_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/cuentas/profile"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Token inválido" })),
        )
        .mount(&server)
        .await;

    let err = client.profile(&pin("stale")).await.unwrap_err();
    assert!(err.is_auth_expired());
}

#[tokio::test]
async fn test_transactions() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/cuentas/transactions"))
        .and(header("authorization", "Bearer jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [
                { "_id": "a", "type": "retiro", "date": "2024-06-01T10:00:00Z", "amount": 50000, "status": "completado" },
                { "_id": "b", "type": "deposito", "date": "2024-05-28T09:00:00Z", "amount": 120000, "status": "completado" }
            ]
        })))
        .mount(&server)
        .await;

    let txs = client.transactions(&pin("jwt")).await.unwrap();
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[0].kind, "retiro");
    assert_eq!(txs[1].id.as_deref(), Some("b"));
}

// ── Lookup ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_lookup_account_includes_history() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/cuentas/4000123412341234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cuenta": {
                "numero": "4000123412341234",
                "nombre": "Luis",
                "tipo": "tarjeta",
                "monto": 90000,
                "transacciones": [ { "tipo": "retiro", "monto": 10000, "fecha": "2024-06-01" } ]
            }
        })))
        .mount(&server)
        .await;

    let account = client.lookup_account("4000123412341234").await.unwrap();
    assert_eq!(account.history.len(), 1);
}

#[tokio::test]
async fn test_lookup_missing_account() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/cuentas/999"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Cuenta no encontrada" })),
        )
        .mount(&server)
        .await;

    let err = client.lookup_account("999").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.service_message(), Some("Cuenta no encontrada"));
}

// ── Withdrawal codes ────────────────────────────────────────────────

#[tokio::test]
async fn test_generate_withdrawal_code() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cuentas/generar-codigo"))
        .and(body_json(json!({ "numero": "13001234567", "clave": "1234" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "codigo": "482913",
            "message": "Código generado"
        })))
        .mount(&server)
        .await;

    let generated = client
        .generate_withdrawal_code("13001234567", &pin("1234"))
        .await
        .unwrap();
    assert_eq!(generated.code.as_deref(), Some("482913"));
}

#[tokio::test]
async fn test_generate_code_without_codigo_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cuentas/generar-codigo"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "Clave incorrecta" })),
        )
        .mount(&server)
        .await;

    let result = client.generate_withdrawal_code("1", &pin("0000")).await;
    assert!(
        matches!(result, Err(Error::Rejected { ref message, .. }) if message == "Clave incorrecta"),
        "got: {result:?}"
    );
}

// ── Withdrawals ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_withdraw_with_code() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/retiros"))
        .and(body_json(json!({ "numero": "13001234567", "codigo": "482913", "monto": 70000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Retiro exitoso",
            "numero": "13001234567",
            "nuevoSaldo": 410000,
            "billetesEntregados": { "billetes": { "50000": 1, "20000": 1 } }
        })))
        .mount(&server)
        .await;

    let receipt = client
        .withdraw(&WithdrawalRequest {
            account: "13001234567".into(),
            auth: WithdrawalAuth::Code("482913".into()),
            amount: 70_000,
        })
        .await
        .unwrap();

    assert_eq!(receipt.new_balance, Some(410_000.0));
    assert_eq!(receipt.dispensed.unwrap().bills.len(), 2);
}

#[tokio::test]
async fn test_withdraw_with_card_pin() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/retiros"))
        .and(body_json(json!({ "numero": "4000", "clave": "1234", "monto": 10000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Retiro exitoso",
            "nuevoSaldo": 0
        })))
        .mount(&server)
        .await;

    let receipt = client
        .withdraw(&WithdrawalRequest {
            account: "4000".into(),
            auth: WithdrawalAuth::Pin(pin("1234")),
            amount: 10_000,
        })
        .await
        .unwrap();
    assert!(receipt.is_success());
}

#[tokio::test]
async fn test_withdraw_expired_code() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/retiros"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Código expirado" })),
        )
        .mount(&server)
        .await;

    let err = client
        .withdraw(&WithdrawalRequest {
            account: "1".into(),
            auth: WithdrawalAuth::Code("000000".into()),
            amount: 10_000,
        })
        .await
        .unwrap_err();
    assert_eq!(err.service_message(), Some("Código expirado"));
}

#[tokio::test]
async fn test_withdraw_unconfirmed_message_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/retiros"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "Saldo insuficiente" })),
        )
        .mount(&server)
        .await;

    let err = client
        .withdraw(&WithdrawalRequest {
            account: "1".into(),
            auth: WithdrawalAuth::Code("1".into()),
            amount: 10_000,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Rejected { .. }));
}

#[tokio::test]
async fn test_non_json_error_body_is_previewed() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/cuentas/profile"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client.profile(&pin("t")).await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.service_message(), Some("Bad Gateway"));
}
