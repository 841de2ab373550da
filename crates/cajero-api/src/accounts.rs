// Account endpoints: registration, login, profile and lookup.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::AccountClient;
use crate::error::Error;
use crate::models::{
    Account, AccountEnvelope, Credentials, LoginResponse, NewAccount, RegisterResponse,
    Transaction, TransactionsEnvelope,
};

impl AccountClient {
    /// Open a new account.
    ///
    /// `POST /api/cuentas`. Card accounts come back with their card
    /// number, CVV and expiry filled in.
    pub async fn register(&self, account: &NewAccount) -> Result<Account, Error> {
        let url = self.api_url("cuentas")?;
        debug!(kind = %account.kind, "registering account");

        let mut body = json!({
            "nombre": account.name,
            "cedula": account.document,
            "fechaNacimiento": account.birth_date,
            "monto": account.initial_balance,
            "clave": account.pin.expose_secret(),
            "tipo": account.kind.as_str(),
        });
        if let Some(phone) = &account.phone {
            body["telefono"] = json!(phone);
        }

        let resp: RegisterResponse = self.post(url, &body).await?;
        if let Some(message) = &resp.message {
            debug!(message, "account registered");
        }
        Ok(resp.cuenta)
    }

    /// Exchange credentials for a bearer token.
    ///
    /// `POST /api/cuentas/login`
    pub async fn login(&self, credentials: &Credentials) -> Result<SecretString, Error> {
        let url = self.api_url("cuentas/login")?;

        let body = match credentials {
            Credentials::Phone { phone, pin, kind } => {
                debug!(%kind, "logging in with phone");
                json!({
                    "telefono": phone,
                    "clave": pin.expose_secret(),
                    "tipo": kind.as_str(),
                })
            }
            Credentials::Card { number, pin } => {
                debug!("logging in with card");
                json!({
                    "numero": number,
                    "clave": pin.expose_secret(),
                })
            }
        };

        let resp: LoginResponse = self.post(url, &body).await.map_err(|e| match e {
            Error::Rejected { status, message } if status == 400 || status == 403 => {
                Error::Authentication { message }
            }
            other => other,
        })?;

        let token = resp.token.ok_or_else(|| Error::Authentication {
            message: resp
                .message
                .unwrap_or_else(|| "login response carried no token".into()),
        })?;

        debug!("login successful");
        Ok(SecretString::from(token))
    }

    /// The account behind a bearer token.
    ///
    /// `GET /api/cuentas/profile`
    pub async fn profile(&self, token: &SecretString) -> Result<Account, Error> {
        let url = self.api_url("cuentas/profile")?;
        let envelope: AccountEnvelope = self.get(url, Some(token)).await?;
        envelope.cuenta.ok_or_else(|| Error::Rejected {
            status: 404,
            message: envelope
                .message
                .unwrap_or_else(|| "profile response carried no account".into()),
        })
    }

    /// Recent movements for the logged-in account.
    ///
    /// `GET /api/cuentas/transactions`
    pub async fn transactions(&self, token: &SecretString) -> Result<Vec<Transaction>, Error> {
        let url = self.api_url("cuentas/transactions")?;
        let envelope: TransactionsEnvelope = self.get(url, Some(token)).await?;
        debug!(count = envelope.transactions.len(), "transactions fetched");
        Ok(envelope.transactions)
    }

    /// Public lookup of an account by number, history included.
    ///
    /// `GET /api/cuentas/{numero}`
    pub async fn lookup_account(&self, number: &str) -> Result<Account, Error> {
        let url = self.api_url_with_segment("cuentas", number)?;
        let envelope: AccountEnvelope = self.get(url, None).await?;
        envelope.cuenta.ok_or_else(|| Error::Rejected {
            status: 404,
            message: envelope
                .message
                .unwrap_or_else(|| format!("no account with number {number}")),
        })
    }
}
