// ── Bank facade ──
//
// Single entry point the front ends talk to. Validates input, forwards to
// the account service and keeps the bearer token for the profile routes.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, info};

use cajero_api::{
    Account, AccountClient, Credentials, NewAccount, Transaction, WithdrawalAuth,
    WithdrawalRequest,
};

use crate::config::ServiceConfig;
use crate::error::CoreError;
use crate::money::bill_breakdown;
use crate::session::CodeSession;
use crate::validate;

/// A code the service issued for a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedCode {
    pub account: String,
    pub code: String,
    pub message: Option<String>,
}

/// A completed withdrawal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Withdrawal {
    pub account: String,
    pub amount: u64,
    pub new_balance: Option<f64>,
    /// `(denomination, count)`, largest denomination first.
    pub bills: Vec<(u64, u32)>,
    pub message: String,
}

/// Cheaply cloneable handle on the account service.
#[derive(Clone)]
pub struct Bank {
    inner: Arc<BankInner>,
}

struct BankInner {
    config: ServiceConfig,
    client: AccountClient,
    token: RwLock<Option<SecretString>>,
}

impl Bank {
    pub fn new(config: ServiceConfig) -> Result<Self, CoreError> {
        let client = AccountClient::new(config.url.clone(), &config.transport())?;
        Ok(Self {
            inner: Arc::new(BankInner {
                config,
                client,
                token: RwLock::new(None),
            }),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// A fresh code session using the configured validity.
    pub fn code_session(&self) -> CodeSession {
        CodeSession::new(self.inner.config.code_validity)
    }

    // ── Token ────────────────────────────────────────────────────────

    /// Adopt a token obtained earlier (e.g. from the keyring).
    pub fn set_token(&self, token: SecretString) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn token(&self) -> Option<SecretString> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    fn require_token(&self) -> Result<SecretString, CoreError> {
        self.token().ok_or(CoreError::NotLoggedIn)
    }

    // ── Accounts ─────────────────────────────────────────────────────

    pub async fn register(&self, account: NewAccount) -> Result<Account, CoreError> {
        validate::non_empty("name", &account.name)?;
        validate::non_empty("document", &account.document)?;
        validate::birth_date(&account.birth_date)?;
        validate::pin(account.pin.expose_secret())?;
        if account.kind.uses_withdrawal_code() {
            let phone = account.phone.as_deref().unwrap_or_default();
            validate::phone(phone)?;
        }

        let created = self.inner.client.register(&account).await?;
        info!(kind = %account.kind, "account created");
        Ok(created)
    }

    /// Log in and keep the token. Returns it so callers can persist it.
    pub async fn login(&self, credentials: Credentials) -> Result<SecretString, CoreError> {
        match &credentials {
            Credentials::Phone { phone, pin, .. } => {
                validate::phone(phone)?;
                validate::pin(pin.expose_secret())?;
            }
            Credentials::Card { number, pin } => {
                validate::non_empty("card number", number)?;
                validate::pin(pin.expose_secret())?;
            }
        }

        let token = self.inner.client.login(&credentials).await?;
        self.set_token(token.clone());
        info!("logged in");
        Ok(token)
    }

    /// Forget the token. The service has no logout route.
    pub fn logout(&self) {
        let previous = self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            info!("logged out");
        }
    }

    pub async fn profile(&self) -> Result<Account, CoreError> {
        let token = self.require_token()?;
        Ok(self.inner.client.profile(&token).await?)
    }

    pub async fn transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        let token = self.require_token()?;
        Ok(self.inner.client.transactions(&token).await?)
    }

    pub async fn lookup_account(&self, number: &str) -> Result<Account, CoreError> {
        validate::non_empty("account number", number)?;
        self.inner
            .client
            .lookup_account(number.trim())
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    CoreError::AccountNotFound {
                        number: number.trim().to_owned(),
                    }
                } else {
                    e.into()
                }
            })
    }

    // ── Withdrawals ──────────────────────────────────────────────────

    pub async fn generate_withdrawal_code(
        &self,
        account: &str,
        pin: &SecretString,
    ) -> Result<IssuedCode, CoreError> {
        validate::non_empty("account number", account)?;
        validate::pin(pin.expose_secret())?;

        let account = account.trim();
        let generated = self
            .inner
            .client
            .generate_withdrawal_code(account, pin)
            .await?;
        let code = generated
            .code
            .ok_or_else(|| CoreError::Internal("service returned no code".into()))?;

        debug!(account, "withdrawal code received");
        Ok(IssuedCode {
            account: account.to_owned(),
            code,
            message: generated.message,
        })
    }

    /// Redeem a code or card PIN. A locally expired code is still sent;
    /// only the service decides.
    pub async fn withdraw(&self, request: WithdrawalRequest) -> Result<Withdrawal, CoreError> {
        validate::non_empty("account number", &request.account)?;
        validate::withdrawal_amount(request.amount)?;
        match &request.auth {
            WithdrawalAuth::Code(code) => validate::non_empty("withdrawal code", code)?,
            WithdrawalAuth::Pin(pin) => validate::pin(pin.expose_secret())?,
        }

        let receipt = self.inner.client.withdraw(&request).await?;
        let bills = receipt
            .dispensed
            .as_ref()
            .map(bill_breakdown)
            .unwrap_or_default();

        Ok(Withdrawal {
            account: receipt.account.unwrap_or(request.account),
            amount: request.amount,
            new_balance: receipt.new_balance,
            bills,
            message: receipt
                .message
                .unwrap_or_else(|| cajero_api::WithdrawalReceipt::SUCCESS_MESSAGE.into()),
        })
    }
}
