// Withdrawal endpoints: security-code issuance and redemption.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, info};

use crate::client::AccountClient;
use crate::error::Error;
use crate::models::{GeneratedCode, WithdrawalAuth, WithdrawalReceipt, WithdrawalRequest};

impl AccountClient {
    /// Ask the service for a one-time withdrawal code.
    ///
    /// `POST /api/cuentas/generar-codigo` with `{numero, clave}`. A 2xx
    /// response without `codigo` is treated as a rejection.
    pub async fn generate_withdrawal_code(
        &self,
        account: &str,
        pin: &SecretString,
    ) -> Result<GeneratedCode, Error> {
        let url = self.api_url("cuentas/generar-codigo")?;
        debug!(account, "requesting withdrawal code");

        let resp: GeneratedCode = self
            .post(
                url,
                &json!({
                    "numero": account,
                    "clave": pin.expose_secret(),
                }),
            )
            .await?;

        match resp.code.as_deref() {
            Some(code) if !code.is_empty() => {
                info!(account, "withdrawal code issued");
                Ok(resp)
            }
            _ => Err(Error::Rejected {
                status: 200,
                message: resp
                    .message
                    .unwrap_or_else(|| "no code in response".into()),
            }),
        }
    }

    /// Redeem a code (or card PIN) for cash.
    ///
    /// `POST /api/retiros`. The service signals success with
    /// `message == "Retiro exitoso"`; anything else is a rejection even
    /// under a 2xx status.
    pub async fn withdraw(&self, request: &WithdrawalRequest) -> Result<WithdrawalReceipt, Error> {
        let url = self.api_url("retiros")?;
        debug!(account = %request.account, amount = request.amount, "requesting withdrawal");

        let body = match &request.auth {
            WithdrawalAuth::Code(code) => json!({
                "numero": request.account,
                "codigo": code,
                "monto": request.amount,
            }),
            WithdrawalAuth::Pin(pin) => json!({
                "numero": request.account,
                "clave": pin.expose_secret(),
                "monto": request.amount,
            }),
        };

        let receipt: WithdrawalReceipt = self.post(url, &body).await?;
        if !receipt.is_success() {
            return Err(Error::Rejected {
                status: 200,
                message: receipt
                    .message
                    .unwrap_or_else(|| "withdrawal not confirmed".into()),
            });
        }

        info!(account = %request.account, amount = request.amount, "withdrawal completed");
        Ok(receipt)
    }
}
