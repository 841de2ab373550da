// Wire types for the account service.
//
// Field names on the wire are Spanish; serde renames keep the Rust side
// in English. Amounts are whole pesos but the service stores them as JSON
// numbers, so balances deserialize as `f64`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

/// The account families the service knows about (`tipo` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Bancolombia,
    Nequi,
    /// Debit card. Withdraws with the card PIN, no generated code.
    Tarjeta,
}

impl AccountKind {
    pub const ALL: [Self; 3] = [Self::Bancolombia, Self::Nequi, Self::Tarjeta];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bancolombia => "bancolombia",
            Self::Nequi => "nequi",
            Self::Tarjeta => "tarjeta",
        }
    }

    /// Card accounts authorise withdrawals with the PIN directly.
    pub fn uses_withdrawal_code(self) -> bool {
        !matches!(self, Self::Tarjeta)
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bancolombia" => Ok(Self::Bancolombia),
            "nequi" => Ok(Self::Nequi),
            "tarjeta" | "card" => Ok(Self::Tarjeta),
            other => Err(format!("unknown account type: {other}")),
        }
    }
}

/// Account numbers arrive as strings from most endpoints, but tolerate numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrap(#[serde(deserialize_with = "string_or_number")] String);

    Ok(Option::<Wrap>::deserialize(deserializer)?.map(|Wrap(s)| s))
}

/// An account as returned by register, profile and lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "numero", deserialize_with = "string_or_number")]
    pub number: String,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(
        rename = "cedula",
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub document: Option<String>,
    #[serde(
        rename = "telefono",
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,
    #[serde(rename = "tipo", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AccountKind>,
    #[serde(rename = "monto", default)]
    pub balance: f64,
    #[serde(
        rename = "numeroTarjeta",
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub card_number: Option<String>,
    #[serde(
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub cvv: Option<String>,
    #[serde(
        rename = "fechaVencimiento",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub card_expiry: Option<String>,
    #[serde(rename = "transacciones", default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Transaction>,
}

/// One movement on an account.
///
/// The dashboard feed uses English keys; the embedded account history
/// uses Spanish ones. Both shapes land here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", alias = "tipo", default)]
    pub kind: String,
    #[serde(alias = "fecha", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(alias = "monto", default)]
    pub amount: f64,
    #[serde(alias = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Registration form.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub document: String,
    /// `YYYY-MM-DD`.
    pub birth_date: String,
    pub phone: Option<String>,
    /// Opening balance in pesos.
    pub initial_balance: u64,
    pub pin: SecretString,
    pub kind: AccountKind,
}

/// Login credentials. The shape on the wire depends on the account kind.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Nequi and Bancolombia log in with the phone number.
    Phone {
        phone: String,
        pin: SecretString,
        kind: AccountKind,
    },
    /// Cards log in with the card number.
    Card { number: String, pin: SecretString },
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub cuenta: Account,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountEnvelope {
    #[serde(default)]
    pub cuenta: Option<Account>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransactionsEnvelope {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// Response of `POST /api/cuentas/generar-codigo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCode {
    #[serde(rename = "codigo", default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// How a withdrawal is authorised.
#[derive(Debug, Clone)]
pub enum WithdrawalAuth {
    /// A code previously issued by `generar-codigo`.
    Code(String),
    /// Card PIN.
    Pin(SecretString),
}

#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    pub account: String,
    pub auth: WithdrawalAuth,
    /// Pesos.
    pub amount: u64,
}

/// Bills handed out by the ATM, keyed by denomination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispensedBills {
    #[serde(rename = "billetes", default)]
    pub bills: BTreeMap<String, u32>,
}

/// Response of `POST /api/retiros`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(
        rename = "numero",
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub account: Option<String>,
    #[serde(rename = "nuevoSaldo", default)]
    pub new_balance: Option<f64>,
    #[serde(rename = "billetesEntregados", default)]
    pub dispensed: Option<DispensedBills>,
}

impl WithdrawalReceipt {
    /// Success marker the service puts in `message`.
    pub const SUCCESS_MESSAGE: &'static str = "Retiro exitoso";

    pub fn is_success(&self) -> bool {
        self.message.as_deref() == Some(Self::SUCCESS_MESSAGE)
    }
}
