//! Domain layer shared by the `cajero` CLI and TUI.
//!
//! - **[`WithdrawalCodeSession`]**: pure state machine for one issued
//!   withdrawal code (countdown, visibility, copy acknowledgement).
//! - **[`CodeSession`]**: owns a session plus its two tokio timers and
//!   publishes [`SessionSnapshot`]s on a `watch` channel.
//! - **[`Bank`]**: cheaply cloneable facade over the account service.
//!   Runs client-side validation before any request and holds the bearer
//!   token for the profile endpoints.
//! - [`money`] and [`validate`]: peso formatting, number masking, input checks.

pub mod bank;
pub mod config;
pub mod error;
pub mod money;
pub mod provider;
pub mod session;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bank::{Bank, IssuedCode, Withdrawal};
pub use config::{DEFAULT_URL, ServiceConfig, TlsVerification};
pub use error::CoreError;
pub use provider::{Brand, Provider, Rgb};
pub use session::{
    COPY_ACK, CodeSession, DEFAULT_VALIDITY, Epoch, SessionSnapshot, SessionState,
    WithdrawalCode, WithdrawalCodeSession,
};

// Wire types consumers need without depending on the api crate directly.
pub use cajero_api::{
    Account, AccountKind, Credentials, DispensedBills, NewAccount, Transaction, WithdrawalAuth,
    WithdrawalReceipt, WithdrawalRequest,
};
