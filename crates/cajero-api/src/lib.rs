//! Async client for the cajero account service.
//!
//! The service owns every piece of business logic (accounts, balances,
//! withdrawal codes, bill breakdowns). This crate only speaks its HTTP
//! dialect: JSON bodies with Spanish field names, bearer tokens for the
//! profile endpoints, and `{ "message": "..." }` error bodies.

pub mod accounts;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;
pub mod withdrawals;

pub use client::AccountClient;
pub use error::Error;
pub use models::{
    Account, AccountKind, Credentials, DispensedBills, GeneratedCode, LoginResponse, NewAccount,
    Transaction, WithdrawalAuth, WithdrawalReceipt, WithdrawalRequest,
};
pub use transport::{TlsMode, TransportConfig};
