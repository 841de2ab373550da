//! All possible UI actions. Actions are the sole mechanism for state mutation.

use cajero_core::{Account, IssuedCode, Provider, SessionSnapshot, Transaction, Withdrawal};

use crate::screen::ScreenId;

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    GoBack,
    SelectProvider(Provider),

    // ── Auth ──────────────────────────────────────────────────────
    LoggedIn,
    Registered(Box<Account>),
    Logout,

    // ── Dashboard data ────────────────────────────────────────────
    RefreshDashboard,
    ProfileLoaded(Box<Account>),
    TransactionsLoaded(Vec<Transaction>),

    // ── Withdrawal codes ──────────────────────────────────────────
    CodeIssued {
        issued: IssuedCode,
        amount: Option<u64>,
    },
    SessionUpdated(SessionSnapshot),

    // ── ATM ───────────────────────────────────────────────────────
    AccountVerified(Box<Account>),
    WithdrawalCompleted(Box<Withdrawal>),

    /// An async request failed; the originating screen leaves its busy state.
    RequestFailed(String),

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
}
