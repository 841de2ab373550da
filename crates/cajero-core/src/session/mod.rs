// ── Withdrawal code session ──
//
// Temporal and visibility state of one issued withdrawal code. Pure: no
// timers, no I/O. The driver in `driver.rs` feeds it ticks.
//
// Every `start`/`close` bumps the epoch. Timer callbacks carry the epoch
// they were scheduled under and are ignored once it no longer matches, so
// a tick queued before `close()` can never touch the next session.

mod driver;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, IntoStaticStr};
use tracing::{debug, info, warn};

pub use driver::CodeSession;

/// How long an issued code is shown as valid.
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(30 * 60);

/// How long the "copied" acknowledgement stays up.
pub const COPY_ACK: Duration = Duration::from_secs(2);

/// Character drawn for each hidden code digit.
const MASK: char = '•';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Active,
    /// Countdown reached zero. Display-only: redemption is still attempted.
    Expired,
}

/// Generation counter for timer callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Epoch(u64);

/// A code issued by the account service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalCode {
    value: String,
    issued_at: DateTime<Utc>,
    amount: Option<u64>,
}

impl WithdrawalCode {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Informational only, passed through untouched.
    pub fn amount(&self) -> Option<u64> {
        self.amount
    }
}

/// State machine for one withdrawal code: `Idle → Active → Expired`.
#[derive(Debug, Clone)]
pub struct WithdrawalCodeSession {
    validity_secs: u64,
    code: Option<WithdrawalCode>,
    remaining_secs: u64,
    revealed: bool,
    copied: bool,
    epoch: u64,
}

impl Default for WithdrawalCodeSession {
    fn default() -> Self {
        Self::new(DEFAULT_VALIDITY)
    }
}

impl WithdrawalCodeSession {
    /// Sub-second validities are rounded up to one second.
    pub fn new(validity: Duration) -> Self {
        Self {
            validity_secs: validity.as_secs().max(1),
            code: None,
            remaining_secs: 0,
            revealed: true,
            copied: false,
            epoch: 0,
        }
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Track a freshly issued code, discarding any previous one.
    ///
    /// Returns the epoch the countdown must be scheduled under, or `None`
    /// when `code` is empty (state is left untouched).
    pub fn start(&mut self, code: impl Into<String>, amount: Option<u64>) -> Option<Epoch> {
        let value = code.into();
        if value.trim().is_empty() {
            warn!("ignoring start with an empty withdrawal code");
            return None;
        }

        self.epoch += 1;
        self.code = Some(WithdrawalCode {
            value,
            issued_at: Utc::now(),
            amount,
        });
        self.remaining_secs = self.validity_secs;
        self.revealed = true;
        self.copied = false;

        info!(validity_secs = self.validity_secs, "withdrawal code session started");
        Some(self.current_epoch())
    }

    /// One second elapsed. Returns `true` if `remaining` changed.
    pub fn tick(&mut self) -> bool {
        if self.code.is_none() || self.remaining_secs == 0 {
            return false;
        }
        self.remaining_secs -= 1;
        if self.remaining_secs == 0 {
            info!("withdrawal code expired");
        }
        true
    }

    /// `tick()` on behalf of a timer scheduled under `epoch`.
    pub fn tick_at(&mut self, epoch: Epoch) -> bool {
        if epoch != self.current_epoch() {
            debug!("dropping stale countdown tick");
            return false;
        }
        self.tick()
    }

    pub fn toggle_visibility(&mut self) {
        if self.code.is_some() {
            self.revealed = !self.revealed;
        }
    }

    /// Raw value for the caller's clipboard; raises the `copied` flag.
    pub fn request_copy(&mut self) -> Option<String> {
        let value = self.code.as_ref()?.value.clone();
        self.copied = true;
        Some(value)
    }

    /// Lower the `copied` flag on behalf of a timer scheduled under `epoch`.
    pub fn clear_copied(&mut self, epoch: Epoch) -> bool {
        if epoch != self.current_epoch() || !self.copied {
            return false;
        }
        self.copied = false;
        true
    }

    /// End the session. Idempotent.
    pub fn close(&mut self) {
        self.epoch += 1;
        if self.code.take().is_some() {
            info!("withdrawal code session closed");
        }
        self.remaining_secs = 0;
        self.revealed = true;
        self.copied = false;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        match (&self.code, self.remaining_secs) {
            (None, _) => SessionState::Idle,
            (Some(_), 0) => SessionState::Expired,
            (Some(_), _) => SessionState::Active,
        }
    }

    pub fn current_epoch(&self) -> Epoch {
        Epoch(self.epoch)
    }

    pub fn code(&self) -> Option<&WithdrawalCode> {
        self.code.as_ref()
    }

    pub fn validity(&self) -> Duration {
        Duration::from_secs(self.validity_secs)
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_copied(&self) -> bool {
        self.copied
    }

    /// `MM:SS`, zero-padded.
    pub fn remaining_formatted(&self) -> String {
        format_mm_ss(self.remaining_secs)
    }

    /// `remaining / validity`, within `[0, 1]`.
    pub fn remaining_fraction(&self) -> f64 {
        fraction(self.remaining_secs, self.validity_secs)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            code: self.code.as_ref().map(|c| c.value.clone()),
            issued_at: self.code.as_ref().map(|c| c.issued_at),
            amount: self.code.as_ref().and_then(|c| c.amount),
            remaining_secs: self.remaining_secs,
            validity_secs: self.validity_secs,
            revealed: self.revealed,
            copied: self.copied,
        }
    }
}

/// Point-in-time copy of a session, published to renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub code: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub amount: Option<u64>,
    pub remaining_secs: u64,
    pub validity_secs: u64,
    pub revealed: bool,
    pub copied: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        WithdrawalCodeSession::default().snapshot()
    }
}

impl SessionSnapshot {
    pub fn is_expired(&self) -> bool {
        self.state == SessionState::Expired
    }

    pub fn remaining_formatted(&self) -> String {
        format_mm_ss(self.remaining_secs)
    }

    pub fn remaining_fraction(&self) -> f64 {
        fraction(self.remaining_secs, self.validity_secs)
    }

    /// The code as it should be drawn: raw when revealed, masked otherwise.
    pub fn display_code(&self) -> Option<String> {
        self.code.as_ref().map(|code| {
            if self.revealed {
                code.clone()
            } else {
                code.chars().map(|_| MASK).collect()
            }
        })
    }
}

fn format_mm_ss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn fraction(remaining: u64, validity: u64) -> f64 {
    if validity == 0 {
        return 0.0;
    }
    (remaining as f64 / validity as f64).clamp(0.0, 1.0)
}
