//! Screen identifiers.

use std::fmt;

/// Each top-level TUI screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    /// Pick a provider or walk up to the ATM.
    #[default]
    Home,
    /// Login / registration forms.
    Auth,
    /// Balance, movements and code issuance.
    Dashboard,
    /// Guided cash withdrawal.
    Atm,
}

impl ScreenId {
    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Auth => "Sign in",
            Self::Dashboard => "Dashboard",
            Self::Atm => "Cajero",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
