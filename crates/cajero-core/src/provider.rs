// ── Providers and their brand palettes ──
//
// The three account families share one session and one set of screens;
// only labels and colours differ, so a brand is plain data.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use cajero_api::AccountKind;

/// Which bank product the user is operating.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Provider {
    #[default]
    Bancolombia,
    Nequi,
    /// Debit card.
    #[strum(to_string = "tarjeta", serialize = "card")]
    Tarjeta,
}

/// 24-bit colour, converted by each front end into its own colour type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Presentation data for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brand {
    pub name: &'static str,
    pub tagline: &'static str,
    /// Card background / headline colour.
    pub primary: Rgb,
    /// Highlights: countdown, copy acknowledgement, focused fields.
    pub accent: Rgb,
    /// Text drawn on top of `primary`.
    pub on_primary: Rgb,
    /// What the login form asks for.
    pub login_label: &'static str,
}

const BANCOLOMBIA: Brand = Brand {
    name: "Bancolombia",
    tagline: "Retira sin tarjeta con tu código",
    primary: Rgb(0x00, 0x33, 0xA0),
    accent: Rgb(0xFD, 0xDA, 0x24),
    on_primary: Rgb(0xFF, 0xFF, 0xFF),
    login_label: "Phone number",
};

const NEQUI: Brand = Brand {
    name: "Nequi",
    tagline: "Tu plata en el celular",
    primary: Rgb(0x21, 0x00, 0x49),
    accent: Rgb(0xDA, 0x00, 0x81),
    on_primary: Rgb(0xFF, 0xFF, 0xFF),
    login_label: "Phone number",
};

const TARJETA: Brand = Brand {
    name: "Tarjeta débito",
    tagline: "Retira con tu tarjeta y clave",
    primary: Rgb(0x4B, 0x55, 0x63),
    accent: Rgb(0xD1, 0xD5, 0xDB),
    on_primary: Rgb(0xF9, 0xFA, 0xFB),
    login_label: "Card number",
};

impl Provider {
    pub fn brand(self) -> &'static Brand {
        match self {
            Self::Bancolombia => &BANCOLOMBIA,
            Self::Nequi => &NEQUI,
            Self::Tarjeta => &TARJETA,
        }
    }

    pub fn kind(self) -> AccountKind {
        match self {
            Self::Bancolombia => AccountKind::Bancolombia,
            Self::Nequi => AccountKind::Nequi,
            Self::Tarjeta => AccountKind::Tarjeta,
        }
    }

    /// Card withdrawals use the PIN directly; the others need a generated code.
    pub fn uses_withdrawal_code(self) -> bool {
        self.kind().uses_withdrawal_code()
    }

    /// Nequi and Bancolombia log in and register with a phone number.
    pub fn uses_phone(self) -> bool {
        !matches!(self, Self::Tarjeta)
    }
}

impl From<AccountKind> for Provider {
    fn from(kind: AccountKind) -> Self {
        match kind {
            AccountKind::Bancolombia => Self::Bancolombia,
            AccountKind::Nequi => Self::Nequi,
            AccountKind::Tarjeta => Self::Tarjeta,
        }
    }
}

impl From<Provider> for AccountKind {
    fn from(provider: Provider) -> Self {
        provider.kind()
    }
}
