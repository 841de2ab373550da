//! Palette and semantic styling for the TUI.
//!
//! The chrome uses a fixed dark palette; anything provider-specific takes
//! its colours from the provider's [`Brand`].

use ratatui::style::{Color, Modifier, Style};

use cajero_core::{Brand, Rgb};

// ── Core Palette ──────────────────────────────────────────────────────

pub const TEXT: Color = Color::Rgb(226, 232, 240); // #e2e8f0
pub const DIM: Color = Color::Rgb(148, 163, 184); // #94a3b8
pub const BORDER: Color = Color::Rgb(71, 85, 105); // #475569
pub const BG_DARK: Color = Color::Rgb(15, 23, 42); // #0f172a
pub const BG_PANEL: Color = Color::Rgb(30, 41, 59); // #1e293b
pub const SUCCESS: Color = Color::Rgb(74, 222, 128); // #4ade80
pub const WARNING: Color = Color::Rgb(250, 204, 21); // #facc15
pub const ERROR: Color = Color::Rgb(248, 113, 113); // #f87171
pub const ACCENT: Color = Color::Rgb(56, 189, 248); // #38bdf8

// ── Brand colours ─────────────────────────────────────────────────────

pub fn color(rgb: Rgb) -> Color {
    let Rgb(r, g, b) = rgb;
    Color::Rgb(r, g, b)
}

pub fn brand_primary(brand: &Brand) -> Color {
    color(brand.primary)
}

pub fn brand_accent(brand: &Brand) -> Color {
    color(brand.accent)
}

/// Header bar painted in the brand's primary colour.
pub fn brand_header(brand: &Brand) -> Style {
    Style::default()
        .fg(color(brand.on_primary))
        .bg(color(brand.primary))
        .add_modifier(Modifier::BOLD)
}

// ── Semantic Styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn border_default() -> Style {
    Style::default().fg(BORDER)
}

pub fn table_header() -> Style {
    Style::default()
        .fg(ACCENT)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

pub fn table_row() -> Style {
    Style::default().fg(TEXT)
}

pub fn key_hint() -> Style {
    Style::default().fg(DIM)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn error() -> Style {
    Style::default().fg(ERROR)
}
