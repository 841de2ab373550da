//! Floating withdrawal-code card.
//!
//! Draws a [`SessionSnapshot`] in a provider's palette: the code (plain or
//! masked), the `MM:SS` countdown with a gauge, the amount, and the
//! copied / expired flags. The card never reads the session itself; it is
//! redrawn from whatever snapshot the owner last received.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Widget},
};

use cajero_core::money::format_pesos;
use cajero_core::{Brand, SessionSnapshot, SessionState};

use crate::theme;

pub const WIDTH: u16 = 44;
pub const HEIGHT: u16 = 13;

/// Countdown turns amber below this many seconds.
const LAST_MINUTE: u64 = 60;

pub struct CodeCard<'a> {
    snapshot: &'a SessionSnapshot,
    brand: &'a Brand,
}

impl<'a> CodeCard<'a> {
    pub fn new(snapshot: &'a SessionSnapshot, brand: &'a Brand) -> Self {
        Self { snapshot, brand }
    }

    /// Centered rectangle the card occupies inside `area`.
    pub fn area(area: Rect) -> Rect {
        let w = WIDTH.min(area.width);
        let h = HEIGHT.min(area.height);
        Rect::new(
            area.x + (area.width - w) / 2,
            area.y + (area.height - h) / 2,
            w,
            h,
        )
    }

    fn status_line(&self) -> Line<'static> {
        let snap = self.snapshot;
        match snap.state {
            SessionState::Expired => Line::from(Span::styled(
                "Code expired · generate a new one",
                Style::default()
                    .fg(theme::ERROR)
                    .add_modifier(Modifier::BOLD),
            )),
            SessionState::Active if snap.copied => Line::from(Span::styled(
                "✓ Copied",
                Style::default()
                    .fg(theme::SUCCESS)
                    .add_modifier(Modifier::BOLD),
            )),
            SessionState::Active => {
                let countdown = if snap.remaining_secs < LAST_MINUTE {
                    theme::WARNING
                } else {
                    theme::brand_accent(self.brand)
                };
                Line::from(vec![
                    Span::styled("Expires in ", Style::default().fg(theme::TEXT)),
                    Span::styled(
                        snap.remaining_formatted(),
                        Style::default().fg(countdown).add_modifier(Modifier::BOLD),
                    ),
                ])
            }
            SessionState::Idle => Line::from(Span::styled(
                "No active code",
                Style::default().fg(theme::DIM),
            )),
        }
    }
}

impl Widget for CodeCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let card = Self::area(area);
        Clear.render(card, buf);

        let primary = theme::brand_primary(self.brand);
        let accent = theme::brand_accent(self.brand);
        let on_primary = theme::color(self.brand.on_primary);

        let block = Block::default()
            .title(Line::from(vec![
                Span::raw(" "),
                Span::styled(
                    self.brand.name,
                    Style::default().fg(accent).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" · withdrawal code ", Style::default().fg(on_primary)),
            ]))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(accent))
            .style(Style::default().bg(primary).fg(on_primary));
        let inner = block.inner(card);
        block.render(card, buf);

        let [_, code_area, _, status_area, gauge_area, amount_area, _, hint_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .areas(inner);

        let code = self.snapshot.display_code().unwrap_or_default();
        let spaced: String = code
            .chars()
            .flat_map(|c| [c, ' '])
            .collect::<String>()
            .trim_end()
            .to_owned();
        let code_style = if self.snapshot.is_expired() {
            Style::default()
                .fg(theme::DIM)
                .add_modifier(Modifier::CROSSED_OUT)
        } else {
            Style::default().fg(on_primary).add_modifier(Modifier::BOLD)
        };
        Paragraph::new(Span::styled(spaced, code_style))
            .alignment(Alignment::Center)
            .render(code_area, buf);

        Paragraph::new(self.status_line())
            .alignment(Alignment::Center)
            .render(status_area, buf);

        let gauge_rect = Rect::new(
            gauge_area.x + 2,
            gauge_area.y,
            gauge_area.width.saturating_sub(4),
            gauge_area.height,
        );
        Gauge::default()
            .ratio(self.snapshot.remaining_fraction())
            .label(self.snapshot.remaining_formatted())
            .gauge_style(Style::default().fg(accent).bg(theme::BG_DARK))
            .render(gauge_rect, buf);

        if let Some(amount) = self.snapshot.amount {
            Paragraph::new(Line::from(vec![
                Span::raw("Amount "),
                Span::styled(format_pesos(amount), Style::default().add_modifier(Modifier::BOLD)),
            ]))
            .alignment(Alignment::Center)
            .render(amount_area, buf);
        }

        let reveal = if self.snapshot.revealed { "hide" } else { "show" };
        Paragraph::new(Line::from(vec![
            Span::styled("v ", Style::default().fg(accent).add_modifier(Modifier::BOLD)),
            Span::raw(format!("{reveal}  ")),
            Span::styled("c ", Style::default().fg(accent).add_modifier(Modifier::BOLD)),
            Span::raw("copy  "),
            Span::styled("x ", Style::default().fg(accent).add_modifier(Modifier::BOLD)),
            Span::raw("close"),
        ]))
        .alignment(Alignment::Center)
        .render(hint_area, buf);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use cajero_core::Provider;
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;

    /// Flatten a buffer into newline-separated rows.
    pub(crate) fn buffer_text(buf: &Buffer) -> String {
        let width = usize::from(buf.area.width);
        buf.content()
            .chunks(width.max(1))
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render(snapshot: &SessionSnapshot) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal
            .draw(|f| {
                f.render_widget(CodeCard::new(snapshot, Provider::Nequi.brand()), f.area());
            })
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn active(revealed: bool, copied: bool) -> SessionSnapshot {
        SessionSnapshot {
            state: SessionState::Active,
            code: Some("482913".into()),
            issued_at: None,
            amount: Some(50_000),
            remaining_secs: 1799,
            validity_secs: 1800,
            revealed,
            copied,
        }
    }

    #[test]
    fn masked_until_revealed() {
        let text = render(&active(false, false));
        assert!(text.contains("• • • • • •"));
        assert!(!text.contains("4 8 2 9 1 3"));
        assert!(text.contains("Expires in 29:59"));
        assert!(text.contains("$ 50.000"));
        assert!(text.contains("Nequi"));

        let text = render(&active(true, false));
        assert!(text.contains("4 8 2 9 1 3"));
        assert!(text.contains("hide"));
    }

    #[test]
    fn copied_acknowledgement_replaces_countdown() {
        let text = render(&active(false, true));
        assert!(text.contains("✓ Copied"));
        assert!(!text.contains("Expires in"));
    }

    #[test]
    fn expired_card_says_so() {
        let snap = SessionSnapshot {
            state: SessionState::Expired,
            remaining_secs: 0,
            ..active(true, false)
        };
        let text = render(&snap);
        assert!(text.contains("Code expired"));
        assert!(text.contains("00:00"));
    }

    #[test]
    fn card_is_centered_and_clamped() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(CodeCard::area(area), Rect::new(28, 13, WIDTH, HEIGHT));

        let tiny = Rect::new(0, 0, 20, 5);
        assert_eq!(CodeCard::area(tiny), Rect::new(0, 0, 20, 5));
    }
}
