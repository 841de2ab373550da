//! Home: choose a provider to sign in with, or walk up to the ATM.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use cajero_core::Provider;

use crate::action::Action;
use crate::component::Component;
use crate::screen::ScreenId;
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Provider(Provider),
    Atm,
}

const CHOICES: [Choice; 4] = [
    Choice::Provider(Provider::Bancolombia),
    Choice::Provider(Provider::Nequi),
    Choice::Provider(Provider::Tarjeta),
    Choice::Atm,
];

#[derive(Default)]
pub struct HomeScreen {
    selected: usize,
}

impl HomeScreen {
    pub fn new() -> Self {
        Self::default()
    }

    fn choose(&self) -> Option<Action> {
        match CHOICES.get(self.selected)? {
            Choice::Provider(p) => Some(Action::SelectProvider(*p)),
            Choice::Atm => Some(Action::SwitchScreen(ScreenId::Atm)),
        }
    }
}

impl Component for HomeScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1).min(CHOICES.len() - 1);
                None
            }
            KeyCode::Char(c @ '1'..='4') => {
                self.selected = usize::from(u8::try_from(c).unwrap_or(b'1') - b'1');
                self.choose()
            }
            KeyCode::Enter => self.choose(),
            _ => None,
        };
        Ok(action)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [title_area, _, list_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(
                    "cajero",
                    Style::default()
                        .fg(theme::ACCENT)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "Withdraw cash with a code or your debit card",
                    Style::default().fg(theme::DIM),
                )),
            ])
            .alignment(Alignment::Center),
            title_area,
        );

        let mut lines = Vec::new();
        for (i, choice) in CHOICES.iter().enumerate() {
            let selected = i == self.selected;
            let (name, tagline, color) = match choice {
                Choice::Provider(p) => {
                    let brand = p.brand();
                    (brand.name, brand.tagline, theme::brand_accent(brand))
                }
                Choice::Atm => ("Cajero automático", "Retirar efectivo", theme::ACCENT),
            };
            let marker = if selected { "▸ " } else { "  " };
            let name_style = if selected {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::TEXT)
            };
            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(color)),
                Span::styled(format!("{} ", i + 1), theme::key_hint()),
                Span::styled(name, name_style),
            ]));
            lines.push(Line::from(Span::styled(
                format!("      {tagline}"),
                Style::default().fg(theme::DIM),
            )));
            lines.push(Line::default());
        }

        let w = 48u16.min(list_area.width);
        let centered = Rect::new(
            list_area.x + (list_area.width - w) / 2,
            list_area.y,
            w,
            list_area.height,
        );
        frame.render_widget(Paragraph::new(lines), centered);
    }

    fn hints(&self) -> Vec<(&'static str, &'static str)> {
        vec![("↑↓", "select"), ("Enter", "open"), ("q", "quit")]
    }
}
