//! Labelled single-line text field backed by `tui-input`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::Span,
    widgets::{Block, BorderType, Borders, Paragraph},
};
use tui_input::{Input, InputRequest};

use crate::theme;

#[derive(Debug, Clone, Default)]
pub struct InputField {
    pub label: &'static str,
    input: Input,
    masked: bool,
    max_len: Option<usize>,
}

impl InputField {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            ..Self::default()
        }
    }

    /// Echo bullets instead of the typed characters.
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn max_len(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.input = Input::new(value.into());
        self
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.input = Input::new(value.into());
    }

    /// Apply an editing key. Returns `true` when the key was consumed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let request = match key.code {
            KeyCode::Char('u') if ctrl => InputRequest::DeleteLine,
            KeyCode::Char('w') if ctrl => InputRequest::DeletePrevWord,
            KeyCode::Char(_) if ctrl => return false,
            KeyCode::Char(c) => {
                if self
                    .max_len
                    .is_some_and(|max| self.input.value().chars().count() >= max)
                {
                    return true;
                }
                InputRequest::InsertChar(c)
            }
            KeyCode::Backspace => InputRequest::DeletePrevChar,
            KeyCode::Delete => InputRequest::DeleteNextChar,
            KeyCode::Left => InputRequest::GoToPrevChar,
            KeyCode::Right => InputRequest::GoToNextChar,
            KeyCode::Home => InputRequest::GoToStart,
            KeyCode::End => InputRequest::GoToEnd,
            _ => return false,
        };
        self.input.handle(request);
        true
    }

    /// Label on the first row, bordered value box below (4 rows total).
    pub fn render(&self, frame: &mut Frame, area: Rect, active: bool, accent: ratatui::style::Color) {
        if area.height < 4 {
            return;
        }

        let label_style = if active {
            Style::default().fg(accent)
        } else {
            Style::default().fg(theme::DIM)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(self.label, label_style)),
            Rect::new(area.x, area.y, area.width, 1),
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if active {
                Style::default().fg(accent)
            } else {
                theme::border_default()
            });
        let box_area = Rect::new(area.x, area.y + 1, area.width, 3);
        let inner = block.inner(box_area);
        frame.render_widget(block, box_area);

        let shown = if self.masked {
            "•".repeat(self.input.value().chars().count())
        } else {
            self.input.value().to_owned()
        };
        let width = usize::from(inner.width.max(1) - 1);
        let scroll = self.input.visual_scroll(width);
        frame.render_widget(
            Paragraph::new(Span::styled(shown, Style::default().fg(theme::TEXT)))
                .scroll((0, u16::try_from(scroll).unwrap_or(0))),
            inner,
        );

        if active {
            let offset = self.input.visual_cursor().saturating_sub(scroll);
            frame.set_cursor_position((
                inner.x + u16::try_from(offset).unwrap_or(0),
                inner.y,
            ));
        }
    }
}
