//! Application core: event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use cajero_core::{Bank, Provider};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;

/// How long a toast stays up.
const TOAST_TTL: Duration = Duration::from_secs(3);

/// Top-level application state and event loop.
pub struct App {
    bank: Bank,
    profile_name: String,
    /// Provider whose palette frames the UI.
    provider: Provider,
    active_screen: ScreenId,
    /// Previous screen for GoBack.
    previous_screen: Option<ScreenId>,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// Active notification toast with display timestamp.
    notification: Option<(Notification, Instant)>,
}

impl App {
    pub fn new(bank: Bank, profile_name: impl Into<String>, provider: Provider) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let profile_name = profile_name.into();
        let screens = create_screens(&bank, &profile_name).into_iter().collect();

        Self {
            bank,
            profile_name,
            provider,
            active_screen: ScreenId::Home,
            previous_screen: None,
            screens,
            running: true,
            action_tx,
            action_rx,
            notification: None,
        }
    }

    /// Hand every screen the action sender. A stored token skips the
    /// sign-in screens.
    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        if self.bank.is_logged_in() {
            self.broadcast(&Action::SelectProvider(self.provider))?;
            self.action_tx.send(Action::LoggedIn)?;
        }
        Ok(())
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init_screens()?;

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(50),  // 20 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;
                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Global keys first, then the active screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        let Some(screen) = self.screens.get_mut(&self.active_screen) else {
            return Ok(None);
        };
        if key.modifiers == KeyModifiers::NONE
            && key.code == KeyCode::Char('q')
            && !screen.captures_text()
        {
            return Ok(Some(Action::Quit));
        }
        screen.handle_key_event(key)
    }

    fn switch_to(&mut self, target: ScreenId) {
        if target == self.active_screen {
            return;
        }
        debug!("switching screen: {} → {}", self.active_screen, target);
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(false);
        }
        self.previous_screen = Some(self.active_screen);
        self.active_screen = target;
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
    }

    /// Deliver `action` to every screen, queueing their follow-ups.
    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Render | Action::Resize(..) => {}

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() > TOAST_TTL)
                {
                    self.notification = None;
                }
                if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                    screen.update(action)?;
                }
            }

            Action::SwitchScreen(target) => self.switch_to(*target),

            Action::GoBack => {
                let target = self.previous_screen.take().unwrap_or_default();
                self.switch_to(target);
            }

            Action::SelectProvider(provider) => {
                self.provider = *provider;
                self.broadcast(action)?;
                self.switch_to(ScreenId::Auth);
            }

            Action::LoggedIn => {
                info!(profile = %self.profile_name, "signed in");
                self.broadcast(action)?;
                self.switch_to(ScreenId::Dashboard);
                self.previous_screen = None;
            }

            Action::Logout => {
                self.bank.logout();
                if let Err(e) = cajero_config::clear_token(&self.profile_name) {
                    warn!(error = %e, "could not clear stored token");
                }
                self.broadcast(action)?;
                self.switch_to(ScreenId::Home);
                self.previous_screen = None;
                self.action_tx
                    .send(Action::Notify(Notification::info("Signed out")))?;
            }

            Action::Notify(n) => self.notification = Some((n.clone(), Instant::now())),

            Action::RequestFailed(message) => {
                warn!(%message, "request failed");
                self.notification = Some((Notification::error(message.clone()), Instant::now()));
                if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                    screen.update(action)?;
                }
            }

            // Request results belong to the screen that is waiting on them.
            other => {
                if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                    if let Some(follow_up) = screen.update(other)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }
        }
        Ok(())
    }

    // ── Rendering ───────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header, content, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.render_header(frame, header);
        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, content);
        }
        self.render_status_bar(frame, status);

        if let Some((ref notif, _)) = self.notification {
            Self::render_notification(frame, area, notif);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let brand = self.provider.brand();
        let mut spans = vec![Span::styled(" cajero ", theme::title_style())];
        if self.active_screen != ScreenId::Home {
            spans.push(Span::styled(format!(" {} ", brand.name), theme::brand_header(brand)));
        }
        spans.push(Span::styled(
            format!("  {}", self.active_screen),
            Style::default().fg(theme::DIM),
        ));
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(theme::BG_DARK)),
            area,
        );
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let hints = self
            .screens
            .get(&self.active_screen)
            .map(|s| s.hints())
            .unwrap_or_default();

        let mut spans = vec![Span::raw(" ")];
        for (i, (key, desc)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", theme::key_hint()));
            }
            spans.push(Span::styled(*key, theme::key_hint_key()));
            spans.push(Span::styled(format!(" {desc}"), theme::key_hint()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    /// Toast in the bottom-right corner, above the status bar.
    fn render_notification(frame: &mut Frame, area: Rect, notif: &Notification) {
        let msg_len = u16::try_from(notif.message.chars().count()).unwrap_or(u16::MAX);
        let width = msg_len.saturating_add(6).clamp(20, 60).min(area.width);
        let height = 3u16.min(area.height);

        let x = area.width.saturating_sub(width + 1);
        let y = area.height.saturating_sub(height + 1);
        let toast_area = Rect::new(area.x + x, area.y + y, width, height);

        let (border_color, icon) = match notif.level {
            NotificationLevel::Success => (theme::SUCCESS, "✓"),
            NotificationLevel::Error => (theme::ERROR, "✗"),
            NotificationLevel::Info => (theme::ACCENT, "·"),
        };

        frame.render_widget(Clear, toast_area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(toast_area);
        frame.render_widget(block, toast_area);

        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
            Span::styled(notif.message.as_str(), Style::default().fg(theme::TEXT)),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cajero_core::ServiceConfig;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::widgets::code_card::tests::buffer_text;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn app() -> App {
        let bank = Bank::new(ServiceConfig::new("http://127.0.0.1:9".parse().unwrap())).unwrap();
        let mut app = App::new(bank, "test", Provider::default());
        app.init_screens().unwrap();
        app
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn q_quits_unless_a_form_has_focus() {
        let mut app = app();
        let action = app
            .handle_key_event(key(KeyCode::Char('q'), KeyModifiers::NONE))
            .unwrap();
        assert!(matches!(action, Some(Action::Quit)));

        app.process_action(&Action::SelectProvider(Provider::Nequi))
            .unwrap();
        assert_eq!(app.active_screen, ScreenId::Auth);
        let action = app
            .handle_key_event(key(KeyCode::Char('q'), KeyModifiers::NONE))
            .unwrap();
        assert!(action.is_none());

        let action = app
            .handle_key_event(key(KeyCode::Char('c'), KeyModifiers::CONTROL))
            .unwrap();
        assert!(matches!(action, Some(Action::Quit)));
    }

    #[test]
    fn go_back_returns_home_from_sign_in() {
        let mut app = app();
        app.process_action(&Action::SelectProvider(Provider::Tarjeta))
            .unwrap();
        assert!(draw(&app).contains("Tarjeta débito"));

        app.process_action(&Action::GoBack).unwrap();
        assert_eq!(app.active_screen, ScreenId::Home);
    }

    #[test]
    fn toast_expires_on_tick() {
        let mut app = app();
        app.process_action(&Action::Notify(Notification::success("Account opened")))
            .unwrap();
        assert!(draw(&app).contains("✓ Account opened"));

        app.process_action(&Action::Tick).unwrap();
        assert!(app.notification.is_some());

        if let Some((_, shown)) = app.notification.as_mut() {
            *shown = Instant::now().checked_sub(TOAST_TTL * 2).unwrap();
        }
        app.process_action(&Action::Tick).unwrap();
        assert!(!draw(&app).contains("Account opened"));
    }
}
