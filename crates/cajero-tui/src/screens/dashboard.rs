//! Dashboard: balance, movements and withdrawal-code issuance.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table},
};
use secrecy::SecretString;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use cajero_core::money::{censor_number, format_cop, mask_card_number};
use cajero_core::{Account, Bank, CoreError, Provider, Transaction, validate};

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::session_bridge::LiveCode;
use crate::theme;
use crate::widgets::code_card::CodeCard;
use crate::widgets::input_field::InputField;

/// Amount + PIN prompt shown before a code is requested.
struct CodeForm {
    fields: [InputField; 2],
    focus: usize,
    busy: bool,
    error: Option<String>,
}

impl CodeForm {
    fn new() -> Self {
        Self {
            fields: [
                InputField::new("Amount (optional)"),
                InputField::new("PIN").masked().max_len(4),
            ],
            focus: 0,
            busy: false,
            error: None,
        }
    }
}

pub struct DashboardScreen {
    bank: Bank,
    action_tx: Option<UnboundedSender<Action>>,
    provider: Provider,
    account: Option<Account>,
    transactions: Vec<Transaction>,
    loading: bool,
    error: Option<String>,
    form: Option<CodeForm>,
    live: Option<LiveCode>,
}

impl DashboardScreen {
    pub fn new(bank: Bank) -> Self {
        Self {
            bank,
            action_tx: None,
            provider: Provider::default(),
            account: None,
            transactions: Vec::new(),
            loading: false,
            error: None,
            form: None,
            live: None,
        }
    }

    fn refresh(&mut self) {
        let Some(tx) = self.action_tx.clone() else {
            return;
        };
        self.loading = true;
        self.error = None;
        let bank = self.bank.clone();
        tokio::spawn(async move {
            let (profile, txs) = tokio::join!(bank.profile(), bank.transactions());
            let actions = match (profile, txs) {
                (Ok(account), Ok(txs)) => vec![
                    Action::ProfileLoaded(Box::new(account)),
                    Action::TransactionsLoaded(txs),
                ],
                (Err(CoreError::AuthenticationFailed { .. } | CoreError::NotLoggedIn), _)
                | (_, Err(CoreError::AuthenticationFailed { .. } | CoreError::NotLoggedIn)) => {
                    vec![
                        Action::Notify(Notification::error("Session expired, sign in again")),
                        Action::Logout,
                    ]
                }
                (Err(e), _) | (_, Err(e)) => vec![Action::RequestFailed(e.to_string())],
            };
            for action in actions {
                let _ = tx.send(action);
            }
        });
    }

    fn open_form(&mut self) -> Option<Action> {
        if !self.provider.uses_withdrawal_code() {
            return Some(Action::Notify(Notification::info(
                "Debit cards withdraw with their PIN at the ATM",
            )));
        }
        if self.account.is_none() {
            return None;
        }
        self.live = None;
        self.form = Some(CodeForm::new());
        None
    }

    fn submit_form(&mut self) {
        let Some(account) = self.account.as_ref().map(|a| a.number.clone()) else {
            return;
        };
        let Some(form) = self.form.as_mut() else {
            return;
        };
        form.error = None;

        let amount_raw = form.fields[0].value().trim().to_owned();
        let amount = if amount_raw.is_empty() {
            Ok(None)
        } else {
            validate::parse_amount(&amount_raw)
                .and_then(validate::withdrawal_amount)
                .map(Some)
        };
        let pin = form.fields[1].value().to_owned();
        let checked = amount.and_then(|amount| validate::pin(&pin).map(|()| amount));

        let amount = match checked {
            Ok(amount) => amount,
            Err(e) => {
                form.error = Some(e.to_string());
                return;
            }
        };

        form.busy = true;
        let Some(tx) = self.action_tx.clone() else {
            return;
        };
        let bank = self.bank.clone();
        let pin = SecretString::from(pin);
        tokio::spawn(async move {
            let action = match bank.generate_withdrawal_code(&account, &pin).await {
                Ok(issued) => Action::CodeIssued { issued, amount },
                Err(e) => Action::RequestFailed(e.to_string()),
            };
            let _ = tx.send(action);
        });
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if form.busy {
            return;
        }
        match key.code {
            KeyCode::Esc => self.form = None,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                form.focus = 1 - form.focus;
            }
            KeyCode::Enter if form.focus == 0 => form.focus = 1,
            KeyCode::Enter => self.submit_form(),
            _ => {
                if let Some(field) = form.fields.get_mut(form.focus) {
                    field.handle_key(key);
                }
            }
        }
    }

    fn handle_card_key(&mut self, key: KeyEvent) -> Option<Action> {
        let live = self.live.as_mut()?;
        match key.code {
            KeyCode::Char('v') => live.toggle_visibility(),
            KeyCode::Char('c') => {
                if live.copy().is_some() {
                    debug!("withdrawal code handed to clipboard");
                }
            }
            KeyCode::Char('x') | KeyCode::Esc => self.live = None,
            _ => {}
        }
        None
    }

    fn clear(&mut self) {
        self.account = None;
        self.transactions.clear();
        self.form = None;
        self.live = None;
        self.loading = false;
        self.error = None;
    }

    // ── Rendering helpers ───────────────────────────────────────────

    fn render_summary(&self, frame: &mut Frame, area: Rect) {
        let brand = self.provider.brand();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::brand_accent(brand)))
            .style(Style::default().bg(theme::brand_primary(brand)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let on_primary = theme::color(brand.on_primary);
        let lines = match &self.account {
            Some(account) => {
                let number = if self.provider == Provider::Tarjeta {
                    mask_card_number(&account.number)
                } else {
                    censor_number(&account.number)
                };
                vec![
                    Line::from(Span::styled(
                        account.name.clone(),
                        Style::default().fg(on_primary).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(number, Style::default().fg(on_primary))),
                    Line::default(),
                    Line::from(vec![
                        Span::styled("Available  ", Style::default().fg(on_primary)),
                        Span::styled(
                            format_cop(account.balance),
                            Style::default()
                                .fg(theme::brand_accent(brand))
                                .add_modifier(Modifier::BOLD),
                        ),
                    ]),
                ]
            }
            None if self.loading => vec![Line::from(Span::styled(
                "Loading account...",
                Style::default().fg(on_primary),
            ))],
            None => vec![Line::from(Span::styled(
                self.error.clone().unwrap_or_else(|| "No account loaded".into()),
                Style::default().fg(on_primary),
            ))],
        };
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_transactions(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(["Date", "Type", "Amount", "Status"]).style(theme::table_header());
        let rows = self.transactions.iter().map(|t| {
            Row::new([
                Cell::from(t.date.as_deref().map(short_date).unwrap_or_default()),
                Cell::from(t.kind.clone()),
                Cell::from(format_cop(t.amount)),
                Cell::from(t.status.clone().unwrap_or_default()),
            ])
            .style(theme::table_row())
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(17),
                Constraint::Min(10),
                Constraint::Length(14),
                Constraint::Length(12),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .title(Span::styled(" Movements ", theme::title_style()))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme::border_default()),
        );
        frame.render_widget(table, area);
    }

    fn render_form(&self, frame: &mut Frame, area: Rect, form: &CodeForm) {
        let brand = self.provider.brand();
        let accent = theme::brand_accent(brand);
        let w = 44u16.min(area.width);
        let h = 12u16.min(area.height);
        let popup = Rect::new(
            area.x + (area.width - w) / 2,
            area.y + (area.height - h) / 2,
            w,
            h,
        );
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(Span::styled(" New withdrawal code ", theme::title_style()))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(accent))
            .style(Style::default().bg(theme::BG_PANEL));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let [a, b, status] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .areas(inner);
        for (i, (field, rect)) in form.fields.iter().zip([a, b]).enumerate() {
            let rect = Rect::new(rect.x + 1, rect.y, rect.width.saturating_sub(2), rect.height);
            field.render(frame, rect, i == form.focus && !form.busy, accent);
        }
        let line = if form.busy {
            Span::styled("Requesting code...", Style::default().fg(theme::DIM))
        } else if let Some(ref err) = form.error {
            Span::styled(err.as_str(), theme::error())
        } else {
            Span::raw("")
        };
        frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), status);
    }
}

/// RFC 3339 timestamps become local `YYYY-MM-DD HH:MM`; anything else is shown as-is.
fn short_date(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_owned(),
        |dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        },
    )
}

impl Component for DashboardScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.form.is_some() {
            self.handle_form_key(key);
            return Ok(None);
        }
        if self.live.is_some() {
            return Ok(self.handle_card_key(key));
        }
        let action = match key.code {
            KeyCode::Char('g') => self.open_form(),
            KeyCode::Char('r') => Some(Action::RefreshDashboard),
            KeyCode::Char('a') => Some(Action::SwitchScreen(crate::screen::ScreenId::Atm)),
            KeyCode::Char('l') => Some(Action::Logout),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SelectProvider(p) => self.provider = *p,
            Action::LoggedIn | Action::RefreshDashboard => self.refresh(),
            Action::ProfileLoaded(account) => {
                self.loading = false;
                self.account = Some(account.as_ref().clone());
            }
            Action::TransactionsLoaded(txs) => self.transactions.clone_from(txs),
            Action::CodeIssued { issued, amount } => {
                if self.form.as_ref().is_some_and(|f| f.busy) {
                    self.form = None;
                    self.live = Some(LiveCode::start(
                        self.bank.code_session(),
                        &issued.code,
                        *amount,
                        self.action_tx.clone(),
                    ));
                }
            }
            Action::SessionUpdated(snapshot) => {
                if let Some(live) = self.live.as_mut() {
                    live.observe(snapshot);
                }
            }
            Action::RequestFailed(message) => {
                if let Some(form) = self.form.as_mut().filter(|f| f.busy) {
                    form.busy = false;
                    form.error = Some(message.clone());
                } else if self.loading {
                    self.loading = false;
                    self.error = Some(message.clone());
                }
            }
            Action::Logout => self.clear(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [summary, movements] =
            Layout::vertical([Constraint::Length(6), Constraint::Min(3)]).areas(area);
        self.render_summary(frame, summary);
        self.render_transactions(frame, movements);

        if let Some(form) = &self.form {
            self.render_form(frame, area, form);
        } else if let Some(live) = &self.live {
            frame.render_widget(CodeCard::new(live.snapshot(), self.provider.brand()), area);
        }
    }

    fn set_focused(&mut self, focused: bool) {
        if !focused {
            self.form = None;
            self.live = None;
        }
    }

    fn captures_text(&self) -> bool {
        self.form.is_some() || self.live.is_some()
    }

    fn hints(&self) -> Vec<(&'static str, &'static str)> {
        if self.form.is_some() {
            vec![("Tab", "next field"), ("Enter", "request"), ("Esc", "cancel")]
        } else if self.live.is_some() {
            vec![("v", "show/hide"), ("c", "copy"), ("x", "close")]
        } else {
            vec![("g", "withdrawal code"), ("a", "ATM"), ("r", "refresh"), ("l", "log out"), ("q", "quit")]
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cajero_core::{IssuedCode, ServiceConfig};
    use crossterm::event::{KeyEventKind, KeyEventState, KeyModifiers};
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::widgets::code_card::tests::buffer_text;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn account() -> Account {
        serde_json::from_value(serde_json::json!({
            "numero": "13001234567",
            "nombre": "Ana Gómez",
            "monto": 480000
        }))
        .unwrap()
    }

    fn dashboard() -> DashboardScreen {
        let bank = Bank::new(ServiceConfig::new("http://127.0.0.1:9".parse().unwrap())).unwrap();
        let mut d = DashboardScreen::new(bank);
        d.update(&Action::ProfileLoaded(Box::new(account()))).unwrap();
        d
    }

    fn draw(d: &DashboardScreen) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| d.render(f, f.area())).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn summary_shows_holder_and_balance() {
        let text = draw(&dashboard());
        assert!(text.contains("Ana Gómez"));
        assert!(text.contains("*******4567"));
        assert!(text.contains("$ 480.000"));
    }

    #[test]
    fn form_validates_before_requesting() {
        let mut d = dashboard();
        d.handle_key_event(press(KeyCode::Char('g'))).unwrap();
        assert!(d.form.is_some());

        for c in "15000".chars() {
            d.handle_key_event(press(KeyCode::Char(c))).unwrap();
        }
        d.handle_key_event(press(KeyCode::Enter)).unwrap();
        for c in "1234".chars() {
            d.handle_key_event(press(KeyCode::Char(c))).unwrap();
        }
        d.handle_key_event(press(KeyCode::Enter)).unwrap();

        let form = d.form.as_ref().unwrap();
        assert!(!form.busy);
        assert!(form.error.as_deref().unwrap_or_default().contains("10.000"));
    }

    #[test]
    fn cards_cannot_issue_codes() {
        let mut d = dashboard();
        d.update(&Action::SelectProvider(Provider::Tarjeta)).unwrap();
        let action = d.handle_key_event(press(KeyCode::Char('g'))).unwrap();
        assert!(matches!(action, Some(Action::Notify(_))));
        assert!(d.form.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn issued_code_opens_the_card_and_blur_closes_it() {
        let mut d = dashboard();
        d.form = Some(CodeForm {
            busy: true,
            ..CodeForm::new()
        });
        d.update(&Action::CodeIssued {
            issued: IssuedCode {
                account: "13001234567".into(),
                code: "482913".into(),
                message: None,
            },
            amount: Some(50_000),
        })
        .unwrap();
        assert!(d.form.is_none());
        assert!(d.live.is_some());

        let text = draw(&d);
        assert!(text.contains("4 8 2 9 1 3"));

        d.handle_key_event(press(KeyCode::Char('v'))).unwrap();
        let text = draw(&d);
        assert!(text.contains("• • • • • •"));
        assert!(!text.contains("4 8 2 9 1 3"));

        d.set_focused(false);
        assert!(d.live.is_none());
    }
}
