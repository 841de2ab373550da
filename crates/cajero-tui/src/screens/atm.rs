//! Guided cash withdrawal.
//!
//! Code providers: PIN → issued code shown on the card → code typed at the
//! keypad → cash. Debit cards: card lookup → PIN → cash.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table},
};
use secrecy::SecretString;
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use cajero_core::money::{censor_number, format_cop, format_pesos};
use cajero_core::{
    Account, Bank, Provider, Withdrawal, WithdrawalAuth, WithdrawalRequest, validate,
};

use crate::action::Action;
use crate::component::Component;
use crate::session_bridge::LiveCode;
use crate::theme;
use crate::widgets::code_card::CodeCard;
use crate::widgets::input_field::InputField;

const PROVIDERS: [Provider; 3] = [Provider::Bancolombia, Provider::Nequi, Provider::Tarjeta];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Provider,
    Details,
    /// Code on screen, waiting for it to be typed back.
    Code,
    /// Card found, waiting for the PIN.
    Pin,
    Working,
    Receipt,
}

pub struct AtmScreen {
    bank: Bank,
    action_tx: Option<UnboundedSender<Action>>,
    step: Step,
    selected: usize,
    provider: Provider,
    /// Account/phone/card and amount.
    details: [InputField; 2],
    details_focus: usize,
    /// PIN (code providers, before issuing) or the code at the keypad.
    secret: InputField,
    amount: u64,
    holder: Option<String>,
    live: Option<LiveCode>,
    receipt: Option<Withdrawal>,
    throbber: ThrobberState,
    error: Option<String>,
}

fn details_fields(provider: Provider) -> [InputField; 2] {
    [
        InputField::new(provider.brand().login_label),
        InputField::new("Amount"),
    ]
}

impl AtmScreen {
    pub fn new(bank: Bank) -> Self {
        let provider = Provider::default();
        Self {
            bank,
            action_tx: None,
            step: Step::Provider,
            selected: 0,
            provider,
            details: details_fields(provider),
            details_focus: 0,
            secret: InputField::new("PIN").masked().max_len(4),
            amount: 0,
            holder: None,
            live: None,
            receipt: None,
            throbber: ThrobberState::default(),
            error: None,
        }
    }

    fn reset(&mut self) {
        self.step = Step::Provider;
        self.details = details_fields(self.provider);
        self.details_focus = 0;
        self.secret = InputField::new("PIN").masked().max_len(4);
        self.amount = 0;
        self.holder = None;
        self.live = None;
        self.receipt = None;
        self.error = None;
    }

    fn account(&self) -> String {
        self.details[0].value().trim().to_owned()
    }

    fn choose_provider(&mut self) {
        if let Some(p) = PROVIDERS.get(self.selected) {
            self.provider = *p;
            self.details = details_fields(*p);
            self.details_focus = 0;
            self.secret = InputField::new("PIN").masked().max_len(4);
            self.error = None;
            self.step = Step::Details;
        }
    }

    /// Validate account, amount and (for code providers) the PIN, then
    /// request a code or look the card up.
    fn submit_details(&mut self) {
        self.error = None;
        let account = self.account();
        let checked = validate::non_empty(self.provider.brand().login_label, &account)
            .and_then(|()| validate::parse_amount(self.details[1].value()))
            .and_then(validate::withdrawal_amount)
            .and_then(|amount| {
                if self.provider.uses_withdrawal_code() {
                    validate::pin(self.secret.value()).map(|()| amount)
                } else {
                    Ok(amount)
                }
            });
        let amount = match checked {
            Ok(amount) => amount,
            Err(e) => {
                self.error = Some(e.to_string());
                return;
            }
        };
        self.amount = amount;

        let Some(tx) = self.action_tx.clone() else {
            return;
        };
        let bank = self.bank.clone();
        self.step = Step::Working;

        if self.provider.uses_withdrawal_code() {
            let pin = SecretString::from(self.secret.value().to_owned());
            tokio::spawn(async move {
                let action = match bank.generate_withdrawal_code(&account, &pin).await {
                    Ok(issued) => Action::CodeIssued {
                        issued,
                        amount: Some(amount),
                    },
                    Err(e) => Action::RequestFailed(e.to_string()),
                };
                let _ = tx.send(action);
            });
        } else {
            tokio::spawn(async move {
                let action = match bank.lookup_account(&account).await {
                    Ok(card) => Action::AccountVerified(Box::new(card)),
                    Err(e) => Action::RequestFailed(e.to_string()),
                };
                let _ = tx.send(action);
            });
        }
    }

    fn submit_withdrawal(&mut self) {
        let auth = match self.step {
            Step::Code => {
                let code = self.secret.value().trim().to_owned();
                if code.is_empty() {
                    self.error = Some("enter the withdrawal code".into());
                    return;
                }
                if self.live.as_ref().is_some_and(LiveCode::is_expired) {
                    warn!("withdrawal code countdown ran out; sending it anyway");
                }
                WithdrawalAuth::Code(code)
            }
            Step::Pin => {
                if let Err(e) = validate::pin(self.secret.value()) {
                    self.error = Some(e.to_string());
                    return;
                }
                WithdrawalAuth::Pin(SecretString::from(self.secret.value().to_owned()))
            }
            _ => return,
        };

        let Some(tx) = self.action_tx.clone() else {
            return;
        };
        let bank = self.bank.clone();
        let request = WithdrawalRequest {
            account: self.account(),
            auth,
            amount: self.amount,
        };
        self.error = None;
        self.step = Step::Working;
        tokio::spawn(async move {
            let action = match bank.withdraw(request).await {
                Ok(w) => Action::WithdrawalCompleted(Box::new(w)),
                Err(e) => Action::RequestFailed(e.to_string()),
            };
            let _ = tx.send(action);
        });
    }

    fn on_verified(&mut self, card: &Account) {
        self.holder = Some(card.name.clone());
        self.secret = InputField::new("Card PIN").masked().max_len(4);
        self.step = Step::Pin;
    }

    fn on_failed(&mut self, message: &str) {
        self.error = Some(message.to_owned());
        // A rejected code can be retyped while the card is still up.
        self.step = if self.live.is_some() {
            Step::Code
        } else if self.holder.is_some() {
            Step::Pin
        } else {
            Step::Details
        };
    }

    // ── Rendering ───────────────────────────────────────────────────

    fn panel(&self, area: Rect, height: u16) -> (Block<'static>, Rect) {
        let brand = self.provider.brand();
        let w = 56u16.min(area.width);
        let h = height.min(area.height);
        let rect = Rect::new(
            area.x + (area.width - w) / 2,
            area.y + (area.height - h) / 2,
            w,
            h,
        );
        let block = Block::default()
            .title(Line::from(vec![
                Span::styled(" Cajero · ", theme::title_style()),
                Span::styled(
                    brand.name,
                    Style::default()
                        .fg(theme::brand_accent(brand))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
            ]))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::brand_primary(brand)));
        (block, rect)
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if let Some(ref err) = self.error {
            frame.render_widget(
                Paragraph::new(Span::styled(err.as_str(), theme::error()))
                    .alignment(Alignment::Center),
                area,
            );
        }
    }

    fn render_providers(&self, frame: &mut Frame, area: Rect) {
        let (block, rect) = self.panel(area, 9);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);

        let mut lines = vec![Line::from(Span::styled(
            "How do you want to withdraw?",
            Style::default().fg(theme::DIM),
        ))];
        lines.push(Line::default());
        for (i, p) in PROVIDERS.iter().enumerate() {
            let brand = p.brand();
            let selected = i == self.selected;
            let style = if selected {
                Style::default()
                    .fg(theme::brand_accent(brand))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::TEXT)
            };
            let method = if p.uses_withdrawal_code() {
                "withdrawal code"
            } else {
                "card + PIN"
            };
            lines.push(Line::from(vec![
                Span::styled(if selected { "▸ " } else { "  " }, style),
                Span::styled(brand.name, style),
                Span::styled(format!("  ({method})"), Style::default().fg(theme::DIM)),
            ]));
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_details(&self, frame: &mut Frame, area: Rect) {
        let with_pin = self.provider.uses_withdrawal_code();
        let (block, rect) = self.panel(area, if with_pin { 15 } else { 11 });
        let inner = block.inner(rect);
        frame.render_widget(block, rect);
        let accent = theme::brand_accent(self.provider.brand());

        let [a, b, c, status] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(if with_pin { 4 } else { 0 }),
            Constraint::Length(1),
        ])
        .areas(inner);
        for (i, (field, rect)) in self.details.iter().zip([a, b]).enumerate() {
            let rect = Rect::new(rect.x + 1, rect.y, rect.width.saturating_sub(2), rect.height);
            field.render(frame, rect, i == self.details_focus, accent);
        }
        if with_pin {
            let rect = Rect::new(c.x + 1, c.y, c.width.saturating_sub(2), c.height);
            self.secret.render(frame, rect, self.details_focus == 2, accent);
        }
        self.render_status(frame, status);
    }

    fn render_keypad(&self, frame: &mut Frame, area: Rect) {
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(area);

        if let Some(live) = &self.live {
            frame.render_widget(CodeCard::new(live.snapshot(), self.provider.brand()), left);
        }

        let (block, rect) = self.panel(right, 10);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);
        let [summary, field, status] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .areas(inner);

        let mut lines = vec![Line::from(vec![
            Span::styled("Account  ", Style::default().fg(theme::DIM)),
            Span::styled(censor_number(&self.account()), Style::default().fg(theme::TEXT)),
        ])];
        if let Some(ref holder) = self.holder {
            lines.push(Line::from(vec![
                Span::styled("Holder   ", Style::default().fg(theme::DIM)),
                Span::styled(holder.clone(), Style::default().fg(theme::TEXT)),
            ]));
        }
        lines.push(Line::from(vec![
            Span::styled("Amount   ", Style::default().fg(theme::DIM)),
            Span::styled(
                format_pesos(self.amount),
                Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
            ),
        ]));
        frame.render_widget(Paragraph::new(lines), summary);

        let rect = Rect::new(field.x + 1, field.y, field.width.saturating_sub(2), field.height);
        self.secret
            .render(frame, rect, true, theme::brand_accent(self.provider.brand()));
        self.render_status(frame, status);
    }

    fn render_working(&self, frame: &mut Frame, area: Rect) {
        let (block, rect) = self.panel(area, 3);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);
        let throbber = Throbber::default()
            .label(" Talking to the bank...")
            .style(Style::default().fg(theme::TEXT))
            .throbber_style(Style::default().fg(theme::brand_accent(self.provider.brand())));
        frame.render_stateful_widget(throbber, inner, &mut self.throbber.clone());
    }

    fn render_receipt(&self, frame: &mut Frame, area: Rect, w: &Withdrawal) {
        let rows = u16::try_from(w.bills.len()).unwrap_or(0);
        let (block, rect) = self.panel(area, 9 + rows);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);

        let [head, table] =
            Layout::vertical([Constraint::Length(4), Constraint::Min(0)]).areas(inner);

        let mut lines = vec![
            Line::from(Span::styled(
                w.message.clone(),
                Style::default()
                    .fg(theme::SUCCESS)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::styled("Amount       ", Style::default().fg(theme::DIM)),
                Span::styled(format_pesos(w.amount), Style::default().fg(theme::TEXT)),
            ]),
        ];
        if let Some(balance) = w.new_balance {
            lines.push(Line::from(vec![
                Span::styled("New balance  ", Style::default().fg(theme::DIM)),
                Span::styled(format_cop(balance), Style::default().fg(theme::TEXT)),
            ]));
        }
        frame.render_widget(Paragraph::new(lines), head);

        if !w.bills.is_empty() {
            let body = w.bills.iter().map(|&(denomination, count)| {
                Row::new([
                    Cell::from(format_pesos(denomination)),
                    Cell::from(format!("× {count}")),
                ])
                .style(theme::table_row())
            });
            let bills = Table::new(body, [Constraint::Length(14), Constraint::Length(8)])
                .header(Row::new(["Bill", "Count"]).style(theme::table_header()));
            frame.render_widget(bills, table);
        }
    }
}

impl Component for AtmScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match self.step {
            Step::Provider => match key.code {
                KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
                KeyCode::Down | KeyCode::Char('j') => {
                    self.selected = (self.selected + 1).min(PROVIDERS.len() - 1);
                }
                KeyCode::Enter => self.choose_provider(),
                KeyCode::Esc => return Ok(Some(Action::GoBack)),
                _ => {}
            },
            Step::Details => {
                let fields = if self.provider.uses_withdrawal_code() { 3 } else { 2 };
                match key.code {
                    KeyCode::Esc => self.reset(),
                    KeyCode::Tab | KeyCode::Down => {
                        self.details_focus = (self.details_focus + 1) % fields;
                    }
                    KeyCode::BackTab | KeyCode::Up => {
                        self.details_focus = (self.details_focus + fields - 1) % fields;
                    }
                    KeyCode::Enter if self.details_focus + 1 < fields => self.details_focus += 1,
                    KeyCode::Enter => self.submit_details(),
                    _ => {
                        let field = match self.details_focus {
                            0 => &mut self.details[0],
                            1 => &mut self.details[1],
                            _ => &mut self.secret,
                        };
                        if field.handle_key(key) {
                            self.error = None;
                        }
                    }
                }
            }
            Step::Code | Step::Pin => match key.code {
                KeyCode::Esc => self.reset(),
                KeyCode::Enter => self.submit_withdrawal(),
                KeyCode::Char('v') if self.step == Step::Code && self.secret.value().is_empty() => {
                    if let Some(live) = self.live.as_mut() {
                        live.toggle_visibility();
                    }
                }
                KeyCode::Char('c') if self.step == Step::Code && self.secret.value().is_empty() => {
                    if self.live.as_mut().and_then(LiveCode::copy).is_some() {
                        debug!("withdrawal code handed to clipboard");
                    }
                }
                _ => {
                    if self.secret.handle_key(key) {
                        self.error = None;
                    }
                }
            },
            Step::Working => {}
            Step::Receipt => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    self.reset();
                }
            }
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Tick if self.step == Step::Working => self.throbber.calc_next(),
            Action::CodeIssued { issued, amount } if self.step == Step::Working => {
                debug!(account = %issued.account, "code issued at the ATM");
                self.live = Some(LiveCode::start(
                    self.bank.code_session(),
                    &issued.code,
                    *amount,
                    self.action_tx.clone(),
                ));
                self.secret = InputField::new("Withdrawal code").max_len(12);
                self.step = Step::Code;
            }
            Action::SessionUpdated(snapshot) => {
                if let Some(live) = self.live.as_mut() {
                    live.observe(snapshot);
                }
            }
            Action::AccountVerified(card) if self.step == Step::Working => self.on_verified(card),
            Action::WithdrawalCompleted(w) if self.step == Step::Working => {
                self.live = None;
                self.receipt = Some(w.as_ref().clone());
                self.step = Step::Receipt;
            }
            Action::RequestFailed(message) if self.step == Step::Working => {
                self.on_failed(message);
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        match self.step {
            Step::Provider => self.render_providers(frame, area),
            Step::Details => self.render_details(frame, area),
            Step::Code | Step::Pin => self.render_keypad(frame, area),
            Step::Working => self.render_working(frame, area),
            Step::Receipt => {
                if let Some(ref w) = self.receipt {
                    self.render_receipt(frame, area, w);
                }
            }
        }
    }

    fn set_focused(&mut self, focused: bool) {
        if !focused {
            self.reset();
        }
    }

    fn captures_text(&self) -> bool {
        matches!(self.step, Step::Details | Step::Code | Step::Pin)
    }

    fn hints(&self) -> Vec<(&'static str, &'static str)> {
        match self.step {
            Step::Provider => vec![("↑↓", "select"), ("Enter", "continue"), ("Esc", "back")],
            Step::Details => vec![("Tab", "next field"), ("Enter", "continue"), ("Esc", "cancel")],
            Step::Code => vec![
                ("Enter", "withdraw"),
                ("v", "show/hide"),
                ("c", "copy"),
                ("Esc", "cancel"),
            ],
            Step::Pin => vec![("Enter", "withdraw"), ("Esc", "cancel")],
            Step::Working => Vec::new(),
            Step::Receipt => vec![("Enter", "done")],
        }
    }
}
