//! Login and registration forms for the selected provider.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use secrecy::SecretString;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use cajero_core::money::format_cop;
use cajero_core::{Bank, CoreError, Credentials, NewAccount, Provider, validate};

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::input_field::InputField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Login,
    Register,
}

pub struct AuthScreen {
    bank: Bank,
    profile_name: String,
    action_tx: Option<UnboundedSender<Action>>,
    provider: Provider,
    mode: Mode,
    fields: Vec<InputField>,
    focus: usize,
    busy: bool,
    throbber: throbber_widgets_tui::ThrobberState,
    error: Option<String>,
}

impl AuthScreen {
    pub fn new(bank: Bank, profile_name: impl Into<String>) -> Self {
        let provider = Provider::default();
        Self {
            bank,
            profile_name: profile_name.into(),
            action_tx: None,
            provider,
            mode: Mode::Login,
            fields: login_fields(provider),
            focus: 0,
            busy: false,
            throbber: throbber_widgets_tui::ThrobberState::default(),
            error: None,
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.fields = match mode {
            Mode::Login => login_fields(self.provider),
            Mode::Register => register_fields(self.provider),
        };
        self.focus = 0;
        self.error = None;
    }

    fn value(&self, label: &str) -> String {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value().trim().to_owned())
            .unwrap_or_default()
    }

    fn submit(&mut self) {
        self.error = None;
        let outcome = match self.mode {
            Mode::Login => self.build_credentials().map(|c| self.spawn_login(c)),
            Mode::Register => self.build_new_account().map(|a| self.spawn_register(a)),
        };
        match outcome {
            Ok(()) => self.busy = true,
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn build_credentials(&self) -> Result<Credentials, CoreError> {
        let id = self.value(self.provider.brand().login_label);
        let pin = self.value(PIN);
        validate::non_empty(self.provider.brand().login_label, &id)?;
        validate::pin(&pin)?;
        let pin = SecretString::from(pin);
        Ok(if self.provider.uses_phone() {
            Credentials::Phone {
                phone: id,
                pin,
                kind: self.provider.kind(),
            }
        } else {
            Credentials::Card { number: id, pin }
        })
    }

    fn build_new_account(&self) -> Result<NewAccount, CoreError> {
        let balance = self.value(BALANCE);
        let initial_balance = if balance.is_empty() {
            0
        } else {
            validate::parse_amount(&balance)?
        };
        let pin = self.value(PIN);
        validate::pin(&pin)?;
        let phone = Some(self.value(PHONE)).filter(|p| !p.is_empty());

        Ok(NewAccount {
            name: self.value(NAME),
            document: self.value(DOCUMENT),
            birth_date: self.value(BIRTH_DATE),
            phone,
            initial_balance,
            pin: SecretString::from(pin),
            kind: self.provider.kind(),
        })
    }

    fn spawn_login(&self, credentials: Credentials) {
        let Some(tx) = self.action_tx.clone() else {
            return;
        };
        let bank = self.bank.clone();
        let profile = self.profile_name.clone();
        tokio::spawn(async move {
            let action = match bank.login(credentials).await {
                Ok(token) => {
                    if let Err(e) = cajero_config::store_token(&profile, &token) {
                        warn!(error = %e, "could not store token in keyring");
                    }
                    Action::LoggedIn
                }
                Err(e) => Action::RequestFailed(e.to_string()),
            };
            let _ = tx.send(action);
        });
    }

    fn spawn_register(&self, account: NewAccount) {
        let Some(tx) = self.action_tx.clone() else {
            return;
        };
        let bank = self.bank.clone();
        tokio::spawn(async move {
            let action = match bank.register(account).await {
                Ok(account) => Action::Registered(Box::new(account)),
                Err(e) => Action::RequestFailed(e.to_string()),
            };
            let _ = tx.send(action);
        });
    }

    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len().max(1);
    }

    fn prev_field(&mut self) {
        let len = self.fields.len().max(1);
        self.focus = (self.focus + len - 1) % len;
    }
}

const PIN: &str = "PIN (4 digits)";
const NAME: &str = "Full name";
const DOCUMENT: &str = "Document number";
const BIRTH_DATE: &str = "Birth date (YYYY-MM-DD)";
const PHONE: &str = "Phone number";
const BALANCE: &str = "Opening balance";

fn login_fields(provider: Provider) -> Vec<InputField> {
    vec![
        InputField::new(provider.brand().login_label),
        InputField::new(PIN).masked().max_len(4),
    ]
}

fn register_fields(provider: Provider) -> Vec<InputField> {
    let mut fields = vec![
        InputField::new(NAME),
        InputField::new(DOCUMENT),
        InputField::new(BIRTH_DATE).max_len(10),
    ];
    if provider.uses_phone() {
        fields.push(InputField::new(PHONE).max_len(10));
    }
    fields.push(InputField::new(BALANCE).with_value("0"));
    fields.push(InputField::new(PIN).masked().max_len(4));
    fields
}

impl Component for AuthScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.busy {
            return Ok(None);
        }
        match key.code {
            KeyCode::Esc => return Ok(Some(Action::GoBack)),
            KeyCode::F(2) => {
                let next = match self.mode {
                    Mode::Login => Mode::Register,
                    Mode::Register => Mode::Login,
                };
                self.set_mode(next);
            }
            KeyCode::Tab | KeyCode::Down => self.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.prev_field(),
            KeyCode::Enter => {
                if self.focus + 1 < self.fields.len() {
                    self.next_field();
                } else {
                    self.submit();
                }
            }
            _ => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    if field.handle_key(key) {
                        self.error = None;
                    }
                }
            }
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SelectProvider(p) => {
                self.provider = *p;
                self.busy = false;
                self.set_mode(Mode::Login);
            }
            Action::Tick if self.busy => self.throbber.calc_next(),
            Action::LoggedIn => {
                self.busy = false;
                self.set_mode(Mode::Login);
            }
            Action::Registered(account) if self.busy => {
                self.busy = false;
                let id = if self.provider.uses_phone() {
                    account.phone.clone().unwrap_or_default()
                } else {
                    account.number.clone()
                };
                let message = format!(
                    "Account {} opened with {}",
                    account.number,
                    format_cop(account.balance)
                );
                self.set_mode(Mode::Login);
                if let Some(field) = self.fields.first_mut() {
                    field.set_value(id);
                }
                self.focus = 1;
                return Ok(Some(Action::Notify(Notification::success(message))));
            }
            Action::RequestFailed(message) if self.busy => {
                self.busy = false;
                self.error = Some(message.clone());
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let brand = self.provider.brand();
        let accent = theme::brand_accent(brand);

        let w = 56u16.min(area.width);
        let rows = u16::try_from(self.fields.len()).unwrap_or(6) * 4 + 6;
        let h = rows.min(area.height);
        let panel = Rect::new(
            area.x + (area.width - w) / 2,
            area.y + (area.height - h) / 2,
            w,
            h,
        );

        let title = match self.mode {
            Mode::Login => "Sign in",
            Mode::Register => "Open an account",
        };
        let block = Block::default()
            .title(Line::from(vec![
                Span::raw(" "),
                Span::styled(brand.name, Style::default().fg(accent).add_modifier(Modifier::BOLD)),
                Span::styled(format!(" · {title} "), theme::title_style()),
            ]))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::brand_primary(brand)));
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let [fields_area, status_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

        for (i, field) in self.fields.iter().enumerate() {
            let y = fields_area.y + u16::try_from(i).unwrap_or(0) * 4;
            if y + 4 > fields_area.y + fields_area.height {
                break;
            }
            let rect = Rect::new(fields_area.x + 1, y, fields_area.width.saturating_sub(2), 4);
            field.render(frame, rect, i == self.focus && !self.busy, accent);
        }

        if self.busy {
            let label = match self.mode {
                Mode::Login => " Signing in...",
                Mode::Register => " Opening account...",
            };
            let throbber = throbber_widgets_tui::Throbber::default()
                .label(label)
                .style(Style::default().fg(theme::TEXT))
                .throbber_style(Style::default().fg(accent));
            frame.render_stateful_widget(throbber, status_area, &mut self.throbber.clone());
        } else if let Some(ref err) = self.error {
            frame.render_widget(
                Paragraph::new(Span::styled(err.as_str(), theme::error())).alignment(Alignment::Center),
                status_area,
            );
        }
    }

    fn captures_text(&self) -> bool {
        true
    }

    fn hints(&self) -> Vec<(&'static str, &'static str)> {
        let toggle = match self.mode {
            Mode::Login => "new account",
            Mode::Register => "sign in",
        };
        vec![("Tab", "next field"), ("Enter", "submit"), ("F2", toggle), ("Esc", "back")]
    }
}
