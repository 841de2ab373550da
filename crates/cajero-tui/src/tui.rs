//! Terminal initialization, restoration, and panic-safe cleanup.

use std::io::{Stdout, stdout};

use color_eyre::eyre::Result;
use crossterm::{
    ExecutableCommand, cursor,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend};

pub type Backend = CrosstermBackend<Stdout>;

/// Terminal wrapper: raw mode and the alternate screen for its lifetime.
pub struct Tui {
    terminal: Terminal<Backend>,
}

impl Tui {
    pub fn new() -> Result<Self> {
        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        Ok(Self { terminal })
    }

    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;
        stdout().execute(cursor::Hide)?;
        self.terminal.clear()?;
        Ok(())
    }

    /// Best-effort restoration; partial failures are ignored.
    pub fn exit(&mut self) {
        restore();
    }

    pub fn draw<F>(&mut self, render: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(render)?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        self.exit();
    }
}

fn restore() {
    let _ = stdout().execute(cursor::Show);
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
}

/// Install panic and error hooks that restore the terminal before printing.
///
/// Must be called before entering the terminal.
pub fn install_hooks() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .display_env_section(false)
        .into_hooks();
    eyre_hook.install()?;

    let panic_hook = panic_hook.into_panic_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        panic_hook(info);
    }));

    Ok(())
}
