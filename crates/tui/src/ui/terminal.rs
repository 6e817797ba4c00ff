use std::io::{Stdout, stdout};

use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::error::{AppError, Result};

pub type AppTerminal = Terminal<CrosstermBackend<Stdout>>;

fn terminal_err(context: &str, err: impl std::fmt::Display) -> AppError {
    AppError::Terminal(format!("{context}: {err}"))
}

/// Puts the terminal into raw mode on the alternate screen. Pair with
/// [`restore_terminal`] before the process exits, or the shell is left in a
/// broken state.
pub fn setup_terminal() -> Result<AppTerminal> {
    enable_raw_mode().map_err(|e| terminal_err("enable raw mode", e))?;
    let mut out = stdout();
    crossterm::execute!(out, EnterAlternateScreen)
        .map_err(|e| terminal_err("enter alternate screen", e))?;
    Terminal::new(CrosstermBackend::new(out)).map_err(|e| terminal_err("create terminal", e))
}

pub fn restore_terminal(terminal: &mut AppTerminal) -> Result<()> {
    disable_raw_mode().map_err(|e| terminal_err("disable raw mode", e))?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .map_err(|e| terminal_err("leave alternate screen", e))?;
    terminal
        .show_cursor()
        .map_err(|e| terminal_err("show cursor", e))
}
