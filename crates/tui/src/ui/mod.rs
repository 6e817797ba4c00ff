pub mod components;
pub mod keymap;
pub mod screens;
mod terminal;
mod theme;

pub use terminal::{AppTerminal, restore_terminal, setup_terminal};
pub use theme::Theme;

use ratatui::Frame;
use tally_core::{Dashboard, ExpenseApi};

use crate::app::{AppState, Screen};

/// Top-level draw: dispatches on the active screen, then overlays the toast.
pub fn render<G: ExpenseApi>(frame: &mut Frame<'_>, state: &AppState, dash: &Dashboard<G>) {
    let area = frame.area();
    match state.screen {
        Screen::Login => screens::login::render(frame, area, &state.login),
        Screen::SignUp => screens::signup::render(frame, area, &state.signup),
        Screen::Dashboard => screens::dashboard::render(frame, area, state, dash),
    }
    components::toast::render(frame, area, state.toast.as_ref());
}
