use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Raw terminal keys mapped to app-level actions. Plain characters stay
/// [`AppAction::Input`]; what they mean (text entry vs shortcut) is decided
/// per screen by the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    Cancel,
    NextField,
    Submit,
    Backspace,
    Up,
    Down,
    NewAccount,
    ResendCode,
    Input(char),
    None,
}

pub fn map_key(key: KeyEvent) -> AppAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => AppAction::Quit,
            KeyCode::Char('n') => AppAction::NewAccount,
            KeyCode::Char('r') => AppAction::ResendCode,
            _ => AppAction::None,
        };
    }

    match key.code {
        KeyCode::Esc => AppAction::Cancel,
        KeyCode::Tab => AppAction::NextField,
        KeyCode::Enter => AppAction::Submit,
        KeyCode::Backspace => AppAction::Backspace,
        KeyCode::Up => AppAction::Up,
        KeyCode::Down => AppAction::Down,
        KeyCode::Char(ch) => AppAction::Input(ch),
        _ => AppAction::None,
    }
}
