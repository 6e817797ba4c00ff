use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::Span,
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::{
    app::{LoginField, LoginState},
    ui::theme::Theme,
};

pub fn render(frame: &mut Frame<'_>, area: Rect, login: &LoginState) {
    let theme = Theme::default();

    let card_area = centered_box(40, 7, area);
    frame.render_widget(Clear, card_area);

    let block = Block::default()
        .title(" tally · sign in ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(card_area);
    frame.render_widget(block, card_area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // email
            Constraint::Length(1),
            Constraint::Length(1), // password
            Constraint::Length(1),
            Constraint::Length(1), // hint
        ])
        .margin(1)
        .split(inner);

    render_input(
        frame,
        rows[0],
        "email",
        &login.email,
        false,
        login.focus == LoginField::Email,
        &theme,
    );
    render_input(
        frame,
        rows[2],
        "password",
        &login.password,
        true,
        login.focus == LoginField::Password,
        &theme,
    );

    frame.render_widget(
        Paragraph::new(Span::styled(
            "Enter sign in · Tab next · Ctrl+N new account",
            Style::default().fg(theme.dim),
        )),
        rows[4],
    );

    if let Some(message) = &login.message {
        let message_area = Rect {
            x: card_area.x,
            y: card_area.y + card_area.height + 1,
            width: card_area.width,
            height: 1,
        };
        frame.render_widget(
            Paragraph::new(Span::styled(
                message.as_str(),
                Style::default().fg(theme.error),
            ))
            .alignment(Alignment::Center),
            message_area,
        );
    }
}

pub(crate) fn centered_box(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}

pub(crate) fn render_input(
    frame: &mut Frame<'_>,
    area: Rect,
    label: &str,
    value: &str,
    is_password: bool,
    focused: bool,
    theme: &Theme,
) {
    let cursor = if focused { "│" } else { "" };
    let shown = if is_password {
        "•".repeat(value.chars().count())
    } else {
        value.to_string()
    };

    let style = if focused {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.dim)
    };

    frame.render_widget(
        Paragraph::new(Span::styled(format!("{label}: {shown}{cursor}"), style)),
        area,
    );
}
