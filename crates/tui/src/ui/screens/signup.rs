use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::Span,
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::{
    app::{SignUpField, SignUpMode, SignUpState},
    ui::{
        screens::login::{centered_box, render_input},
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, signup: &SignUpState) {
    match signup.mode {
        SignUpMode::Form => render_form(frame, area, signup),
        SignUpMode::Verify => render_verify(frame, area, signup),
    }
}

fn render_form(frame: &mut Frame<'_>, area: Rect, signup: &SignUpState) {
    let theme = Theme::default();

    let card_area = centered_box(44, 11, area);
    frame.render_widget(Clear, card_area);

    let block = Block::default()
        .title(" tally · create account ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(card_area);
    frame.render_widget(block, card_area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // name
            Constraint::Length(1), // email
            Constraint::Length(1), // password
            Constraint::Length(1), // confirm
            Constraint::Length(1),
            Constraint::Length(1), // hint
        ])
        .margin(1)
        .split(inner);

    let focus = signup.focus;
    render_input(
        frame,
        rows[0],
        "name",
        &signup.name,
        false,
        focus == SignUpField::Name,
        &theme,
    );
    render_input(
        frame,
        rows[1],
        "email",
        &signup.email,
        false,
        focus == SignUpField::Email,
        &theme,
    );
    render_input(
        frame,
        rows[2],
        "password",
        &signup.password,
        true,
        focus == SignUpField::Password,
        &theme,
    );
    render_input(
        frame,
        rows[3],
        "confirm",
        &signup.confirm,
        true,
        focus == SignUpField::Confirm,
        &theme,
    );

    frame.render_widget(
        Paragraph::new(Span::styled(
            "Enter sign up · Tab next · Esc back to sign in",
            Style::default().fg(theme.dim),
        )),
        rows[5],
    );

    render_message(frame, card_area, signup, &theme);
}

fn render_verify(frame: &mut Frame<'_>, area: Rect, signup: &SignUpState) {
    let theme = Theme::default();

    let card_area = centered_box(46, 8, area);
    frame.render_widget(Clear, card_area);

    let block = Block::default()
        .title(" verify your email ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(card_area);
    frame.render_widget(block, card_area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // explanation
            Constraint::Length(1), // code
            Constraint::Length(1),
            Constraint::Length(1), // hint
        ])
        .margin(1)
        .split(inner);

    frame.render_widget(
        Paragraph::new(format!(
            "A 6-digit code was sent to {}.",
            signup.email
        ))
        .style(Style::default().fg(theme.text)),
        rows[0],
    );

    render_input(frame, rows[1], "code", &signup.code, false, true, &theme);

    frame.render_widget(
        Paragraph::new(Span::styled(
            "Enter verify · Ctrl+R resend · Esc back",
            Style::default().fg(theme.dim),
        )),
        rows[3],
    );

    render_message(frame, card_area, signup, &theme);
}

fn render_message(frame: &mut Frame<'_>, card_area: Rect, signup: &SignUpState, theme: &Theme) {
    if let Some(message) = &signup.message {
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
