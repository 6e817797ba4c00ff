use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::ui::theme::Theme;

/// Bordered container for dashboard panels.
pub struct Card<'a> {
    title: &'a str,
    theme: &'a Theme,
}

impl<'a> Card<'a> {
    pub fn new(title: &'a str, theme: &'a Theme) -> Self {
        Self { title, theme }
    }

    pub fn block(&self) -> Block<'a> {
        Block::default()
            .title(Span::styled(
                format!(" {} ", self.title),
                Style::default().fg(self.theme.accent),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.border))
    }

    pub fn inner(&self, area: Rect) -> Rect {
        self.block().inner(area)
    }

    pub fn render_frame(&self, frame: &mut Frame<'_>, area: Rect) {
        frame.render_widget(self.block(), area);
    }
}

/// A label + value card for the dashboard's headline numbers.
pub struct StatCard<'a> {
    title: &'a str,
    value: String,
    value_style: Style,
    subtitle: Option<String>,
    theme: &'a Theme,
}

impl<'a> StatCard<'a> {
    pub fn new(title: &'a str, value: impl Into<String>, theme: &'a Theme) -> Self {
        Self {
            title,
            value: value.into(),
            value_style: Style::default().fg(theme.text),
            subtitle: None,
            theme,
        }
    }

    pub fn value_style(mut self, style: Style) -> Self {
        self.value_style = style;
        self
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let card = Card::new(self.title, self.theme);
        let inner = card.inner(area);
        card.render_frame(frame, area);

        let mut lines = vec![Line::from(Span::styled(
            self.value.clone(),
            self.value_style.add_modifier(Modifier::BOLD),
        ))];
        if let Some(sub) = &self.subtitle {
            lines.push(Line::from(Span::styled(
                sub.clone(),
                Style::default().fg(self.theme.dim),
            )));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }
}
