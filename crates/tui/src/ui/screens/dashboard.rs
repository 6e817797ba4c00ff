use std::collections::BTreeMap;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
};

use tally_core::{BudgetLevel, Dashboard, ExpenseApi, Phase};

use crate::{
    app::{AppState, InputMode},
    ui::{
        components::{
            bars::{ascii_bar, mini_bars},
            card::{Card, StatCard},
            money::format_usd,
        },
        theme::Theme,
    },
};

pub fn render<G: ExpenseApi>(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &AppState,
    dash: &Dashboard<G>,
) {
    let theme = Theme::default();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // info bar
            Constraint::Length(4), // stat cards
            Constraint::Length(5), // budget card
            Constraint::Min(5),    // expense list + category panel
            Constraint::Length(1), // input / hints
        ])
        .split(area);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(38)])
        .split(layout[3]);

    render_info_bar(frame, layout[0], state, dash, &theme);
    render_stat_cards(frame, layout[1], dash, &theme);
    render_budget_card(frame, layout[2], dash, &theme);
    render_expense_list(frame, middle[0], state, dash, &theme);
    render_category_panel(frame, middle[1], dash, &theme);
    render_bottom_bar(frame, layout[4], state, &theme);
}

fn render_info_bar<G: ExpenseApi>(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &AppState,
    dash: &Dashboard<G>,
    theme: &Theme,
) {
    let user = state.user_email.as_deref().unwrap_or("-");
    let status = match dash.phase() {
        Phase::Loading => Span::styled("loading…", Style::default().fg(theme.warn)),
        Phase::Ready => Span::styled("ready", Style::default().fg(theme.positive)),
    };

    let line = Line::from(vec![
        Span::styled("tally", Style::default().fg(theme.accent)),
        Span::raw("  "),
        Span::styled("user", Style::default().fg(theme.dim)),
        Span::raw(format!(": {user}  ")),
        status,
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_stat_cards<G: ExpenseApi>(
    frame: &mut Frame<'_>,
    area: Rect,
    dash: &Dashboard<G>,
    theme: &Theme,
) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(area);

    StatCard::new("Total Spent", format_usd(dash.total_spent()), theme)
        .subtitle(format!("{} expenses", dash.expenses().len()))
        .render(frame, cols[0]);

    let remaining = dash.remaining();
    let remaining_style = if remaining >= 0.0 {
        Style::default().fg(theme.positive)
    } else {
        Style::default().fg(theme.error)
    };
    StatCard::new("Remaining", format_usd(remaining), theme)
        .value_style(remaining_style)
        .subtitle(if remaining >= 0.0 { "On track" } else { "Over budget" })
        .render(frame, cols[1]);

    let average = dash
        .stats()
        .map(|stats| stats.average_expense)
        .unwrap_or(0.0);
    StatCard::new("Avg Expense", format_usd(average), theme)
        .subtitle("Per transaction")
        .render(frame, cols[2]);

    match dash.top_category() {
        Some((category, amount)) => StatCard::new("Top Category", category, theme)
            .subtitle(format!("{} spent", format_usd(amount)))
            .render(frame, cols[3]),
        None => StatCard::new("Top Category", "-", theme).render(frame, cols[3]),
    }
}

fn render_budget_card<G: ExpenseApi>(
    frame: &mut Frame<'_>,
    area: Rect,
    dash: &Dashboard<G>,
    theme: &Theme,
) {
    let card = Card::new("Monthly Budget", theme);
    let inner = card.inner(area);
    card.render_frame(frame, area);

    let budget = dash.budget();
    let percent = dash.percent_used();
    let level = dash.budget_level();

    let bar_color = match level {
        BudgetLevel::Neutral => theme.positive,
        BudgetLevel::ApproachingLimit => theme.warn,
        BudgetLevel::Exceeded => theme.error,
    };

    let source = if budget.is_fallback() { " (default)" } else { "" };
    let headline = format!(
        "{} of {}{}  ({percent:.1}%)",
        format_usd(dash.total_spent()),
        format_usd(budget.value()),
        source,
    );

    let bar_width = inner.width.saturating_sub(2).max(10) as usize;
    let bar = ascii_bar(dash.total_spent(), budget.value(), bar_width);

    let mut lines = vec![
        Line::from(Span::styled(headline, Style::default().fg(theme.text))),
        Line::from(Span::styled(bar, Style::default().fg(bar_color))),
    ];
    match level {
        BudgetLevel::Exceeded => lines.push(Line::from(Span::styled(
            "Budget exceeded!",
            Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
        ))),
        BudgetLevel::ApproachingLimit => lines.push(Line::from(Span::styled(
            "Approaching budget limit",
            Style::default().fg(theme.warn),
        ))),
        BudgetLevel::Neutral => {}
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_expense_list<G: ExpenseApi>(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &AppState,
    dash: &Dashboard<G>,
    theme: &Theme,
) {
    let card = Card::new("Expenses", theme);
    let inner = card.inner(area);
    card.render_frame(frame, area);

    if dash.phase() == Phase::Loading && dash.expenses().is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Loading your data…",
                Style::default().fg(theme.dim),
            )),
            inner,
        );
        return;
    }

    if dash.expenses().is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No expenses yet. Press 'a' to add one.",
                Style::default().fg(theme.dim),
            )),
            inner,
        );
        return;
    }

    let items: Vec<ListItem<'_>> = dash
        .expenses()
        .iter()
        .enumerate()
        .map(|(index, expense)| {
            let note = expense.note.as_deref().unwrap_or("");
            let row = format!(
                "{}  {:<14} {:>10}  {}",
                expense.date,
                expense.category,
                format_usd(expense.amount),
                note,
            );
            let style = if index == state.dash.selected {
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text)
            };
            ListItem::new(Line::from(Span::styled(row, style)))
        })
        .collect();

    frame.render_widget(List::new(items), inner);
}

fn render_category_panel<G: ExpenseApi>(
    frame: &mut Frame<'_>,
    area: Rect,
    dash: &Dashboard<G>,
    theme: &Theme,
) {
    let card = Card::new("By Category", theme);
    let inner = card.inner(area);
    card.render_frame(frame, area);

    let rows = dash
        .stats()
        .map(|stats| sorted_breakdown(&stats.category_breakdown))
        .unwrap_or_default();
    if rows.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No data yet.",
                Style::default().fg(theme.dim),
            )),
            inner,
        );
        return;
    }

    let monthly: Vec<f64> = dash
        .stats()
        .map(|stats| stats.monthly_breakdown.values().copied().collect())
        .unwrap_or_default();
    let trend_rows = if monthly.is_empty() { 0 } else { 1 };
    let visible = (inner.height as usize).saturating_sub(trend_rows);

    let max = rows[0].1;
    let mut lines: Vec<Line<'_>> = rows
        .iter()
        .take(visible)
        .map(|(category, amount)| {
            Line::from(vec![
                Span::styled(format!("{category:<14} "), Style::default().fg(theme.text)),
                Span::styled(ascii_bar(*amount, max, 8), Style::default().fg(theme.accent)),
                Span::styled(
                    format!(" {:>9}", format_usd(*amount)),
                    Style::default().fg(theme.dim),
                ),
            ])
        })
        .collect();

    if trend_rows > 0 {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<14} ", "by month"), Style::default().fg(theme.dim)),
            Span::styled(mini_bars(&monthly), Style::default().fg(theme.accent)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Breakdown entries sorted by amount, largest first.
fn sorted_breakdown(breakdown: &BTreeMap<String, f64>) -> Vec<(&str, f64)> {
    let mut rows: Vec<(&str, f64)> = breakdown
        .iter()
        .map(|(category, amount)| (category.as_str(), *amount))
        .collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));
    rows
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let line = match state.dash.input_mode {
        InputMode::AddExpense => Line::from(vec![
            Span::styled("add expense", Style::default().fg(theme.accent)),
            Span::raw(format!(" (<amount> [#category] [note]): {}│", state.dash.input)),
        ]),
        InputMode::EditBudget => Line::from(vec![
            Span::styled("set budget", Style::default().fg(theme.accent)),
            Span::raw(format!(": {}│", state.dash.input)),
        ]),
        InputMode::None => {
            let hint = |key: &'static str| Span::styled(key, Style::default().fg(theme.accent));
            Line::from(vec![
                hint("a"),
                Span::raw(" add  "),
                hint("d"),
                Span::raw(" delete  "),
                hint("b"),
                Span::raw(" budget  "),
                hint("r"),
                Span::raw(" refresh  "),
                hint("j/k"),
                Span::raw(" select  "),
                hint("o"),
                Span::raw(" sign out  "),
                hint("q"),
                Span::raw(" quit"),
            ])
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}
