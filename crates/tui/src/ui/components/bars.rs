use ratatui::symbols;

/// ASCII horizontal bar like `████████░░░░░░░░` for the given ratio.
pub fn ascii_bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 {
        return "░".repeat(width);
    }

    let ratio = (value / max).clamp(0.0, 1.0);
    let filled = ((ratio * width as f64) as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// One-row chart like `▁▂▅█` for a short series, scaled to its maximum.
pub fn mini_bars(values: &[f64]) -> String {
    if values.is_empty() {
        return String::new();
    }
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return " ".repeat(values.len());
    }

    let bars = [
        symbols::bar::ONE_EIGHTH,
        symbols::bar::ONE_QUARTER,
        symbols::bar::THREE_EIGHTHS,
        symbols::bar::HALF,
        symbols::bar::FIVE_EIGHTHS,
        symbols::bar::THREE_QUARTERS,
        symbols::bar::SEVEN_EIGHTHS,
        symbols::bar::FULL,
    ];

    values
        .iter()
        .map(|&value| {
            if value <= 0.0 {
                " "
            } else {
                let index = ((value / max) * 7.0) as usize;
                bars[index.min(7)]
            }
        })
        .collect()
}
