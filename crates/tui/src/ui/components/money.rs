/// Formats a dollar amount for display, two decimals, sign outside the `$`.
pub fn format_usd(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${amount:.2}")
    }
}
