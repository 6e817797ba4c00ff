use chrono::{Local, NaiveDate};

use api_types::expense::ExpenseNew;

/// Categories accepted by the quick-entry line. Unknown tags are rejected
/// rather than silently remapped.
pub const CATEGORIES: [&str; 7] = [
    "Food",
    "Transportation",
    "Entertainment",
    "Shopping",
    "Healthcare",
    "Bills",
    "Other",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
    pub amount: f64,
    pub category: String,
    pub note: Option<String>,
}

impl ParsedEntry {
    pub fn into_expense(self) -> ExpenseNew {
        ExpenseNew {
            category: self.category,
            amount: self.amount,
            note: self.note,
            date: today(),
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parses a quick-entry line: `<amount> [#category] [note...]`.
///
/// The amount accepts `.` or `,` as decimal separator and at most two
/// decimals. At most one `#tag` is allowed; without one the entry lands in
/// `Other`.
pub fn parse(input: &str) -> Result<ParsedEntry, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Enter an amount.".to_string());
    }

    let mut parts = trimmed.splitn(2, ' ');
    let amount_raw = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim();

    let amount = parse_amount(amount_raw)?;
    let (category, note) = parse_tag(rest)?;

    Ok(ParsedEntry {
        amount,
        category: category.unwrap_or_else(|| "Other".to_string()),
        note,
    })
}

/// Parses a positive money amount with at most two decimals.
pub fn parse_amount(raw: &str) -> Result<f64, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Missing amount.".to_string());
    }

    let normalized = raw.replace(',', ".");
    if let Some((_, decimals)) = normalized.split_once('.')
        && decimals.len() > 2
    {
        return Err("At most two decimals.".to_string());
    }

    let amount: f64 = normalized.parse().map_err(|_| "Invalid amount.".to_string())?;
    if !(amount > 0.0) {
        return Err("Amount must be > 0.".to_string());
    }
    Ok(amount)
}

fn parse_tag(rest: &str) -> Result<(Option<String>, Option<String>), String> {
    if rest.is_empty() {
        return Ok((None, None));
    }

    let mut category: Option<String> = None;
    let mut kept: Vec<&str> = Vec::new();

    for token in rest.split_whitespace() {
        if let Some(tag) = token.strip_prefix('#') {
            if tag.is_empty() {
                kept.push(token);
                continue;
            }
            if category.is_some() {
                return Err("Too many tags: at most 1.".to_string());
            }
            category = Some(canonical_category(tag)?);
        } else {
            kept.push(token);
        }
    }

    let note = kept.join(" ");
    let note = if note.is_empty() { None } else { Some(note) };
    Ok((category, note))
}

fn canonical_category(tag: &str) -> Result<String, String> {
    CATEGORIES
        .iter()
        .find(|name| name.eq_ignore_ascii_case(tag))
        .map(|name| (*name).to_string())
        .ok_or_else(|| format!("Unknown category '#{tag}'."))
}
