//! French-locale presentation helpers shared by statistics and documents.

use chrono::{NaiveDate, NaiveDateTime};

pub const DEFAULT_CURRENCY: &str = "XOF";

/// `dd/mm/yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `dd/mm/yyyy à HH:MM`.
pub fn format_date_time(moment: NaiveDateTime) -> String {
    moment.format("%d/%m/%Y à %H:%M").to_string()
}

/// Groups thousands with spaces, uses a decimal comma and appends the currency symbol.
///
/// Franc CFA amounts carry no decimals; unknown ISO codes are appended verbatim.
pub fn format_currency(amount: f64, currency: Option<&str>) -> String {
    let code = currency.unwrap_or(DEFAULT_CURRENCY).trim().to_ascii_uppercase();
    let (symbol, decimals) = match code.as_str() {
        "XOF" | "XAF" => ("F CFA", 0),
        "EUR" => ("€", 2),
        "USD" => ("$", 2),
        "GBP" => ("£", 2),
        _ => (code.as_str(), 2),
    };
    format!("{} {symbol}", format_number(amount, decimals))
}

/// Space-grouped number with a decimal comma.
pub fn format_number(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let rendered = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match rendered.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (rendered.as_str(), None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }

    let negative = value < 0.0 && rendered.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut output = String::new();
    if negative {
        output.push('-');
    }
    output.push_str(&grouped);
    if let Some(fraction) = fraction {
        output.push(',');
        output.push_str(fraction);
    }
    output
}
