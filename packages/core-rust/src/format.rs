//! Display formatting for metric cards and table cells.

/// Formats `value` with `decimals` fractional digits and comma thousands
/// separators, e.g. `format_number(1234567.891, 2) == "1,234,567.89"`.
#[must_use]
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// `$40,000.00`
#[must_use]
pub fn format_currency(value: f64) -> String {
    let body = format_number(value.abs(), 2);
    if value < 0.0 && body != "0.00" {
        format!("-${body}")
    } else {
        format!("${body}")
    }
}

/// `150 HP`
#[must_use]
pub fn format_horsepower(value: f64) -> String {
    format!("{} HP", format_number(value, 0))
}

/// Table cell for an optional measurement; missing values render empty.
#[must_use]
pub fn format_optional(value: Option<f64>, decimals: usize) -> String {
    value.map(|v| format_number(v, decimals)).unwrap_or_default()
}
