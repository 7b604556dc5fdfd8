//! Utility functions and helpers.

pub mod http;

use url::Url;

use crate::error::Result;

/// Resolve a potentially relative href against a base URL.
pub fn resolve_url(base_url: &str, href: &str) -> Result<Url> {
    Ok(Url::parse(base_url)?.join(href)?)
}

/// Format a count with thousands separators (`1,234`).
pub fn format_count(value: u64) -> String {
    group_digits(&value.to_string())
}

/// Format a delta with an explicit sign and thousands separators (`+1,234`, `-5`, `+0`).
pub fn format_signed(value: i64) -> String {
    let sign = if value < 0 { '-' } else { '+' };
    format!("{}{}", sign, group_digits(&value.unsigned_abs().to_string()))
}

fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
