//! Sequential invoice-number allocation helpers.
//!
//! Numbers look like `INV/TP/2026/08/0007`: a per-kind prefix, the creation
//! year and month, and a zero-padded counter that restarts for every
//! prefix+year+month scope. The zero padding keeps lexicographic and numeric
//! order identical, so "sort descending, take first" finds the current
//! maximum.

use chrono::{DateTime, Datelike, Utc};

/// Width of the zero-padded sequence suffix.
const SEQUENCE_WIDTH: usize = 4;

/// Regex matching every number allocated in `prefix`'s scope for the month
/// of `now`. The prefix is escaped since it contains `/` today and could
/// contain regex metacharacters tomorrow.
pub fn month_scope_pattern(prefix: &str, now: DateTime<Utc>) -> String {
    format!(
        "^{}/{}/{:02}/",
        escape_regex(prefix),
        now.year(),
        now.month()
    )
}

/// Format a full invoice number for the month of `now`.
pub fn format_invoice_number(prefix: &str, now: DateTime<Utc>, sequence: u32) -> String {
    format!(
        "{}/{}/{:02}/{:0width$}",
        prefix,
        now.year(),
        now.month(),
        sequence,
        width = SEQUENCE_WIDTH
    )
}

/// Next sequence value given the highest number currently allocated in the
/// scope, or `None` when the scope is empty.
pub fn next_sequence(latest: Option<&str>) -> u32 {
    latest
        .and_then(parse_sequence_suffix)
        .map(|n| n + 1)
        .unwrap_or(1)
}

/// Parse the trailing counter of an invoice number.
pub fn parse_sequence_suffix(number: &str) -> Option<u32> {
    number.rsplit('/').next()?.parse().ok()
}

/// Escape a literal string for use inside a MongoDB `$regex`.
pub fn escape_regex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(
            c,
            '.' | '^' | '$' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
