//! SQL expression fragments requiring dialect-specific casts.
//!
//! The dialect refuses implicit casts in several places the base family
//! accepts them: concatenation arguments, substring positions, and
//! text-to-integer conversions all need explicit casts.

use once_cell::sync::Lazy;
use regex::Regex;

static QUOTED_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"'.*'").unwrap());

/// Append `::text` unless the argument already is a quoted literal.
fn cast_text(value: &str) -> String {
    if QUOTED_LITERAL.is_match(value) {
        value.to_string()
    } else {
        format!("{}::text", value)
    }
}

/// Concatenation fragment with explicit text casts.
///
/// A leading empty-string element keeps integer-only concatenations valid
/// without casting each element at the call site.
pub fn concat(parts: &[&str]) -> String {
    let cast: Vec<String> = parts.iter().map(|p| cast_text(p)).collect();
    let joined = cast.join(" || ");
    if joined.is_empty() {
        " '' ".to_string()
    } else {
        format!(" '' || {} ", joined)
    }
}

/// Concatenation with a separator interleaved between elements.
pub fn concat_join(separator: &str, parts: &[&str]) -> String {
    let mut elements = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            elements.push(separator);
        }
        elements.push(part);
    }

    let cast: Vec<String> = elements.iter().map(|p| cast_text(p)).collect();
    let joined = cast.join(" || ");
    if joined.is_empty() {
        " '' ".to_string()
    } else {
        format!(" {} ", joined)
    }
}

/// Cast a character column to integer.
///
/// Goes through decimal first: callers always supply base-10 strings, and
/// a direct cast would accept notations that are rejected downstream.
pub fn cast_char_to_int(field: &str) -> String {
    format!("{}::decimal::int ", field)
}

/// Substring fragment; start and length need explicit integer casts.
pub fn substring(expr: &str, start: &str, length: Option<&str>) -> String {
    match length {
        Some(length) => format!("SUBSTR({}, {}::int, {}::int)", expr, start, length),
        None => format!("SUBSTR({}, {}::int)", expr, start),
    }
}
