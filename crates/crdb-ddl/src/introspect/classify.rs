//! Normalization of raw catalog rows into column descriptors.
//!
//! The two introspection strategies (direct catalog query and the
//! descriptive `SHOW COLUMNS` command) feed the same classification
//! through a tagged [`RawColumn`] union, so the per-family rules cannot
//! drift between read paths.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::schema::{ColumnInfo, TypeFamily};
use crate::dialect::DialectProfile;

static INT_WIDTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)INT(\d)").unwrap());
static FLOAT_WIDTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)FLOAT(\d)").unwrap());
static DESCRIBED_VARCHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)VARCHAR\((\d+)\)").unwrap());
static DESCRIBED_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)DECIMAL\((\d+)(?:,(\d+))?\)").unwrap());

/// A raw column row in one of the two introspection shapes.
#[derive(Debug)]
pub enum RawColumn<'a> {
    /// Direct `pg_catalog` row: bare type name plus the encoded type
    /// modifier integer.
    Catalog {
        name: &'a str,
        type_name: &'a str,
        type_modifier: i32,
        not_null: bool,
        has_default: bool,
        default: Option<&'a str>,
    },
    /// `SHOW COLUMNS` row: a single descriptive type string.
    Described {
        name: &'a str,
        data_type: &'a str,
        not_null: bool,
        default: Option<&'a str>,
    },
}

impl<'a> RawColumn<'a> {
    fn name(&self) -> &'a str {
        match self {
            RawColumn::Catalog { name, .. } | RawColumn::Described { name, .. } => name,
        }
    }

    fn not_null(&self) -> bool {
        match self {
            RawColumn::Catalog { not_null, .. } | RawColumn::Described { not_null, .. } => {
                *not_null
            }
        }
    }

    fn default(&self) -> Option<&'a str> {
        match self {
            RawColumn::Catalog { default, .. } | RawColumn::Described { default, .. } => *default,
        }
    }

    fn has_default(&self) -> bool {
        match self {
            RawColumn::Catalog { has_default, .. } => *has_default,
            RawColumn::Described { default, .. } => default.is_some_and(|d| !d.is_empty()),
        }
    }
}

struct ParsedType {
    family: TypeFamily,
    max_length: i32,
    scale: Option<i32>,
}

/// Classify a raw row into a normalized descriptor.
///
/// Returns `None` for vendor types outside the closed family set; such
/// columns are omitted from the result entirely.
pub fn classify(raw: &RawColumn<'_>, profile: &DialectProfile) -> Option<ColumnInfo> {
    let parsed = parse_type(raw, profile)?;
    let default = raw.default();

    let mut info = ColumnInfo {
        name: raw.name().to_string(),
        family: parsed.family,
        max_length: parsed.max_length,
        scale: parsed.scale,
        not_null: raw.not_null(),
        has_default: false,
        default_value: None,
        primary_key_identity: false,
        binary: Some(parsed.family == TypeFamily::Binary),
        unique: None,
    };

    match parsed.family {
        // A sequence-backed default marks a primary-key identity column;
        // its default is suppressed, never reported to consumers.
        TypeFamily::Integer if default.is_some_and(|d| d.starts_with("nextval")) => {
            info.primary_key_identity = true;
            info.unique = Some(true);
        }
        // Binary columns never record a default.
        TypeFamily::Binary => {}
        family => {
            if raw.has_default() {
                info.has_default = true;
                info.default_value = default.map(|d| normalize_default(d, family));
            }
        }
    }

    Some(info)
}

fn parse_type(raw: &RawColumn<'_>, profile: &DialectProfile) -> Option<ParsedType> {
    match raw {
        RawColumn::Catalog {
            type_name,
            type_modifier,
            ..
        } => {
            if *type_name == "varchar" {
                Some(ParsedType {
                    family: TypeFamily::Varchar,
                    max_length: type_modifier - 4,
                    scale: None,
                })
            } else if let Some(width) = capture_width(&INT_WIDTH, type_name) {
                Some(integer_type(profile, width))
            } else if *type_name == "numeric" {
                // High bits carry precision, the low 16 bits the scale
                // biased by the header size.
                Some(ParsedType {
                    family: TypeFamily::Numeric,
                    max_length: type_modifier >> 16,
                    scale: Some((type_modifier & 0xFFFF) - 4),
                })
            } else if let Some(width) = capture_width(&FLOAT_WIDTH, type_name) {
                Some(float_type(width))
            } else if *type_name == "text" {
                Some(unbounded_type(TypeFamily::Text))
            } else if *type_name == "bytea" {
                Some(unbounded_type(TypeFamily::Binary))
            } else {
                None
            }
        }
        RawColumn::Described { data_type, .. } => {
            if let Some(captures) = DESCRIBED_VARCHAR.captures(data_type) {
                Some(ParsedType {
                    family: TypeFamily::Varchar,
                    max_length: captures[1].parse().ok()?,
                    scale: None,
                })
            } else if let Some(captures) = DESCRIBED_DECIMAL.captures(data_type) {
                Some(ParsedType {
                    family: TypeFamily::Numeric,
                    max_length: captures[1].parse().ok()?,
                    scale: Some(
                        captures
                            .get(2)
                            .and_then(|s| s.as_str().parse().ok())
                            .unwrap_or(0),
                    ),
                })
            } else if let Some(width) = capture_width(&INT_WIDTH, data_type) {
                Some(integer_type(profile, width))
            } else if let Some(width) = capture_width(&FLOAT_WIDTH, data_type) {
                Some(float_type(width))
            } else if *data_type == "STRING" {
                Some(unbounded_type(TypeFamily::Text))
            } else if *data_type == "BYTES" {
                Some(unbounded_type(TypeFamily::Binary))
            } else {
                None
            }
        }
    }
}

fn capture_width(pattern: &Regex, text: &str) -> Option<u8> {
    pattern.captures(text)?[1].parse().ok()
}

fn integer_type(profile: &DialectProfile, width: u8) -> ParsedType {
    // Decimal-digit capacity, not the byte width.
    ParsedType {
        family: TypeFamily::Integer,
        max_length: profile.integer_digits(width),
        scale: None,
    }
}

fn float_type(width: u8) -> ParsedType {
    // The catalog does not expose precision for floats; guess from the
    // byte width. Known-lossy.
    let (max_length, scale) = if width == 8 { (8, 7) } else { (4, 2) };
    ParsedType {
        family: TypeFamily::Float,
        max_length,
        scale: Some(scale),
    }
}

fn unbounded_type(family: TypeFamily) -> ParsedType {
    ParsedType {
        family,
        max_length: -1,
        scale: None,
    }
}

/// Strip redundant cast syntax from a raw default expression.
///
/// Catalog-reported defaults may be the bare literal or an expression
/// with a `value::type` cast; consumers must only see the literal.
fn normalize_default(raw: &str, family: TypeFamily) -> String {
    match family {
        TypeFamily::Varchar | TypeFamily::Text => match raw.split_once("::") {
            Some((value, _)) => value.trim_matches('\'').to_string(),
            None => raw.to_string(),
        },
        _ => {
            let value = raw.split_once("::").map_or(raw, |(value, _)| value);
            value
                .trim_matches(|c| matches!(c, '(' | ')' | '\''))
                .to_string()
        }
    }
}
