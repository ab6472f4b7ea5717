//! Dialect capability profile (Strategy pattern).
//!
//! The original generator family expressed dialect variants as an
//! inheritance chain overriding individual methods. Here a variant is a
//! [`DialectProfile`] value supplying only the overridden behaviors:
//! digit-capacity table, cast-expression rules, sequence syntax, and
//! capability flags. [`DialectProfile::cockroachdb`] derives from the
//! base profile and overrides only the deltas.

pub mod expr;

use crate::core::schema::{ColumnSpec, TypeFamily};

/// Cast expression selected for the rebuild's data-copy UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastRule {
    /// Plain column reference; the type family did not change.
    Assign,
    /// `CAST(col AS NUMERIC)`: char/text source into numeric or float.
    ViaNumeric,
    /// `CAST(CAST(col AS NUMERIC) AS INTEGER)`: char/text source into
    /// integer; the dialect rejects a direct text-to-integer cast.
    ViaNumericToInteger,
    /// Native inline cast `col::<type>` for any other family change.
    Inline,
}

/// SQL-generation capabilities and limits of one target dialect.
#[derive(Debug, Clone)]
pub struct DialectProfile {
    /// Dialect identifier (e.g. "cockroachdb").
    pub name: &'static str,

    /// Whether the wire protocol supports scrollable cursors.
    pub supports_cursors: bool,

    /// Whether native temporary tables exist.
    pub supports_temp_tables: bool,

    /// Whether DDL participates in the surrounding transaction. When
    /// false, multi-statement plans can be interrupted mid-sequence.
    pub transactional_ddl: bool,

    /// Decimal-digit capacity by integer byte width, widest first.
    digit_capacity: &'static [(u8, i32)],

    /// Suffix naming the sequence behind `<table>_<column>`.
    sequence_suffix: &'static str,
}

impl DialectProfile {
    /// Base PostgreSQL profile.
    pub fn postgres() -> Self {
        Self {
            name: "postgres",
            supports_cursors: true,
            supports_temp_tables: true,
            transactional_ddl: true,
            digit_capacity: &[(8, 18), (4, 9), (2, 4), (1, 2)],
            sequence_suffix: "_seq",
        }
    }

    /// CockroachDB: wire-compatible with the base profile, minus cursors,
    /// native temp tables and transactional DDL.
    pub fn cockroachdb() -> Self {
        Self {
            name: "cockroachdb",
            supports_cursors: false,
            supports_temp_tables: false,
            transactional_ddl: false,
            ..Self::postgres()
        }
    }

    /// Decimal-digit capacity for an integer column of the given byte
    /// width (not the byte width itself).
    pub fn integer_digits(&self, width: u8) -> i32 {
        self.digit_capacity
            .iter()
            .find(|(min_width, _)| width >= *min_width)
            .map(|(_, digits)| *digits)
            .unwrap_or(0)
    }

    /// Name of the sequence backing `table.column`.
    pub fn sequence_name(&self, table: &str, column: &str) -> String {
        format!("{}_{}{}", table, column, self.sequence_suffix)
    }

    /// Default expression binding a column to its sequence.
    pub fn sequence_default(&self, sequence: &str) -> String {
        format!("nextval('{}')", sequence)
    }

    /// Cast rule for copying data of family `from` into a column of
    /// family `to`. The two composed-cast pairs are exactly the ones the
    /// dialect documents; do not extend them without verification.
    pub fn cast_rule(&self, from: TypeFamily, to: TypeFamily) -> CastRule {
        if from.is_character() && matches!(to, TypeFamily::Numeric | TypeFamily::Float) {
            CastRule::ViaNumeric
        } else if from.is_character() && to == TypeFamily::Integer {
            CastRule::ViaNumericToInteger
        } else if from != to {
            CastRule::Inline
        } else {
            CastRule::Assign
        }
    }

    /// Render the SQL type for a desired column shape.
    ///
    /// Integer widths are chosen from digit capacity, the inverse of the
    /// introspection mapping.
    pub fn column_type_sql(&self, spec: &ColumnSpec) -> String {
        match spec.family {
            TypeFamily::Integer => {
                let digits = spec.length.unwrap_or(10);
                if digits > 9 {
                    "BIGINT".to_string()
                } else if digits > 4 {
                    "INTEGER".to_string()
                } else {
                    "SMALLINT".to_string()
                }
            }
            TypeFamily::Numeric => format!(
                "NUMERIC({},{})",
                spec.length.unwrap_or(10),
                spec.decimals.unwrap_or(0)
            ),
            TypeFamily::Float => {
                if spec.length.unwrap_or(8) > 4 {
                    "DOUBLE PRECISION".to_string()
                } else {
                    "REAL".to_string()
                }
            }
            TypeFamily::Varchar => format!("VARCHAR({})", spec.length.unwrap_or(255)),
            TypeFamily::Text => "TEXT".to_string(),
            TypeFamily::Binary => "BYTEA".to_string(),
        }
    }

    /// Quoted/bare default literal for a spec, or `None` when the spec
    /// carries no default (sequence columns never take one).
    pub fn default_literal(&self, spec: &ColumnSpec) -> Option<String> {
        if spec.sequence {
            return None;
        }
        let value = spec.default.as_ref()?;
        if spec.family.is_character() {
            Some(format!("'{}'", value.replace('\'', "''")))
        } else {
            Some(value.clone())
        }
    }
}
