//! Schema metadata types for columns and indexes.
//!
//! These types provide a dialect-independent representation of column
//! metadata: every vendor type string collapses into one [`TypeFamily`],
//! and lengths are semantic (character count or decimal-digit capacity),
//! never byte widths.

use serde::{Deserialize, Serialize};

/// Closed set of dialect-independent type families.
///
/// All vendor-specific subtypes collapse into one of these; raw vendor
/// type strings never escape the introspection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFamily {
    /// Bounded character data.
    Varchar,
    /// Whole numbers of any byte width.
    Integer,
    /// Exact decimals with precision and scale.
    Numeric,
    /// Approximate floating point.
    Float,
    /// Unbounded character data.
    Text,
    /// Unbounded binary data.
    Binary,
}

impl TypeFamily {
    /// Character-typed families (varchar, text).
    pub fn is_character(self) -> bool {
        matches!(self, TypeFamily::Varchar | TypeFamily::Text)
    }

    /// Families whose length is always the -1 "unbounded" sentinel.
    pub fn is_unbounded(self) -> bool {
        matches!(self, TypeFamily::Text | TypeFamily::Binary)
    }
}

/// Normalized view of one existing column.
///
/// A value object, recomputed on each introspection call. `max_length`
/// is semantic: character count for varchar, decimal-digit capacity for
/// integer/numeric/float, and -1 for the unbounded families.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name, unique within its table.
    pub name: String,

    /// Type family the vendor type collapsed into.
    pub family: TypeFamily,

    /// Semantic length (-1 for text/binary).
    pub max_length: i32,

    /// Fractional decimal digits; `None` when not applicable.
    pub scale: Option<i32>,

    /// Whether the column rejects NULL.
    pub not_null: bool,

    /// Whether a default is recorded (always false for identity columns).
    pub has_default: bool,

    /// Normalized default literal, cast syntax stripped.
    pub default_value: Option<String>,

    /// True when the column is primary and backed by a sequence default.
    pub primary_key_identity: bool,

    /// Binary flag; `None` when unknown.
    pub binary: Option<bool>,

    /// Uniqueness flag; `None` when unknown.
    pub unique: Option<bool>,
}

/// Ordered mapping of column name to descriptor.
///
/// Preserves physical column position: consumers rely on positional
/// stability for display and for reconstructing CREATE TABLE order, so
/// this is a thin insertion-ordered map rather than a sorted one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMap {
    columns: Vec<ColumnInfo>,
}

impl ColumnMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor, replacing any previous one with the same name.
    pub fn insert(&mut self, column: ColumnInfo) {
        if let Some(existing) = self.columns.iter_mut().find(|c| c.name == column.name) {
            *existing = column;
        } else {
            self.columns.push(column);
        }
    }

    /// Look up a descriptor by column name.
    pub fn get(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether a column with the given name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Descriptors in physical column order.
    pub fn iter(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter()
    }

    /// Column names in physical column order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the map holds no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<ColumnInfo> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = ColumnInfo>>(iter: I) -> Self {
        let mut map = Self::new();
        for column in iter {
            map.insert(column);
        }
        map
    }
}

/// Index metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Whether the index enforces uniqueness.
    pub unique: bool,

    /// Indexed column names, in index order, quote and qualifier stripped.
    pub columns: Vec<String>,
}

/// Declarative target definition for one column.
///
/// Consumed read-only by the planner; carries no identity beyond equality
/// of its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,

    /// Desired type family.
    pub family: TypeFamily,

    /// Desired semantic length, when the family has one.
    #[serde(default)]
    pub length: Option<u32>,

    /// Desired fractional digits, when the family has them.
    #[serde(default)]
    pub decimals: Option<u32>,

    /// Whether the column must reject NULL.
    #[serde(default)]
    pub not_null: bool,

    /// Desired default literal (unquoted; quoting is per family).
    #[serde(default)]
    pub default: Option<String>,

    /// Whether the column is backed by a sequence (identity). Sequence
    /// columns never take a caller-supplied default.
    #[serde(default)]
    pub sequence: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_column(name: &str, family: TypeFamily) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            family,
            max_length: 10,
            scale: None,
            not_null: false,
            has_default: false,
            default_value: None,
            primary_key_identity: false,
            binary: Some(false),
            unique: None,
        }
    }

    #[test]
    fn test_family_predicates() {
        assert!(TypeFamily::Varchar.is_character());
        assert!(TypeFamily::Text.is_character());
        assert!(!TypeFamily::Integer.is_character());

        assert!(TypeFamily::Text.is_unbounded());
        assert!(TypeFamily::Binary.is_unbounded());
        assert!(!TypeFamily::Varchar.is_unbounded());
    }

    #[test]
    fn test_column_map_preserves_insertion_order() {
        let mut map = ColumnMap::new();
        map.insert(make_column("id", TypeFamily::Integer));
        map.insert(make_column("name", TypeFamily::Varchar));
        map.insert(make_column("amount", TypeFamily::Numeric));

        let names: Vec<_> = map.names().collect();
        assert_eq!(names, vec!["id", "name", "amount"]);
    }

    #[test]
    fn test_column_map_insert_replaces_in_place() {
        let mut map = ColumnMap::new();
        map.insert(make_column("id", TypeFamily::Integer));
        map.insert(make_column("name", TypeFamily::Varchar));

        let mut replacement = make_column("id", TypeFamily::Integer);
        replacement.not_null = true;
        map.insert(replacement);

        assert_eq!(map.len(), 2);
        assert!(map.get("id").unwrap().not_null);
        let names: Vec<_> = map.names().collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_column_map_lookup() {
        let map: ColumnMap = vec![make_column("id", TypeFamily::Integer)]
            .into_iter()
            .collect();

        assert!(map.contains("id"));
        assert!(!map.contains("missing"));
        assert_eq!(map.get("id").unwrap().family, TypeFamily::Integer);
        assert!(map.get("missing").is_none());
    }
}
