//! Column and index introspection against the live catalog.
//!
//! [`SchemaReader`] reconstructs normalized descriptors from whichever of
//! the two introspection strategies fits the deployment target, memoizing
//! results in the injected metadata cache.

pub mod classify;

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, warn};

use crate::core::schema::{ColumnMap, IndexInfo};
use crate::core::traits::{CacheScope, MetadataCache, QueryExecutor, TempTables};
use crate::dialect::DialectProfile;
use crate::error::Result;

use classify::{classify, RawColumn};

/// How column metadata is obtained.
///
/// The two strategies are interchangeable: they target different
/// deployments of the same wire-compatible family and produce identical
/// descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrospectionMode {
    /// Query the `pg_catalog` tables directly.
    Catalog,
    /// Use the descriptive `SHOW COLUMNS` command.
    Describe,
}

/// Reads column and index metadata for one table at a time.
pub struct SchemaReader {
    executor: Arc<dyn QueryExecutor>,
    cache: Arc<dyn MetadataCache>,
    temp_tables: Arc<TempTables>,
    profile: DialectProfile,
    mode: IntrospectionMode,
    database: String,
}

impl SchemaReader {
    /// Create a reader over the given executor and cache.
    ///
    /// `database` is the current database name, used to anchor index
    /// definition parsing.
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        cache: Arc<dyn MetadataCache>,
        temp_tables: Arc<TempTables>,
        profile: DialectProfile,
        mode: IntrospectionMode,
        database: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            cache,
            temp_tables,
            profile,
            mode,
            database: database.into(),
        }
    }

    /// Detailed information about the columns of `table`, keyed by column
    /// name in physical column order.
    ///
    /// With `use_cache`, a prior result is returned without touching the
    /// catalog, and a fresh result is stored back. Temporary tables use a
    /// separate cache partition. A table with no columns, or a deployment
    /// target that cannot answer the introspection query, yields an empty
    /// map; the cache is never populated from a failed read.
    pub async fn read_columns(&self, table: &str, use_cache: bool) -> Result<ColumnMap> {
        let scope = self.cache_scope(table);
        if use_cache {
            if let Some(cached) = self.cache.get(scope, table) {
                return Ok(cached);
            }
        }

        let result = match self.mode {
            IntrospectionMode::Catalog => self.read_columns_catalog(table).await,
            IntrospectionMode::Describe => self.read_columns_describe(table).await,
        };

        let columns = match result {
            Ok(columns) => columns,
            Err(e) => {
                // Drivers without full catalog support report no result
                // set here; the contract is an empty map, not an error.
                warn!(table, error = %e, "column introspection unavailable");
                return Ok(ColumnMap::new());
            }
        };

        debug!(table, columns = columns.len(), "read columns");

        if use_cache {
            self.cache.set(scope, table, columns.clone());
        }
        Ok(columns)
    }

    /// Index metadata for `table`, keyed by index name.
    ///
    /// The implicit identity-ordering index is excluded: it is not a
    /// user-visible constraint.
    pub async fn read_indexes(&self, table: &str) -> Result<BTreeMap<String, IndexInfo>> {
        let sql = format!(
            "SELECT i.schemaname, i.indexname, i.indexdef \
               FROM pg_catalog.pg_indexes i \
               JOIN pg_catalog.pg_namespace ns ON ns.nspname = i.schemaname \
              WHERE i.tablename = '{}' \
                AND (i.schemaname = current_schema() OR ns.oid = pg_my_temp_schema())",
            quote_literal(table)
        );

        let rows = self.executor.query(&sql).await?;

        let mut indexes = BTreeMap::new();
        for row in &rows {
            let (Some(schema), Some(name), Some(definition)) = (
                row.get("schemaname"),
                row.get("indexname"),
                row.get("indexdef"),
            ) else {
                continue;
            };
            if let Some(index) = parse_index_definition(definition, &self.database, schema, table)
            {
                indexes.insert(name.to_string(), index);
            }
        }

        debug!(table, indexes = indexes.len(), "read indexes");
        Ok(indexes)
    }

    /// Drop cached descriptors for a table, from both partitions.
    ///
    /// Call after executing DDL that changes the table's structure.
    pub fn invalidate(&self, table: &str) {
        self.cache.purge(table);
    }

    fn cache_scope(&self, table: &str) -> CacheScope {
        if self.temp_tables.contains(table) {
            CacheScope::Temporary
        } else {
            CacheScope::Permanent
        }
    }

    async fn read_columns_catalog(&self, table: &str) -> Result<ColumnMap> {
        let sql = format!(
            "SELECT a.attnum, a.attname AS field, t.typname AS type, a.attlen, a.atttypmod, \
                    a.attnotnull, a.atthasdef, d.adsrc \
               FROM pg_catalog.pg_class c \
               JOIN pg_catalog.pg_namespace ns ON ns.oid = c.relnamespace \
               JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid \
               JOIN pg_catalog.pg_type t ON t.oid = a.atttypid \
          LEFT JOIN pg_catalog.pg_attrdef d ON (d.adrelid = c.oid AND d.adnum = a.attnum) \
              WHERE c.relkind = 'r' AND c.relname = '{}' AND a.attnum > 0 \
                AND (ns.nspname = current_schema() OR ns.oid = pg_my_temp_schema()) \
           ORDER BY a.attnum",
            quote_literal(table)
        );

        let rows = self.executor.query(&sql).await?;

        let mut columns = ColumnMap::new();
        for row in &rows {
            let (Some(name), Some(type_name)) = (row.get("field"), row.get("type")) else {
                continue;
            };
            let raw = RawColumn::Catalog {
                name,
                type_name,
                type_modifier: row
                    .get("atttypmod")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(-1),
                not_null: flag(row.get("attnotnull")),
                has_default: flag(row.get("atthasdef")),
                default: row.get("adsrc"),
            };
            match classify(&raw, &self.profile) {
                Some(info) => columns.insert(info),
                None => debug!(
                    table,
                    column = name,
                    vendor_type = type_name,
                    "unrecognized vendor type skipped"
                ),
            }
        }
        Ok(columns)
    }

    async fn read_columns_describe(&self, table: &str) -> Result<ColumnMap> {
        let sql = format!("SHOW COLUMNS FROM {}", table);

        let rows = self.executor.query(&sql).await?;

        let mut columns = ColumnMap::new();
        for row in &rows {
            let (Some(name), Some(data_type)) = (row.get("column_name"), row.get("data_type"))
            else {
                continue;
            };
            let raw = RawColumn::Described {
                name,
                data_type,
                not_null: matches!(row.get("is_nullable"), Some("f") | Some("false")),
                default: row.get("column_default").filter(|v| !v.is_empty()),
            };
            match classify(&raw, &self.profile) {
                Some(info) => columns.insert(info),
                None => debug!(
                    table,
                    column = name,
                    vendor_type = data_type,
                    "unrecognized vendor type skipped"
                ),
            }
        }
        Ok(columns)
    }
}

/// Escape a string for inclusion in a single-quoted SQL literal.
fn quote_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Interpret a catalog boolean, which arrives as `t`/`f` or spelled out.
fn flag(value: Option<&str>) -> bool {
    matches!(value, Some("t") | Some("true"))
}

/// Parse one `CREATE INDEX` definition from the catalog.
///
/// The definition may schema-qualify the target table depending on the
/// server version (CVE-2018-1058); anchoring the pattern to the current
/// database name keeps a qualified definition from being misread as a
/// different table. Returns `None` for definitions of other tables and
/// for the implicit identity-ordering index.
fn parse_index_definition(
    definition: &str,
    database: &str,
    schema: &str,
    table: &str,
) -> Option<IndexInfo> {
    let pattern = format!(
        r"(?i)CREATE (UNIQUE )?INDEX (\S+) ON {}\.(?:{}\.)?{} USING (\S+) \(([^)]+)\)",
        regex::escape(database),
        regex::escape(schema),
        regex::escape(table)
    );
    let re = Regex::new(&pattern).ok()?;
    let captures = re.captures(definition)?;

    let column_list = captures.get(4)?.as_str();
    if column_list == "id ASC" {
        return None;
    }

    let columns = column_list
        .split(',')
        .map(|column| {
            let column = column.trim();
            // Sort direction or operator class follows the first space.
            let column = column.split(' ').next().unwrap_or(column);
            column
                .trim_matches(|c: char| c == '\'' || c == '"' || c.is_whitespace())
                .to_string()
        })
        .collect();

    Some(IndexInfo {
        unique: captures.get(1).is_some(),
        columns,
    })
}
