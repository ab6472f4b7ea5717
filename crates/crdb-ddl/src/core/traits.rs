//! Collaborator traits the reader and planner are parameterized over.
//!
//! This module defines the two external seams:
//!
//! - [`QueryExecutor`]: runs SQL against the live connection
//! - [`MetadataCache`]: memoizes column descriptors per table
//!
//! Both are injected explicitly; the library holds no global state.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;

use super::schema::ColumnMap;

/// One row of a catalog or introspection query, in text form.
///
/// Catalog reads use the simple-query protocol (the target dialect has no
/// cursor support), so every value arrives as text; `None` is SQL NULL.
#[derive(Debug, Clone, Default)]
pub struct SqlRow {
    columns: Vec<String>,
    values: Vec<Option<String>>,
}

impl SqlRow {
    /// Create a row from parallel column-name and value vectors.
    pub fn new(columns: Vec<String>, values: Vec<Option<String>>) -> Self {
        Self { columns, values }
    }

    /// Value by column name; `None` when the column is absent or NULL.
    pub fn get(&self, name: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.values.get(idx)?.as_deref()
    }

    /// Value by position; `None` when out of range or NULL.
    pub fn index(&self, idx: usize) -> Option<&str> {
        self.values.get(idx)?.as_deref()
    }

    /// Number of values in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Execute SQL against the live connection.
///
/// Used both for catalog reads and DDL statements. Implementations report
/// structured errors on malformed SQL; a SHOW-style command unsupported by
/// the deployment target yields an error the caller treats as
/// "introspection unavailable", never a panic.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a query returning rows (catalog reads, SHOW commands).
    async fn query(&self, sql: &str) -> Result<Vec<SqlRow>>;

    /// Run a statement returning an affected-row count (DDL, UPDATE).
    async fn execute(&self, sql: &str) -> Result<u64>;
}

/// Cache partition for a table's descriptors.
///
/// Temporary tables live in a session-private schema and must not share
/// cache entries with an ordinary table of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheScope {
    /// Ordinary tables in the current schema.
    Permanent,
    /// Session-scoped tables tracked by [`TempTables`].
    Temporary,
}

/// Shared key-value store memoizing column descriptors by table name.
///
/// Externally owned; the reader only gets and sets. Values are opaque
/// blobs to the cache: it never inspects descriptors.
pub trait MetadataCache: Send + Sync {
    /// Fetch the cached descriptor map for a table, if present.
    fn get(&self, scope: CacheScope, table: &str) -> Option<ColumnMap>;

    /// Store the descriptor map for a table.
    fn set(&self, scope: CacheScope, table: &str, columns: ColumnMap);

    /// Drop cached entries for a table from both partitions.
    fn purge(&self, table: &str);
}

/// In-memory [`MetadataCache`] suitable for a single process.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<(CacheScope, String), ColumnMap>>,
}

impl MetadataCache for MemoryCache {
    fn get(&self, scope: CacheScope, table: &str) -> Option<ColumnMap> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        entries.get(&(scope, table.to_string())).cloned()
    }

    fn set(&self, scope: CacheScope, table: &str, columns: ColumnMap) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert((scope, table.to_string()), columns);
    }

    fn purge(&self, table: &str) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.remove(&(CacheScope::Permanent, table.to_string()));
        entries.remove(&(CacheScope::Temporary, table.to_string()));
    }
}

/// Session-scoped registry of tables created as "temporary".
///
/// The dialect has no native temporary tables; temp tables are ordinary
/// tables the caller registers here. Membership selects the metadata
/// cache partition and the schema filter used when reading the catalog.
#[derive(Debug, Default)]
pub struct TempTables {
    tables: Mutex<HashSet<String>>,
}

impl TempTables {
    /// Register a table as temporary.
    pub fn add(&self, table: impl Into<String>) {
        let mut tables = self.tables.lock().expect("temp table lock poisoned");
        tables.insert(table.into());
    }

    /// Remove a table from the registry (after it is dropped).
    pub fn remove(&self, table: &str) {
        let mut tables = self.tables.lock().expect("temp table lock poisoned");
        tables.remove(table);
    }

    /// Whether the table was registered as temporary.
    pub fn contains(&self, table: &str) -> bool {
        let tables = self.tables.lock().expect("temp table lock poisoned");
        tables.contains(table)
    }
}
