//! # crdb-ddl
//!
//! CockroachDB schema introspection and DDL migration planning.
//!
//! This library reconstructs normalized, dialect-independent column
//! descriptors from a live database and computes the minimal ordered DDL
//! needed to reconcile them with a desired definition, honoring the
//! dialect's limits:
//!
//! - **No in-place type change**: type/precision changes rebuild the column
//!   via an add-copy-drop-rename sequence
//! - **Two introspection paths**: direct `pg_catalog` queries and the
//!   descriptive `SHOW COLUMNS` command, producing identical descriptors
//! - **Non-transactional DDL**: rebuild statements may auto-commit
//!   independently, so temporary column names are randomized per attempt
//! - **Sequence-aware renames**: renaming a table renames the backing
//!   identity sequence, dropping and re-establishing the column default
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use crdb_ddl::{
//!     ConnectionConfig, DialectProfile, IntrospectionMode, MemoryCache,
//!     MigrationPlanner, PgExecutor, SchemaReader, TempTables,
//! };
//!
//! #[tokio::main]
//! async fn main() -> crdb_ddl::Result<()> {
//!     let config = ConnectionConfig::load("config.yaml")?;
//!     let executor = Arc::new(PgExecutor::connect(&config, 4).await?);
//!     let reader = SchemaReader::new(
//!         executor,
//!         Arc::new(MemoryCache::default()),
//!         Arc::new(TempTables::default()),
//!         DialectProfile::cockroachdb(),
//!         IntrospectionMode::Catalog,
//!         &config.database,
//!     );
//!     let columns = reader.read_columns("app_user", true).await?;
//!     for column in columns.iter() {
//!         println!("{} ({:?})", column.name, column.family);
//!     }
//!     let planner = MigrationPlanner::new(DialectProfile::cockroachdb());
//!     for sql in planner.plan_rename_table("app_user", "app_user2") {
//!         println!("{sql}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod ddl;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod introspect;

// Re-exports for convenient access
pub use config::{ConnectionConfig, SessionOptions};
pub use core::schema::{ColumnInfo, ColumnMap, ColumnSpec, IndexInfo, TypeFamily};
pub use core::traits::{
    CacheScope, MemoryCache, MetadataCache, QueryExecutor, SqlRow, TempTables,
};
pub use ddl::{MigrationPlanner, TempColumnNamer};
pub use dialect::{CastRule, DialectProfile};
pub use error::{DdlError, Result};
pub use executor::PgExecutor;
pub use introspect::{IntrospectionMode, SchemaReader};
