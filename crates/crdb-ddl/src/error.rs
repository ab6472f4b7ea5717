//! Error types for introspection and DDL planning.

use thiserror::Error;

/// Main error type for schema operations.
#[derive(Error, Debug)]
pub enum DdlError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query error
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// Alter-column was requested for a column the table does not have.
    ///
    /// This is a caller bug, not a recoverable condition: a plan produced
    /// against a missing column would silently alter nothing.
    #[error("Column {column} not found in table {table}")]
    UnknownColumn { table: String, column: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DdlError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl Into<String>, context: impl Into<String>) -> Self {
        DdlError::Pool {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create an UnknownColumn error
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        DdlError::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// Result type alias for schema operations.
pub type Result<T> = std::result::Result<T, DdlError>;
