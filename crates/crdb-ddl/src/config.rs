//! Connection and session configuration.
//!
//! Session settings that the original driver mutated on an ambient
//! connection (cursor disabling, savepoint semantics, serial
//! normalization) are modeled here as an immutable [`SessionOptions`]
//! value, applied exactly once at connection establishment.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 26257).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    pub password: String,

    /// Session options applied once after connecting.
    #[serde(default)]
    pub session: SessionOptions,
}

impl ConnectionConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }
}

/// Session options applied at connection establishment.
///
/// Immutable once built; the executor emits the corresponding SET
/// statements on its first connection and never again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Restart the whole transaction on savepoint rollback.
    #[serde(default = "default_true")]
    pub force_savepoint_restart: bool,

    /// Serial normalization mode for SERIAL columns; identity detection
    /// relies on sequence-backed defaults, so this must stay a sequence
    /// mode. Empty disables the statement.
    #[serde(default = "default_serial_normalization")]
    pub serial_normalization: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            force_savepoint_restart: true,
            serial_normalization: default_serial_normalization(),
        }
    }
}

impl SessionOptions {
    /// SET statements to run right after connecting.
    pub fn startup_statements(&self) -> Vec<String> {
        let mut statements = Vec::new();
        if self.force_savepoint_restart {
            statements.push("SET force_savepoint_restart = true".to_string());
        }
        if !self.serial_normalization.is_empty() {
            statements.push(format!(
                "SET experimental_serial_normalization TO {}",
                self.serial_normalization
            ));
        }
        statements
    }
}

fn default_port() -> u16 {
    26257
}

fn default_true() -> bool {
    true
}

fn default_serial_normalization() -> String {
    "sql_sequence".to_string()
}
