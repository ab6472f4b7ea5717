//! Query executor backed by a deadpool-postgres connection pool.
//!
//! All traffic uses the simple-query protocol: the target dialect does
//! not support cursors, and catalog reads only ever need text values.

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::{Config as PgConfig, NoTls, SimpleQueryMessage};
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::core::traits::{QueryExecutor, SqlRow};
use crate::error::{DdlError, Result};

/// PostgreSQL-wire query executor.
pub struct PgExecutor {
    pool: Pool,
}

impl PgExecutor {
    /// Connect and apply session options once.
    pub async fn connect(config: &ConnectionConfig, max_conns: usize) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(max_conns)
            .build()
            .map_err(|e| DdlError::pool(e.to_string(), "creating connection pool"))?;

        // Test connection and apply session options
        let client = pool
            .get()
            .await
            .map_err(|e| DdlError::pool(e.to_string(), "establishing first connection"))?;
        for statement in config.session.startup_statements() {
            client.simple_query(&statement).await?;
        }

        info!(
            "Connected to {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self { pool })
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn query(&self, sql: &str) -> Result<Vec<SqlRow>> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DdlError::pool(e.to_string(), "getting connection for query"))?;

        let messages = client.simple_query(sql).await?;

        let mut rows = Vec::new();
        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                let columns = row
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect();
                let values = (0..row.len()).map(|i| row.get(i).map(str::to_string)).collect();
                rows.push(SqlRow::new(columns, values));
            }
        }

        debug!(rows = rows.len(), "query returned");
        Ok(rows)
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DdlError::pool(e.to_string(), "getting connection for execute"))?;

        let messages = client.simple_query(sql).await?;

        let mut affected = 0;
        for message in messages {
            if let SimpleQueryMessage::CommandComplete(count) = message {
                affected = count;
            }
        }
        Ok(affected)
    }
}
