//! Scoped statement execution against the database
//!
//! The executor owns a connection pool built from the gateway
//! configuration. Each execution checks a single connection out, runs
//! exactly one statement under the statement timeout, and returns the
//! connection to the pool on every exit path. No transaction is opened and
//! nothing is retried: a failed statement is reported once to the caller.

use secrecy::ExposeSecret;
use sqlx::AnyPool;
use sqlx::pool::PoolOptions;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::{ConnectionConfig, GatewayConfig};
use crate::decode::{column_names, decode_row};
use crate::error::GatewayError;
use crate::types::ResultSet;

/// Executes sanitized statements through a pooled connection.
pub struct Executor {
    pool: AnyPool,
    statement_timeout: Duration,
}

impl Executor {
    /// Build the pool and verify connectivity with a ping.
    ///
    /// A failure here is a connection error, distinct from the execution
    /// errors later statements may raise.
    pub async fn connect(
        connection: &ConnectionConfig,
        config: &GatewayConfig,
    ) -> Result<Self, GatewayError> {
        // Registers the compiled-in drivers with sqlx::any; must run
        // before the first AnyPool is created
        sqlx::any::install_default_drivers();

        let dsn = connection.connection_string()?;
        let pool: AnyPool = PoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .test_before_acquire(true)
            .connect(dsn.expose_secret())
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        // Force an actual round trip so an unreachable database fails now
        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            statement_timeout: config.statement_timeout,
        })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: AnyPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// Execute one sanitized read statement and materialize the result.
    ///
    /// The checked-out connection is released on success, on database
    /// error, and on timeout alike; dropping the handle returns it to the
    /// pool, so no path can leak it.
    pub async fn fetch(&self, sql: &str) -> Result<ResultSet, GatewayError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        let rows = match timeout(
            self.statement_timeout,
            sqlx::query(sql).fetch_all(&mut *conn),
        )
        .await
        {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => return Err(GatewayError::Execution(e.to_string())),
            Err(_) => {
                return Err(GatewayError::Execution(format!(
                    "statement timed out after {:?}",
                    self.statement_timeout
                )));
            }
        };

        let columns = column_names(&rows);
        let mut tuples = Vec::with_capacity(rows.len());
        for row in &rows {
            tuples.push(decode_row(row)?);
        }

        Ok(ResultSet {
            columns,
            rows: tuples,
        })
    }
}
