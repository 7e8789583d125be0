//! The validation and execution pipeline
//!
//! One gateway instance holds the configuration and the executor; every
//! request runs the same strictly linear pipeline to completion:
//! parse, policy check, limit enforcement, canonical rendering, execution.
//! Any stage short-circuits to a typed rejection or failure, and no stage
//! re-enters an earlier one. The validation stages hold no mutable state,
//! so concurrent requests need no coordination beyond pool checkout.

use sqlx::AnyPool;

use crate::config::{ConnectionConfig, GatewayConfig};
use crate::error::GatewayError;
use crate::executor::Executor;
use crate::limit::enforce_row_limit;
use crate::parse::parse_single_statement;
use crate::policy::ensure_read_only;
use crate::render::to_sql;
use crate::schema;
use crate::types::{CandidateQuery, Driver, ResultSet};

/// Validate-and-execute gateway for untrusted SQL text.
pub struct Gateway {
    driver: Driver,
    config: GatewayConfig,
    executor: Executor,
}

impl Gateway {
    /// Connect to the configured database and build a gateway around the
    /// pooled connection.
    pub async fn connect(
        connection: &ConnectionConfig,
        config: GatewayConfig,
    ) -> Result<Self, GatewayError> {
        let executor = Executor::connect(connection, &config).await?;
        log::info!("database connection established ({})", connection);
        Ok(Self {
            driver: connection.driver,
            config,
            executor,
        })
    }

    /// Wrap an existing pool, e.g. one shared with other components.
    pub fn from_pool(pool: AnyPool, driver: Driver, config: GatewayConfig) -> Self {
        let executor = Executor::from_pool(pool, config.statement_timeout);
        Self {
            driver,
            config,
            executor,
        }
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    pub fn max_rows(&self) -> u64 {
        self.config.max_rows
    }

    /// Run the full pipeline for one candidate query.
    ///
    /// Synchronous to completion: the result is fully materialized before
    /// this returns, and nothing about the candidate is retained
    /// afterwards. A rejected or failed query is reported once; the caller
    /// decides whether to regenerate.
    pub async fn run(&self, candidate: &CandidateQuery) -> Result<ResultSet, GatewayError> {
        if let Some(question) = &candidate.question {
            log::debug!("validating generated SQL for question: {}", question);
        }

        let sql = sanitize(&candidate.sql, self.config.max_rows, self.driver)
            .inspect_err(|e| log::warn!("rejected candidate query: {}", e))?;

        log::debug!("executing sanitized SQL: {}", sql);
        let result = self.executor.fetch(&sql).await?;
        log::debug!(
            "query returned {} row(s), {} column(s)",
            result.row_count(),
            result.columns.len()
        );
        Ok(result)
    }

    /// Convenience wrapper for callers without question context.
    pub async fn run_sql(&self, sql: &str) -> Result<ResultSet, GatewayError> {
        self.run(&CandidateQuery::new(sql)).await
    }

    /// Plain-text description of the connected database's tables and
    /// columns, for prompting the upstream generator.
    ///
    /// Introspection statements are gateway-built (PRAGMA among them) and
    /// bypass the read-only pipeline; the interpolated identifiers are
    /// validated instead.
    pub async fn describe_schema(&self) -> Result<String, GatewayError> {
        let tables = self.executor.fetch(schema::tables_query(self.driver)).await?;

        let mut description = String::new();
        for row in &tables.rows {
            let Some(crate::types::SqlValue::Text(table)) = row.first() else {
                continue;
            };
            let columns = self
                .executor
                .fetch(&schema::columns_query(self.driver, table)?)
                .await?;
            description.push_str(&schema::describe_table(self.driver, table, &columns));
        }
        Ok(description)
    }
}

/// Turn candidate text into sanitized, executable SQL without touching a
/// database: parse, prove read-only, cap the row count, re-render.
///
/// # Examples
/// ```
/// # use sqlgate::gateway::sanitize;
/// # use sqlgate::types::Driver;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let sql = sanitize("SELECT id, name FROM customers", 100, Driver::MySql)?;
/// assert_eq!(sql, "SELECT id, name FROM customers LIMIT 100");
/// # Ok(())
/// # }
/// ```
pub fn sanitize(sql: &str, max_rows: u64, driver: Driver) -> Result<String, GatewayError> {
    let mut statement = parse_single_statement(sql, driver)?;
    ensure_read_only(&statement)?;
    enforce_row_limit(&mut statement, max_rows);
    Ok(to_sql(&statement))
}
