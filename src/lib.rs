//! SQL safety validation and execution gateway
//!
//! Mediates between machine-generated SQL text (untrusted, possibly
//! malformed or malicious) and a live relational database. A candidate
//! query is parsed into a syntax tree, proven to be a pure read query all
//! the way down (nested mutations inside CTEs, subqueries, and set
//! operations included), capped to a bounded row count, re-rendered
//! deterministically, and only then executed — against PostgreSQL, MySQL,
//! MariaDB, or SQLite through a pooled sqlx connection.
//!
//! ```no_run
//! use sqlgate::{CandidateQuery, ConnectionConfig, Driver, Gateway, GatewayConfig};
//!
//! # async fn example() -> Result<(), sqlgate::GatewayError> {
//! let connection = ConnectionConfig::new(
//!     Driver::MySql, "localhost", None, "app", "s3cret", "classicmodels",
//! );
//! let gateway = Gateway::connect(&connection, GatewayConfig::default()).await?;
//!
//! let candidate = CandidateQuery::with_question(
//!     "SELECT customerName, creditLimit FROM customers ORDER BY creditLimit",
//!     "Which customers have the highest credit limit?",
//! );
//! let result = gateway.run(&candidate).await?;
//! println!("{} rows", result.row_count());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decode;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod limit;
pub mod parse;
pub mod policy;
pub mod render;
pub mod schema;
pub mod types;

// Re-export secrecy types for consumers
pub use secrecy::{ExposeSecret, SecretString};

// Re-exports
pub use config::{ConnectionConfig, DEFAULT_MAX_ROWS, DEFAULT_STATEMENT_TIMEOUT, GatewayConfig};
pub use error::GatewayError;
pub use executor::Executor;
pub use gateway::{Gateway, sanitize};
pub use limit::enforce_row_limit;
pub use parse::parse_single_statement;
pub use policy::ensure_read_only;
pub use render::to_sql;
pub use types::{CandidateQuery, Driver, ResultSet, SqlValue};
