//! Core value, query, and result types

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Database driver, used for SQL dialect selection and connection URI
/// assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    Postgres,
    MySql,
    MariaDb,
    Sqlite,
}

impl Driver {
    /// Detect the driver from a connection URL scheme
    ///
    /// # Examples
    /// ```
    /// # use sqlgate::types::Driver;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let driver = Driver::from_url("postgres://localhost/mydb")?;
    /// assert_eq!(driver, Driver::Postgres);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_url(url: &str) -> Result<Self, GatewayError> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Self::Postgres)
        } else if url.starts_with("mysql://") {
            Ok(Self::MySql)
        } else if url.starts_with("mariadb://") {
            Ok(Self::MariaDb)
        } else if url.starts_with("sqlite:") || url.starts_with("file:") {
            Ok(Self::Sqlite)
        } else {
            Err(GatewayError::Connection(format!(
                "cannot determine database driver from URL: {}",
                url
            )))
        }
    }

    /// URL scheme used when assembling a connection URI.
    ///
    /// MariaDB speaks the MySQL protocol, so it shares the `mysql` scheme.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql | Self::MariaDb => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Conventional port for network databases; `None` for SQLite.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::Postgres => Some(5432),
            Self::MySql | Self::MariaDb => Some(3306),
            Self::Sqlite => None,
        }
    }
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres => write!(f, "PostgreSQL"),
            Self::MySql => write!(f, "MySQL"),
            Self::MariaDb => write!(f, "MariaDB"),
            Self::Sqlite => write!(f, "SQLite"),
        }
    }
}

/// Untrusted SQL text produced by an upstream generator, plus the question
/// that prompted it. The question is opaque context, used only for logging;
/// neither field is ever persisted by the gateway.
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    /// The raw SQL text to validate and execute
    pub sql: String,

    /// Originating natural-language question, if known
    pub question: Option<String>,
}

impl CandidateQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            question: None,
        }
    }

    pub fn with_question(sql: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            question: Some(question.into()),
        }
    }
}

/// A single cell value in a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Convert to a JSON value for the rendering layer. Binary cells are
    /// base64-encoded since JSON has no byte-string type.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(v) => serde_json::Value::from(*v),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Bytes(b) => serde_json::Value::String(BASE64.encode(b)),
        }
    }
}

/// Fully materialized tabular result of a successful execution.
///
/// Column order is significant and duplicate labels are permitted (SQL
/// allows repeated column labels), which is why rows are ordinal tuples
/// rather than name-keyed maps. Every row's arity equals the column count.
/// The result is owned by the caller and never cached across requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    /// Ordered column names
    pub columns: Vec<String>,

    /// Ordered row tuples, one value per column
    pub rows: Vec<Vec<SqlValue>>,
}

impl ResultSet {
    /// Number of rows returned
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when the query matched no rows. Still a valid success.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// JSON rendering: an array of rows, each an array of cell values in
    /// column order.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "columns": self.columns,
            "rows": self.rows.iter()
                .map(|row| row.iter().map(SqlValue::to_json).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
        })
    }
}
