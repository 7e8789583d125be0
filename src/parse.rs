//! Candidate text parsing into a syntax tree
//!
//! Uses the sqlparser crate with the dialect matching the configured
//! driver. The gateway executes exactly one statement per request, so
//! anything other than a single parsed statement is rejected here.

use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use crate::error::GatewayError;
use crate::types::Driver;

/// Get the SQL dialect for the configured driver
pub(crate) fn dialect_for(driver: Driver) -> Box<dyn Dialect> {
    match driver {
        Driver::Postgres => Box::new(PostgreSqlDialect {}),
        Driver::MySql | Driver::MariaDb => Box::new(MySqlDialect {}),
        Driver::Sqlite => Box::new(SQLiteDialect {}),
    }
}

/// Parse candidate text into exactly one statement.
///
/// The parser diagnostic is embedded in the error so the caller can see
/// why the text was rejected.
///
/// # Examples
/// ```
/// # use sqlgate::parse::parse_single_statement;
/// # use sqlgate::types::Driver;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let statement = parse_single_statement("SELECT 1", Driver::Postgres)?;
/// assert_eq!(statement.to_string(), "SELECT 1");
/// # Ok(())
/// # }
/// ```
pub fn parse_single_statement(sql: &str, driver: Driver) -> Result<Statement, GatewayError> {
    let dialect = dialect_for(driver);
    let mut statements = Parser::parse_sql(&*dialect, sql)
        .map_err(|e| GatewayError::Parse(e.to_string()))?;

    match statements.len() {
        1 => Ok(statements.remove(0)),
        0 => Err(GatewayError::Parse("empty statement".to_string())),
        n => Err(GatewayError::Parse(format!(
            "expected a single statement, found {}",
            n
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_select() {
        let statement = parse_single_statement("SELECT id FROM users", Driver::Postgres);
        assert!(statement.is_ok(), "parse failed: {:?}", statement.err());
    }

    #[test]
    fn test_trailing_semicolon_ok() {
        assert!(parse_single_statement("SELECT 1;", Driver::MySql).is_ok());
    }

    #[test]
    fn test_malformed_text_carries_diagnostic() {
        let err = parse_single_statement("not valid sql at all ;;;", Driver::Postgres)
            .expect_err("garbage should not parse");
        match err {
            GatewayError::Parse(msg) => {
                assert!(!msg.is_empty(), "diagnostic should not be empty");
            }
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_statements_rejected() {
        let err = parse_single_statement("SELECT 1; SELECT 2", Driver::Postgres)
            .expect_err("two statements should be rejected");
        assert!(err.to_string().contains("single statement"));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(parse_single_statement("", Driver::Postgres).is_err());
        assert!(parse_single_statement("   -- only a comment", Driver::Postgres).is_err());
    }

    #[test]
    fn test_string_literal_with_semicolon_is_one_statement() {
        assert!(parse_single_statement("SELECT 'a;b' FROM t", Driver::Postgres).is_ok());
    }
}
