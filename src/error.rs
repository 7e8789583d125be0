//! Error types for the query gateway

use thiserror::Error;

/// Failures surfaced by the gateway pipeline.
///
/// Every stage converts its faults into one of these kinds at its boundary;
/// no raw parser, pool, or driver error reaches the caller. Display strings
/// are safe to show to an end user: rejected input carries the
/// `invalid query` prefix, backend faults the `execution failure` prefix,
/// with no internal stack traces.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The candidate text is not a single syntactically valid SQL statement
    #[error("invalid query: {0}")]
    Parse(String),

    /// The statement parsed but violates the read-only policy
    #[error("invalid query: {0}")]
    Policy(&'static str),

    /// Could not reach or authenticate against the database
    #[error("execution failure: {0}")]
    Connection(String),

    /// The database rejected the sanitized statement, a row failed to
    /// decode, or the statement timeout expired
    #[error("execution failure: {0}")]
    Execution(String),
}

impl GatewayError {
    /// True for rejections of the candidate text itself (parse or policy),
    /// as opposed to faults of the database backend.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Policy(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let parse = GatewayError::Parse("unexpected token".to_string());
        assert!(parse.to_string().starts_with("invalid query: "));

        let exec = GatewayError::Execution("no such table: t".to_string());
        assert!(exec.to_string().starts_with("execution failure: "));
    }

    #[test]
    fn test_rejection_classification() {
        assert!(GatewayError::Policy("only read queries are allowed").is_rejection());
        assert!(!GatewayError::Connection("refused".to_string()).is_rejection());
    }
}
