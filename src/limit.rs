//! Row cap enforcement on the outermost query
//!
//! The cap attaches to the outermost `Query` node, whose LIMIT clause
//! bounds the combined output of the whole body — for a compound statement
//! (UNION / INTERSECT / EXCEPT) the set operation nests inside the body,
//! so the cap never binds a single arm.

use sqlparser::ast::{Expr, LimitClause, Query, SetExpr, Statement, Value};

/// Attach `LIMIT max_rows` to the outermost query when it carries no
/// explicit row bound.
///
/// Idempotent: a query that already has a LIMIT or FETCH clause at the
/// outermost level (possibly nested through a lone parenthesized body) is
/// left untouched, so re-running the enforcer never stacks a second limit
/// or alters an existing one. Non-query statements never reach this stage;
/// they are rejected by the policy check first.
///
/// # Examples
/// ```
/// # use sqlgate::limit::enforce_row_limit;
/// # use sqlgate::parse::parse_single_statement;
/// # use sqlgate::types::Driver;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut statement = parse_single_statement("SELECT * FROM users", Driver::Postgres)?;
/// enforce_row_limit(&mut statement, 100);
/// assert_eq!(statement.to_string(), "SELECT * FROM users LIMIT 100");
/// # Ok(())
/// # }
/// ```
pub fn enforce_row_limit(statement: &mut Statement, max_rows: u64) {
    if let Statement::Query(query) = statement {
        apply_cap(query, max_rows);
    }
}

fn apply_cap(query: &mut Query, max_rows: u64) {
    if has_row_bound(query) {
        return;
    }
    query.limit_clause = Some(LimitClause::LimitOffset {
        limit: Some(Expr::Value(
            Value::Number(max_rows.to_string(), false).with_empty_span(),
        )),
        offset: None,
        limit_by: Vec::new(),
    });
}

fn has_row_bound(query: &Query) -> bool {
    if query.limit_clause.is_some() || query.fetch.is_some() {
        return true;
    }
    // A body that is just a parenthesized query is already bounded if the
    // inner query is
    match query.body.as_ref() {
        SetExpr::Query(inner) => has_row_bound(inner),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_single_statement;
    use crate::types::Driver;

    fn capped(sql: &str, max_rows: u64) -> String {
        let mut statement =
            parse_single_statement(sql, Driver::Postgres).expect("test SQL should parse");
        enforce_row_limit(&mut statement, max_rows);
        statement.to_string()
    }

    #[test]
    fn test_adds_limit_when_absent() {
        assert_eq!(
            capped("SELECT id, name FROM customers", 100),
            "SELECT id, name FROM customers LIMIT 100"
        );
    }

    #[test]
    fn test_existing_limit_unchanged() {
        // Never clamped, never doubled
        assert_eq!(
            capped("SELECT * FROM customers LIMIT 10", 100),
            "SELECT * FROM customers LIMIT 10"
        );
        assert_eq!(
            capped("SELECT * FROM customers LIMIT 5000", 100),
            "SELECT * FROM customers LIMIT 5000"
        );
    }

    #[test]
    fn test_idempotent_on_reapplication() {
        let once = capped("SELECT a FROM t", 100);
        let twice = capped(&once, 100);
        assert_eq!(once, twice);
        assert_eq!(once.matches("LIMIT").count(), 1);
    }

    #[test]
    fn test_union_capped_as_a_whole() {
        let sql = "SELECT a FROM t WHERE a IN (SELECT b FROM t2) UNION SELECT c FROM t3";
        let result = capped(sql, 100);
        assert_eq!(result.matches("LIMIT").count(), 1);
        assert!(result.ends_with("LIMIT 100"), "got: {}", result);
    }

    #[test]
    fn test_union_with_trailing_limit_unchanged() {
        let sql = "SELECT a FROM t1 UNION SELECT b FROM t2 LIMIT 25";
        assert_eq!(capped(sql, 100), "SELECT a FROM t1 UNION SELECT b FROM t2 LIMIT 25");
    }

    #[test]
    fn test_fetch_counts_as_row_bound() {
        let sql = "SELECT a FROM t FETCH FIRST 5 ROWS ONLY";
        let result = capped(sql, 100);
        assert!(!result.contains("LIMIT"), "got: {}", result);
    }

    #[test]
    fn test_parenthesized_limited_body_unchanged() {
        let sql = "(SELECT a FROM t LIMIT 5)";
        let result = capped(sql, 100);
        assert_eq!(result.matches("LIMIT").count(), 1, "got: {}", result);
    }

    #[test]
    fn test_subquery_limit_does_not_satisfy_outer_bound() {
        // An inner LIMIT bounds the subquery, not the statement
        let sql = "SELECT a FROM (SELECT a FROM t LIMIT 500) AS sub";
        let result = capped(sql, 100);
        assert!(result.ends_with("LIMIT 100"), "got: {}", result);
    }
}
