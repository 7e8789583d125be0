//! Canonical SQL rendering
//!
//! The validated, limit-enforced tree is re-rendered through sqlparser's
//! `Display`, which is deterministic: the same tree always yields the same
//! text. That makes the sanitized output testable and auditable, and the
//! tree's semantics are carried over unchanged.

use sqlparser::ast::Statement;

/// Render the tree back into an executable SQL string.
pub fn to_sql(statement: &Statement) -> String {
    statement.to_string()
}
