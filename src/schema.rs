//! Schema description for the upstream query generator
//!
//! The generation step is prompted with a plain-text description of the
//! available tables and columns. This module builds the per-driver
//! introspection SQL (information_schema for the network databases,
//! sqlite_master + PRAGMA for SQLite) and formats the fetched metadata
//! into that description. It only produces strings; execution goes through
//! the ordinary executor.
//!
//! PRAGMA statements cannot be parameterized, and the MySQL and Postgres
//! variants interpolate the table name as a literal, so every interpolated
//! identifier passes a strict validation gate first.

use crate::error::GatewayError;
use crate::types::{Driver, ResultSet, SqlValue};

/// SQL listing user tables, one `table_name` column.
pub fn tables_query(driver: Driver) -> &'static str {
    match driver {
        Driver::Postgres => {
            // CAST for sqlx::any compatibility (NAME type is not supported
            // by the Any driver)
            "SELECT CAST(table_name AS TEXT) AS table_name FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
             ORDER BY table_name"
        }
        Driver::MySql | Driver::MariaDb => {
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' \
             ORDER BY table_name"
        }
        Driver::Sqlite => {
            "SELECT name AS table_name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name"
        }
    }
}

/// SQL listing the columns of one table.
///
/// The table name is interpolated (PRAGMA takes no parameters), so it must
/// pass [`validate_identifier`] first.
pub fn columns_query(driver: Driver, table: &str) -> Result<String, GatewayError> {
    validate_identifier(table)?;

    Ok(match driver {
        Driver::Postgres => format!(
            "SELECT CAST(column_name AS TEXT) AS column_name, \
                    CAST(data_type AS TEXT) AS data_type, \
                    CAST(is_nullable AS TEXT) AS is_nullable \
             FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = '{}' \
             ORDER BY ordinal_position",
            table
        ),
        Driver::MySql | Driver::MariaDb => format!(
            "SELECT column_name, data_type, is_nullable \
             FROM information_schema.columns \
             WHERE table_schema = DATABASE() AND table_name = '{}' \
             ORDER BY ordinal_position",
            table
        ),
        Driver::Sqlite => format!("PRAGMA table_info({})", table),
    })
}

/// Validate an identifier for safe interpolation into introspection SQL.
///
/// Deliberately stricter than what the databases accept: 1-64 characters,
/// alphanumeric and underscore only, no leading digit, no SQL keywords.
pub fn validate_identifier(name: &str) -> Result<(), GatewayError> {
    if name.is_empty() {
        return Err(GatewayError::Execution(
            "identifier cannot be empty".to_string(),
        ));
    }
    if name.len() > 64 {
        return Err(GatewayError::Execution(format!(
            "identifier too long: {} characters (max 64)",
            name.len()
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(GatewayError::Execution(format!(
            "invalid identifier '{}': only alphanumeric and underscore allowed",
            name
        )));
    }
    if let Some(first) = name.chars().next()
        && first.is_ascii_digit()
    {
        return Err(GatewayError::Execution(format!(
            "identifier cannot start with a digit: '{}'",
            name
        )));
    }

    let keywords = [
        "SELECT", "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TABLE", "INDEX",
        "VIEW", "TRIGGER", "PRAGMA", "ATTACH", "DETACH", "BEGIN", "COMMIT", "ROLLBACK", "VACUUM",
        "ANALYZE",
    ];
    if keywords.contains(&name.to_uppercase().as_str()) {
        return Err(GatewayError::Execution(format!(
            "identifier cannot be a SQL keyword: '{}'",
            name
        )));
    }

    Ok(())
}

/// Format one table's fetched column metadata as description lines:
///
/// ```text
/// TABLE customers
///   id INTEGER NOT NULL
///   name TEXT
/// ```
///
/// Handles both the information_schema shape (column_name / data_type /
/// is_nullable) and the PRAGMA table_info shape (name / type / notnull).
pub fn describe_table(driver: Driver, table: &str, columns: &ResultSet) -> String {
    let mut out = format!("TABLE {}\n", table);

    let (name_idx, type_idx) = match driver {
        Driver::Sqlite => (index_of(&columns.columns, "name"), index_of(&columns.columns, "type")),
        _ => (
            index_of(&columns.columns, "column_name"),
            index_of(&columns.columns, "data_type"),
        ),
    };
    let (Some(name_idx), Some(type_idx)) = (name_idx, type_idx) else {
        return out;
    };

    for row in &columns.rows {
        let Some(SqlValue::Text(name)) = row.get(name_idx) else {
            continue;
        };
        let data_type = match row.get(type_idx) {
            Some(SqlValue::Text(t)) => t.as_str(),
            _ => "",
        };
        out.push_str("  ");
        out.push_str(name);
        if !data_type.is_empty() {
            out.push(' ');
            out.push_str(data_type);
        }
        if is_not_null(driver, columns, row) {
            out.push_str(" NOT NULL");
        }
        out.push('\n');
    }

    out
}

fn is_not_null(driver: Driver, columns: &ResultSet, row: &[SqlValue]) -> bool {
    match driver {
        Driver::Sqlite => matches!(
            index_of(&columns.columns, "notnull").and_then(|i| row.get(i)),
            Some(SqlValue::Int(v)) if *v != 0
        ),
        _ => matches!(
            index_of(&columns.columns, "is_nullable").and_then(|i| row.get(i)),
            Some(SqlValue::Text(v)) if v == "NO"
        ),
    }
}

fn index_of(columns: &[String], name: &str) -> Option<usize> {
    columns.iter().position(|c| c == name)
}
