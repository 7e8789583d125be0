//! sqlx row decoding into gateway values
//!
//! Converts `AnyRow` instances into ordinal value tuples, dispatching on
//! the driver-reported type name. Works across PostgreSQL, MySQL/MariaDB,
//! and SQLite through the sqlx Any driver.

use sqlx::any::AnyRow;
use sqlx::{Column, Row, TypeInfo};

use crate::error::GatewayError;
use crate::types::SqlValue;

/// Ordered column names of a result, taken from the first row.
///
/// An empty row set yields an empty column list; the Any driver exposes
/// column metadata only on returned rows.
pub fn column_names(rows: &[AnyRow]) -> Vec<String> {
    match rows.first() {
        Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
        None => Vec::new(),
    }
}

/// Decode one row into a value tuple, one entry per column in order.
/// Duplicate column labels are fine: cells are addressed by ordinal.
pub fn decode_row(row: &AnyRow) -> Result<Vec<SqlValue>, GatewayError> {
    let mut values = Vec::with_capacity(row.columns().len());
    for column in row.columns() {
        values.push(decode_cell(row, column.ordinal(), column.name(), column.type_info().name())?);
    }
    Ok(values)
}

fn decode_cell(
    row: &AnyRow,
    ordinal: usize,
    name: &str,
    type_name: &str,
) -> Result<SqlValue, GatewayError> {
    match type_name {
        // Text types
        "TEXT" | "VARCHAR" | "CHAR" | "STRING" | "BPCHAR" | "NAME" | "CITEXT" => {
            fetch(row, ordinal, name, type_name, SqlValue::Text)
        }
        // Integer types
        "INTEGER" | "INT" | "INT2" | "INT4" | "INT8" | "BIGINT" | "SMALLINT" | "MEDIUMINT"
        | "TINYINT" | "SERIAL" | "BIGSERIAL" => {
            fetch(row, ordinal, name, type_name, SqlValue::Int)
        }
        // Boolean types
        "BOOLEAN" | "BOOL" | "TINYINT(1)" => fetch(row, ordinal, name, type_name, SqlValue::Bool),
        // Float types
        "REAL" | "FLOAT" | "FLOAT4" | "FLOAT8" | "DOUBLE" | "DOUBLE PRECISION" => {
            fetch(row, ordinal, name, type_name, SqlValue::Float)
        }
        // DECIMAL/NUMERIC: try f64, fall back to text to preserve precision
        "NUMERIC" | "DECIMAL" | "NUMBER" => {
            match row.try_get::<Option<f64>, _>(ordinal) {
                Ok(Some(v)) => Ok(SqlValue::Float(v)),
                Ok(None) => Ok(SqlValue::Null),
                Err(_) => fetch(row, ordinal, name, type_name, SqlValue::Text),
            }
        }
        // JSON arrives already serialized
        "JSON" | "JSONB" => fetch(row, ordinal, name, type_name, SqlValue::Text),
        // Binary types
        "BYTEA" | "BLOB" | "BINARY" | "VARBINARY" => {
            fetch(row, ordinal, name, type_name, SqlValue::Bytes)
        }
        // Date/time types surface as text
        "TIMESTAMP" | "TIMESTAMPTZ" | "DATETIME" | "DATE" | "TIME" | "INTERVAL" | "UUID" => {
            fetch(row, ordinal, name, type_name, SqlValue::Text)
        }
        // SQLite reports NULL-valued expression columns as type NULL
        "NULL" => Ok(SqlValue::Null),
        _ => Err(GatewayError::Execution(format!(
            "unsupported column type '{}' for column '{}'; \
             consider casting it in the query: CAST({} AS TEXT)",
            type_name, name, name
        ))),
    }
}

/// Pull one nullable cell and wrap it, mapping decode faults to a typed
/// execution error carrying the column context.
fn fetch<'r, T, F>(
    row: &'r AnyRow,
    ordinal: usize,
    name: &str,
    type_name: &str,
    wrap: F,
) -> Result<SqlValue, GatewayError>
where
    T: sqlx::Decode<'r, sqlx::Any> + sqlx::Type<sqlx::Any>,
    F: FnOnce(T) -> SqlValue,
{
    match row.try_get::<Option<T>, _>(ordinal) {
        Ok(Some(value)) => Ok(wrap(value)),
        Ok(None) => Ok(SqlValue::Null),
        Err(e) => Err(GatewayError::Execution(format!(
            "failed to decode column '{}' as {}: {}",
            name, type_name, e
        ))),
    }
}
