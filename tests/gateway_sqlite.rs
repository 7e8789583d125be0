//! End-to-end gateway tests against an in-memory SQLite database.
//!
//! The pool is capped at a single connection so the seeded in-memory
//! database is the one every statement sees.

use sqlx::AnyPool;
use sqlx::pool::PoolOptions;

use sqlgate::{
    CandidateQuery, Driver, Gateway, GatewayConfig, GatewayError, SqlValue,
    policy::WRITE_OPERATION,
};

async fn seeded_pool() -> AnyPool {
    let _ = env_logger::builder().is_test(true).try_init();
    sqlx::any::install_default_drivers();

    let pool: AnyPool = PoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite should connect");

    sqlx::query(
        "CREATE TABLE customers (\
            id INTEGER PRIMARY KEY, \
            name TEXT NOT NULL, \
            credit_limit REAL\
         )",
    )
    .execute(&pool)
    .await
    .expect("create table");

    sqlx::query(
        "INSERT INTO customers (id, name, credit_limit) VALUES \
         (1, 'Acme', 1000.0), \
         (2, 'Globex', 250.5), \
         (3, 'Initech', NULL)",
    )
    .execute(&pool)
    .await
    .expect("seed rows");

    pool
}

async fn seeded_gateway(config: GatewayConfig) -> Gateway {
    Gateway::from_pool(seeded_pool().await, Driver::Sqlite, config)
}

#[tokio::test]
async fn select_returns_columns_and_rows() {
    let gateway = seeded_gateway(GatewayConfig::default()).await;

    let result = gateway
        .run_sql("SELECT id, name FROM customers ORDER BY id")
        .await
        .expect("valid read query");

    assert_eq!(result.columns, vec!["id", "name"]);
    assert_eq!(result.row_count(), 3);
    assert_eq!(
        result.rows[0],
        vec![SqlValue::Int(1), SqlValue::Text("Acme".to_string())]
    );
}

#[tokio::test]
async fn every_row_matches_column_arity() {
    let gateway = seeded_gateway(GatewayConfig::default()).await;

    let result = gateway
        .run_sql("SELECT id, name, credit_limit FROM customers")
        .await
        .expect("valid read query");

    for row in &result.rows {
        assert_eq!(row.len(), result.columns.len());
    }
}

#[tokio::test]
async fn default_cap_bounds_unlimited_queries() {
    let config = GatewayConfig {
        max_rows: 2,
        ..Default::default()
    };
    let gateway = seeded_gateway(config).await;

    let result = gateway
        .run_sql("SELECT id FROM customers ORDER BY id")
        .await
        .expect("valid read query");

    assert_eq!(result.row_count(), 2);
}

#[tokio::test]
async fn explicit_limit_is_respected() {
    let gateway = seeded_gateway(GatewayConfig::default()).await;

    let result = gateway
        .run_sql("SELECT id FROM customers LIMIT 1")
        .await
        .expect("valid read query");

    assert_eq!(result.row_count(), 1);
}

#[tokio::test]
async fn write_is_rejected_and_data_survives() {
    let gateway = seeded_gateway(GatewayConfig::default()).await;

    let err = gateway
        .run_sql("DELETE FROM customers")
        .await
        .expect_err("writes must be rejected");
    match err {
        GatewayError::Policy(reason) => assert_eq!(reason, WRITE_OPERATION),
        other => panic!("expected Policy error, got {:?}", other),
    }

    let result = gateway
        .run_sql("SELECT id FROM customers")
        .await
        .expect("table should be intact");
    assert_eq!(result.row_count(), 3);
}

#[tokio::test]
async fn nested_write_is_rejected() {
    let gateway = seeded_gateway(GatewayConfig::default()).await;

    let err = gateway
        .run_sql("SELECT * FROM (DELETE FROM customers RETURNING id) AS gone")
        .await
        .expect_err("nested writes must be rejected");
    assert!(err.is_rejection());
}

#[tokio::test]
async fn malformed_text_is_a_parse_error() {
    let gateway = seeded_gateway(GatewayConfig::default()).await;

    let err = gateway
        .run_sql("not valid sql at all ;;;")
        .await
        .expect_err("garbage must be rejected");
    assert!(matches!(err, GatewayError::Parse(_)));
}

#[tokio::test]
async fn unknown_table_surfaces_as_execution_error() {
    let gateway = seeded_gateway(GatewayConfig::default()).await;

    let err = gateway
        .run_sql("SELECT id FROM missing_table")
        .await
        .expect_err("unknown table should fail at the database");
    match err {
        GatewayError::Execution(message) => {
            assert!(!message.is_empty(), "backend message should be carried");
        }
        other => panic!("expected Execution error, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_result_is_a_valid_success() {
    let gateway = seeded_gateway(GatewayConfig::default()).await;

    let result = gateway
        .run_sql("SELECT id, name FROM customers WHERE id > 999")
        .await
        .expect("empty result is still a success");
    assert!(result.is_empty());
}

#[tokio::test]
async fn duplicate_column_labels_are_preserved() {
    let gateway = seeded_gateway(GatewayConfig::default()).await;

    let result = gateway
        .run_sql("SELECT id, id FROM customers WHERE id = 1")
        .await
        .expect("valid read query");

    assert_eq!(result.columns.len(), 2);
    assert_eq!(result.rows[0], vec![SqlValue::Int(1), SqlValue::Int(1)]);
}

#[tokio::test]
async fn null_cells_decode_as_null() {
    let gateway = seeded_gateway(GatewayConfig::default()).await;

    let result = gateway
        .run_sql("SELECT credit_limit FROM customers WHERE id = 3")
        .await
        .expect("valid read query");

    assert_eq!(result.rows[0][0], SqlValue::Null);
}

#[tokio::test]
async fn sentinel_literal_executes_as_ordinary_read() {
    let gateway = seeded_gateway(GatewayConfig::default()).await;

    let result = gateway
        .run(&CandidateQuery::with_question(
            "SELECT 'INSUFFICIENT_DATA'",
            "What is the meaning of life?",
        ))
        .await
        .expect("sentinel select is a valid read");

    assert_eq!(result.row_count(), 1);
    assert_eq!(
        result.rows[0][0],
        SqlValue::Text("INSUFFICIENT_DATA".to_string())
    );
}

#[tokio::test]
async fn union_is_capped_as_a_whole() {
    let config = GatewayConfig {
        max_rows: 2,
        ..Default::default()
    };
    let gateway = seeded_gateway(config).await;

    let result = gateway
        .run_sql("SELECT id FROM customers UNION ALL SELECT id FROM customers")
        .await
        .expect("valid compound read query");

    // Six rows exist across the two arms; the cap bounds the combination
    assert_eq!(result.row_count(), 2);
}

#[tokio::test]
async fn describe_schema_lists_tables_and_columns() {
    let gateway = seeded_gateway(GatewayConfig::default()).await;

    let description = gateway.describe_schema().await.expect("describe schema");
    assert!(description.contains("TABLE customers"), "got: {}", description);
    assert!(description.contains("name TEXT NOT NULL"), "got: {}", description);
    assert!(description.contains("credit_limit"), "got: {}", description);
}
