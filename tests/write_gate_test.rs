//! Integration tests for the safety gate in front of a writable SQLite database.
//!
//! Tests verify that:
//! - Read-only mode rejects anything but SELECT, WITH and EXPLAIN
//! - Denylisted keywords are rejected in both modes
//! - UPDATE/DELETE need a non-trivial WHERE clause in write mode
//! - Constraint violations come back with a stable error kind

mod common;

use common::{
    expect_affected, expect_failure, expect_rows, query_input, read_only_policy, seeded_database,
    write_policy,
};
use pg_mcp_server::error::ErrorKind;
use pg_mcp_server::tools::query::QueryToolHandler;
use serde_json::json;

#[tokio::test]
async fn test_read_only_rejects_writes_before_execution() {
    let (_dir, handle) = seeded_database(3).await;
    let handler = QueryToolHandler::new(handle.clone(), read_only_policy());

    for statement in [
        "INSERT INTO items (name) VALUES ('x')",
        "UPDATE items SET qty = 1 WHERE id = 1",
        "DELETE FROM items WHERE id = 1",
        "REPLACE INTO items (id, name) VALUES (1, 'y')",
    ] {
        let failure = expect_failure(handler.query(query_input(statement)).await);
        assert_eq!(failure.error_kind, ErrorKind::SafetyRejected, "{}", statement);
        assert!(failure.message.contains("read-only"), "{}", failure.message);
    }

    // Nothing reached the database
    let writer = QueryToolHandler::new(handle, write_policy());
    let rows = expect_rows(
        writer
            .query(query_input("SELECT COUNT(*) AS n FROM items"))
            .await,
    );
    assert_eq!(rows.rows[0]["n"], 3);
}

#[tokio::test]
async fn test_denylist_applies_in_write_mode() {
    let (_dir, handle) = seeded_database(1).await;
    let handler = QueryToolHandler::new(handle, write_policy());

    for statement in [
        "DROP TABLE items",
        "create table t (id int)",
        "ALTER TABLE items ADD COLUMN x TEXT",
        "PRAGMA foreign_keys = OFF",
        "ATTACH DATABASE 'other.db' AS other",
        "VACUUM",
    ] {
        let failure = expect_failure(handler.query(query_input(statement)).await);
        assert_eq!(failure.error_kind, ErrorKind::SafetyRejected, "{}", statement);
    }
}

#[tokio::test]
async fn test_denylisted_word_inside_literal_is_rejected() {
    let (_dir, handle) = seeded_database(1).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let failure = expect_failure(
        handler
            .query(query_input("SELECT * FROM items WHERE name = 'drop'"))
            .await,
    );
    assert_eq!(failure.error_kind, ErrorKind::SafetyRejected);
}

#[tokio::test]
async fn test_insert_reports_affected_rows() {
    let (_dir, handle) = seeded_database(0).await;
    let handler = QueryToolHandler::new(handle, write_policy());

    let mut input = query_input("INSERT INTO items (name, qty) VALUES ($1, $2), ($3, $4)");
    input.parameters = Some(json!(["a", 1, "b", 2]));

    let affected = expect_affected(handler.query(input).await);
    assert_eq!(affected.row_count, 2);
}

#[tokio::test]
async fn test_update_requires_meaningful_where() {
    let (_dir, handle) = seeded_database(5).await;
    let handler = QueryToolHandler::new(handle, write_policy());

    for statement in [
        "UPDATE items SET qty = 1",
        "UPDATE items SET qty = 1 WHERE 1=1",
        "UPDATE items SET qty = 1 WHERE 1 = 1",
        "update items set qty = 1 where true",
        "DELETE FROM items",
        "DELETE FROM items WHERE '1'='1'",
    ] {
        let failure = expect_failure(handler.query(query_input(statement)).await);
        assert_eq!(failure.error_kind, ErrorKind::SafetyRejected, "{}", statement);
    }

    let affected = expect_affected(
        handler
            .query(query_input("UPDATE items SET qty = 9 WHERE id = 5"))
            .await,
    );
    assert_eq!(affected.row_count, 1);

    let mut input = query_input("DELETE FROM items WHERE id <= $1");
    input.parameters = Some(json!([2]));
    let affected = expect_affected(handler.query(input).await);
    assert_eq!(affected.row_count, 2);
}

#[tokio::test]
async fn test_duplicate_key_is_classified() {
    let (_dir, handle) = seeded_database(2).await;
    let handler = QueryToolHandler::new(handle, write_policy());

    let failure = expect_failure(
        handler
            .query(query_input("INSERT INTO items (name) VALUES ('item-1')"))
            .await,
    );
    assert_eq!(failure.error_kind, ErrorKind::DuplicateKey);
    assert!(!failure.hint.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_foreign_key_violation_is_classified() {
    let (_dir, handle) = seeded_database(1).await;
    let handler = QueryToolHandler::new(handle, write_policy());

    let failure = expect_failure(
        handler
            .query(query_input("INSERT INTO orders (item_id) VALUES (999)"))
            .await,
    );
    assert_eq!(failure.error_kind, ErrorKind::ForeignKeyViolation);
}

#[tokio::test]
async fn test_non_finite_number_is_parameter_error() {
    let (_dir, handle) = seeded_database(1).await;
    let handler = QueryToolHandler::new(handle, write_policy());

    // JSON cannot carry Infinity; build the request directly
    let request = pg_mcp_server::models::QueryRequest::new("UPDATE items SET qty = $1 WHERE id = 1")
        .with_param(pg_mcp_server::models::QueryParam::Float(f64::INFINITY));

    let failure = expect_failure(handler.execute(request).await);
    assert_eq!(failure.error_kind, ErrorKind::ParameterError);
}
