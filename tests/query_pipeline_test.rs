//! Integration tests for the query pipeline on a live SQLite database.
//!
//! Tests verify that:
//! - Read statements are paginated and report hasMore at page boundaries
//! - Self-paginated statements and single-row aggregates run unmodified
//! - Positional parameters are substituted as escaped literals
//! - Invalid arguments fail before reaching the database

mod common;

use common::{expect_failure, expect_rows, query_input, read_only_policy, seeded_database};
use pg_mcp_server::error::ErrorKind;
use pg_mcp_server::tools::query::QueryToolHandler;
use serde_json::json;

#[tokio::test]
async fn test_full_page_reports_has_more() {
    let (_dir, handle) = seeded_database(10).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let mut input = query_input("SELECT * FROM items ORDER BY id");
    input.page_size = Some(json!(10));

    let rows = expect_rows(handler.query(input).await);
    assert_eq!(rows.row_count, 10);
    // Last page, yet a full one: the boundary heuristic says there may be more
    assert!(rows.pagination.has_more);
    assert_eq!(rows.pagination.page_size, 10);
    assert_eq!(rows.pagination.offset, 0);
}

#[tokio::test]
async fn test_short_page_reports_no_more() {
    let (_dir, handle) = seeded_database(9).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let mut input = query_input("SELECT * FROM items ORDER BY id");
    input.page_size = Some(json!(10));

    let rows = expect_rows(handler.query(input).await);
    assert_eq!(rows.row_count, 9);
    assert!(!rows.pagination.has_more);
}

#[tokio::test]
async fn test_offset_selects_later_page() {
    let (_dir, handle) = seeded_database(10).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let mut input = query_input("SELECT id FROM items ORDER BY id;");
    input.page_size = Some(json!(4));
    input.offset = Some(json!(8));

    let rows = expect_rows(handler.query(input).await);
    let ids: Vec<_> = rows.rows.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(9), json!(10)]);
    assert_eq!(rows.pagination.offset, 8);
    assert!(!rows.pagination.has_more);
}

#[tokio::test]
async fn test_default_page_size_applies() {
    let (_dir, handle) = seeded_database(150).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let rows = expect_rows(handler.query(query_input("SELECT id FROM items")).await);
    assert_eq!(rows.row_count, 100);
    assert_eq!(rows.pagination.page_size, 100);
    assert!(rows.pagination.has_more);
}

#[tokio::test]
async fn test_existing_limit_is_untouched() {
    let (_dir, handle) = seeded_database(10).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let mut input = query_input("SELECT * FROM items ORDER BY id LIMIT 3");
    input.page_size = Some(json!(2));

    let rows = expect_rows(handler.query(input).await);
    assert_eq!(rows.row_count, 3);
    assert_eq!(rows.pagination.page_size, 2);
}

#[tokio::test]
async fn test_single_row_aggregate() {
    let (_dir, handle) = seeded_database(7).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let rows = expect_rows(
        handler
            .query(query_input("SELECT COUNT(*) AS n FROM items"))
            .await,
    );
    assert_eq!(rows.row_count, 1);
    assert_eq!(rows.rows[0]["n"], 7);
}

#[tokio::test]
async fn test_grouped_aggregate_is_paginated() {
    let (_dir, handle) = seeded_database(9).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let mut input =
        query_input("SELECT qty, COUNT(*) AS n FROM items GROUP BY qty ORDER BY qty");
    input.page_size = Some(json!(2));

    let rows = expect_rows(handler.query(input).await);
    assert_eq!(rows.row_count, 2);
    assert!(rows.pagination.has_more);
}

#[tokio::test]
async fn test_cte_is_read_only() {
    let (_dir, handle) = seeded_database(5).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let rows = expect_rows(
        handler
            .query(query_input(
                "WITH big AS (SELECT * FROM items WHERE id > 2) SELECT name FROM big ORDER BY id",
            ))
            .await,
    );
    assert_eq!(rows.row_count, 3);
    assert_eq!(rows.rows[0]["name"], "item-3");
}

#[tokio::test]
async fn test_parameters_are_substituted() {
    let (_dir, handle) = seeded_database(5).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let mut input = query_input("SELECT name FROM items WHERE id = $1 OR name = $2");
    input.parameters = Some(json!([2, "item-4"]));

    let rows = expect_rows(handler.query(input).await);
    let names: Vec<_> = rows.rows.iter().map(|r| r["name"].clone()).collect();
    assert_eq!(names, vec![json!("item-2"), json!("item-4")]);
}

#[tokio::test]
async fn test_quote_in_parameter_is_escaped() {
    let (_dir, handle) = seeded_database(1).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let mut input = query_input("SELECT $1 AS who, $2 AS flag, $3 AS nothing");
    input.parameters = Some(json!(["O'Brien", true, null]));

    let rows = expect_rows(handler.query(input).await);
    assert_eq!(rows.rows[0]["who"], "O'Brien");
    let flag = &rows.rows[0]["flag"];
    assert!(*flag == json!(1) || *flag == json!(true), "flag: {}", flag);
    assert!(rows.rows[0]["nothing"].is_null());
}

#[tokio::test]
async fn test_injection_attempt_stays_a_literal() {
    let (_dir, handle) = seeded_database(3).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let mut input = query_input("SELECT id FROM items WHERE name = $1");
    input.parameters = Some(json!(["x' OR '1'='1"]));

    let rows = expect_rows(handler.query(input).await);
    assert_eq!(rows.row_count, 0);
}

#[tokio::test]
async fn test_object_parameter_is_rejected() {
    let (_dir, handle) = seeded_database(1).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let mut input = query_input("SELECT * FROM items WHERE id = $1");
    input.parameters = Some(json!([{"id": 1}]));

    let failure = expect_failure(handler.query(input).await);
    assert_eq!(failure.error_kind, ErrorKind::ParameterError);
    assert!(failure.hint.is_some());
}

#[tokio::test]
async fn test_argument_bounds() {
    let (_dir, handle) = seeded_database(1).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let mut input = query_input("SELECT 1");
    input.page_size = Some(json!(501));
    let failure = expect_failure(handler.query(input).await);
    assert_eq!(failure.error_kind, ErrorKind::ValidationError);

    let mut input = query_input("SELECT 1");
    input.offset = Some(json!(-1));
    let failure = expect_failure(handler.query(input).await);
    assert_eq!(failure.error_kind, ErrorKind::ValidationError);

    let failure = expect_failure(handler.query(query_input("  ")).await);
    assert_eq!(failure.error_kind, ErrorKind::ValidationError);
}

#[tokio::test]
async fn test_backend_errors_are_classified() {
    let (_dir, handle) = seeded_database(1).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let cases = [
        ("SELECT * FROM nowhere", ErrorKind::RelationNotFound),
        ("SELECT missing_col FROM items", ErrorKind::ColumnNotFound),
        ("SELECT * FROM items WHERE", ErrorKind::SyntaxError),
    ];

    for (statement, expected) in cases {
        let failure = expect_failure(handler.query(query_input(statement)).await);
        assert_eq!(failure.error_kind, expected, "statement: {}", statement);
        assert!(failure.hint.is_some(), "statement: {}", statement);
    }
}

#[tokio::test]
async fn test_negative_parameter_after_minus_keeps_page_limit() {
    let (_dir, handle) = seeded_database(20).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let mut input = query_input("SELECT id FROM items WHERE id > 0-$1");
    input.parameters = Some(json!([-1]));
    input.page_size = Some(json!(5));

    let rows = expect_rows(handler.query(input).await);
    assert_eq!(rows.row_count, 5);
    assert!(rows.pagination.has_more);
}

#[tokio::test]
async fn test_trailing_comment_keeps_page_limit() {
    let (_dir, handle) = seeded_database(20).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let mut input = query_input("SELECT id FROM items -- all items");
    input.page_size = Some(json!(5));

    let rows = expect_rows(handler.query(input).await);
    assert_eq!(rows.row_count, 5);
    assert_eq!(rows.pagination.page_size, 5);
}

#[tokio::test]
async fn test_wrongly_typed_page_size_is_validation_error() {
    let (_dir, handle) = seeded_database(3).await;
    let handler = QueryToolHandler::new(handle, read_only_policy());

    let mut input = query_input("SELECT id FROM items");
    input.page_size = Some(json!("10"));

    let failure = expect_failure(handler.query(input).await);
    assert_eq!(failure.error_kind, ErrorKind::ValidationError);
    assert!(failure.hint.is_some());
}
