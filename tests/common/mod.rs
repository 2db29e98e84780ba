//! Shared fixtures for integration tests: a seeded SQLite file per test.

#![allow(dead_code)]

use pg_mcp_server::config::QueryPolicy;
use pg_mcp_server::db::{ConnectionHandle, DbPool};
use pg_mcp_server::error::Failure;
use pg_mcp_server::models::{AffectedResult, ConnectionSettings, QueryResult, RowsResult};
use pg_mcp_server::tools::query::QueryInput;
use std::sync::Arc;
use tempfile::TempDir;

pub fn read_only_policy() -> QueryPolicy {
    QueryPolicy::default()
}

pub fn write_policy() -> QueryPolicy {
    QueryPolicy {
        read_only: false,
        ..QueryPolicy::default()
    }
}

/// Open a writable SQLite database with `items(1..=item_count)` and an empty `orders` table.
///
/// The returned `TempDir` must outlive the handle.
pub async fn seeded_database(item_count: usize) -> (TempDir, Arc<ConnectionHandle>) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("test.db").display());
    let settings = ConnectionSettings::new(url, false).unwrap();
    let handle = ConnectionHandle::connect(&settings).await.unwrap();

    if let DbPool::SQLite(pool) = handle.pool() {
        for stmt in [
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE, qty INTEGER DEFAULT 0)",
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, item_id INTEGER NOT NULL REFERENCES items(id), note TEXT)",
            "CREATE INDEX orders_item_idx ON orders (item_id)",
            "CREATE VIEW stocked AS SELECT * FROM items WHERE qty > 0",
        ] {
            sqlx::query(stmt).execute(pool).await.unwrap();
        }
        for i in 1..=item_count {
            sqlx::query("INSERT INTO items (id, name, qty) VALUES (?1, ?2, ?3)")
                .bind(i as i64)
                .bind(format!("item-{}", i))
                .bind((i % 3) as i64)
                .execute(pool)
                .await
                .unwrap();
        }
    }

    (dir, Arc::new(handle))
}

pub fn query_input(statement: &str) -> QueryInput {
    QueryInput::new(statement)
}

pub fn expect_rows(result: QueryResult) -> RowsResult {
    match result {
        QueryResult::Rows(rows) => rows,
        other => panic!("expected rows, got {:?}", other),
    }
}

pub fn expect_affected(result: QueryResult) -> AffectedResult {
    match result {
        QueryResult::Affected(affected) => affected,
        other => panic!("expected affected count, got {:?}", other),
    }
}

pub fn expect_failure(result: QueryResult) -> Failure {
    match result {
        QueryResult::Failure(failure) => failure,
        other => panic!("expected failure, got {:?}", other),
    }
}
