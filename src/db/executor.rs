//! Statement execution.
//!
//! The executor receives the final, fully literal statement. It runs as one
//! unprepared statement (`persistent(false)`) bounded by the query timeout,
//! which on PostgreSQL also rules out multi-statement strings.
//!
//! Database-specific implementations live in the `postgres` and `sqlite`
//! submodules and are intentionally parallel.

use crate::db::pool::DbPool;
use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

pub type JsonRow = serde_json::Map<String, JsonValue>;

/// Query executor that handles database statement execution.
#[derive(Debug, Clone, Copy)]
pub struct QueryExecutor {
    query_timeout: Duration,
}

impl QueryExecutor {
    pub fn new(query_timeout: Duration) -> Self {
        Self { query_timeout }
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Run a row-returning statement and decode every row.
    pub async fn fetch_rows(&self, pool: &DbPool, sql: &str) -> DbResult<Vec<JsonRow>> {
        debug!(sql = %sql, timeout_secs = self.query_timeout.as_secs(), "Executing query");

        match pool {
            DbPool::Postgres(p) => {
                let rows = postgres::fetch_rows(p, sql, self.query_timeout).await?;
                Ok(rows.iter().map(RowToJson::to_json_map).collect())
            }
            DbPool::SQLite(p) => {
                let rows = sqlite::fetch_rows(p, sql, self.query_timeout).await?;
                Ok(rows.iter().map(RowToJson::to_json_map).collect())
            }
        }
    }

    /// Run a write statement and return the affected row count.
    pub async fn execute_write(&self, pool: &DbPool, sql: &str) -> DbResult<u64> {
        debug!(sql = %sql, timeout_secs = self.query_timeout.as_secs(), "Executing write operation");

        match pool {
            DbPool::Postgres(p) => postgres::execute_write(p, sql, self.query_timeout).await,
            DbPool::SQLite(p) => sqlite::execute_write(p, sql, self.query_timeout).await,
        }
    }
}

fn timeout_error(operation: &str, timeout: Duration) -> DbError {
    DbError::timeout(operation, timeout.as_secs())
}

mod postgres {
    use super::*;
    use sqlx::PgPool;
    use sqlx::postgres::PgRow;

    pub async fn fetch_rows(
        pool: &PgPool,
        sql: &str,
        query_timeout: Duration,
    ) -> DbResult<Vec<PgRow>> {
        let query = sqlx::query(sql).persistent(false);
        match timeout(query_timeout, query.fetch_all(pool)).await {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn execute_write(pool: &PgPool, sql: &str, query_timeout: Duration) -> DbResult<u64> {
        let query = sqlx::query(sql).persistent(false);
        match timeout(query_timeout, query.execute(pool)).await {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("write operation", query_timeout)),
        }
    }
}

mod sqlite {
    use super::*;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqliteRow;

    pub async fn fetch_rows(
        pool: &SqlitePool,
        sql: &str,
        query_timeout: Duration,
    ) -> DbResult<Vec<SqliteRow>> {
        let query = sqlx::query(sql).persistent(false);
        match timeout(query_timeout, query.fetch_all(pool)).await {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn execute_write(
        pool: &SqlitePool,
        sql: &str,
        query_timeout: Duration,
    ) -> DbResult<u64> {
        let query = sqlx::query(sql).persistent(false);
        match timeout(query_timeout, query.execute(pool)).await {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("write operation", query_timeout)),
        }
    }
}
