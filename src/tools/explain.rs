//! Query execution plan tool.
//!
//! This module implements the `explain_query` MCP tool. The wrapped statement
//! goes through the safety gate first, so `EXPLAIN ANALYZE` can never run a
//! statement the `query` tool would refuse.
//!
//! - PostgreSQL: `EXPLAIN (ANALYZE b, [BUFFERS b,] COSTS b, FORMAT f) <sql>`
//! - SQLite: `EXPLAIN QUERY PLAN <sql>`

use crate::config::QueryPolicy;
use crate::db::{ConnectionHandle, DbPool};
use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use crate::tools::sql_validator;
use crate::tools::validation::{ExplainFormat, bool_arg, statement_arg, string_arg};
use futures_util::TryStreamExt;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Column name of PostgreSQL EXPLAIN output.
const PG_PLAN_COLUMN: &str = "QUERY PLAN";

/// Input for the explain_query tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExplainInput {
    /// SQL statement to explain. Subject to the same safety rules as the query tool.
    #[schemars(with = "String")]
    pub statement: Option<JsonValue>,
    /// Execute the statement and report actual timings (PostgreSQL). Default: false
    #[serde(default)]
    #[schemars(with = "Option<bool>")]
    pub analyze: Option<JsonValue>,
    /// Report buffer usage; only applies with analyze (PostgreSQL). Default: false
    #[serde(default)]
    #[schemars(with = "Option<bool>")]
    pub buffers: Option<JsonValue>,
    /// Include estimated costs (PostgreSQL). Default: true
    #[serde(default)]
    #[schemars(with = "Option<bool>")]
    pub costs: Option<JsonValue>,
    /// Plan format: text, json, yaml or xml. Default: text
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub format: Option<JsonValue>,
}

/// Resolved EXPLAIN options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplainOptions {
    pub analyze: bool,
    pub buffers: bool,
    pub costs: bool,
    pub format: ExplainFormat,
}

impl Default for ExplainOptions {
    fn default() -> Self {
        Self {
            analyze: false,
            buffers: false,
            costs: true,
            format: ExplainFormat::Text,
        }
    }
}

impl ExplainInput {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: Some(JsonValue::String(statement.into())),
            ..Self::default()
        }
    }

    pub fn options(&self) -> DbResult<ExplainOptions> {
        let defaults = ExplainOptions::default();
        Ok(ExplainOptions {
            analyze: bool_arg(self.analyze.as_ref(), "analyze")?.unwrap_or(defaults.analyze),
            buffers: bool_arg(self.buffers.as_ref(), "buffers")?.unwrap_or(defaults.buffers),
            costs: bool_arg(self.costs.as_ref(), "costs")?.unwrap_or(defaults.costs),
            format: ExplainFormat::parse(string_arg(self.format.as_ref(), "format")?)?,
        })
    }
}

/// Output from the explain_query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ExplainOutput {
    /// The statement that was explained
    pub statement: String,
    /// text, json, yaml or xml
    pub format: String,
    /// Plan text for text/yaml/xml, structured plan for json
    pub plan: JsonValue,
}

/// Handler for the explain tool.
pub struct ExplainToolHandler {
    connection: Arc<ConnectionHandle>,
    policy: QueryPolicy,
}

impl ExplainToolHandler {
    pub fn new(connection: Arc<ConnectionHandle>, policy: QueryPolicy) -> Self {
        Self { connection, policy }
    }

    /// Handle the explain tool call.
    pub async fn explain(&self, input: ExplainInput) -> DbResult<ExplainOutput> {
        let statement = statement_arg(input.statement.as_ref())?.to_string();
        let options = input.options()?;
        sql_validator::check_statement(&statement, &self.policy)?;

        let pool = self.connection.pool();
        let explain_sql = build_explain_sql(pool, &statement, &options)?;
        debug!(sql = %explain_sql, "Running EXPLAIN");

        let rows = execute_explain(pool, &explain_sql, self.connection.query_timeout()).await?;
        let plan = shape_plan(pool, rows, options.format);

        info!(format = options.format.as_sql(), analyze = options.analyze, "Explained statement");

        Ok(ExplainOutput {
            statement,
            format: options.format.as_sql().to_lowercase(),
            plan,
        })
    }
}

/// Build the backend-specific EXPLAIN statement.
pub fn build_explain_sql(pool: &DbPool, statement: &str, options: &ExplainOptions) -> DbResult<String> {
    let inner = statement.trim().trim_end_matches(';').trim_end();

    match pool {
        DbPool::Postgres(_) => Ok(postgres_explain_sql(inner, options)),
        DbPool::SQLite(_) => match options.format {
            ExplainFormat::Text | ExplainFormat::Json => Ok(format!("EXPLAIN QUERY PLAN {}", inner)),
            other => Err(DbError::unsupported(format!(
                "SQLite query plans are available as text or json, not {}",
                other.as_sql().to_lowercase()
            ))),
        },
    }
}

fn postgres_explain_sql(inner: &str, options: &ExplainOptions) -> String {
    let mut parts = vec![format!("ANALYZE {}", options.analyze)];
    // BUFFERS requires ANALYZE before PostgreSQL 16
    if options.analyze {
        parts.push(format!("BUFFERS {}", options.buffers));
    }
    parts.push(format!("COSTS {}", options.costs));
    parts.push(format!("FORMAT {}", options.format.as_sql()));

    format!("EXPLAIN ({}) {}", parts.join(", "), inner)
}

async fn execute_explain(
    pool: &DbPool,
    explain_sql: &str,
    timeout: Duration,
) -> DbResult<Vec<serde_json::Map<String, JsonValue>>> {
    match pool {
        DbPool::Postgres(p) => {
            let rows_future = sqlx::query(explain_sql)
                .persistent(false)
                .fetch(p)
                .try_collect::<Vec<_>>();
            match tokio::time::timeout(timeout, rows_future).await {
                Ok(Ok(rows)) => Ok(rows.iter().map(|r| r.to_json_map()).collect()),
                Ok(Err(e)) => Err(DbError::from(e)),
                Err(_) => Err(DbError::timeout("EXPLAIN", timeout.as_secs())),
            }
        }
        DbPool::SQLite(p) => {
            let rows_future = sqlx::query(explain_sql)
                .persistent(false)
                .fetch(p)
                .try_collect::<Vec<_>>();
            match tokio::time::timeout(timeout, rows_future).await {
                Ok(Ok(rows)) => Ok(rows.iter().map(|r| r.to_json_map()).collect()),
                Ok(Err(e)) => Err(DbError::from(e)),
                Err(_) => Err(DbError::timeout("EXPLAIN", timeout.as_secs())),
            }
        }
    }
}

/// Turn EXPLAIN rows into the plan payload.
fn shape_plan(
    pool: &DbPool,
    rows: Vec<serde_json::Map<String, JsonValue>>,
    format: ExplainFormat,
) -> JsonValue {
    match pool {
        DbPool::Postgres(_) => {
            let mut values = rows
                .into_iter()
                .filter_map(|mut row| row.remove(PG_PLAN_COLUMN));
            match format {
                // A single row holding the whole JSON document
                ExplainFormat::Json => values.next().unwrap_or(JsonValue::Null),
                _ => JsonValue::String(
                    values
                        .map(|v| match v {
                            JsonValue::String(s) => s,
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
            }
        }
        DbPool::SQLite(_) => match format {
            ExplainFormat::Json => JsonValue::Array(rows.into_iter().map(JsonValue::Object).collect()),
            _ => JsonValue::String(sqlite_plan_text(&rows)),
        },
    }
}

/// Render `EXPLAIN QUERY PLAN` rows as an indented tree.
fn sqlite_plan_text(rows: &[serde_json::Map<String, JsonValue>]) -> String {
    let mut depths: Vec<(i64, usize)> = Vec::new();
    let mut lines = Vec::with_capacity(rows.len());

    for row in rows {
        let id = row.get("id").and_then(JsonValue::as_i64).unwrap_or(0);
        let parent = row.get("parent").and_then(JsonValue::as_i64).unwrap_or(0);
        let detail = row.get("detail").and_then(JsonValue::as_str).unwrap_or("");

        let depth = depths
            .iter()
            .find(|(node, _)| *node == parent)
            .map(|(_, d)| d + 1)
            .unwrap_or(0);
        depths.push((id, depth));
        lines.push(format!("{}{}", "  ".repeat(depth), detail));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn sqlite_pool() -> DbPool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        DbPool::SQLite(pool)
    }

    #[test]
    fn test_explain_input_defaults() {
        let input: ExplainInput = serde_json::from_str(r#"{"statement": "SELECT 1"}"#).unwrap();
        assert_eq!(input.options().unwrap(), ExplainOptions::default());
        assert!(input.options().unwrap().costs);
    }

    #[test]
    fn test_explain_input_rejects_unknown_format() {
        let input: ExplainInput =
            serde_json::from_str(r#"{"statement": "SELECT 1", "format": "html"}"#).unwrap();
        assert_eq!(input.options().unwrap_err().kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_explain_input_rejects_wrong_types() {
        let input: ExplainInput =
            serde_json::from_str(r#"{"statement": "SELECT 1", "costs": "no"}"#).unwrap();
        assert_eq!(input.options().unwrap_err().kind(), ErrorKind::ValidationError);

        let input: ExplainInput =
            serde_json::from_str(r#"{"statement": "SELECT 1", "format": 3}"#).unwrap();
        assert_eq!(input.options().unwrap_err().kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_postgres_options_without_analyze_skip_buffers() {
        let options = ExplainOptions {
            buffers: true,
            ..ExplainOptions::default()
        };
        assert_eq!(
            postgres_explain_sql("SELECT 1", &options),
            "EXPLAIN (ANALYZE false, COSTS true, FORMAT TEXT) SELECT 1"
        );
    }

    #[test]
    fn test_postgres_options_with_analyze() {
        let options = ExplainOptions {
            analyze: true,
            buffers: true,
            costs: false,
            format: ExplainFormat::Json,
        };
        assert_eq!(
            postgres_explain_sql("SELECT 1", &options),
            "EXPLAIN (ANALYZE true, BUFFERS true, COSTS false, FORMAT JSON) SELECT 1"
        );
    }

    #[tokio::test]
    async fn test_sqlite_explain_sql() {
        let pool = sqlite_pool().await;
        let sql = build_explain_sql(&pool, "SELECT * FROM t;", &ExplainOptions::default()).unwrap();
        assert_eq!(sql, "EXPLAIN QUERY PLAN SELECT * FROM t");

        let yaml = ExplainOptions {
            format: ExplainFormat::Yaml,
            ..ExplainOptions::default()
        };
        let err = build_explain_sql(&pool, "SELECT 1", &yaml).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn test_sqlite_plan_text() {
        let pool = sqlite_pool().await;
        let sql = build_explain_sql(
            &pool,
            "SELECT * FROM t WHERE id = 1",
            &ExplainOptions::default(),
        )
        .unwrap();
        let rows = execute_explain(&pool, &sql, Duration::from_secs(5))
            .await
            .unwrap();
        let plan = shape_plan(&pool, rows, ExplainFormat::Text);
        assert!(plan.as_str().unwrap().contains("t"));
    }

    #[test]
    fn test_sqlite_plan_text_indents_children() {
        let rows: Vec<_> = [
            json!({"id": 2, "parent": 0, "detail": "SCAN a"}),
            json!({"id": 5, "parent": 2, "detail": "SEARCH b"}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
        assert_eq!(sqlite_plan_text(&rows), "SCAN a\n  SEARCH b");
    }
}
