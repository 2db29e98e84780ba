//! Query execution tool.
//!
//! This module implements the `query` MCP tool. A request passes through
//! input validation, the safety gate, pagination (read-only statements only),
//! literal parameter substitution and execution. Every outcome, including
//! failures, is returned as a [`QueryResult`].

use crate::config::QueryPolicy;
use crate::db::{ConnectionHandle, QueryExecutor, params};
use crate::error::DbResult;
use crate::models::{
    AffectedResult, Pagination, QueryRequest, QueryResult, RowsResult, params_from_json,
};
use crate::tools::{pagination, sql_validator, validation};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, info};

/// Input for the query tool.
///
/// Fields stay raw JSON until [`QueryInput::into_request`] so wrongly typed
/// arguments come back as a `VALIDATION_ERROR` result.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryInput {
    /// SQL statement. In read-only mode only SELECT, WITH and EXPLAIN are accepted.
    #[schemars(with = "String")]
    pub statement: Option<JsonValue>,
    /// Positional values for $1, $2, ... placeholders (string, number, boolean or null)
    #[serde(default)]
    #[schemars(with = "Option<Vec<JsonValue>>")]
    pub parameters: Option<JsonValue>,
    /// Rows per page for read-only statements. Default: 100, max: 500
    #[serde(default)]
    #[schemars(with = "Option<i64>")]
    pub page_size: Option<JsonValue>,
    /// Rows to skip before the page starts. Default: 0
    #[serde(default)]
    #[schemars(with = "Option<i64>")]
    pub offset: Option<JsonValue>,
}

impl QueryInput {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: Some(JsonValue::String(statement.into())),
            ..Self::default()
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<JsonValue>) -> Self {
        self.parameters = Some(JsonValue::Array(parameters));
        self
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = Some(page_size.into());
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset.into());
        self
    }

    /// Validate types, bounds and parameters, producing a pipeline request.
    pub fn into_request(self) -> DbResult<QueryRequest> {
        let statement = validation::statement_arg(self.statement.as_ref())?;
        let page_size = validation::validate_page_size(validation::integer_arg(
            self.page_size.as_ref(),
            "pageSize",
        )?)?;
        let offset =
            validation::validate_offset(validation::integer_arg(self.offset.as_ref(), "offset")?)?;
        let params = params_from_json(validation::parameters_arg(self.parameters.as_ref())?)?;

        Ok(QueryRequest {
            statement: statement.to_string(),
            params,
            page_size,
            offset,
        })
    }
}

/// Handler for query execution.
pub struct QueryToolHandler {
    connection: Arc<ConnectionHandle>,
    policy: QueryPolicy,
    executor: QueryExecutor,
}

impl QueryToolHandler {
    pub fn new(connection: Arc<ConnectionHandle>, policy: QueryPolicy) -> Self {
        let executor = QueryExecutor::new(connection.query_timeout());
        Self {
            connection,
            policy,
            executor,
        }
    }

    pub fn policy(&self) -> &QueryPolicy {
        &self.policy
    }

    /// Handle the query tool call. Failures are folded into the result.
    pub async fn query(&self, input: QueryInput) -> QueryResult {
        match input.into_request() {
            Ok(request) => self.execute(request).await,
            Err(e) => e.into(),
        }
    }

    /// Run an already validated request.
    pub async fn execute(&self, request: QueryRequest) -> QueryResult {
        match self.run(&request).await {
            Ok(result) => result,
            Err(e) => {
                info!(error_kind = ?e.kind(), error = %e, "Query failed");
                e.into()
            }
        }
    }

    async fn run(&self, request: &QueryRequest) -> DbResult<QueryResult> {
        sql_validator::check_statement(&request.statement, &self.policy)?;

        let read_only = sql_validator::is_read_only_statement(&request.statement);
        debug!(
            statement = %request.statement,
            param_count = request.params.len(),
            read_only,
            "Statement accepted"
        );

        if read_only {
            let page = pagination::rewrite(
                &request.statement,
                request.page_size,
                request.offset,
                &self.policy,
            );
            let sql = params::substitute(&page.statement, &request.params)?;
            let rows = self
                .executor
                .fetch_rows(self.connection.pool(), &sql)
                .await?;
            let row_count = rows.len();
            let has_more = pagination::has_more(row_count, page.page_size);

            info!(row_count, has_more, "Query executed");

            Ok(QueryResult::Rows(RowsResult {
                rows,
                row_count,
                pagination: Pagination {
                    has_more,
                    page_size: page.page_size,
                    offset: page.offset,
                },
            }))
        } else {
            let sql = params::substitute(&request.statement, &request.params)?;
            let row_count = self
                .executor
                .execute_write(self.connection.pool(), &sql)
                .await?;

            info!(row_count, "Write statement executed");

            Ok(QueryResult::Affected(AffectedResult { row_count }))
        }
    }
}
