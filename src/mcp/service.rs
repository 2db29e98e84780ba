//! MCP service implementation using rmcp.
//!
//! This module defines the DbService struct with all database tools
//! exposed via the MCP protocol using the rmcp framework's macros.
//!
//! Every tool answers with a tool result, never a protocol error: successes
//! carry the JSON payload, failures carry a JSON `Failure` with the error flag
//! set. Protocol errors are reserved for serialization faults.

use crate::config::QueryPolicy;
use crate::db::ConnectionHandle;
use crate::error::DbResult;
use crate::models::QueryResult;
use crate::tools::explain::{ExplainInput, ExplainToolHandler};
use crate::tools::query::{QueryInput, QueryToolHandler};
use crate::tools::schema::{
    DescribeTableInput, GetConstraintsInput, GetTableStatsInput, ListFunctionsInput,
    ListIndexesInput, ListSchemasInput, ListTablesInput, ListViewsInput, SchemaToolHandler,
};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{Instrument, Span, info_span};
use uuid::Uuid;

#[derive(Clone)]
pub struct DbService {
    /// Shared connection handle for all database operations
    connection: Arc<ConnectionHandle>,
    /// Statement policy, fixed at startup
    policy: QueryPolicy,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl DbService {
    pub fn new(connection: Arc<ConnectionHandle>, policy: QueryPolicy) -> Self {
        Self {
            connection,
            policy,
            tool_router: Self::tool_router(),
        }
    }

    pub fn connection(&self) -> &Arc<ConnectionHandle> {
        &self.connection
    }

    fn schema_handler(&self) -> SchemaToolHandler {
        SchemaToolHandler::new(self.connection.clone())
    }
}

/// Span wrapping one tool call.
fn tool_span(tool: &'static str) -> Span {
    info_span!("tool_call", tool, request_id = %Uuid::new_v4())
}

fn json_content<T: Serialize>(data: &T) -> Result<Vec<Content>, McpError> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize result: {}", e), None))?;
    Ok(vec![Content::text(json)])
}

/// Map a handler result to a tool result.
fn tool_result<T: Serialize>(result: DbResult<T>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(data) => json_content(&data).map(CallToolResult::success),
        Err(e) => json_content(&e.to_failure()).map(CallToolResult::error),
    }
}

fn query_tool_result(result: &QueryResult) -> Result<CallToolResult, McpError> {
    let content = json_content(result)?;
    if result.is_failure() {
        Ok(CallToolResult::error(content))
    } else {
        Ok(CallToolResult::success(content))
    }
}

#[tool_router]
impl DbService {
    #[tool(
        description = "Execute a SQL statement and return rows or the affected row count.\nRead-only mode accepts only SELECT, WITH and EXPLAIN. UPDATE/DELETE require a meaningful WHERE clause.\nUse $1, $2, ... placeholders with `parameters` (string, number, boolean or null).\nRead results are paginated with `pageSize` (default 100, max 500) and `offset`; check pagination.hasMore."
    )]
    async fn query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = QueryToolHandler::new(self.connection.clone(), self.policy);
        let result = handler.query(input).instrument(tool_span("query")).await;
        query_tool_result(&result)
    }

    #[tool(
        description = "Describe the columns of a table: name, data type, max length, nullability and default."
    )]
    async fn describe_table(
        &self,
        Parameters(input): Parameters<DescribeTableInput>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .schema_handler()
            .describe_table(input)
            .instrument(tool_span("describe_table"))
            .await;
        tool_result(result)
    }

    #[tool(description = "List tables and views in a schema (default: public).")]
    async fn list_tables(
        &self,
        Parameters(input): Parameters<ListTablesInput>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .schema_handler()
            .list_tables(input)
            .instrument(tool_span("list_tables"))
            .await;
        tool_result(result)
    }

    #[tool(
        description = "List the primary key, foreign key, unique and check constraints of a table."
    )]
    async fn get_constraints(
        &self,
        Parameters(input): Parameters<GetConstraintsInput>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .schema_handler()
            .get_constraints(input)
            .instrument(tool_span("get_constraints"))
            .await;
        tool_result(result)
    }

    #[tool(
        description = "List schemas with their owners.\nSystem schemas are hidden unless includeSystemSchemas is true."
    )]
    async fn list_schemas(
        &self,
        Parameters(input): Parameters<ListSchemasInput>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .schema_handler()
            .list_schemas(input)
            .instrument(tool_span("list_schemas"))
            .await;
        tool_result(result)
    }

    #[tool(
        description = "List indexes in a schema, optionally for one table.\nReturns access method, uniqueness, columns, definition and size."
    )]
    async fn list_indexes(
        &self,
        Parameters(input): Parameters<ListIndexesInput>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .schema_handler()
            .list_indexes(input)
            .instrument(tool_span("list_indexes"))
            .await;
        tool_result(result)
    }

    #[tool(description = "List views with their definitions, optionally for one schema.")]
    async fn list_views(
        &self,
        Parameters(input): Parameters<ListViewsInput>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .schema_handler()
            .list_views(input)
            .instrument(tool_span("list_views"))
            .await;
        tool_result(result)
    }

    #[tool(
        description = "List functions and procedures with signatures, language, volatility and security mode (PostgreSQL)."
    )]
    async fn list_functions(
        &self,
        Parameters(input): Parameters<ListFunctionsInput>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .schema_handler()
            .list_functions(input)
            .instrument(tool_span("list_functions"))
            .await;
        tool_result(result)
    }

    #[tool(
        description = "Table size and maintenance statistics: row estimate, dead rows, sizes, scan counts and last vacuum/analyze times (PostgreSQL)."
    )]
    async fn get_table_stats(
        &self,
        Parameters(input): Parameters<GetTableStatsInput>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .schema_handler()
            .get_table_stats(input)
            .instrument(tool_span("get_table_stats"))
            .await;
        tool_result(result)
    }

    #[tool(
        description = "Show the execution plan of a statement.\nThe statement is checked by the same safety rules as `query`.\nOptions: analyze (default false), buffers (default false), costs (default true), format: text|json|yaml|xml (default text)."
    )]
    async fn explain_query(
        &self,
        Parameters(input): Parameters<ExplainInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = ExplainToolHandler::new(self.connection.clone(), self.policy);
        let result = handler
            .explain(input)
            .instrument(tool_span("explain_query"))
            .await;
        tool_result(result)
    }
}

#[tool_handler]
impl ServerHandler for DbService {
    fn get_info(&self) -> ServerInfo {
        let mode = if self.policy.read_only {
            "read-only: only SELECT, WITH and EXPLAIN statements are accepted"
        } else {
            "read-write: UPDATE and DELETE require a non-trivial WHERE clause"
        };

        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_owned(),
                title: Some("PostgreSQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "Database tools for inspecting and querying a {} database.\n\
                \n\
                ## Mode\n\
                This server is {}. DROP, CREATE, ALTER, TRUNCATE, GRANT, REVOKE and other\n\
                administrative keywords are always rejected.\n\
                \n\
                ## Workflow\n\
                1. `list_schemas` and `list_tables` to find objects\n\
                2. `describe_table`, `get_constraints` and `list_indexes` to learn their shape\n\
                3. `query` with $1, $2, ... placeholders and `parameters`\n\
                4. Follow `pagination.hasMore` with a larger `offset` to read further pages\n\
                \n\
                ## Errors\n\
                Failed calls return `message`, `errorKind` and usually a `hint` explaining how to\n\
                correct the request.",
                self.connection.db_type(),
                mode
            )),
        }
    }
}
