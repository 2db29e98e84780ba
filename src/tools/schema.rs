//! Schema introspection tools.
//!
//! This module implements the catalog MCP tools: `describe_table`,
//! `list_tables`, `get_constraints`, `list_schemas`, `list_indexes`,
//! `list_views`, `list_functions` and `get_table_stats`. They skip the safety
//! gate and the literal substitution path; arguments reach the catalog only as
//! bound parameters.

use crate::db::{ConnectionHandle, SchemaInspector};
use crate::error::DbResult;
use crate::models::{
    ColumnDescriptor, ConstraintInfo, FunctionInfo, IndexInfo, SchemaInfo, TableEntry, TableStats,
    ViewInfo,
};
use crate::tools::validation::{bool_arg, validate_identifier, validate_optional_identifier};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;

/// Format bytes as human-readable size string.
///
/// Uses binary units (1 kB = 1024 bytes) via the `humansize` WINDOWS preset,
/// matching what `pg_size_pretty` users expect.
///
/// # Examples
///
/// ```
/// use pg_mcp_server::tools::schema::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(1024), "1 kB");
/// assert_eq!(format_size(1048576), "1 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::WINDOWS)
}

/// Input for the describe_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Schema containing the table (e.g. public; main for SQLite)
    #[serde(default)]
    pub schema: String,
    /// Name of the table to describe
    #[serde(default)]
    pub table: String,
}

/// Output from the describe_table tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DescribeTableOutput {
    pub schema: String,
    pub table: String,
    /// Columns in ordinal order
    pub columns: Vec<ColumnDescriptor>,
}

/// Input for the list_tables tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListTablesInput {
    /// Schema to list. Default: public
    #[serde(default)]
    pub schema: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    pub tables: Vec<TableEntry>,
    pub count: usize,
}

/// Input for the get_constraints tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetConstraintsInput {
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub table: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct GetConstraintsOutput {
    pub constraints: Vec<ConstraintInfo>,
    pub count: usize,
}

/// Input for the list_schemas tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListSchemasInput {
    /// Include pg_catalog, information_schema, pg_toast and pg_temp schemas. Default: false
    #[serde(default)]
    #[schemars(with = "Option<bool>")]
    pub include_system_schemas: Option<JsonValue>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListSchemasOutput {
    pub schemas: Vec<SchemaInfo>,
    pub count: usize,
}

/// Input for the list_indexes tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListIndexesInput {
    #[serde(default)]
    pub schema: String,
    /// Restrict to one table. Omit for every table in the schema.
    #[serde(default)]
    pub table: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListIndexesOutput {
    pub indexes: Vec<IndexInfo>,
    pub count: usize,
}

/// Input for the list_views tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListViewsInput {
    /// Schema to list. Omit for every non-system schema.
    #[serde(default)]
    pub schema: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListViewsOutput {
    pub views: Vec<ViewInfo>,
    pub count: usize,
}

/// Input for the list_functions tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListFunctionsInput {
    /// Schema to list. Omit for every non-system schema.
    #[serde(default)]
    pub schema: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListFunctionsOutput {
    pub functions: Vec<FunctionInfo>,
    pub count: usize,
}

/// Input for the get_table_stats tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetTableStatsInput {
    #[serde(default)]
    pub schema: String,
    /// Restrict to one table. Omit for every user table in the schema.
    #[serde(default)]
    pub table: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct GetTableStatsOutput {
    pub tables: Vec<TableStats>,
    pub count: usize,
}

pub struct SchemaToolHandler {
    connection: Arc<ConnectionHandle>,
}

impl SchemaToolHandler {
    pub fn new(connection: Arc<ConnectionHandle>) -> Self {
        Self { connection }
    }

    pub async fn describe_table(&self, input: DescribeTableInput) -> DbResult<DescribeTableOutput> {
        validate_identifier(&input.schema, "schema")?;
        validate_identifier(&input.table, "table")?;

        let columns =
            SchemaInspector::describe_table(self.connection.pool(), &input.schema, &input.table)
                .await?;

        info!(
            schema = %input.schema,
            table = %input.table,
            columns = columns.len(),
            "Described table"
        );

        Ok(DescribeTableOutput {
            schema: input.schema,
            table: input.table,
            columns,
        })
    }

    pub async fn list_tables(&self, input: ListTablesInput) -> DbResult<ListTablesOutput> {
        validate_optional_identifier(input.schema.as_deref(), "schema")?;

        let tables =
            SchemaInspector::list_tables(self.connection.pool(), input.schema.as_deref()).await?;
        let count = tables.len();

        info!(count, "Listed tables");
        Ok(ListTablesOutput { tables, count })
    }

    pub async fn get_constraints(
        &self,
        input: GetConstraintsInput,
    ) -> DbResult<GetConstraintsOutput> {
        validate_identifier(&input.schema, "schema")?;
        validate_identifier(&input.table, "table")?;

        let constraints =
            SchemaInspector::get_constraints(self.connection.pool(), &input.schema, &input.table)
                .await?;
        let count = constraints.len();

        info!(table = %input.table, count, "Listed constraints");
        Ok(GetConstraintsOutput { constraints, count })
    }

    pub async fn list_schemas(&self, input: ListSchemasInput) -> DbResult<ListSchemasOutput> {
        let include_system =
            bool_arg(input.include_system_schemas.as_ref(), "includeSystemSchemas")?
                .unwrap_or(false);
        let schemas = SchemaInspector::list_schemas(self.connection.pool(), include_system).await?;
        let count = schemas.len();

        info!(count, include_system, "Listed schemas");
        Ok(ListSchemasOutput { schemas, count })
    }

    pub async fn list_indexes(&self, input: ListIndexesInput) -> DbResult<ListIndexesOutput> {
        validate_identifier(&input.schema, "schema")?;
        validate_optional_identifier(input.table.as_deref(), "table")?;

        let indexes = SchemaInspector::list_indexes(
            self.connection.pool(),
            &input.schema,
            input.table.as_deref(),
        )
        .await?;
        let count = indexes.len();

        info!(schema = %input.schema, count, "Listed indexes");
        Ok(ListIndexesOutput { indexes, count })
    }

    pub async fn list_views(&self, input: ListViewsInput) -> DbResult<ListViewsOutput> {
        validate_optional_identifier(input.schema.as_deref(), "schema")?;

        let views =
            SchemaInspector::list_views(self.connection.pool(), input.schema.as_deref()).await?;
        let count = views.len();

        info!(count, "Listed views");
        Ok(ListViewsOutput { views, count })
    }

    pub async fn list_functions(&self, input: ListFunctionsInput) -> DbResult<ListFunctionsOutput> {
        validate_optional_identifier(input.schema.as_deref(), "schema")?;

        let functions =
            SchemaInspector::list_functions(self.connection.pool(), input.schema.as_deref())
                .await?;
        let count = functions.len();

        info!(count, "Listed functions");
        Ok(ListFunctionsOutput { functions, count })
    }

    pub async fn get_table_stats(
        &self,
        input: GetTableStatsInput,
    ) -> DbResult<GetTableStatsOutput> {
        validate_identifier(&input.schema, "schema")?;
        validate_optional_identifier(input.table.as_deref(), "table")?;

        let tables = SchemaInspector::get_table_stats(
            self.connection.pool(),
            &input.schema,
            input.table.as_deref(),
        )
        .await?;
        let count = tables.len();

        info!(schema = %input.schema, count, "Collected table statistics");
        Ok(GetTableStatsOutput { tables, count })
    }
}
