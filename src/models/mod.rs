//! Data models for the PG MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use connection::{ConnectionSettings, DatabaseType};
pub use query::{
    AffectedResult, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MAX_STATEMENT_LENGTH, Pagination,
    QueryParam, QueryRequest, QueryResult, RowsResult, params_from_json,
};
pub use schema::{
    ColumnDescriptor, ConstraintInfo, ConstraintType, FunctionInfo, FunctionKind, IndexInfo,
    IndexMethod, ParallelSafety, SchemaInfo, SecurityMode, TableEntry, TableKind, TableStats,
    ViewInfo, Volatility,
};
