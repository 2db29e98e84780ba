//! MCP tool implementations.
//!
//! - `query`: the statement pipeline (validate, gate, paginate, substitute, execute)
//! - `schema`: catalog tools
//! - `explain`: execution plans behind the safety gate
//! - `sql_validator`: the lexical safety gate
//! - `pagination`: LIMIT/OFFSET rewriting
//! - `validation`: argument bounds shared by all tools

pub mod explain;
pub mod pagination;
pub mod query;
pub mod schema;
pub mod sql_validator;
pub mod validation;

pub use explain::{ExplainInput, ExplainOutput, ExplainToolHandler};
pub use query::{QueryInput, QueryToolHandler};
pub use schema::SchemaToolHandler;
