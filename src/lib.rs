//! PG MCP Server Library
//!
//! MCP (Model Context Protocol) tools that let an agent inspect and query a
//! PostgreSQL database (or a local SQLite file) safely: a lexical safety gate,
//! pagination rewriting, literal parameter substitution and a stable error
//! taxonomy sit between the tool call and the database.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::{Config, QueryPolicy};
pub use error::{DbError, ErrorKind, Failure};
pub use mcp::DbService;
