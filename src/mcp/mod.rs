//! MCP server integration module.
//!
//! Binds the tool handlers to the rmcp tool router.

pub mod service;

pub use service::DbService;
