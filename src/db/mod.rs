//! Database access layer.
//!
//! - `pool`: the connection handle owning the process-wide pool
//! - `executor`: timeout-bounded execution of final statements
//! - `params`: literal parameter substitution
//! - `schema`: catalog introspection
//! - `types`: row decoding to JSON

pub mod executor;
pub mod params;
pub mod pool;
pub mod schema;
pub mod types;

pub use executor::{JsonRow, QueryExecutor};
pub use pool::{ConnectionHandle, DbPool};
pub use schema::SchemaInspector;
