//! Error types for the PG MCP Server.
//!
//! `DbError` is the crate-internal error, built with `thiserror`. Before anything
//! leaves a tool it is converted into a [`Failure`] envelope carrying a stable
//! [`ErrorKind`] and an actionable hint, so callers can correct and resubmit.

use schemars::JsonSchema;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("{message}")]
    Database {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
    },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u64,
    },

    /// No connection could be acquired within the pool's acquire timeout.
    #[error("Timeout: no database connection became available")]
    PoolTimedOut,

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Statement rejected: {reason}")]
    SafetyRejected { reason: String },

    #[error("Invalid parameter: {message}")]
    Parameter { message: String },

    #[error("{message} (object: {object})")]
    NotFound { message: String, object: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a backend error with optional SQL state.
    pub fn database(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
        }
    }

    pub fn timeout(operation: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn safety_rejected(reason: impl Into<String>) -> Self {
        Self::SafetyRejected {
            reason: reason.into(),
        }
    }

    pub fn parameter(message: impl Into<String>) -> Self {
        Self::Parameter {
            message: message.into(),
        }
    }

    /// Create a not-found error for a catalog object (table, view, ...).
    pub fn not_found(message: impl Into<String>, object: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            object: object.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable taxonomy kind for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } | Self::Unsupported { .. } => ErrorKind::ValidationError,
            Self::SafetyRejected { .. } => ErrorKind::SafetyRejected,
            Self::Parameter { .. } => ErrorKind::ParameterError,
            Self::Timeout { .. } | Self::PoolTimedOut => ErrorKind::Timeout,
            Self::NotFound { .. } => ErrorKind::RelationNotFound,
            Self::Database { message, .. } => classify_backend_message(message),
            Self::Connection { .. } | Self::Internal { .. } => ErrorKind::DatabaseError,
        }
    }

    /// Convert into the wire-level failure envelope.
    pub fn to_failure(&self) -> Failure {
        let kind = self.kind();
        let hint = match self {
            Self::Connection { suggestion, .. } => Some(suggestion.clone()),
            Self::PoolTimedOut => Some(
                "All pool connections are busy or the database is unreachable; retry shortly or raise POOL_SIZE"
                    .to_string(),
            ),
            _ => Some(kind.hint().to_string()),
        };
        let message = match self {
            Self::Database {
                message,
                sql_state: Some(code),
            } => format!("{} (SQLSTATE: {})", message, code),
            other => other.to_string(),
        };
        Failure {
            message,
            error_kind: kind,
            hint,
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection settings (DATABASE_URL or DB_* variables)",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::database(db_err.message(), code)
            }
            sqlx::Error::RowNotFound => DbError::database("No rows returned", None),
            sqlx::Error::PoolTimedOut => DbError::PoolTimedOut,
            sqlx::Error::PoolClosed => DbError::connection(
                "Connection pool is closed",
                "The server is shutting down; retry against a running instance",
            ),
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify DB_SSL_MODE and the server certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::database(format!("column \"{}\" does not exist", col), None)
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            other => DbError::internal(format!("Unknown database error: {}", other)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Stable error taxonomy reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    SafetyRejected,
    ParameterError,
    SyntaxError,
    PermissionDenied,
    DuplicateKey,
    ForeignKeyViolation,
    RelationNotFound,
    ColumnNotFound,
    Timeout,
    DatabaseError,
}

impl ErrorKind {
    /// Fixed, user-actionable hint for this kind.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::ValidationError => {
                "Check the tool arguments against the documented types and limits and retry"
            }
            Self::SafetyRejected => {
                "Only SELECT, WITH or EXPLAIN statements are accepted in read-only mode; \
                 DDL and maintenance commands are always blocked; UPDATE/DELETE need a selective WHERE clause"
            }
            Self::ParameterError => {
                "Parameters must be strings, finite numbers, booleans or null, in $1, $2, ... order"
            }
            Self::SyntaxError => {
                "Check the SQL syntax near the reported position and quote identifiers if needed"
            }
            Self::PermissionDenied => {
                "The database role lacks privileges for this object; query a permitted table instead"
            }
            Self::DuplicateKey => {
                "A row with the same unique key already exists; use a different key value"
            }
            Self::ForeignKeyViolation => {
                "The referenced row does not exist or is still referenced; check related tables"
            }
            Self::RelationNotFound => {
                "Check table name spelling and schema qualification; use list_tables to see available tables"
            }
            Self::ColumnNotFound => {
                "Check column name spelling; use describe_table to see available columns"
            }
            Self::Timeout => {
                "The statement took too long; add filters, a smaller page size or an index"
            }
            Self::DatabaseError => {
                "Inspect the message and SQLSTATE, correct the statement and retry"
            }
        }
    }
}

/// Ordered classification rules: first match wins.
const CLASSIFICATION_RULES: &[(ErrorKind, fn(&str) -> bool)] = &[
    (ErrorKind::SyntaxError, |m| m.contains("syntax error")),
    (ErrorKind::PermissionDenied, |m| {
        m.contains("permission denied") || m.contains("must be owner")
    }),
    (ErrorKind::DuplicateKey, |m| {
        m.contains("duplicate key value") || m.contains("unique constraint failed")
    }),
    (ErrorKind::ForeignKeyViolation, |m| {
        m.contains("foreign key constraint")
    }),
    (ErrorKind::RelationNotFound, |m| {
        (m.contains("relation") && m.contains("does not exist") && !m.contains("column"))
            || m.contains("no such table")
    }),
    (ErrorKind::ColumnNotFound, |m| {
        (m.contains("column") && m.contains("does not exist")) || m.contains("no such column")
    }),
    (ErrorKind::Timeout, |m| {
        m.contains("timeout") || m.contains("timed out") || m.contains("canceling statement")
    }),
];

/// Map a raw backend error message to a taxonomy kind.
pub fn classify_backend_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();
    CLASSIFICATION_RULES
        .iter()
        .find(|(_, matches)| matches(&lower))
        .map(|(kind, _)| *kind)
        .unwrap_or(ErrorKind::DatabaseError)
}

/// Failure envelope returned in place of a success payload.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub message: String,
    pub error_kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl From<DbError> for Failure {
    fn from(err: DbError) -> Self {
        err.to_failure()
    }
}
