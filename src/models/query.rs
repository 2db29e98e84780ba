//! Query-related data models.
//!
//! This module defines the query request, the positional parameter values and
//! the tagged result union returned by the `query` tool.

use crate::error::{DbError, Failure};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Default page size when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Upper bound for any page size, requested or configured.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Maximum statement length in characters.
pub const MAX_STATEMENT_LENGTH: usize = 50_000;

/// A positional parameter value for `$1`, `$2`, ... placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    Null,
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    Float(f64),
    String(String),
}

impl QueryParam {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this parameter for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
        }
    }
}

impl TryFrom<&JsonValue> for QueryParam {
    type Error = DbError;

    fn try_from(value: &JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(b) => Ok(Self::Bool(*b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Ok(Self::Int(i)),
                None => n
                    .as_f64()
                    .map(Self::Float)
                    .ok_or_else(|| DbError::parameter(format!("unrepresentable number {}", n))),
            },
            JsonValue::String(s) => Ok(Self::String(s.clone())),
            JsonValue::Array(_) => Err(DbError::parameter(
                "arrays are not supported; expected string, number, boolean or null",
            )),
            JsonValue::Object(_) => Err(DbError::parameter(
                "objects are not supported; expected string, number, boolean or null",
            )),
        }
    }
}

/// Convert raw JSON parameters, failing on the first unsupported value.
pub fn params_from_json(values: &[JsonValue]) -> Result<Vec<QueryParam>, DbError> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            QueryParam::try_from(v).map_err(|e| match e {
                DbError::Parameter { message } => {
                    DbError::parameter(format!("parameter ${}: {}", i + 1, message))
                }
                other => other,
            })
        })
        .collect()
}

/// A validated query request as it enters the pipeline.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub statement: String,
    pub params: Vec<QueryParam>,
    pub page_size: Option<u32>,
    pub offset: Option<u64>,
}

impl QueryRequest {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            params: Vec::new(),
            page_size: None,
            offset: None,
        }
    }

    pub fn with_param(mut self, param: QueryParam) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub has_more: bool,
    pub page_size: u32,
    pub offset: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsResult {
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    pub row_count: usize,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedResult {
    pub row_count: u64,
}

/// Result of the query pipeline; exactly one variant per response.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Rows(RowsResult),
    Affected(AffectedResult),
    Failure(Failure),
}

impl QueryResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

impl From<DbError> for QueryResult {
    fn from(err: DbError) -> Self {
        Self::Failure(err.to_failure())
    }
}
