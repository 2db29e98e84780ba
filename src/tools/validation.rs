//! Argument validation for tool inputs.
//!
//! Runs before the query pipeline or any catalog query; every failure is a
//! `VALIDATION_ERROR`.
//!
//! Scalar tool arguments are deserialized as raw JSON and typed here, so a
//! wrongly typed value becomes a `VALIDATION_ERROR` result rather than a
//! protocol-level invalid-params error.

use crate::error::{DbError, DbResult};
use crate::models::{MAX_PAGE_SIZE, MAX_STATEMENT_LENGTH};
use serde_json::Value as JsonValue;

/// Maximum length of a schema or table name argument.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Statement must be non-blank and at most [`MAX_STATEMENT_LENGTH`] characters.
pub fn validate_statement(statement: &str) -> DbResult<()> {
    if statement.trim().is_empty() {
        return Err(DbError::invalid_input("statement must not be empty"));
    }
    let len = statement.chars().count();
    if len > MAX_STATEMENT_LENGTH {
        return Err(DbError::invalid_input(format!(
            "statement is {} characters; the maximum is {}",
            len, MAX_STATEMENT_LENGTH
        )));
    }
    Ok(())
}

fn wrong_type(field: &str, expected: &str, value: &JsonValue) -> DbError {
    DbError::invalid_input(format!("{} must be {}, got {}", field, expected, value))
}

/// Integer argument; `null` counts as absent.
pub fn integer_arg(value: Option<&JsonValue>, field: &str) -> DbResult<Option<i64>> {
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| wrong_type(field, "an integer", v)),
    }
}

pub fn bool_arg(value: Option<&JsonValue>, field: &str) -> DbResult<Option<bool>> {
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| wrong_type(field, "a boolean", v)),
    }
}

pub fn string_arg<'a>(value: Option<&'a JsonValue>, field: &str) -> DbResult<Option<&'a str>> {
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(v) => v
            .as_str()
            .map(Some)
            .ok_or_else(|| wrong_type(field, "a string", v)),
    }
}

/// Statement argument: required string, then [`validate_statement`].
pub fn statement_arg<'a>(value: Option<&'a JsonValue>) -> DbResult<&'a str> {
    let statement = string_arg(value, "statement")?
        .ok_or_else(|| DbError::invalid_input("statement is required"))?;
    validate_statement(statement)?;
    Ok(statement)
}

/// Positional parameters: an array, or absent.
pub fn parameters_arg(value: Option<&JsonValue>) -> DbResult<&[JsonValue]> {
    match value {
        None | Some(JsonValue::Null) => Ok(&[]),
        Some(JsonValue::Array(values)) => Ok(values),
        Some(v) => Err(wrong_type("parameters", "an array", v)),
    }
}

pub fn validate_page_size(page_size: Option<i64>) -> DbResult<Option<u32>> {
    match page_size {
        None => Ok(None),
        Some(n) if (1..=MAX_PAGE_SIZE as i64).contains(&n) => Ok(Some(n as u32)),
        Some(n) => Err(DbError::invalid_input(format!(
            "pageSize must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, n
        ))),
    }
}

pub fn validate_offset(offset: Option<i64>) -> DbResult<Option<u64>> {
    match offset {
        None => Ok(None),
        Some(n) if n >= 0 => Ok(Some(n as u64)),
        Some(n) => Err(DbError::invalid_input(format!(
            "offset must be zero or greater, got {}",
            n
        ))),
    }
}

/// Schema and table names: 1..=128 characters, no NUL byte.
pub fn validate_identifier(value: &str, field: &str) -> DbResult<()> {
    let len = value.chars().count();
    if len == 0 || len > MAX_IDENTIFIER_LENGTH {
        return Err(DbError::invalid_input(format!(
            "{} must be between 1 and {} characters",
            field, MAX_IDENTIFIER_LENGTH
        )));
    }
    if value.contains('\0') {
        return Err(DbError::invalid_input(format!(
            "{} must not contain NUL bytes",
            field
        )));
    }
    Ok(())
}

pub fn validate_optional_identifier(value: Option<&str>, field: &str) -> DbResult<()> {
    match value {
        Some(v) => validate_identifier(v, field),
        None => Ok(()),
    }
}

/// Output format accepted by `explain_query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExplainFormat {
    #[default]
    Text,
    Json,
    Yaml,
    Xml,
}

impl ExplainFormat {
    pub fn parse(value: Option<&str>) -> DbResult<Self> {
        match value.map(|v| v.to_lowercase()).as_deref() {
            None | Some("text") => Ok(Self::Text),
            Some("json") => Ok(Self::Json),
            Some("yaml") => Ok(Self::Yaml),
            Some("xml") => Ok(Self::Xml),
            Some(other) => Err(DbError::invalid_input(format!(
                "format must be one of text, json, yaml, xml; got '{}'",
                other
            ))),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Xml => "XML",
        }
    }
}
