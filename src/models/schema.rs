//! Schema-related data models.
//!
//! This module defines the catalog descriptors returned by the introspection
//! tools. Field names serialize in camelCase.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    /// Full type as reported by the catalog (e.g., `character varying`, `INTEGER`)
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    pub nullable: bool,
    /// Default expression, verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            max_length: None,
            nullable,
            default: None,
        }
    }

    pub fn with_max_length(mut self, max_length: Option<i64>) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_default(mut self, default: Option<String>) -> Self {
        self.default = default;
        self
    }
}

/// Kind of relation reported by `list_tables`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum TableKind {
    #[serde(rename = "BASE TABLE")]
    BaseTable,
    #[serde(rename = "VIEW")]
    View,
}

impl TableKind {
    /// Parse table type from database-specific string.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "view" => Self::View,
            _ => Self::BaseTable,
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BaseTable => write!(f, "BASE TABLE"),
            Self::View => write!(f, "VIEW"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TableKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConstraintType {
    #[serde(rename = "PRIMARY KEY")]
    PrimaryKey,
    #[serde(rename = "FOREIGN KEY")]
    ForeignKey,
    #[serde(rename = "UNIQUE")]
    Unique,
    #[serde(rename = "CHECK")]
    Check,
}

impl ConstraintType {
    /// Parse a `pg_constraint.contype` code. Exclusion and trigger
    /// constraints have no counterpart and yield `None`.
    pub fn from_pg_code(code: &str) -> Option<Self> {
        match code {
            "p" => Some(Self::PrimaryKey),
            "f" => Some(Self::ForeignKey),
            "u" => Some(Self::Unique),
            "c" => Some(Self::Check),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConstraintInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub constraint_type: ConstraintType,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaInfo {
    pub name: String,
    pub owner: String,
}

/// Index access method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum IndexMethod {
    Btree,
    Hash,
    Gin,
    Gist,
    SpGist,
    Brin,
    Unknown,
}

impl IndexMethod {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "btree" => Self::Btree,
            "hash" => Self::Hash,
            "gin" => Self::Gin,
            "gist" => Self::Gist,
            "spgist" | "sp-gist" => Self::SpGist,
            "brin" => Self::Brin,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    pub schema: String,
    pub table: String,
    pub name: String,
    #[serde(rename = "type")]
    pub method: IndexMethod,
    pub unique: bool,
    pub primary: bool,
    pub columns: Vec<String>,
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewInfo {
    pub schema: String,
    pub name: String,
    pub definition: String,
    pub updatable: bool,
    /// `NONE`, `LOCAL` or `CASCADED`
    pub check_option: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    Function,
    Procedure,
    Aggregate,
    Window,
}

impl FunctionKind {
    /// Parse a `pg_proc.prokind` code.
    pub fn from_pg_code(code: &str) -> Self {
        match code {
            "p" => Self::Procedure,
            "a" => Self::Aggregate,
            "w" => Self::Window,
            _ => Self::Function,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    Immutable,
    Stable,
    Volatile,
}

impl Volatility {
    pub fn from_pg_code(code: &str) -> Self {
        match code {
            "i" => Self::Immutable,
            "s" => Self::Stable,
            _ => Self::Volatile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParallelSafety {
    Safe,
    Restricted,
    Unsafe,
}

impl ParallelSafety {
    pub fn from_pg_code(code: &str) -> Self {
        match code {
            "s" => Self::Safe,
            "r" => Self::Restricted,
            _ => Self::Unsafe,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    Definer,
    Invoker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInfo {
    pub schema: String,
    pub name: String,
    pub return_type: String,
    pub argument_types: String,
    pub kind: FunctionKind,
    pub language: String,
    pub is_aggregate: bool,
    pub is_window: bool,
    pub security: SecurityMode,
    pub volatility: Volatility,
    pub parallel_safety: ParallelSafety,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Size and maintenance statistics for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableStats {
    pub schema: String,
    pub table: String,
    /// Planner estimate, not an exact count
    pub row_estimate: i64,
    pub dead_rows: i64,
    pub total_bytes: i64,
    pub table_bytes: i64,
    pub index_bytes: i64,
    pub total_size: String,
    pub table_size: String,
    pub index_size: String,
    pub seq_scans: i64,
    pub index_scans: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_vacuum: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_autovacuum: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_analyze: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_autoanalyze: Option<DateTime<Utc>>,
}
