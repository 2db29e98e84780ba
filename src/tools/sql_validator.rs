//! SQL safety gate.
//!
//! A lexical scan, not a parser. It decides whether a statement may run under
//! the current [`QueryPolicy`] and the keyword and pattern lists below are the
//! compatibility contract: changing them changes which statements are accepted.
//!
//! Known limitations:
//! - Keywords inside string literals or comments are still matched, so
//!   `SELECT 'drop'` is rejected.
//! - The WHERE check for writes triggers on `UPDATE`/`DELETE` anywhere in the
//!   text, including identifiers such as `last_update`.
//! - Trivial-WHERE patterns are plain substrings; `WHERE 10 > x` matches
//!   `WHERE 1`.

use crate::config::QueryPolicy;
use crate::error::{DbError, DbResult};

/// Operations rejected in every mode.
pub const DENIED_KEYWORDS: &[&str] = &[
    "DROP", "CREATE", "ALTER", "TRUNCATE", "GRANT", "REVOKE", "VACUUM", "ANALYZE", "CLUSTER",
    "REINDEX", "COPY", "BACKUP", "RESTORE", "ATTACH", "DETACH", "PRAGMA",
];

/// Statement prefixes accepted in read-only mode.
pub const READ_ONLY_PREFIXES: &[&str] = &["SELECT", "WITH", "EXPLAIN"];

/// WHERE clauses that filter nothing.
pub const TRIVIAL_WHERE_PATTERNS: &[&str] = &[
    "WHERE 1=1",
    "WHERE 1 = 1",
    "WHERE TRUE",
    "WHERE 1",
    "WHERE '1'='1'",
    "WHERE \"1\"=\"1\"",
];

/// Outcome of evaluating one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl SafetyDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn reject(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }

    /// Convert into a `SAFETY_REJECTED` error when not allowed.
    pub fn into_result(self) -> DbResult<()> {
        match self {
            Self { allowed: true, .. } => Ok(()),
            Self { reason, .. } => Err(DbError::safety_rejected(
                reason.unwrap_or_else(|| "statement rejected".to_string()),
            )),
        }
    }
}

/// Split upper-cased text into identifier-like words (`[A-Z0-9_]+`).
fn words(upper: &str) -> impl Iterator<Item = &str> {
    upper
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
}

fn contains_word(upper: &str, word: &str) -> bool {
    words(upper).any(|w| w == word)
}

/// True if the trimmed statement starts with SELECT, WITH or EXPLAIN.
pub fn is_read_only_statement(statement: &str) -> bool {
    let upper = statement.trim().to_uppercase();
    READ_ONLY_PREFIXES.iter().any(|p| upper.starts_with(p))
}

/// Decide whether `statement` may run under `policy`.
pub fn evaluate(statement: &str, policy: &QueryPolicy) -> SafetyDecision {
    let upper = statement.to_uppercase();

    if let Some(keyword) = words(&upper).find(|w| DENIED_KEYWORDS.iter().any(|k| k == w)) {
        return SafetyDecision::reject(format!("{} operations are not allowed", keyword));
    }

    if policy.read_only {
        if is_read_only_statement(statement) {
            return SafetyDecision::allow();
        }
        return SafetyDecision::reject(
            "Server is in read-only mode: only SELECT, WITH and EXPLAIN statements are allowed",
        );
    }

    if upper.contains("UPDATE") || upper.contains("DELETE") {
        if !contains_word(&upper, "WHERE") {
            return SafetyDecision::reject(
                "UPDATE and DELETE statements require a WHERE clause",
            );
        }
        if let Some(pattern) = TRIVIAL_WHERE_PATTERNS.iter().find(|p| upper.contains(*p)) {
            return SafetyDecision::reject(format!(
                "UPDATE and DELETE statements require a selective WHERE clause, found '{}'",
                pattern
            ));
        }
    }

    SafetyDecision::allow()
}

/// Evaluate and convert to a result.
pub fn check_statement(statement: &str, policy: &QueryPolicy) -> DbResult<()> {
    evaluate(statement, policy).into_result()
}
