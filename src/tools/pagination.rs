//! Pagination rewriting for read-only statements.
//!
//! Appends `LIMIT`/`OFFSET` unless the statement already paginates itself or is
//! a single-row aggregate. Matching is lexical, like the safety gate.

use crate::config::QueryPolicy;

/// Aggregate calls that, without GROUP BY, yield exactly one row.
const SINGLE_ROW_AGGREGATES: &[&str] = &["COUNT(", "SUM(", "AVG(", "MAX(", "MIN("];

/// A statement after pagination, with the page metadata to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRewrite {
    pub statement: String,
    pub page_size: u32,
    pub offset: u64,
}

fn has_word(upper: &str, word: &str) -> bool {
    upper
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|w| w == word)
}

/// True for aggregate statements without GROUP BY.
pub fn is_single_row_aggregate(statement: &str) -> bool {
    let upper = statement.to_uppercase();
    SINGLE_ROW_AGGREGATES.iter().any(|a| upper.contains(a)) && !upper.contains("GROUP BY")
}

/// Page size after defaulting and clamping to the configured maximum.
pub fn effective_page_size(requested: Option<u32>, policy: &QueryPolicy) -> u32 {
    requested
        .unwrap_or(policy.default_page_size)
        .min(policy.max_page_size)
}

fn ends_in_line_comment(statement: &str) -> bool {
    statement
        .rsplit('\n')
        .next()
        .is_some_and(|last_line| last_line.contains("--"))
}

/// Apply pagination to a read-only statement.
pub fn rewrite(
    statement: &str,
    page_size: Option<u32>,
    offset: Option<u64>,
    policy: &QueryPolicy,
) -> PageRewrite {
    let upper = statement.to_uppercase();
    let offset = offset.unwrap_or(0);

    // Already paginated: report metadata only
    if has_word(&upper, "LIMIT") || has_word(&upper, "OFFSET") {
        return PageRewrite {
            statement: statement.to_string(),
            page_size: page_size.unwrap_or(policy.default_page_size),
            offset,
        };
    }

    let effective = effective_page_size(page_size, policy);

    if is_single_row_aggregate(statement) {
        return PageRewrite {
            statement: statement.to_string(),
            page_size: effective,
            offset,
        };
    }

    let base = statement.trim_end_matches(|c: char| c.is_whitespace() || c == ';');
    // A trailing line comment would swallow a clause appended on the same line
    let separator = if ends_in_line_comment(base) { '\n' } else { ' ' };
    let mut rewritten = format!("{}{}LIMIT {}", base, separator, effective);
    if offset > 0 {
        rewritten.push_str(&format!(" OFFSET {}", offset));
    }

    PageRewrite {
        statement: rewritten,
        page_size: effective,
        offset,
    }
}

/// Page-boundary heuristic: a full page means there may be more.
pub fn has_more(returned_rows: usize, page_size: u32) -> bool {
    returned_rows == page_size as usize
}
