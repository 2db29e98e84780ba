//! Literal parameter substitution for `$n` placeholders.
//!
//! Parameters are not bound by the driver. Each placeholder is replaced with an
//! escaped SQL literal before the statement is sent, and the driver executes
//! the fully literal text. The escaping in [`render_literal`] is therefore the
//! whole security contract for this path.
//!
//! Negative numbers are parenthesized: after a `-` in the statement a bare
//! `-5` would form `--`, a line comment swallowing the rest of the statement
//! (including an appended `LIMIT`).

use crate::error::{DbError, DbResult};
use crate::models::QueryParam;

/// Check every parameter before anything is substituted.
pub fn validate_params(params: &[QueryParam]) -> DbResult<()> {
    for (i, param) in params.iter().enumerate() {
        match param {
            QueryParam::Float(v) if !v.is_finite() => {
                return Err(DbError::parameter(format!(
                    "parameter ${} must be a finite number, got {}",
                    i + 1,
                    v
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Render a parameter as a SQL literal.
pub fn render_literal(param: &QueryParam) -> String {
    match param {
        QueryParam::Null => "NULL".to_string(),
        QueryParam::Bool(true) => "TRUE".to_string(),
        QueryParam::Bool(false) => "FALSE".to_string(),
        QueryParam::Int(v) if *v < 0 => format!("({})", v),
        QueryParam::Int(v) => v.to_string(),
        QueryParam::Float(v) if v.is_sign_negative() => format!("({})", v),
        QueryParam::Float(v) => v.to_string(),
        QueryParam::String(v) => quote_string(v),
    }
}

/// Single-quote a string: NUL bytes stripped, backslashes and quotes doubled.
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\0' => {}
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("''"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

/// Replace `$1`, `$2`, ... with escaped literals.
///
/// A placeholder is the whole run of digits after `$`, so `$1` never matches
/// the prefix of `$10`. Placeholders outside `1..=params.len()` are left as is.
/// The scan is single-pass: substituted literals are never rescanned.
pub fn substitute(statement: &str, params: &[QueryParam]) -> DbResult<String> {
    validate_params(params)?;
    if params.is_empty() {
        return Ok(statement.to_string());
    }

    let literals: Vec<String> = params.iter().map(render_literal).collect();
    let extra: usize = literals.iter().map(String::len).sum();
    let mut out = String::with_capacity(statement.len() + extra);
    let mut rest = statement;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();

        let index = after[..digits].parse::<usize>().ok();
        match index.filter(|i| (1..=literals.len()).contains(i)) {
            Some(i) => out.push_str(&literals[i - 1]),
            None => {
                out.push('$');
                out.push_str(&after[..digits]);
            }
        }
        rest = &after[digits..];
    }
    out.push_str(rest);

    Ok(out)
}
