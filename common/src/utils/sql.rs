//! SQL assembly helpers for the fixed analysis queries.
//!
//! The analysis queries group fixed tables by a fixed key; the only dynamic
//! parts are identifiers, which cannot be bound as query parameters. Every
//! identifier therefore passes through [`ensure_safe_ident`] before it is
//! placed into a statement, and the assembled statement must be a SELECT.

use crate::errors::{AppError, AppResult};

/// Maximum accepted identifier length.
const MAX_IDENT_LEN: usize = 64;

/// Validates a SQL identifier: ASCII letter or underscore first, then
/// letters, digits or underscores.
pub fn ensure_safe_ident(ident: &str) -> AppResult<&str> {
    let mut chars = ident.chars();
    let valid_head = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    let valid_tail = ident
        .chars()
        .skip(1)
        .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_head && valid_tail && ident.len() <= MAX_IDENT_LEN {
        Ok(ident)
    } else {
        Err(AppError::Validation(format!(
            "invalid SQL identifier: {:?}",
            ident
        )))
    }
}

/// Rejects statements that are not plain SELECTs.
pub fn ensure_select(sql: &str) -> AppResult<()> {
    if sql.trim_start().to_uppercase().starts_with("SELECT") {
        Ok(())
    } else {
        Err(AppError::Validation(
            "only SELECT statements are executed".to_string(),
        ))
    }
}

/// Assembles a `SELECT <key>, COUNT(*) AS <count> FROM <table> GROUP BY
/// <key>` statement from validated identifiers.
pub fn build_group_count_query(
    group_key: &str,
    count_column: &str,
    table: &str,
) -> AppResult<String> {
    let key = ensure_safe_ident(group_key)?;
    let count = ensure_safe_ident(count_column)?;
    let table = ensure_safe_ident(table)?;

    let sql = format!(
        "SELECT {key}, COUNT(*) AS {count} FROM {table} GROUP BY {key}"
    );
    ensure_select(&sql)?;
    Ok(sql)
}
