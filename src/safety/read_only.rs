use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::error::{AppError, ErrorKind};

const BLOCKED_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "MERGE", "ALTER", "DROP", "CREATE", "TRUNCATE", "GRANT",
    "REVOKE", "BACKUP", "RESTORE", "EXEC", "EXECUTE", "INTO",
];

static NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)--[^\n]*|/\*.*?\*/|N?'(?:[^']|'')*'|\[(?:[^\]]|\]\])*\]")
        .expect("invalid noise pattern")
});

static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("invalid word pattern")
});

/// Accept only statements that produce rows without side effects: a leading
/// `SELECT` or `WITH`, and none of the blocked keywords outside comments,
/// string literals and bracketed identifiers.
pub fn validate_read_only(sql: &str) -> Result<()> {
    let code = NOISE.replace_all(sql, " ");
    let mut words = WORD.find_iter(&code).map(|m| m.as_str().to_uppercase());

    let lead = words.next().ok_or_else(|| rejected("Empty SQL input"))?;
    if lead != "SELECT" && lead != "WITH" {
        return Err(rejected(
            "Only read-only queries (SELECT or WITH ... SELECT) can be compared",
        ));
    }

    if let Some(keyword) = words.find(|word| BLOCKED_KEYWORDS.contains(&word.as_str())) {
        return Err(rejected(format!("Blocked keyword detected: {}", keyword)));
    }

    Ok(())
}

/// Validate `sql` unless writes were explicitly allowed.
pub fn ensure_read_only(sql: &str, allow_write: bool) -> Result<()> {
    if allow_write {
        tracing::warn!("read-only check skipped (--allow-write)");
        return Ok(());
    }
    validate_read_only(sql)
}

fn rejected(message: impl Into<String>) -> anyhow::Error {
    AppError::new(ErrorKind::Input, message).into()
}
