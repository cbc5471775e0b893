use std::fmt;

use anyhow::Result;

use crate::compare::Record;
use crate::config::ConnectionSettings;
use crate::db::client;
use crate::db::executor::{run_query, run_sql};
use crate::error::{AppError, ErrorKind};
use crate::safety::ensure_read_only;

const TABLE_COLUMNS: &str = r#"
SELECT COLUMN_NAME
FROM INFORMATION_SCHEMA.COLUMNS
WHERE TABLE_SCHEMA = @P1 AND TABLE_NAME = @P2
ORDER BY ORDINAL_POSITION
"#;

/// Schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    /// `schema.table` or bare `table` (resolved against `default_schema`).
    /// Square brackets around either part are removed.
    pub fn parse(raw: &str, default_schema: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (schema, table) = match trimmed.split_once('.') {
            Some((schema, table)) => (unbracket(schema), unbracket(table)),
            None => (default_schema.to_string(), unbracket(trimmed)),
        };
        if table.is_empty() || schema.is_empty() || table.contains('.') {
            return Err(AppError::new(
                ErrorKind::Input,
                format!("Invalid table name '{}' (expected schema.table)", raw),
            )
            .into());
        }
        Ok(Self { schema, table })
    }

    pub fn quoted(&self) -> String {
        format!(
            "{}.{}",
            quote_identifier(&self.schema),
            quote_identifier(&self.table)
        )
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

fn unbracket(part: &str) -> String {
    part.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string()
}

/// Bracket-quote a SQL Server identifier.
pub fn quote_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

pub(crate) fn select_statement(
    table: &TableRef,
    columns: &[String],
    filter: Option<&str>,
    max_rows: u64,
) -> String {
    let top = if max_rows > 0 {
        format!("TOP ({}) ", max_rows)
    } else {
        String::new()
    };
    let column_list = columns
        .iter()
        .map(|col| quote_identifier(col))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!("SELECT {}{} FROM {}", top, column_list, table.quoted());
    if let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(filter);
    }
    sql
}

pub(crate) async fn fetch_table(
    settings: &ConnectionSettings,
    table: &TableRef,
    filter: Option<&str>,
    max_rows: u64,
    allow_write: bool,
) -> Result<(Vec<String>, Vec<Record>)> {
    if let Some(filter) = filter {
        ensure_read_only(&format!("SELECT 1 WHERE {}", filter), allow_write)?;
    }

    let mut client = client::connect(settings).await?;

    let mut query = tiberius::Query::new(TABLE_COLUMNS);
    query.bind(table.schema.as_str());
    query.bind(table.table.as_str());
    let columns: Vec<String> = run_query(query, &mut client)
        .await?
        .rows
        .into_iter()
        .filter_map(|row| row.into_iter().next().and_then(|v| v.canonical()))
        .collect();
    if columns.is_empty() {
        return Err(AppError::new(
            ErrorKind::Query,
            format!("Table {} not found in {}", table, settings.database),
        )
        .into());
    }

    let sql = select_statement(table, &columns, filter, max_rows);
    tracing::debug!(sql = %sql, "fetching table rows");
    let result = run_sql(&sql, &mut client).await?;
    Ok((columns, result.into_records()))
}

pub(crate) async fn fetch_query(
    settings: &ConnectionSettings,
    sql: &str,
    allow_write: bool,
) -> Result<(Vec<String>, Vec<Record>)> {
    ensure_read_only(sql, allow_write)?;
    let mut client = client::connect(settings).await?;
    let result = run_sql(sql, &mut client).await?;
    Ok((result.column_names(), result.into_records()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_table_names() {
        assert_eq!(
            TableRef::parse("sales.Orders", "dbo").expect("qualified"),
            TableRef {
                schema: "sales".to_string(),
                table: "Orders".to_string()
            }
        );
        let bare = TableRef::parse("[Order Lines]", "dbo").expect("bare");
        assert_eq!(bare.schema, "dbo");
        assert_eq!(bare.table, "Order Lines");
        assert!(TableRef::parse("a.b.c", "dbo").is_err());
        assert!(TableRef::parse("", "dbo").is_err());
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_identifier("Name"), "[Name]");
        assert_eq!(quote_identifier("odd]name"), "[odd]]name]");
    }

    #[test]
    fn builds_select_with_top_and_filter() {
        let table = TableRef::parse("dbo.Users", "dbo").expect("table");
        let columns = vec!["Id".to_string(), "Name".to_string()];
        assert_eq!(
            select_statement(&table, &columns, Some("Active = 1"), 1000),
            "SELECT TOP (1000) [Id], [Name] FROM [dbo].[Users] WHERE Active = 1"
        );
        assert_eq!(
            select_statement(&table, &columns, Some("  "), 0),
            "SELECT [Id], [Name] FROM [dbo].[Users]"
        );
    }
}
