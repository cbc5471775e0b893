//! Loading one side of a comparison into memory.

mod file;
mod table;

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::compare::Record;
use crate::config::ConnectionSettings;
use crate::error::{AppError, ErrorKind};

pub use file::{parse_cell, read_csv, read_json};
pub use table::{TableRef, quote_identifier};

/// Where one side's rows come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    Table {
        table: TableRef,
        filter: Option<String>,
        max_rows: u64,
        allow_write: bool,
    },
    Query {
        sql: String,
        allow_write: bool,
    },
    Csv {
        path: PathBuf,
    },
    Json {
        path: PathBuf,
    },
}

impl SourceSpec {
    /// Pick the file reader from the extension.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(SourceSpec::Csv { path }),
            Some("json") => Ok(SourceSpec::Json { path }),
            _ => Err(AppError::new(
                ErrorKind::Input,
                format!(
                    "Unsupported data file '{}' (expected .csv or .json)",
                    path.display()
                ),
            )
            .into()),
        }
    }

    pub fn needs_connection(&self) -> bool {
        matches!(self, SourceSpec::Table { .. } | SourceSpec::Query { .. })
    }

    /// Default name for the comparison when none is given.
    pub fn display_name(&self) -> String {
        match self {
            SourceSpec::Table { table, .. } => table.to_string(),
            SourceSpec::Query { .. } => "query".to_string(),
            SourceSpec::Csv { path } | SourceSpec::Json { path } => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }
}

/// Rows of one side plus their column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSet {
    pub label: String,
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

/// Load `spec`. Database specs require `connection`.
pub async fn fetch(
    spec: &SourceSpec,
    label: &str,
    connection: Option<&ConnectionSettings>,
) -> Result<DataSet> {
    let name = spec.display_name();
    let (columns, rows) = match spec {
        SourceSpec::Csv { path } => read_csv(path)?,
        SourceSpec::Json { path } => read_json(path)?,
        SourceSpec::Table {
            table: table_ref,
            filter,
            max_rows,
            allow_write,
        } => {
            let connection = require_connection(connection, label)?;
            table::fetch_table(
                connection,
                table_ref,
                filter.as_deref(),
                *max_rows,
                *allow_write,
            )
                .await
                .with_context(|| format!("Failed to read {} table {}", label, table_ref))?
        }
        SourceSpec::Query { sql, allow_write } => {
            let connection = require_connection(connection, label)?;
            table::fetch_query(connection, sql, *allow_write)
                .await
                .with_context(|| format!("Failed to run {} query", label))?
        }
    };

    tracing::info!(
        side = label,
        name = %name,
        columns = columns.len(),
        rows = rows.len(),
        "loaded data set"
    );

    Ok(DataSet {
        label: label.to_string(),
        name,
        columns,
        rows,
    })
}

fn require_connection<'a>(
    connection: Option<&'a ConnectionSettings>,
    label: &str,
) -> Result<&'a ConnectionSettings> {
    connection.ok_or_else(|| {
        AppError::new(
            ErrorKind::Config,
            format!("No database connection configured for {}", label),
        )
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_reader_from_extension() {
        assert_eq!(
            SourceSpec::from_file("data/people.CSV").expect("csv"),
            SourceSpec::Csv {
                path: PathBuf::from("data/people.CSV")
            }
        );
        assert!(matches!(
            SourceSpec::from_file("rows.json").expect("json"),
            SourceSpec::Json { .. }
        ));
        assert!(SourceSpec::from_file("rows.txt").is_err());
    }

    #[test]
    fn display_name_uses_file_stem() {
        let spec = SourceSpec::Csv {
            path: PathBuf::from("/tmp/customers.csv"),
        };
        assert_eq!(spec.display_name(), "customers");
        assert!(!spec.needs_connection());
    }

    #[tokio::test]
    async fn database_source_without_connection_fails() {
        let spec = SourceSpec::Query {
            sql: "SELECT 1".to_string(),
            allow_write: false,
        };
        let err = fetch(&spec, "source", None).await.expect_err("no connection");
        assert_eq!(crate::error::classify_error(&err), ErrorKind::Config);
    }

    #[tokio::test]
    async fn fetches_csv_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "id,name\n1,Ann\n2,\n").expect("write csv");

        let data = fetch(&SourceSpec::Csv { path }, "target", None)
            .await
            .expect("fetch");
        assert_eq!(data.label, "target");
        assert_eq!(data.name, "people");
        assert_eq!(data.columns, vec!["id", "name"]);
        assert_eq!(data.rows.len(), 2);
    }
}
