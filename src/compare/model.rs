use std::collections::HashMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Loosely typed scalar as delivered by a data source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical string form used for equality and key building. `None` for null.
    pub fn canonical(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(value) => Some(value.to_string()),
            Value::Int(value) => Some(value.to_string()),
            Value::Float(value) => Some(float_text(*value)),
            Value::Text(value) => Some(value.clone()),
            Value::Date(value) => Some(value.format("%Y-%m-%d").to_string()),
            Value::DateTime(value) => Some(value.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        }
    }

    /// Rendering for reports: null becomes the literal `null`.
    pub fn as_report(&self) -> String {
        self.canonical().unwrap_or_else(|| "null".to_string())
    }
}

/// Float text that keeps a `.0` on integral values, so `20.0` never reads as `20`.
fn float_text(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_report())
    }
}

/// One row from a data source, keyed by column name.
pub type Record = HashMap<String, Value>;

static NULL: Value = Value::Null;

/// Value of `column` in `record`, treating a missing column as null.
pub fn value_of<'a>(record: &'a Record, column: &str) -> &'a Value {
    record.get(column).unwrap_or(&NULL)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    Matched,
    Mismatched,
    SourceOnly,
    TargetOnly,
}

impl RowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RowStatus::Matched => "MATCHED",
            RowStatus::Mismatched => "MISMATCHED",
            RowStatus::SourceOnly => "SOURCE_ONLY",
            RowStatus::TargetOnly => "TARGET_ONLY",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RowStatus::Matched => "Matched",
            RowStatus::Mismatched => "Mismatched",
            RowStatus::SourceOnly => "Source Only",
            RowStatus::TargetOnly => "Target Only",
        }
    }

    /// CSS class used by the HTML report.
    pub fn css_class(self) -> &'static str {
        match self {
            RowStatus::Matched => "matched",
            RowStatus::Mismatched => "mismatched",
            RowStatus::SourceOnly => "source-only",
            RowStatus::TargetOnly => "target-only",
        }
    }

    pub fn on_both_sides(self) -> bool {
        matches!(self, RowStatus::Matched | RowStatus::Mismatched)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellComparison {
    pub column: String,
    pub source: Value,
    pub target: Value,
    pub matched: bool,
}

impl CellComparison {
    pub fn new(column: impl Into<String>, source: Value, target: Value) -> Self {
        let matched = values_match(&source, &target);
        Self {
            column: column.into(),
            source,
            target,
            matched,
        }
    }
}

/// Both null match, one null never matches, otherwise canonical strings decide.
pub fn values_match(source: &Value, target: &Value) -> bool {
    match (source.canonical(), target.canonical()) {
        (None, None) => true,
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub key: String,
    pub key_values: Vec<Value>,
    pub status: RowStatus,
    pub cells: Vec<CellComparison>,
}

impl ComparisonRow {
    pub fn cell(&self, column: &str) -> Option<&CellComparison> {
        self.cells.iter().find(|cell| cell.column == column)
    }

    /// Cells at `positions`, as returned by [`ComparisonResult::value_positions`].
    pub fn value_cells<'a>(
        &'a self,
        positions: &'a [usize],
    ) -> impl Iterator<Item = Option<&'a CellComparison>> + 'a {
        positions.iter().map(|&pos| self.cells.get(pos))
    }

    pub fn differing_columns(&self) -> Vec<&str> {
        self.cells
            .iter()
            .filter(|cell| !cell.matched)
            .map(|cell| cell.column.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    total_rows: usize,
    matched: usize,
    mismatched: usize,
    source_only: usize,
    target_only: usize,
}

impl ComparisonSummary {
    pub fn from_rows(rows: &[ComparisonRow]) -> Self {
        let mut summary = Self {
            total_rows: rows.len(),
            ..Self::default()
        };
        for row in rows {
            match row.status {
                RowStatus::Matched => summary.matched += 1,
                RowStatus::Mismatched => summary.mismatched += 1,
                RowStatus::SourceOnly => summary.source_only += 1,
                RowStatus::TargetOnly => summary.target_only += 1,
            }
        }
        summary
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn mismatched(&self) -> usize {
        self.mismatched
    }

    pub fn source_only(&self) -> usize {
        self.source_only
    }

    pub fn target_only(&self) -> usize {
        self.target_only
    }

    pub fn has_differences(&self) -> bool {
        self.mismatched + self.source_only + self.target_only > 0
    }
}

/// Records shadowed by a later record with the same composite key, per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCounts {
    pub source: usize,
    pub target: usize,
}

impl DuplicateCounts {
    pub fn any(&self) -> bool {
        self.source > 0 || self.target > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub table_name: String,
    pub source_label: String,
    pub target_label: String,
    pub compare_columns: Vec<String>,
    pub key_columns: Vec<String>,
    pub rows: Vec<ComparisonRow>,
    pub summary: ComparisonSummary,
    pub duplicates: DuplicateCounts,
}

impl ComparisonResult {
    pub fn is_key_column(&self, column: &str) -> bool {
        self.key_columns.iter().any(|key| key == column)
    }

    /// Compared columns that are not part of the identification key.
    pub fn value_columns(&self) -> Vec<&str> {
        self.compare_columns
            .iter()
            .filter(|column| !self.is_key_column(column))
            .map(String::as_str)
            .collect()
    }

    /// Indexes of the value columns in `compare_columns`, which are also their
    /// indexes in every row's `cells`.
    pub fn value_positions(&self) -> Vec<usize> {
        self.compare_columns
            .iter()
            .enumerate()
            .filter(|(_, column)| !self.is_key_column(column))
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn row(&self, key: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|row| row.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_equality_policy() {
        assert!(values_match(&Value::Null, &Value::Null));
        assert!(!values_match(&Value::Null, &Value::Text("".to_string())));
        assert!(!values_match(&Value::Int(0), &Value::Null));
    }

    #[test]
    fn equality_is_textual_not_typed() {
        assert!(values_match(&Value::Int(1), &Value::Text("1".to_string())));
        assert!(values_match(&Value::Bool(true), &Value::Text("true".to_string())));
        assert!(!values_match(&Value::Float(1.5), &Value::Text("1.50".to_string())));
    }

    #[test]
    fn integral_floats_keep_their_fraction() {
        assert_eq!(Value::Float(20.0).canonical().as_deref(), Some("20.0"));
        assert_eq!(Value::Float(-3.0).canonical().as_deref(), Some("-3.0"));
        assert_eq!(Value::Float(2.5).canonical().as_deref(), Some("2.5"));
        assert!(!values_match(&Value::Float(20.0), &Value::Int(20)));
        assert!(values_match(&Value::Float(20.0), &Value::Text("20.0".to_string())));
    }

    #[test]
    fn value_cells_skip_key_columns() {
        let cell = |column: &str| CellComparison::new(column, Value::Int(1), Value::Int(1));
        let result = ComparisonResult {
            table_name: "t".to_string(),
            source_label: "s".to_string(),
            target_label: "t".to_string(),
            compare_columns: vec!["a".to_string(), "id".to_string(), "b".to_string()],
            key_columns: vec!["id".to_string()],
            rows: vec![ComparisonRow {
                key: "1|".to_string(),
                key_values: vec![Value::Int(1)],
                status: RowStatus::Matched,
                cells: vec![cell("a"), cell("id"), cell("b")],
            }],
            summary: ComparisonSummary::default(),
            duplicates: DuplicateCounts::default(),
        };

        let positions = result.value_positions();
        assert_eq!(positions, vec![0, 2]);
        let columns: Vec<&str> = result.rows[0]
            .value_cells(&positions)
            .map(|cell| cell.map(|c| c.column.as_str()).unwrap_or("?"))
            .collect();
        assert_eq!(columns, result.value_columns());
    }

    #[test]
    fn canonical_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).expect("date");
        assert_eq!(Value::Date(date).canonical().as_deref(), Some("2024-02-29"));
        let dt = date.and_hms_opt(8, 5, 0).expect("datetime");
        assert_eq!(
            Value::DateTime(dt).canonical().as_deref(),
            Some("2024-02-29 08:05:00")
        );
    }

    #[test]
    fn missing_column_reads_as_null() {
        let record = Record::from([("id".to_string(), Value::Int(1))]);
        assert_eq!(value_of(&record, "id"), &Value::Int(1));
        assert!(value_of(&record, "name").is_null());
    }

    #[test]
    fn summary_counts_statuses() {
        let row = |status| ComparisonRow {
            key: String::new(),
            key_values: Vec::new(),
            status,
            cells: Vec::new(),
        };
        let rows = vec![
            row(RowStatus::Matched),
            row(RowStatus::Matched),
            row(RowStatus::Mismatched),
            row(RowStatus::TargetOnly),
        ];
        let summary = ComparisonSummary::from_rows(&rows);
        assert_eq!(summary.total_rows(), 4);
        assert_eq!(summary.matched(), 2);
        assert_eq!(summary.mismatched(), 1);
        assert_eq!(summary.source_only(), 0);
        assert_eq!(summary.target_only(), 1);
        assert!(summary.has_differences());
    }
}
