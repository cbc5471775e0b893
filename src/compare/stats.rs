use serde::Serialize;

use super::model::ComparisonResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnVerdict {
    AllMatch,
    AllDiffer,
    Partial,
    NoData,
}

impl ColumnVerdict {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnVerdict::AllMatch => "all match",
            ColumnVerdict::AllDiffer => "all differ",
            ColumnVerdict::Partial => "partial",
            ColumnVerdict::NoData => "no data",
        }
    }
}

/// Match counts for one non-key column over rows present on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStats {
    pub column: String,
    pub total: usize,
    pub matches: usize,
    pub mismatches: usize,
}

impl ColumnStats {
    fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
            total: 0,
            matches: 0,
            mismatches: 0,
        }
    }

    pub fn match_percentage(&self) -> usize {
        if self.total == 0 {
            return 0;
        }
        self.matches * 100 / self.total
    }

    pub fn verdict(&self) -> ColumnVerdict {
        if self.total == 0 {
            ColumnVerdict::NoData
        } else if self.mismatches == 0 {
            ColumnVerdict::AllMatch
        } else if self.matches == 0 {
            ColumnVerdict::AllDiffer
        } else {
            ColumnVerdict::Partial
        }
    }
}

/// Per-column statistics in compare-column order, skipping key columns.
/// Rows that exist on only one side do not count.
pub fn column_stats(result: &ComparisonResult) -> Vec<ColumnStats> {
    let positions = result.value_positions();
    let mut stats = result
        .value_columns()
        .into_iter()
        .map(ColumnStats::new)
        .collect::<Vec<_>>();

    for row in result.rows.iter().filter(|row| row.status.on_both_sides()) {
        for (entry, cell) in stats.iter_mut().zip(row.value_cells(&positions)) {
            let Some(cell) = cell else {
                continue;
            };
            entry.total += 1;
            if cell.matched {
                entry.matches += 1;
            } else {
                entry.mismatches += 1;
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::engine::compare;
    use crate::compare::model::{Record, Value};

    fn record(id: i64, a: &str, b: &str) -> Record {
        Record::from([
            ("id".to_string(), Value::Int(id)),
            ("a".to_string(), Value::Text(a.to_string())),
            ("b".to_string(), Value::Text(b.to_string())),
        ])
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn counts_only_rows_on_both_sides() {
        let source = vec![record(1, "x", "p"), record(2, "y", "q"), record(3, "z", "r")];
        let target = vec![record(1, "x", "P"), record(2, "Y", "Q"), record(4, "w", "s")];
        let result = compare(
            "t",
            "s",
            "t",
            &source,
            &target,
            &columns(&["id", "a", "b"]),
            &columns(&["id"]),
        );

        let stats = column_stats(&result);
        assert_eq!(stats.len(), 2);

        let a = &stats[0];
        assert_eq!(a.column, "a");
        assert_eq!((a.total, a.matches, a.mismatches), (2, 1, 1));
        assert_eq!(a.match_percentage(), 50);
        assert_eq!(a.verdict(), ColumnVerdict::Partial);

        let b = &stats[1];
        assert_eq!((b.total, b.matches, b.mismatches), (2, 0, 2));
        assert_eq!(b.verdict(), ColumnVerdict::AllDiffer);
    }

    #[test]
    fn percentage_uses_integer_division() {
        let stats = ColumnStats {
            column: "c".to_string(),
            total: 3,
            matches: 2,
            mismatches: 1,
        };
        assert_eq!(stats.match_percentage(), 66);
    }

    #[test]
    fn empty_column_has_no_data() {
        let stats = ColumnStats::new("c");
        assert_eq!(stats.match_percentage(), 0);
        assert_eq!(stats.verdict(), ColumnVerdict::NoData);
    }

    #[test]
    fn identical_sets_report_all_match() {
        let rows = vec![record(1, "x", "p"), record(2, "y", "q")];
        let result = compare(
            "t",
            "s",
            "t",
            &rows,
            &rows,
            &columns(&["a", "b"]),
            &columns(&["id"]),
        );
        let stats = column_stats(&result);
        assert!(stats.iter().all(|s| s.verdict() == ColumnVerdict::AllMatch));
        assert!(stats.iter().all(|s| s.match_percentage() == 100));
    }
}
