use std::collections::HashMap;

use anyhow::Result;

use super::engine::composite_key;
use super::model::Record;
use crate::config::DuplicateKeyPolicy;
use crate::error::{AppError, ErrorKind};

const DUPLICATE_SAMPLE: usize = 5;

/// Columns present in both lists, in source order.
pub fn common_columns(source: &[String], target: &[String]) -> Vec<String> {
    source
        .iter()
        .filter(|column| target.contains(column))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    pub key: String,
    pub occurrences: usize,
}

/// Composite keys that occur more than once, in first-seen order.
pub fn find_duplicate_keys(rows: &[Record], key_columns: &[String]) -> Vec<DuplicateKey> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order = Vec::new();
    for row in rows {
        let key = composite_key(row, key_columns);
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter_map(|key| {
            let occurrences = counts.get(&key).copied().unwrap_or(0);
            (occurrences > 1).then_some(DuplicateKey { key, occurrences })
        })
        .collect()
}

/// Column selection for a comparison, checked before the comparator runs.
#[derive(Debug, Clone)]
pub struct ComparisonRequest {
    pub compare_columns: Vec<String>,
    pub key_columns: Vec<String>,
}

impl ComparisonRequest {
    /// Resolve the compared columns from both sides' column lists.
    ///
    /// `include` restricts the comparison to the named columns; `exclude` removes
    /// columns from it. Key columns stay in the compared set unless excluded.
    pub fn resolve(
        source_columns: &[String],
        target_columns: &[String],
        key_columns: &[String],
        include: &[String],
        exclude: &[String],
    ) -> Result<Self> {
        let key_columns = key_columns
            .iter()
            .map(|column| column.trim().to_string())
            .filter(|column| !column.is_empty())
            .collect::<Vec<_>>();
        if key_columns.is_empty() {
            return Err(input_error(
                "No identification columns selected. Use --key to name at least one column.",
            ));
        }

        let common = common_columns(source_columns, target_columns);
        if common.is_empty() {
            return Err(input_error(
                "The selected sources have no common columns to compare.",
            ));
        }

        for key in &key_columns {
            if !common.contains(key) {
                return Err(input_error(format!(
                    "Identification column '{}' is not present in both sources",
                    key
                )));
            }
        }

        let mut compare_columns = if include.is_empty() {
            common.clone()
        } else {
            let mut selected = Vec::new();
            for column in include {
                if !common.contains(column) {
                    return Err(input_error(format!(
                        "Column '{}' is not present in both sources",
                        column
                    )));
                }
                if !selected.contains(column) {
                    selected.push(column.clone());
                }
            }
            selected
        };
        compare_columns.retain(|column| !exclude.contains(column));

        if compare_columns.is_empty() {
            return Err(input_error("No columns left to compare after filtering."));
        }

        Ok(Self {
            compare_columns,
            key_columns,
        })
    }

    /// Apply the duplicate-key policy to both sides.
    pub fn check_duplicates(
        &self,
        policy: DuplicateKeyPolicy,
        source_rows: &[Record],
        target_rows: &[Record],
    ) -> Result<()> {
        if matches!(policy, DuplicateKeyPolicy::LastWins) {
            return Ok(());
        }

        for (side, rows) in [("source", source_rows), ("target", target_rows)] {
            let duplicates = find_duplicate_keys(rows, &self.key_columns);
            if duplicates.is_empty() {
                continue;
            }
            let sample = duplicates
                .iter()
                .take(DUPLICATE_SAMPLE)
                .map(|dup| format!("{} (x{})", dup.key.trim_end_matches('|'), dup.occurrences))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(input_error(format!(
                "Identification key is not unique in {}: {} duplicate key(s), e.g. {}",
                side,
                duplicates.len(),
                sample
            )));
        }

        Ok(())
    }
}

fn input_error(message: impl Into<String>) -> anyhow::Error {
    AppError::new(ErrorKind::Input, message).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::model::Value;
    use crate::error::classify_error;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn row(id: i64) -> Record {
        Record::from([("id".to_string(), Value::Int(id))])
    }

    #[test]
    fn common_columns_keep_source_order() {
        let common = common_columns(&names(&["c", "a", "b"]), &names(&["b", "c", "z"]));
        assert_eq!(common, names(&["c", "b"]));
    }

    #[test]
    fn rejects_empty_key_list() {
        let err = ComparisonRequest::resolve(&names(&["id"]), &names(&["id"]), &[], &[], &[])
            .expect_err("no keys");
        assert_eq!(classify_error(&err), ErrorKind::Input);
        assert!(err.to_string().contains("No identification columns"));
    }

    #[test]
    fn rejects_disjoint_columns() {
        let err = ComparisonRequest::resolve(
            &names(&["id", "a"]),
            &names(&["key", "b"]),
            &names(&["id"]),
            &[],
            &[],
        )
        .expect_err("no common columns");
        assert!(err.to_string().contains("no common columns"));
    }

    #[test]
    fn keys_must_exist_on_both_sides() {
        let err = ComparisonRequest::resolve(
            &names(&["id", "v"]),
            &names(&["v"]),
            &names(&["id"]),
            &[],
            &[],
        )
        .expect_err("id missing on target");
        assert_eq!(classify_error(&err), ErrorKind::Input);
        assert!(err.to_string().contains("'id' is not present in both sources"));

        let err = ComparisonRequest::resolve(
            &names(&["v"]),
            &names(&["v", "id"]),
            &names(&["id"]),
            &[],
            &[],
        )
        .expect_err("id missing on source");
        assert!(err.to_string().contains("'id'"));
    }

    #[test]
    fn include_and_exclude_shape_the_compare_set() {
        let request = ComparisonRequest::resolve(
            &names(&["id", "a", "b", "c"]),
            &names(&["id", "a", "b", "c"]),
            &names(&["id"]),
            &names(&["id", "a", "b"]),
            &names(&["b"]),
        )
        .expect("request");
        assert_eq!(request.compare_columns, names(&["id", "a"]));
        assert_eq!(request.key_columns, names(&["id"]));
    }

    #[test]
    fn include_must_name_common_columns() {
        let err = ComparisonRequest::resolve(
            &names(&["id", "a"]),
            &names(&["id"]),
            &names(&["id"]),
            &names(&["a"]),
            &[],
        )
        .expect_err("a missing on target");
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn finds_duplicate_keys() {
        let rows = vec![row(1), row(2), row(1), row(1), row(3), row(2)];
        let dups = find_duplicate_keys(&rows, &names(&["id"]));
        assert_eq!(
            dups,
            vec![
                DuplicateKey {
                    key: "1|".to_string(),
                    occurrences: 3
                },
                DuplicateKey {
                    key: "2|".to_string(),
                    occurrences: 2
                },
            ]
        );
    }

    #[test]
    fn reject_policy_fails_on_duplicates() {
        let request = ComparisonRequest {
            compare_columns: names(&["id"]),
            key_columns: names(&["id"]),
        };
        let rows = vec![row(1), row(1)];
        request
            .check_duplicates(DuplicateKeyPolicy::LastWins, &rows, &[])
            .expect("last wins tolerates duplicates");
        let err = request
            .check_duplicates(DuplicateKeyPolicy::Reject, &[], &rows)
            .expect_err("reject");
        assert!(err.to_string().contains("not unique in target"));
        assert!(err.to_string().contains("1 (x2)"));
    }
}
