use std::collections::HashMap;

use tracing::{debug, warn};

use super::model::{
    CellComparison, ComparisonResult, ComparisonRow, ComparisonSummary, DuplicateCounts, Record,
    RowStatus, Value, value_of,
};

const KEY_SEPARATOR: char = '|';
const NULL_KEY_PART: &str = "NULL";

/// Composite key string for `record`: each key column's canonical value (or `NULL`)
/// followed by `|`, in key-column order.
pub fn composite_key(record: &Record, key_columns: &[String]) -> String {
    let mut key = String::new();
    for column in key_columns {
        match value_of(record, column).canonical() {
            Some(text) => key.push_str(&text),
            None => key.push_str(NULL_KEY_PART),
        }
        key.push(KEY_SEPARATOR);
    }
    key
}

/// Records of one side indexed by composite key. A later record with an existing
/// key replaces the earlier one but keeps its position.
struct KeyIndex<'a> {
    order: Vec<String>,
    rows: HashMap<String, &'a Record>,
    shadowed: usize,
}

impl<'a> KeyIndex<'a> {
    fn build(records: &'a [Record], key_columns: &[String]) -> Self {
        let mut order = Vec::with_capacity(records.len());
        let mut rows = HashMap::with_capacity(records.len());
        let mut shadowed = 0;

        for record in records {
            let key = composite_key(record, key_columns);
            if rows.insert(key.clone(), record).is_some() {
                shadowed += 1;
            } else {
                order.push(key);
            }
        }

        Self {
            order,
            rows,
            shadowed,
        }
    }

    fn get(&self, key: &str) -> Option<&'a Record> {
        self.rows.get(key).copied()
    }

    fn contains(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }
}

/// Compare two record sets keyed by `key_columns`, judging every column in
/// `compare_columns`. Never fails: absent columns compare as null.
pub fn compare(
    table_name: &str,
    source_label: &str,
    target_label: &str,
    source_rows: &[Record],
    target_rows: &[Record],
    compare_columns: &[String],
    key_columns: &[String],
) -> ComparisonResult {
    let source = KeyIndex::build(source_rows, key_columns);
    let target = KeyIndex::build(target_rows, key_columns);
    debug!(
        source_rows = source_rows.len(),
        target_rows = target_rows.len(),
        source_keys = source.order.len(),
        target_keys = target.order.len(),
        "indexed comparison inputs"
    );

    let duplicates = DuplicateCounts {
        source: source.shadowed,
        target: target.shadowed,
    };
    if duplicates.any() {
        warn!(
            source = duplicates.source,
            target = duplicates.target,
            "identification key is not unique; later rows replaced earlier ones"
        );
    }

    let keys = source
        .order
        .iter()
        .chain(target.order.iter().filter(|key| !source.contains(key)));

    let mut rows = Vec::with_capacity(source.order.len() + target.order.len());
    for key in keys {
        let row = match (source.get(key), target.get(key)) {
            (Some(left), Some(right)) => both_sides(key, left, right, compare_columns, key_columns),
            (Some(left), None) => one_side(key, left, RowStatus::SourceOnly, compare_columns, key_columns),
            (None, Some(right)) => one_side(key, right, RowStatus::TargetOnly, compare_columns, key_columns),
            (None, None) => continue,
        };
        rows.push(row);
    }

    let summary = ComparisonSummary::from_rows(&rows);
    debug!(
        total = summary.total_rows(),
        matched = summary.matched(),
        mismatched = summary.mismatched(),
        source_only = summary.source_only(),
        target_only = summary.target_only(),
        "comparison finished"
    );

    ComparisonResult {
        table_name: table_name.to_string(),
        source_label: source_label.to_string(),
        target_label: target_label.to_string(),
        compare_columns: compare_columns.to_vec(),
        key_columns: key_columns.to_vec(),
        rows,
        summary,
        duplicates,
    }
}

fn key_values(record: &Record, key_columns: &[String]) -> Vec<Value> {
    key_columns
        .iter()
        .map(|column| value_of(record, column).clone())
        .collect()
}

fn both_sides(
    key: &str,
    source: &Record,
    target: &Record,
    compare_columns: &[String],
    key_columns: &[String],
) -> ComparisonRow {
    let cells = compare_columns
        .iter()
        .map(|column| {
            CellComparison::new(
                column.as_str(),
                value_of(source, column).clone(),
                value_of(target, column).clone(),
            )
        })
        .collect::<Vec<_>>();
    let status = if cells.iter().all(|cell| cell.matched) {
        RowStatus::Matched
    } else {
        RowStatus::Mismatched
    };

    ComparisonRow {
        key: key.to_string(),
        key_values: key_values(source, key_columns),
        status,
        cells,
    }
}

fn one_side(
    key: &str,
    record: &Record,
    status: RowStatus,
    compare_columns: &[String],
    key_columns: &[String],
) -> ComparisonRow {
    let cells = compare_columns
        .iter()
        .map(|column| {
            let present = value_of(record, column).clone();
            match status {
                RowStatus::TargetOnly => CellComparison::new(column.as_str(), Value::Null, present),
                _ => CellComparison::new(column.as_str(), present, Value::Null),
            }
        })
        .collect();

    ComparisonRow {
        key: key.to_string(),
        key_values: key_values(record, key_columns),
        status,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn text(value: &str) -> Value {
        Value::Text(value.to_string())
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn run(source: &[Record], target: &[Record], compare_cols: &[&str], keys: &[&str]) -> ComparisonResult {
        compare("t", "src", "tgt", source, target, &cols(compare_cols), &cols(keys))
    }

    fn assert_totals(result: &ComparisonResult) {
        let s = &result.summary;
        assert_eq!(
            s.total_rows(),
            s.matched() + s.mismatched() + s.source_only() + s.target_only()
        );
        assert_eq!(s.total_rows(), result.rows.len());
    }

    #[test]
    fn builds_composite_key_with_null_sentinel() {
        let row = record(&[("a", Value::Int(7)), ("b", Value::Null)]);
        assert_eq!(composite_key(&row, &cols(&["a", "b", "c"])), "7|NULL|NULL|");
    }

    #[test]
    fn classifies_matched_and_mismatched_rows() {
        let source = vec![
            record(&[("id", Value::Int(1)), ("name", text("A"))]),
            record(&[("id", Value::Int(2)), ("name", text("B"))]),
        ];
        let target = vec![
            record(&[("id", Value::Int(1)), ("name", text("A"))]),
            record(&[("id", Value::Int(2)), ("name", text("X"))]),
        ];
        let result = run(&source, &target, &["name"], &["id"]);

        assert_eq!(result.row("1|").expect("row 1").status, RowStatus::Matched);
        let row2 = result.row("2|").expect("row 2");
        assert_eq!(row2.status, RowStatus::Mismatched);
        let cell = row2.cell("name").expect("name cell");
        assert_eq!(cell.source, text("B"));
        assert_eq!(cell.target, text("X"));
        assert!(!cell.matched);

        assert_eq!(result.summary.total_rows(), 2);
        assert_eq!(result.summary.matched(), 1);
        assert_eq!(result.summary.mismatched(), 1);
        assert_eq!(result.summary.source_only(), 0);
        assert_eq!(result.summary.target_only(), 0);
        assert_totals(&result);
    }

    #[test]
    fn source_only_row_compares_against_null() {
        let source = vec![record(&[("id", Value::Int(1)), ("v", text("A"))])];
        let result = run(&source, &[], &["v"], &["id"]);

        assert_eq!(result.rows.len(), 1);
        let row = &result.rows[0];
        assert_eq!(row.status, RowStatus::SourceOnly);
        assert_eq!(row.key_values, vec![Value::Int(1)]);
        let cell = row.cell("v").expect("cell");
        assert_eq!(cell.source, text("A"));
        assert!(cell.target.is_null());
        assert!(!cell.matched);
        assert_eq!(result.summary.source_only(), 1);
        assert_totals(&result);
    }

    #[test]
    fn both_null_values_match() {
        let source = vec![record(&[("id", Value::Int(1)), ("v", Value::Null)])];
        let target = vec![record(&[("id", Value::Int(1)), ("v", Value::Null)])];
        let result = run(&source, &target, &["v"], &["id"]);
        assert_eq!(result.rows[0].status, RowStatus::Matched);
        assert_eq!(result.summary.matched(), 1);
    }

    #[test]
    fn one_sided_null_in_present_value_still_matches_cell() {
        let target = vec![record(&[("id", Value::Int(9)), ("v", Value::Null)])];
        let result = run(&[], &target, &["v"], &["id"]);
        let row = &result.rows[0];
        assert_eq!(row.status, RowStatus::TargetOnly);
        assert!(row.cell("v").expect("cell").matched);
    }

    #[test]
    fn duplicate_keys_keep_last_record() {
        let source = vec![
            record(&[("id", Value::Int(1)), ("v", text("A"))]),
            record(&[("id", Value::Int(1)), ("v", text("B"))]),
        ];
        let target = vec![record(&[("id", Value::Int(1)), ("v", text("B"))])];
        let result = run(&source, &target, &["v"], &["id"]);

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].status, RowStatus::Matched);
        assert_eq!(result.rows[0].cell("v").expect("cell").source, text("B"));
        assert_eq!(result.duplicates.source, 1);
        assert_eq!(result.duplicates.target, 0);
    }

    #[test]
    fn empty_compare_columns_match_vacuously() {
        let source = vec![record(&[("id", Value::Int(1)), ("v", text("A"))])];
        let target = vec![record(&[("id", Value::Int(1)), ("v", text("Z"))])];
        let result = run(&source, &target, &[], &["id"]);
        assert_eq!(result.rows[0].status, RowStatus::Matched);
        assert!(result.rows[0].cells.is_empty());
    }

    #[test]
    fn empty_key_collapses_rows() {
        let source = vec![
            record(&[("v", text("A"))]),
            record(&[("v", text("B"))]),
        ];
        let target = vec![record(&[("v", text("B"))])];
        let result = run(&source, &target, &["v"], &[]);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].key, "");
        assert_eq!(result.rows[0].status, RowStatus::Matched);
    }

    #[test]
    fn missing_compare_column_degrades_to_null() {
        let source = vec![record(&[("id", Value::Int(1)), ("v", text("A"))])];
        let target = vec![record(&[("id", Value::Int(1))])];
        let result = run(&source, &target, &["v"], &["id"]);
        let cell = result.rows[0].cell("v").expect("cell");
        assert!(cell.target.is_null());
        assert_eq!(result.rows[0].status, RowStatus::Mismatched);
    }

    #[test]
    fn composite_keys_correlate_across_types() {
        let source = vec![record(&[
            ("region", text("eu")),
            ("id", Value::Int(5)),
            ("v", Value::Float(2.5)),
        ])];
        let target = vec![record(&[
            ("region", text("eu")),
            ("id", text("5")),
            ("v", text("2.5")),
        ])];
        let result = run(&source, &target, &["v"], &["region", "id"]);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].key, "eu|5|");
        assert_eq!(result.rows[0].status, RowStatus::Matched);
    }

    #[test]
    fn integral_float_keys_do_not_correlate_with_integers() {
        let source = vec![record(&[("id", Value::Float(20.0)), ("v", text("a"))])];
        let target = vec![record(&[("id", Value::Int(20)), ("v", text("a"))])];
        let result = run(&source, &target, &["v"], &["id"]);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].key, "20.0|");
        assert_eq!(result.rows[0].status, RowStatus::SourceOnly);
        assert_eq!(result.rows[1].status, RowStatus::TargetOnly);
    }

    fn mixed_inputs() -> (Vec<Record>, Vec<Record>) {
        let source = vec![
            record(&[("id", Value::Int(1)), ("v", text("a"))]),
            record(&[("id", Value::Int(2)), ("v", text("b"))]),
            record(&[("id", Value::Int(3)), ("v", text("c"))]),
            record(&[("id", Value::Int(4)), ("v", Value::Null)]),
        ];
        let target = vec![
            record(&[("id", Value::Int(2)), ("v", text("b"))]),
            record(&[("id", Value::Int(3)), ("v", text("changed"))]),
            record(&[("id", Value::Int(5)), ("v", text("e"))]),
            record(&[("id", Value::Int(6)), ("v", text("f"))]),
        ];
        (source, target)
    }

    #[test]
    fn one_row_per_distinct_key() {
        let (source, target) = mixed_inputs();
        let result = run(&source, &target, &["v"], &["id"]);
        assert_eq!(result.summary.total_rows(), 6);
        assert_eq!(result.summary.matched(), 1);
        assert_eq!(result.summary.mismatched(), 1);
        assert_eq!(result.summary.source_only(), 2);
        assert_eq!(result.summary.target_only(), 2);
        assert_totals(&result);

        let mut keys = result.rows.iter().map(|row| row.key.clone()).collect::<Vec<_>>();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), result.rows.len());
    }

    #[test]
    fn rerun_is_idempotent() {
        let (source, target) = mixed_inputs();
        let first = run(&source, &target, &["v"], &["id"]);
        let second = run(&source, &target, &["v"], &["id"]);
        assert_eq!(first.summary, second.summary);
        for row in &first.rows {
            let other = second.row(&row.key).expect("same key");
            assert_eq!(row.status, other.status);
        }
    }

    #[test]
    fn swapping_sides_swaps_only_statuses_and_values() {
        let (source, target) = mixed_inputs();
        let forward = run(&source, &target, &["v"], &["id"]);
        let backward = run(&target, &source, &["v"], &["id"]);

        assert_eq!(forward.summary.source_only(), backward.summary.target_only());
        assert_eq!(forward.summary.target_only(), backward.summary.source_only());
        assert_eq!(forward.summary.matched(), backward.summary.matched());
        assert_eq!(forward.summary.mismatched(), backward.summary.mismatched());

        for row in &forward.rows {
            let mirrored = backward.row(&row.key).expect("mirrored row");
            let expected = match row.status {
                RowStatus::SourceOnly => RowStatus::TargetOnly,
                RowStatus::TargetOnly => RowStatus::SourceOnly,
                other => other,
            };
            assert_eq!(mirrored.status, expected);
            for cell in &row.cells {
                let other = mirrored.cell(&cell.column).expect("cell");
                assert_eq!(cell.source, other.target);
                assert_eq!(cell.target, other.source);
                assert_eq!(cell.matched, other.matched);
            }
        }
    }

    #[test]
    fn rows_follow_source_then_target_order() {
        let (source, target) = mixed_inputs();
        let result = run(&source, &target, &["v"], &["id"]);
        let keys = result.rows.iter().map(|row| row.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["1|", "2|", "3|", "4|", "5|", "6|"]);
    }
}
