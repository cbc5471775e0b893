use comfy_table::{Cell, Color, ContentArrangement, Table, presets};

use crate::compare::{ColumnStats, ColumnVerdict, ComparisonResult, ComparisonRow, RowStatus, Value};
use crate::config::OutputFormat;

const NULL_DISPLAY: &str = "—";
const ELLIPSIS: &str = "…";
const DEFAULT_MAX_CELL_WIDTH: usize = 40;
const DEFAULT_MAX_OUTPUT_CHARS: usize = 2_000_000;

#[derive(Debug, Clone)]
pub struct TableOptions {
    pub max_cell_width: usize,
    pub max_output_chars: usize,
    pub color: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            max_cell_width: DEFAULT_MAX_CELL_WIDTH,
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
            color: false,
        }
    }
}

/// Which parts of a comparison to print.
#[derive(Debug, Clone, Default)]
pub struct ComparisonView {
    pub only_diff: bool,
    pub limit: Option<usize>,
    pub summary_only: bool,
}

pub fn render_key_value_table(
    title: &str,
    rows: &[(String, String)],
    format: OutputFormat,
    options: &TableOptions,
) -> String {
    let mut table = new_table(format);
    table.set_header(vec![title.to_string(), "Value".to_string()]);

    for (key, value) in rows {
        let key = truncate_string(key, options.max_cell_width);
        let value = truncate_string(value, options.max_cell_width);
        table.add_row(vec![key, value]);
    }

    truncate_output(table.to_string(), options.max_output_chars)
}

/// Header, summary, column statistics and the row grid, separated by blank lines.
pub fn render_comparison(
    result: &ComparisonResult,
    stats: &[ColumnStats],
    format: OutputFormat,
    options: &TableOptions,
    view: &ComparisonView,
) -> String {
    let color = options.color && matches!(format, OutputFormat::Pretty);
    let mut sections = vec![
        render_header(result, format, options),
        render_summary(result, format, color),
    ];
    if !stats.is_empty() {
        sections.push(render_column_stats(stats, format, color));
    }
    if !view.summary_only {
        sections.push(render_grid(result, format, options, view, color));
    }
    truncate_output(sections.join("\n\n"), options.max_output_chars)
}

fn render_header(result: &ComparisonResult, format: OutputFormat, options: &TableOptions) -> String {
    let mut rows = vec![
        ("Table".to_string(), result.table_name.clone()),
        ("Source".to_string(), result.source_label.clone()),
        ("Target".to_string(), result.target_label.clone()),
        ("Key".to_string(), result.key_columns.join(", ")),
        (
            "Columns".to_string(),
            result.compare_columns.len().to_string(),
        ),
    ];
    if result.duplicates.any() {
        rows.push((
            "Duplicate keys".to_string(),
            format!(
                "source {}, target {} (last row wins)",
                result.duplicates.source, result.duplicates.target
            ),
        ));
    }
    render_key_value_table("Comparison", &rows, format, options)
}

fn render_summary(result: &ComparisonResult, format: OutputFormat, color: bool) -> String {
    let summary = &result.summary;
    let mut table = new_table(format);
    table.set_header(vec!["Status", "Rows"]);
    table.add_row(vec![Cell::new("Total"), Cell::new(summary.total_rows())]);
    for (status, count) in [
        (RowStatus::Matched, summary.matched()),
        (RowStatus::Mismatched, summary.mismatched()),
        (RowStatus::SourceOnly, summary.source_only()),
        (RowStatus::TargetOnly, summary.target_only()),
    ] {
        table.add_row(vec![
            status_cell(status, color),
            Cell::new(count),
        ]);
    }
    table.to_string()
}

fn render_column_stats(stats: &[ColumnStats], format: OutputFormat, color: bool) -> String {
    let mut table = new_table(format);
    table.set_header(vec!["Column", "Matches", "Mismatches", "Match %", "Verdict"]);
    for entry in stats {
        let verdict = entry.verdict();
        let mut verdict_cell = Cell::new(verdict.as_str());
        if color {
            verdict_cell = verdict_cell.fg(match verdict {
                ColumnVerdict::AllMatch => Color::Green,
                ColumnVerdict::AllDiffer => Color::Red,
                ColumnVerdict::Partial => Color::Yellow,
                ColumnVerdict::NoData => Color::DarkGrey,
            });
        }
        table.add_row(vec![
            Cell::new(&entry.column),
            Cell::new(entry.matches),
            Cell::new(entry.mismatches),
            Cell::new(format!("{}%", entry.match_percentage())),
            verdict_cell,
        ]);
    }
    table.to_string()
}

fn render_grid(
    result: &ComparisonResult,
    format: OutputFormat,
    options: &TableOptions,
    view: &ComparisonView,
    color: bool,
) -> String {
    let value_columns = result.value_columns();
    let positions = result.value_positions();
    let mut table = new_table(format);
    let mut header = vec!["Status".to_string()];
    header.extend(result.key_columns.iter().map(|key| format!("{} (PK)", key)));
    header.extend(value_columns.iter().map(|col| col.to_string()));
    table.set_header(header);

    let visible: Vec<&ComparisonRow> = result
        .rows
        .iter()
        .filter(|row| !view.only_diff || row.status != RowStatus::Matched)
        .collect();
    let shown = view.limit.unwrap_or(visible.len()).min(visible.len());

    for row in visible.iter().take(shown) {
        let mut cells = vec![status_cell(row.status, color)];
        cells.extend(
            row.key_values
                .iter()
                .map(|value| Cell::new(format_cell(value, options.max_cell_width))),
        );
        for cell in row.value_cells(&positions) {
            let Some(cell) = cell else {
                cells.push(Cell::new(NULL_DISPLAY));
                continue;
            };
            let text = format!(
                "S: {} / T: {}",
                format_cell(&cell.source, options.max_cell_width),
                format_cell(&cell.target, options.max_cell_width)
            );
            let mut rendered = Cell::new(text);
            if color && row.status.on_both_sides() {
                rendered = rendered.fg(if cell.matched { Color::Green } else { Color::Red });
            }
            cells.push(rendered);
        }
        table.add_row(cells);
    }

    let mut output = if shown == 0 {
        "No rows to show.".to_string()
    } else {
        table.to_string()
    };
    if shown < visible.len() {
        output.push('\n');
        output.push_str(&format!(
            "Showing {} of {} rows (raise --limit to see more)",
            shown,
            visible.len()
        ));
    }
    output
}

fn new_table(format: OutputFormat) -> Table {
    let mut table = Table::new();
    match format {
        OutputFormat::Markdown => {
            table.load_preset(presets::ASCII_MARKDOWN);
        }
        _ => {
            table.load_preset(presets::UTF8_FULL);
        }
    }
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn status_cell(status: RowStatus, color: bool) -> Cell {
    let cell = Cell::new(status.label());
    if !color {
        return cell;
    }
    cell.fg(match status {
        RowStatus::Matched => Color::Green,
        RowStatus::Mismatched => Color::Red,
        RowStatus::SourceOnly => Color::Yellow,
        RowStatus::TargetOnly => Color::Cyan,
    })
}

fn format_cell(value: &Value, max_cell_width: usize) -> String {
    let raw = match value {
        Value::Null => NULL_DISPLAY.to_string(),
        _ => value.as_report(),
    };
    truncate_string(&raw, max_cell_width)
}

fn truncate_string(input: &str, max_len: usize) -> String {
    let len = input.chars().count();
    if len <= max_len {
        return input.to_string();
    }
    if max_len <= 1 {
        return ELLIPSIS.to_string();
    }
    let truncated: String = input.chars().take(max_len - 1).collect();
    format!("{}{}", truncated, ELLIPSIS)
}

fn truncate_output(output: String, max_len: usize) -> String {
    if output.len() <= max_len {
        return output;
    }
    let mut truncated = output.chars().take(max_len).collect::<String>();
    truncated.push_str("\n[output truncated]");
    truncated
}
