use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use crate::compare::ComparisonResult;
use crate::error::{AppError, ErrorKind};

const STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 20px; }
h1 { color: #2c3e50; }
.summary { margin: 20px 0; padding: 10px; background-color: #f5f7fa; border-radius: 5px; }
table { border-collapse: collapse; width: 100%; margin-top: 20px; }
th { background-color: #34495e; color: white; padding: 10px; text-align: left; }
td { padding: 8px; border: 1px solid #ddd; }
.matched { background-color: #c8e6c9; }
.mismatched { background-color: #ffcdd2; }
.source-only { background-color: #e1bee7; }
.target-only { background-color: #bbdefb; }
";

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Standalone HTML document for the comparison.
pub fn render_comparison_html(result: &ComparisonResult) -> String {
    let title = escape_html(&result.table_name);
    let summary = &result.summary;
    let value_columns = result.value_columns();
    let positions = result.value_positions();
    let mut html = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(html, "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">");
    let _ = writeln!(html, "<title>Data Comparison: {}</title>", title);
    let _ = writeln!(html, "<style>\n{}</style>\n</head>\n<body>", STYLE);
    let _ = writeln!(html, "<h1>Data Comparison: {}</h1>", title);
    let _ = writeln!(html, "<div class=\"summary\">");
    let _ = writeln!(
        html,
        "<p><strong>Source:</strong> {}</p>",
        escape_html(&result.source_label)
    );
    let _ = writeln!(
        html,
        "<p><strong>Target:</strong> {}</p>",
        escape_html(&result.target_label)
    );
    let _ = writeln!(
        html,
        "<p><strong>ID Columns:</strong> {}</p>",
        escape_html(&result.key_columns.join(", "))
    );
    let _ = writeln!(
        html,
        "<p><strong>Total Rows:</strong> {} | <strong>Matched:</strong> {} | <strong>Mismatched:</strong> {} | <strong>Source Only:</strong> {} | <strong>Target Only:</strong> {}</p>",
        summary.total_rows(),
        summary.matched(),
        summary.mismatched(),
        summary.source_only(),
        summary.target_only()
    );
    let _ = writeln!(html, "</div>");

    let _ = writeln!(html, "<table>\n<thead>\n<tr>\n<th>Status</th>");
    for key in &result.key_columns {
        let _ = writeln!(html, "<th>{} (PK)</th>", escape_html(key));
    }
    for column in &value_columns {
        let column = escape_html(column);
        let _ = writeln!(html, "<th>{} (S)</th>\n<th>{} (T)</th>", column, column);
    }
    let _ = writeln!(html, "</tr>\n</thead>\n<tbody>");

    for row in &result.rows {
        let _ = writeln!(html, "<tr class=\"{}\">", row.status.css_class());
        let _ = writeln!(html, "<td>{}</td>", row.status.label());
        for value in &row.key_values {
            let _ = writeln!(html, "<td>{}</td>", escape_html(&value.as_report()));
        }
        for cell in row.value_cells(&positions) {
            match cell {
                Some(cell) => {
                    let class = if cell.matched { "matched" } else { "mismatched" };
                    let _ = writeln!(
                        html,
                        "<td class=\"{class}\">{}</td>\n<td class=\"{class}\">{}</td>",
                        escape_html(&cell.source.as_report()),
                        escape_html(&cell.target.as_report()),
                    );
                }
                None => {
                    let _ = writeln!(html, "<td></td><td></td>");
                }
            }
        }
        let _ = writeln!(html, "</tr>");
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

pub fn export_comparison(result: &ComparisonResult, path: &Path) -> Result<()> {
    std::fs::write(path, render_comparison_html(result)).map_err(|err| {
        AppError::new(
            ErrorKind::Export,
            format!("Failed to write HTML {}: {}", path.display(), err),
        )
    })?;
    tracing::info!(path = %path.display(), rows = result.rows.len(), "wrote html report");
    Ok(())
}
