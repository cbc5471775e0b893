use std::io::Write;
use std::path::Path;

use anyhow::Result;

use crate::compare::ComparisonResult;
use crate::error::{AppError, ErrorKind};

/// Header row: status, key columns, then source/target/match per value column.
pub fn comparison_headers(result: &ComparisonResult) -> Vec<String> {
    let mut headers = vec!["Status".to_string()];
    headers.extend(result.key_columns.iter().map(|key| format!("{} (PK)", key)));
    for column in result.value_columns() {
        headers.push(format!("{} (Source)", column));
        headers.push(format!("{} (Target)", column));
        headers.push(format!("{} (Match)", column));
    }
    headers
}

/// Write the comparison as CSV with every field quoted.
pub fn write_comparison<W: Write>(result: &ComparisonResult, out: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(out);
    writer.write_record(comparison_headers(result))?;

    let positions = result.value_positions();
    for row in &result.rows {
        let mut record = vec![row.status.label().to_string()];
        record.extend(row.key_values.iter().map(|value| value.as_report()));
        for cell in row.value_cells(&positions) {
            match cell {
                Some(cell) => {
                    record.push(cell.source.as_report());
                    record.push(cell.target.as_report());
                    record.push(if cell.matched { "Yes" } else { "No" }.to_string());
                }
                None => record.extend(["null".to_string(), "null".to_string(), "No".to_string()]),
            }
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_comparison(result: &ComparisonResult, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|err| {
        AppError::new(
            ErrorKind::Export,
            format!("Cannot write {}: {}", path.display(), err),
        )
    })?;
    write_comparison(result, file).map_err(|err| {
        AppError::new(
            ErrorKind::Export,
            format!("Failed to write CSV {}: {}", path.display(), err),
        )
    })?;
    tracing::info!(path = %path.display(), rows = result.rows.len(), "wrote csv report");
    Ok(())
}
