use std::path::Path;

use anyhow::Result;
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};

use crate::compare::ComparisonResult;
use crate::error::{AppError, ErrorKind};

const SHEET_NAME: &str = "Comparison";
const HEADER_GREY: u32 = 0xD9D9D9;
const MATCH_GREEN: u32 = 0xCCFFCC;
const MISMATCH_ORANGE: u32 = 0xFFCC99;

/// Build the workbook: title, source, target, summary, then the row grid with
/// a styled header and colored match cells.
pub fn build_workbook(result: &ComparisonResult) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet().set_name(SHEET_NAME)?;
    write_sheet(worksheet, result)?;
    Ok(workbook)
}

fn write_sheet(worksheet: &mut Worksheet, result: &ComparisonResult) -> Result<(), XlsxError> {
    let header = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(HEADER_GREY));
    let matched = Format::new().set_background_color(Color::RGB(MATCH_GREEN));
    let mismatched = Format::new().set_background_color(Color::RGB(MISMATCH_ORANGE));
    let summary = &result.summary;

    worksheet.write_string(0, 0, format!("Data Comparison: {}", result.table_name))?;
    worksheet.write_string(1, 0, format!("Source: {}", result.source_label))?;
    worksheet.write_string(2, 0, format!("Target: {}", result.target_label))?;

    let summary_cells = [
        format!("Total Rows: {}", summary.total_rows()),
        format!("Matched: {}", summary.matched()),
        format!("Mismatched: {}", summary.mismatched()),
        format!("Source Only: {}", summary.source_only()),
        format!("Target Only: {}", summary.target_only()),
    ];
    for (col, text) in summary_cells.iter().enumerate() {
        worksheet.write_string(4, col as u16, text)?;
    }

    let value_columns = result.value_columns();
    let positions = result.value_positions();
    let header_row = 6;
    let mut col: u16 = 0;
    worksheet.write_string_with_format(header_row, col, "Status", &header)?;
    col += 1;
    for key in &result.key_columns {
        worksheet.write_string_with_format(header_row, col, format!("{} (PK)", key), &header)?;
        col += 1;
    }
    for column in &value_columns {
        for suffix in ["Source", "Target", "Match"] {
            worksheet.write_string_with_format(
                header_row,
                col,
                format!("{} ({})", column, suffix),
                &header,
            )?;
            col += 1;
        }
    }

    for (idx, row) in result.rows.iter().enumerate() {
        let excel_row = header_row + 1 + idx as u32;
        let mut col: u16 = 0;
        worksheet.write_string(excel_row, col, row.status.label())?;
        col += 1;
        for value in &row.key_values {
            worksheet.write_string(excel_row, col, value.as_report())?;
            col += 1;
        }
        for cell in row.value_cells(&positions) {
            if let Some(cell) = cell {
                worksheet.write_string(excel_row, col, cell.source.as_report())?;
                worksheet.write_string(excel_row, col + 1, cell.target.as_report())?;
                let (text, format) = if cell.matched {
                    ("✓", &matched)
                } else {
                    ("✗", &mismatched)
                };
                worksheet.write_string_with_format(excel_row, col + 2, text, format)?;
            }
            col += 3;
        }
    }

    worksheet.autofit();
    Ok(())
}

pub fn export_comparison(result: &ComparisonResult, path: &Path) -> Result<()> {
    let export_error = |err: XlsxError| {
        AppError::new(
            ErrorKind::Export,
            format!("Failed to write XLSX {}: {}", path.display(), err),
        )
    };
    let mut workbook = build_workbook(result).map_err(export_error)?;
    workbook.save(path).map_err(export_error)?;
    tracing::info!(path = %path.display(), rows = result.rows.len(), "wrote xlsx report");
    Ok(())
}
