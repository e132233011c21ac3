//! XLSX workbook export of an assembled report.
//!
//! One worksheet per report section, header rows styled and frozen. Cells
//! carry the report's already-formatted strings except for the Summary
//! Stats sheet, whose aggregates are written as real numbers so they stay
//! usable in the spreadsheet.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use log::info;
use rust_xlsxwriter::{Color, Format, Workbook};

use crate::report::Report;

const HEADER_FILL: Color = Color::RGB(0xD9E1F2);
const MIN_COLUMN_WIDTH: f64 = 10.0;
const MAX_COLUMN_WIDTH: f64 = 50.0;

/// A directory argument gets a timestamped default file name inside it;
/// anything else is used verbatim.
pub fn resolve_report_path(requested: &Path) -> PathBuf {
    if requested.is_dir() {
        requested.join(format!(
            "comparison_report_{}.xlsx",
            Local::now().format("%H%M%S")
        ))
    } else {
        requested.to_path_buf()
    }
}

pub fn write_workbook(report: &Report, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    let mut summary_rows: Vec<Vec<String>> = report
        .summary
        .metric_rows()
        .into_iter()
        .map(|(metric, value)| vec![metric, value])
        .collect();
    summary_rows.push(vec![
        "Report Generated".to_string(),
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    ]);
    add_sheet(
        &mut workbook,
        "Executive Summary",
        &["Metric", "Value"],
        &summary_rows,
    )?;

    if !report.summary.mismatches.is_empty() {
        let matched = report.summary.matched_pairs;
        let rows: Vec<Vec<String>> = report
            .summary
            .mismatches
            .iter()
            .map(|m| {
                let percent = m.count as f64 / matched as f64 * 100.0;
                vec![
                    m.column.clone(),
                    m.count.to_string(),
                    format!("{percent:.2}%"),
                ]
            })
            .collect();
        add_sheet(
            &mut workbook,
            "Mismatch Contributors",
            &["Column", "Mismatched Pairs", "% of Matched"],
            &rows,
        )?;
    }

    if let Some(presence) = &report.column_presence {
        let rows: Vec<Vec<String>> = presence
            .iter()
            .map(|p| {
                vec![
                    p.column.clone(),
                    p.in_source.to_string(),
                    p.in_target.to_string(),
                ]
            })
            .collect();
        add_sheet(
            &mut workbook,
            "Column Names",
            &["Column", "In Source", "In Target"],
            &rows,
        )?;
    }

    if let Some(sheet) = &report.rows {
        let headers: Vec<&str> = sheet.headers.iter().map(String::as_str).collect();
        add_sheet(&mut workbook, "Row Comparison", &headers, &sheet.rows)?;
    }

    if let Some(unique) = &report.unique_values {
        let rows: Vec<Vec<String>> = unique
            .iter()
            .map(|u| vec![u.column.clone(), u.side.to_string(), u.value.clone()])
            .collect();
        add_sheet(
            &mut workbook,
            "Unique Values",
            &["Key Column", "Side", "Value"],
            &rows,
        )?;
    }

    if !report.key_samples.is_empty() {
        let mut rows = Vec::new();
        for sample in &report.key_samples {
            for value in &sample.source_values {
                rows.push(vec![
                    sample.column.clone(),
                    "source".to_string(),
                    value.clone(),
                ]);
            }
            for value in &sample.target_values {
                rows.push(vec![
                    sample.column.clone(),
                    "target".to_string(),
                    value.clone(),
                ]);
            }
        }
        add_sheet(
            &mut workbook,
            "Key Samples",
            &["Key Column", "Side", "Sample Value"],
            &rows,
        )?;
    }

    if let Some(stats) = &report.stats {
        let worksheet = workbook.add_worksheet().set_name("Summary Stats")?;
        let header_format = header_format();
        let headers = ["Column", "Side", "Count", "Sum", "Mean", "Min", "Max"];
        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }
        let mut row: u32 = 1;
        for summary in stats {
            for (side, aggregate) in [("source", &summary.source), ("target", &summary.target)] {
                worksheet.write_string(row, 0, summary.column.as_str())?;
                worksheet.write_string(row, 1, side)?;
                if let Some(agg) = aggregate {
                    worksheet.write_number(row, 2, agg.count as f64)?;
                    worksheet.write_number(row, 3, agg.sum)?;
                    worksheet.write_number(row, 4, agg.mean)?;
                    worksheet.write_number(row, 5, agg.min)?;
                    worksheet.write_number(row, 6, agg.max)?;
                }
                row += 1;
            }
        }
        worksheet.set_freeze_panes(1, 0)?;
        for col in 0..headers.len() {
            worksheet.set_column_width(col as u16, 14.0)?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Writing report workbook to {path:?}"))?;
    info!("Report workbook written to {}", path.display());
    Ok(())
}

fn header_format() -> Format {
    Format::new().set_bold().set_background_color(HEADER_FILL)
}

fn add_sheet(
    workbook: &mut Workbook,
    name: &str,
    headers: &[&str],
    rows: &[Vec<String>],
) -> Result<()> {
    let worksheet = workbook.add_worksheet().set_name(name)?;
    let format = header_format();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &format)?;
    }
    for (row_idx, row) in rows.iter().enumerate() {
        for (col, cell) in row.iter().enumerate().take(headers.len()) {
            widths[col] = widths[col].max(cell.chars().count());
            worksheet.write_string(row_idx as u32 + 1, col as u16, cell.as_str())?;
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    for (col, width) in widths.iter().enumerate() {
        let width = (*width as f64 + 2.0).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        worksheet.set_column_width(col as u16, width)?;
    }
    Ok(())
}
