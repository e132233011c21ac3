//! Dataset loading: CSV/TSV, JSON, and workbook formats into [`Table`].
//!
//! Loading is collaborator logic, not engine logic: the comparison engine
//! only ever sees fully materialized tables. Format is chosen by file
//! extension. Workbook inputs honor an explicit sheet name; otherwise the
//! sheet with the most rows wins, which is the practical default when a
//! workbook carries a lone data sheet next to notes and pivot leftovers.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use calamine::{Data, Reader, Sheets, open_workbook_auto};
use chrono::{Duration, NaiveDate};
use log::debug;

use crate::{
    data::{self, Table},
    io_utils,
};

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Workbook sheet to read; ignored for delimited and JSON inputs.
    pub sheet: Option<String>,
    /// 1-based row number of the header row; rows above it are discarded.
    pub header_row: usize,
    pub delimiter: Option<u8>,
    pub encoding: Option<String>,
}

impl LoadOptions {
    fn header_offset(&self) -> usize {
        self.header_row.saturating_sub(1)
    }
}

pub fn load_table(path: &Path, options: &LoadOptions) -> Result<Table> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string());
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let table = match extension.as_str() {
        "csv" | "tsv" | "txt" => load_delimited(path, name, options)?,
        "json" => load_json(path, name)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path, name, options)?,
        other => bail!(
            "Unsupported input format '.{other}' for {path:?}; expected csv, tsv, txt, json, xlsx, xlsm, xlsb, xls, or ods"
        ),
    };
    debug!(
        "Loaded '{}': {} column(s), {} row(s)",
        table.name,
        table.headers.len(),
        table.row_count()
    );
    Ok(table)
}

fn load_delimited(path: &Path, name: String, options: &LoadOptions) -> Result<Table> {
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    let encoding = io_utils::resolve_encoding(options.encoding.as_deref())?;
    let mut reader = io_utils::open_csv_reader(path, delimiter)?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for (record_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading record {}", record_idx + 1))?;
        if record_idx < options.header_offset() {
            continue;
        }
        let decoded = io_utils::decode_record(&record, encoding)?;
        if headers.is_none() {
            headers = Some(name_columns(decoded));
        } else {
            rows.push(decoded);
        }
    }

    let headers = headers
        .ok_or_else(|| anyhow!("No header row found in {path:?} (file too short or empty)"))?;
    Ok(Table::new(name, headers, rows))
}

fn load_json(path: &Path, name: String) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    let value: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Parsing JSON from {path:?}"))?;
    let serde_json::Value::Array(items) = value else {
        bail!("JSON input {path:?} must be a top-level array of objects");
    };

    // Two passes: first the union of keys in first-seen order, then rows
    // padded against that header set.
    let mut headers: Vec<String> = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        let serde_json::Value::Object(object) = item else {
            bail!("JSON record {} in {path:?} is not an object", idx + 1);
        };
        for key in object.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = items
        .iter()
        .map(|item| {
            let object = item.as_object().expect("validated above");
            headers
                .iter()
                .map(|key| object.get(key).map(json_cell).unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(Table::new(name, headers, rows))
}

fn json_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

fn load_workbook(path: &Path, name: String, options: &LoadOptions) -> Result<Table> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Opening workbook {path:?}"))?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        bail!("Workbook {path:?} contains no sheets");
    }

    let sheet = match &options.sheet {
        Some(requested) => {
            if !sheet_names.contains(requested) {
                bail!(
                    "Sheet '{requested}' not found in {path:?}; available sheets: {}",
                    sheet_names.join(", ")
                );
            }
            requested.clone()
        }
        None => pick_largest_sheet(&mut workbook, &sheet_names)?,
    };

    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("Reading sheet '{sheet}' from {path:?}"))?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for row in range.rows().skip(options.header_offset()) {
        let cells: Vec<String> = row.iter().map(workbook_cell).collect();
        if headers.is_none() {
            headers = Some(name_columns(cells));
        } else {
            rows.push(cells);
        }
    }
    let headers = headers.ok_or_else(|| {
        anyhow!("No header row found on sheet '{sheet}' of {path:?} (sheet too short or empty)")
    })?;

    let display = if sheet_names.len() > 1 {
        format!("{name}:{sheet}")
    } else {
        name
    };
    Ok(Table::new(display, headers, rows))
}

fn pick_largest_sheet(
    workbook: &mut Sheets<BufReader<File>>,
    sheet_names: &[String],
) -> Result<String> {
    let mut best: Option<(String, usize)> = None;
    for sheet in sheet_names {
        let range = workbook
            .worksheet_range(sheet)
            .with_context(|| format!("Reading sheet '{sheet}'"))?;
        let height = range.height();
        let replace = best.as_ref().is_none_or(|(_, rows)| height > *rows);
        if replace {
            best = Some((sheet.clone(), height));
        }
    }
    best.map(|(sheet, _)| sheet)
        .ok_or_else(|| anyhow!("Workbook contains no readable sheets"))
}

fn workbook_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => data::format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#{e:?}"),
        Data::DateTime(dt) => excel_serial_to_string(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Converts an Excel serial date (1900 system, epoch 1899-12-30) into a
/// date or datetime string. Falls back to the raw serial on out-of-range
/// values rather than failing the load.
fn excel_serial_to_string(serial: f64) -> String {
    let days = serial.floor();
    let seconds = ((serial - days) * 86_400.0).round() as u32;
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.checked_add_signed(Duration::days(days as i64)));
    match date {
        Some(date) if seconds == 0 => date.format("%Y-%m-%d").to_string(),
        Some(date) => {
            let seconds = seconds.min(86_399);
            match date.and_hms_opt(seconds / 3600, seconds % 3600 / 60, seconds % 60) {
                Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => data::format_number(serial),
            }
        }
        None => data::format_number(serial),
    }
}

fn name_columns(cells: Vec<String>) -> Vec<String> {
    cells
        .into_iter()
        .enumerate()
        .map(|(idx, cell)| {
            if cell.trim().is_empty() {
                format!("column_{}", idx + 1)
            } else {
                cell
            }
        })
        .collect()
}
