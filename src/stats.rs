//! Numeric summary aggregates for the report's Summary Stats section.
//!
//! Columns recognized as numeric in the source table are profiled on both
//! sides independently, over the raw (non-normalized) cell values. A side
//! whose column turns out to hold mixed types fails in isolation: its cells
//! render blank while the rest of the report is unaffected.

use anyhow::{Result, bail};
use serde::Serialize;

use crate::{
    data::{self, Table},
    normalize::NULL_TOKENS,
    reconcile::ColumnMap,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    /// `None` when aggregation failed for that side (mixed types) or the
    /// side held no numeric values; rendered as blank cells.
    pub source: Option<Aggregate>,
    pub target: Option<Aggregate>,
}

/// Profiles every common column that looks numeric in the source table.
pub fn numeric_summaries(source: &Table, target: &Table, map: &ColumnMap) -> Vec<ColumnSummary> {
    let mut summaries = Vec::new();
    for column in &map.common {
        let Some(source_idx) = source.column_index(column) else {
            continue;
        };
        if !is_numeric_column(source, source_idx) {
            continue;
        }
        let target_idx = target.column_index(map.target_name(column));
        summaries.push(ColumnSummary {
            column: column.clone(),
            source: aggregate(source.column_values(source_idx)).ok(),
            target: target_idx.and_then(|idx| aggregate(target.column_values(idx)).ok()),
        });
    }
    summaries
}

/// A column is numeric when it has at least one parseable value and every
/// cell either parses as a number or is null-equivalent.
fn is_numeric_column(table: &Table, column: usize) -> bool {
    let mut seen_number = false;
    for cell in table.column_values(column) {
        if data::parse_number(cell).is_some() {
            seen_number = true;
        } else if !is_null_equivalent(cell) {
            return false;
        }
    }
    seen_number
}

fn is_null_equivalent(cell: &str) -> bool {
    NULL_TOKENS.contains(&cell.trim().to_lowercase().as_str())
}

/// Aggregates one side of a column. Fails on a non-null cell that does not
/// parse; the caller maps that failure to blank output cells.
fn aggregate<'a>(values: impl Iterator<Item = &'a str>) -> Result<Aggregate> {
    let mut count = 0usize;
    let mut sum = 0.0f64;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for cell in values {
        if is_null_equivalent(cell) {
            continue;
        }
        let Some(number) = data::parse_number(cell) else {
            bail!("Non-numeric value {cell:?} in numeric column");
        };
        count += 1;
        sum += number;
        min = min.min(number);
        max = max.max(number);
    }
    if count == 0 {
        bail!("No numeric values to aggregate");
    }
    Ok(Aggregate {
        count,
        sum,
        mean: sum / count as f64,
        min,
        max,
    })
}
