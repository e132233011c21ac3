//! Report assembly: reshapes an already-computed comparison into named
//! sections for console rendering and workbook export.
//!
//! This module performs no matching. It re-projects retained row ordinals
//! against the untouched tables, so every cell in the row sheet shows the
//! original, un-normalized value. The executive summary is always present;
//! the remaining sections honor the caller's toggles.

use std::collections::BTreeSet;

use anyhow::Result;
use serde::Serialize;

use crate::{
    data::Table,
    diagnose::{ColumnMismatch, DiagnosisTier, DropOneHint, KeySample},
    matcher::{self, MatchPartition},
    normalize::{NormalizeOptions, normalize_cell},
    reconcile::{self, ColumnMap},
    stats::{self, ColumnSummary},
};

/// Cap on exclusive values listed per key column in the Unique Values
/// section; keeps the sheet bounded on very divergent inputs.
pub const UNIQUE_VALUE_CAP: usize = 50;

pub const STATUS_ONLY_SOURCE: &str = "only_source";
pub const STATUS_ONLY_TARGET: &str = "only_target";
pub const STATUS_MATCHED: &str = "matched";

#[derive(Debug, Clone, Copy)]
pub struct SectionToggles {
    pub rows: bool,
    pub columns: bool,
    pub unique_values: bool,
    pub stats: bool,
    /// Include matched rows in the row sheet, not just unmatched ones.
    pub include_matched: bool,
}

impl Default for SectionToggles {
    fn default() -> Self {
        Self {
            rows: true,
            columns: true,
            unique_values: true,
            stats: true,
            include_matched: false,
        }
    }
}

/// Machine-readable executive summary; also the source of the key/value
/// rows on the summary sheet.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub source: String,
    pub target: String,
    pub source_rows: usize,
    pub target_rows: usize,
    pub matched_pairs: usize,
    pub only_source: usize,
    pub only_target: usize,
    pub match_percent: f64,
    pub diagnosis: DiagnosisTier,
    pub key_columns: Vec<String>,
    pub case_insensitive_columns: bool,
    pub case_insensitive_data: bool,
    pub trim_whitespace: bool,
    pub mismatches: Vec<ColumnMismatch>,
    pub drop_one_hint: Option<DropOneHint>,
}

impl Summary {
    pub fn metric_rows(&self) -> Vec<(String, String)> {
        let mut rows = vec![
            ("Source File".to_string(), self.source.clone()),
            ("Target File".to_string(), self.target.clone()),
            ("Source Rows".to_string(), self.source_rows.to_string()),
            ("Target Rows".to_string(), self.target_rows.to_string()),
            ("Matched Pairs".to_string(), self.matched_pairs.to_string()),
            ("Only in Source".to_string(), self.only_source.to_string()),
            ("Only in Target".to_string(), self.only_target.to_string()),
            (
                "Match %".to_string(),
                format!("{:.2}%", self.match_percent),
            ),
            ("Diagnosis".to_string(), self.diagnosis.label().to_string()),
        ];
        if let Some(hint) = &self.drop_one_hint {
            rows.push((
                "Drop-One Hint".to_string(),
                format!(
                    "Ignoring key column '{}' would raise the match to {:.2}%",
                    hint.column, hint.match_percent
                ),
            ));
        }
        rows.push(("Key Columns".to_string(), self.key_columns.join(", ")));
        rows.push((
            "Case-Insensitive Columns".to_string(),
            self.case_insensitive_columns.to_string(),
        ));
        rows.push((
            "Case-Insensitive Data".to_string(),
            self.case_insensitive_data.to_string(),
        ));
        rows.push((
            "Trim Whitespace".to_string(),
            self.trim_whitespace.to_string(),
        ));
        rows
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnPresence {
    pub column: String,
    pub in_source: bool,
    pub in_target: bool,
}

/// Status-tagged rows under the source table's header set.
#[derive(Debug, Clone)]
pub struct RowSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueValue {
    pub column: String,
    pub side: &'static str,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub summary: Summary,
    pub column_presence: Option<Vec<ColumnPresence>>,
    pub rows: Option<RowSheet>,
    pub unique_values: Option<Vec<UniqueValue>>,
    /// Populated only when zero pairs matched.
    pub key_samples: Vec<KeySample>,
    pub stats: Option<Vec<ColumnSummary>>,
}

pub struct ReportInput<'a> {
    pub source: &'a Table,
    pub target: &'a Table,
    pub keys: &'a [String],
    pub map: &'a ColumnMap,
    pub normalize: NormalizeOptions,
    pub case_insensitive_columns: bool,
    pub partition: &'a MatchPartition,
    pub mismatches: Vec<ColumnMismatch>,
    pub drop_one_hint: Option<DropOneHint>,
    pub key_samples: Vec<KeySample>,
}

pub fn assemble(input: ReportInput<'_>, toggles: &SectionToggles) -> Result<Report> {
    let partition = input.partition;
    let match_percent = partition.match_percent();

    let summary = Summary {
        source: input.source.name.clone(),
        target: input.target.name.clone(),
        source_rows: input.source.row_count(),
        target_rows: input.target.row_count(),
        matched_pairs: partition.matched.len(),
        only_source: partition.only_source.len(),
        only_target: partition.only_target.len(),
        match_percent,
        diagnosis: DiagnosisTier::for_percent(match_percent),
        key_columns: input.keys.to_vec(),
        case_insensitive_columns: input.case_insensitive_columns,
        case_insensitive_data: input.normalize.case_insensitive,
        trim_whitespace: input.normalize.trim_whitespace,
        mismatches: input.mismatches,
        drop_one_hint: input.drop_one_hint,
    };

    let column_presence = toggles.columns.then(|| {
        reconcile::column_presence(
            &input.source.headers,
            &input.target.headers,
            input.case_insensitive_columns,
        )
        .into_iter()
        .map(|(column, in_source, in_target)| ColumnPresence {
            column,
            in_source,
            in_target,
        })
        .collect()
    });

    let rows = toggles
        .rows
        .then(|| {
            row_sheet(
                input.source,
                input.target,
                input.map,
                partition,
                toggles.include_matched,
            )
        })
        .transpose()?;

    let unique_values = toggles
        .unique_values
        .then(|| {
            unique_key_values(
                input.source,
                input.target,
                input.keys,
                input.map,
                &input.normalize,
            )
        })
        .transpose()?;

    let stats = toggles
        .stats
        .then(|| stats::numeric_summaries(input.source, input.target, input.map));

    Ok(Report {
        summary,
        column_presence,
        rows,
        unique_values,
        key_samples: input.key_samples,
        stats,
    })
}

fn row_sheet(
    source: &Table,
    target: &Table,
    map: &ColumnMap,
    partition: &MatchPartition,
    include_matched: bool,
) -> Result<RowSheet> {
    let mut headers = Vec::with_capacity(source.headers.len() + 1);
    headers.push("status".to_string());
    headers.extend(source.headers.iter().cloned());

    // Target rows are projected onto the source header set through the
    // column map; target columns with no source counterpart are dropped.
    let target_projection: Vec<Option<usize>> = source
        .headers
        .iter()
        .map(|column| {
            if map.contains(column) {
                target.column_index(map.target_name(column))
            } else {
                None
            }
        })
        .collect();

    let mut rows = Vec::new();
    for &row in &partition.only_source {
        rows.push(source_row(source, row, STATUS_ONLY_SOURCE));
    }
    for &row in &partition.only_target {
        let mut cells = Vec::with_capacity(headers.len());
        cells.push(STATUS_ONLY_TARGET.to_string());
        for projected in &target_projection {
            cells.push(match projected {
                Some(column) => target.cell(row, *column).to_string(),
                None => String::new(),
            });
        }
        rows.push(cells);
    }
    if include_matched {
        let mut seen = BTreeSet::new();
        for &(row, _) in &partition.matched {
            if seen.insert(row) {
                rows.push(source_row(source, row, STATUS_MATCHED));
            }
        }
    }
    Ok(RowSheet { headers, rows })
}

fn source_row(source: &Table, row: usize, status: &str) -> Vec<String> {
    let mut cells = Vec::with_capacity(source.headers.len() + 1);
    cells.push(status.to_string());
    for column in 0..source.headers.len() {
        cells.push(source.cell(row, column).to_string());
    }
    cells
}

fn unique_key_values(
    source: &Table,
    target: &Table,
    keys: &[String],
    map: &ColumnMap,
    options: &NormalizeOptions,
) -> Result<Vec<UniqueValue>> {
    let indices = matcher::key_indices(source, target, keys, map)?;
    let mut output = Vec::new();
    for (key, (source_idx, target_idx)) in keys.iter().zip(indices) {
        let source_values: BTreeSet<String> = source
            .column_values(source_idx)
            .map(|cell| normalize_cell(cell, options))
            .collect();
        let target_values: BTreeSet<String> = target
            .column_values(target_idx)
            .map(|cell| normalize_cell(cell, options))
            .collect();
        for value in source_values.difference(&target_values).take(UNIQUE_VALUE_CAP) {
            output.push(UniqueValue {
                column: key.clone(),
                side: "source",
                value: display_value(value),
            });
        }
        for value in target_values.difference(&source_values).take(UNIQUE_VALUE_CAP) {
            output.push(UniqueValue {
                column: key.clone(),
                side: "target",
                value: display_value(value),
            });
        }
    }
    Ok(output)
}

fn display_value(value: &str) -> String {
    if value.is_empty() {
        String::from("<empty>")
    } else {
        value.to_string()
    }
}
