//! The `columns` command: column presence across two datasets.
//!
//! Renders every column seen on either side with presence flags, then logs
//! the reconciled common set, so key columns can be picked before a full
//! comparison run.

use anyhow::{Result, bail};
use log::info;

use crate::{
    cli::ColumnsArgs,
    load::{self, LoadOptions},
    reconcile, table,
};

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let source = load::load_table(
        &args.source,
        &LoadOptions {
            sheet: args.source_sheet.clone(),
            header_row: args.source_header_row,
            delimiter: args.delimiter,
            encoding: None,
        },
    )?;
    let target = load::load_table(
        &args.target,
        &LoadOptions {
            sheet: args.target_sheet.clone(),
            header_row: args.target_header_row,
            delimiter: args.delimiter,
            encoding: None,
        },
    )?;

    let case_insensitive = !args.match_columns_exact;
    let presence =
        reconcile::column_presence(&source.headers, &target.headers, case_insensitive);
    let rows: Vec<Vec<String>> = presence
        .iter()
        .map(|(column, in_source, in_target)| {
            vec![
                column.clone(),
                flag(*in_source).to_string(),
                flag(*in_target).to_string(),
            ]
        })
        .collect();
    let headers = vec![
        "column".to_string(),
        "in_source".to_string(),
        "in_target".to_string(),
    ];
    table::print_table(&headers, &rows);

    let map = reconcile::reconcile(&source.headers, &target.headers, case_insensitive);
    if map.common.is_empty() {
        bail!(
            "No common columns between '{}' and '{}'",
            source.name,
            target.name
        );
    }
    info!(
        "{} common column(s): {}",
        map.common.len(),
        map.common.join(", ")
    );
    Ok(())
}

fn flag(present: bool) -> &'static str {
    if present { "yes" } else { "no" }
}
