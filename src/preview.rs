//! The `preview` command: first rows of any supported input as a table.

use anyhow::Result;
use log::info;

use crate::{
    cli::PreviewArgs,
    load::{self, LoadOptions},
    table,
};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let dataset = load::load_table(
        &args.input,
        &LoadOptions {
            sheet: args.sheet.clone(),
            header_row: args.header_row,
            delimiter: args.delimiter,
            encoding: args.input_encoding.clone(),
        },
    )?;
    let rows: Vec<Vec<String>> = dataset.rows.iter().take(args.rows).cloned().collect();
    table::print_table(&dataset.headers, &rows);
    info!(
        "Previewed {} of {} row(s) from '{}'",
        rows.len(),
        dataset.row_count(),
        dataset.name
    );
    Ok(())
}
