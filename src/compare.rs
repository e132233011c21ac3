//! The `compare` command: load, validate, match, diagnose, report.
//!
//! Validation failures (unreadable input, no common columns, bad key
//! columns) abort before any matching runs. A 0% match is a result, not an
//! error; the process exits non-zero only for input errors.

use anyhow::{Result, bail};
use itertools::Itertools;
use log::{info, warn};

use crate::{
    cli::CompareArgs,
    diagnose, export,
    load::{self, LoadOptions},
    matcher,
    normalize::NormalizeOptions,
    reconcile,
    report::{self, ReportInput, SectionToggles},
    table,
};

pub fn execute(args: &CompareArgs) -> Result<()> {
    let source = load::load_table(
        &args.source,
        &LoadOptions {
            sheet: args.source_sheet.clone(),
            header_row: args.source_header_row,
            delimiter: args.delimiter,
            encoding: args.source_encoding.clone(),
        },
    )?;
    let target = load::load_table(
        &args.target,
        &LoadOptions {
            sheet: args.target_sheet.clone(),
            header_row: args.target_header_row,
            delimiter: args.delimiter,
            encoding: args.target_encoding.clone(),
        },
    )?;
    info!(
        "Loaded: source '{}' ({} row(s)) | target '{}' ({} row(s))",
        source.name,
        source.row_count(),
        target.name,
        target.row_count()
    );

    let case_insensitive_columns = !args.match_columns_exact;
    let map = reconcile::reconcile(&source.headers, &target.headers, case_insensitive_columns);
    if map.common.is_empty() {
        bail!(
            "No common columns between '{}' and '{}'",
            source.name,
            target.name
        );
    }

    let keys: Vec<String> = args.keys.iter().unique().cloned().collect();
    if keys.is_empty() {
        bail!("At least one key column must be selected");
    }
    for key in &keys {
        if !map.contains(key) {
            bail!(
                "Key column '{key}' is not common to both datasets; common columns: {}",
                map.common.join(", ")
            );
        }
    }

    let normalize = NormalizeOptions {
        case_insensitive: !args.match_data_exact,
        trim_whitespace: !args.keep_whitespace,
    };

    let partition = matcher::match_rows(&source, &target, &keys, &map, &normalize)?;
    let match_percent = partition.match_percent();
    let mismatches =
        diagnose::rank_mismatches(&source, &target, &map, &keys, &partition, &normalize);
    let drop_one_hint =
        diagnose::drop_one_sensitivity(&source, &target, &keys, &map, &normalize, match_percent)?;
    let key_samples = if partition.matched.is_empty()
        && (source.row_count() > 0 || target.row_count() > 0)
    {
        diagnose::key_samples(&source, &target, &keys, &map, &normalize, args.sample_limit)?
    } else {
        Vec::new()
    };

    let toggles = SectionToggles {
        rows: !args.skip_rows,
        columns: !args.skip_columns,
        unique_values: !args.skip_unique,
        stats: !args.skip_stats,
        include_matched: args.include_matched,
    };
    let report = report::assemble(
        ReportInput {
            source: &source,
            target: &target,
            keys: &keys,
            map: &map,
            normalize,
            case_insensitive_columns,
            partition: &partition,
            mismatches,
            drop_one_hint,
            key_samples,
        },
        &toggles,
    )?;

    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
    } else {
        print_console_report(&report);
    }

    if let Some(hint) = &report.summary.drop_one_hint {
        warn!(
            "Tip: ignoring key column '{}' would raise the match to {:.2}%",
            hint.column, hint.match_percent
        );
    }

    if let Some(requested) = &args.report {
        let path = export::resolve_report_path(requested);
        export::write_workbook(&report, &path)?;
    }

    info!(
        "Comparison complete: {:.2}% match ({} pair(s), {} only-source, {} only-target)",
        match_percent,
        report.summary.matched_pairs,
        report.summary.only_source,
        report.summary.only_target
    );
    Ok(())
}

fn print_console_report(report: &report::Report) {
    let headers = vec!["metric".to_string(), "value".to_string()];
    let rows: Vec<Vec<String>> = report
        .summary
        .metric_rows()
        .into_iter()
        .map(|(metric, value)| vec![metric, value])
        .collect();
    table::print_table(&headers, &rows);

    if !report.summary.mismatches.is_empty() {
        println!();
        let headers = vec!["column".to_string(), "mismatched_pairs".to_string()];
        let rows: Vec<Vec<String>> = report
            .summary
            .mismatches
            .iter()
            .map(|m| vec![m.column.clone(), m.count.to_string()])
            .collect();
        table::print_table(&headers, &rows);
    }

    if !report.key_samples.is_empty() {
        println!();
        let headers = vec![
            "key_column".to_string(),
            "side".to_string(),
            "sample_values".to_string(),
        ];
        let mut rows = Vec::new();
        for sample in &report.key_samples {
            rows.push(vec![
                sample.column.clone(),
                "source".to_string(),
                sample.source_values.join(", "),
            ]);
            rows.push(vec![
                sample.column.clone(),
                "target".to_string(),
                sample.target_values.join(", "),
            ]);
        }
        table::print_table(&headers, &rows);
    }
}
