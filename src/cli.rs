use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Reconcile two tabular datasets row-by-row", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare two datasets on key columns and report mismatches
    Compare(CompareArgs),
    /// List column presence across two datasets and the reconciled common set
    Columns(ColumnsArgs),
    /// Preview the first few rows of a dataset in a formatted table
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Source dataset (csv, tsv, txt, json, xlsx, xlsm, xlsb, xls, ods)
    #[arg(short = 's', long = "source")]
    pub source: PathBuf,
    /// Target dataset to compare against the source
    #[arg(short = 't', long = "target")]
    pub target: PathBuf,
    /// Key columns defining row identity (comma-separated, repeatable)
    #[arg(short = 'k', long = "key", required = true, value_delimiter = ',', action = clap::ArgAction::Append)]
    pub keys: Vec<String>,
    /// Workbook sheet to read from the source (defaults to the largest)
    #[arg(long = "source-sheet")]
    pub source_sheet: Option<String>,
    /// Workbook sheet to read from the target (defaults to the largest)
    #[arg(long = "target-sheet")]
    pub target_sheet: Option<String>,
    /// 1-based header row in the source
    #[arg(long = "source-header-row", default_value_t = 1)]
    pub source_header_row: usize,
    /// 1-based header row in the target
    #[arg(long = "target-header-row", default_value_t = 1)]
    pub target_header_row: usize,
    /// Delimiter for delimited inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the source file (defaults to utf-8)
    #[arg(long = "source-encoding")]
    pub source_encoding: Option<String>,
    /// Character encoding of the target file (defaults to utf-8)
    #[arg(long = "target-encoding")]
    pub target_encoding: Option<String>,
    /// Match column names exactly instead of case-insensitively
    #[arg(long = "match-columns-exact")]
    pub match_columns_exact: bool,
    /// Compare cell values exactly instead of case-insensitively
    #[arg(long = "match-data-exact")]
    pub match_data_exact: bool,
    /// Keep cell whitespace instead of trimming and collapsing it
    #[arg(long = "keep-whitespace")]
    pub keep_whitespace: bool,
    /// Write an XLSX report to this path (a directory gets a timestamped name)
    #[arg(short = 'r', long = "report")]
    pub report: Option<PathBuf>,
    /// Omit the Row Comparison sheet
    #[arg(long = "skip-rows")]
    pub skip_rows: bool,
    /// Omit the Column Names sheet
    #[arg(long = "skip-columns")]
    pub skip_columns: bool,
    /// Omit the Unique Values sheet
    #[arg(long = "skip-unique")]
    pub skip_unique: bool,
    /// Omit the Summary Stats sheet
    #[arg(long = "skip-stats")]
    pub skip_stats: bool,
    /// Include matched rows in the Row Comparison sheet
    #[arg(long = "include-matched")]
    pub include_matched: bool,
    /// Print the executive summary as JSON instead of tables
    #[arg(long = "summary-json")]
    pub summary_json: bool,
    /// Distinct key values to sample per side when nothing matches
    #[arg(long = "sample-limit", default_value_t = 5)]
    pub sample_limit: usize,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Source dataset
    #[arg(short = 's', long = "source")]
    pub source: PathBuf,
    /// Target dataset
    #[arg(short = 't', long = "target")]
    pub target: PathBuf,
    /// Workbook sheet to read from the source
    #[arg(long = "source-sheet")]
    pub source_sheet: Option<String>,
    /// Workbook sheet to read from the target
    #[arg(long = "target-sheet")]
    pub target_sheet: Option<String>,
    /// 1-based header row in the source
    #[arg(long = "source-header-row", default_value_t = 1)]
    pub source_header_row: usize,
    /// 1-based header row in the target
    #[arg(long = "target-header-row", default_value_t = 1)]
    pub target_header_row: usize,
    /// Delimiter for delimited inputs
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Match column names exactly instead of case-insensitively
    #[arg(long = "match-columns-exact")]
    pub match_columns_exact: bool,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input dataset to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Workbook sheet to read
    #[arg(long)]
    pub sheet: Option<String>,
    /// 1-based header row
    #[arg(long = "header-row", default_value_t = 1)]
    pub header_row: usize,
    /// Delimiter for delimited inputs
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_aliases_resolve() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("|"), Ok(b'|'));
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn compare_args_collect_comma_separated_keys() {
        let cli = Cli::parse_from([
            "tabrecon", "compare", "-s", "a.csv", "-t", "b.csv", "-k", "id,region", "-k", "batch",
        ]);
        let Commands::Compare(args) = cli.command else {
            panic!("expected compare command");
        };
        assert_eq!(args.keys, vec!["id", "region", "batch"]);
    }
}
