//! Mismatch diagnosis over matched row pairs.
//!
//! Two independent analyses, both consuming a [`MatchPartition`]:
//!
//! - **Per-column mismatch ranking**: counts matched pairs whose normalized
//!   values differ, for every common column outside the key set. Columns
//!   with zero mismatches are omitted.
//! - **Drop-one key sensitivity**: when the match is imperfect and more
//!   than one key column is in play, re-runs the match once per key column
//!   with that column removed and reports the single removal that most
//!   improves the match percentage. A hint only; key selection is never
//!   changed here.
//!
//! When nothing matches at all, [`key_samples()`] surfaces the first few
//! distinct normalized key values per side so formatting gaps are visible
//! instead of a bare "0%".

use anyhow::Result;
use itertools::Itertools;
use serde::Serialize;

use crate::{
    data::Table,
    matcher::{self, MatchPartition},
    normalize::{NormalizeOptions, normalize_cell},
    reconcile::ColumnMap,
};

/// Match percentage at or above which an imperfect run still counts as
/// high accuracy. Policy, not law; observed variants differ slightly.
pub const HIGH_ACCURACY_THRESHOLD: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisTier {
    Identical,
    HighAccuracy,
    MismatchFound,
    CriticalMismatch,
}

impl DiagnosisTier {
    pub fn for_percent(percent: f64) -> Self {
        if percent >= 100.0 {
            DiagnosisTier::Identical
        } else if percent >= HIGH_ACCURACY_THRESHOLD {
            DiagnosisTier::HighAccuracy
        } else if percent > 0.0 {
            DiagnosisTier::MismatchFound
        } else {
            DiagnosisTier::CriticalMismatch
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DiagnosisTier::Identical => "identical",
            DiagnosisTier::HighAccuracy => "high accuracy",
            DiagnosisTier::MismatchFound => "mismatch found",
            DiagnosisTier::CriticalMismatch => "critical mismatch",
        }
    }
}

impl std::fmt::Display for DiagnosisTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMismatch {
    pub column: String,
    pub count: usize,
}

/// Ranks non-key common columns by how many matched pairs disagree in them.
/// An empty result means either a clean match or no non-key common columns.
pub fn rank_mismatches(
    source: &Table,
    target: &Table,
    map: &ColumnMap,
    keys: &[String],
    partition: &MatchPartition,
    options: &NormalizeOptions,
) -> Vec<ColumnMismatch> {
    let candidates: Vec<&String> = map
        .common
        .iter()
        .filter(|column| !keys.contains(column))
        .collect();

    let mut ranked = Vec::new();
    for column in candidates {
        let Some(source_idx) = source.column_index(column) else {
            continue;
        };
        let Some(target_idx) = target.column_index(map.target_name(column)) else {
            continue;
        };
        let count = partition
            .matched
            .iter()
            .filter(|(source_row, target_row)| {
                normalize_cell(source.cell(*source_row, source_idx), options)
                    != normalize_cell(target.cell(*target_row, target_idx), options)
            })
            .count();
        if count > 0 {
            ranked.push(ColumnMismatch {
                column: column.clone(),
                count,
            });
        }
    }
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropOneHint {
    /// Key column whose removal most improves the match rate.
    pub column: String,
    /// Match percentage after removing that column.
    pub match_percent: f64,
}

/// Searches for the single key column whose removal most improves the match
/// percentage. One re-join per candidate, so O(key columns) joins; fine for
/// the interactive table sizes this tool targets. Returns `None` when the
/// baseline is already perfect, only one key is selected, or no removal
/// strictly improves on the baseline. Ties resolve to the first candidate
/// in key order.
pub fn drop_one_sensitivity(
    source: &Table,
    target: &Table,
    keys: &[String],
    map: &ColumnMap,
    options: &NormalizeOptions,
    baseline_percent: f64,
) -> Result<Option<DropOneHint>> {
    if keys.len() < 2 || baseline_percent >= 100.0 {
        return Ok(None);
    }

    let mut best: Option<DropOneHint> = None;
    for candidate in keys {
        let remaining: Vec<String> = keys.iter().filter(|k| *k != candidate).cloned().collect();
        let partition = matcher::match_rows(source, target, &remaining, map, options)?;
        let percent = partition.match_percent();
        if percent <= baseline_percent {
            continue;
        }
        let improves_on_best = best.as_ref().is_none_or(|b| percent > b.match_percent);
        if improves_on_best {
            best = Some(DropOneHint {
                column: candidate.clone(),
                match_percent: percent,
            });
        }
    }
    Ok(best)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySample {
    pub column: String,
    pub source_values: Vec<String>,
    pub target_values: Vec<String>,
}

/// First few distinct normalized values per key column on each side, in row
/// order. Surfaced when zero rows match to make formatting gaps visible.
pub fn key_samples(
    source: &Table,
    target: &Table,
    keys: &[String],
    map: &ColumnMap,
    options: &NormalizeOptions,
    limit: usize,
) -> Result<Vec<KeySample>> {
    let indices = matcher::key_indices(source, target, keys, map)?;
    let samples = keys
        .iter()
        .zip(indices)
        .map(|(key, (source_idx, target_idx))| KeySample {
            column: key.clone(),
            source_values: distinct_normalized(source, source_idx, options, limit),
            target_values: distinct_normalized(target, target_idx, options, limit),
        })
        .collect();
    Ok(samples)
}

fn distinct_normalized(
    table: &Table,
    column: usize,
    options: &NormalizeOptions,
    limit: usize,
) -> Vec<String> {
    table
        .column_values(column)
        .map(|cell| normalize_cell(cell, options))
        .unique()
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{matcher::match_rows, reconcile};

    fn table(name: &str, headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            name,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(DiagnosisTier::for_percent(100.0), DiagnosisTier::Identical);
        assert_eq!(DiagnosisTier::for_percent(97.5), DiagnosisTier::HighAccuracy);
        assert_eq!(DiagnosisTier::for_percent(50.0), DiagnosisTier::MismatchFound);
        assert_eq!(
            DiagnosisTier::for_percent(0.0),
            DiagnosisTier::CriticalMismatch
        );
    }

    #[test]
    fn mismatch_ranking_counts_and_orders() {
        let source = table(
            "s",
            &["id", "name", "city"],
            &[&["1", "Alice", "Rome"], &["2", "Bob", "Oslo"]],
        );
        let target = table(
            "t",
            &["id", "name", "city"],
            &[&["1", "Alice", "Lima"], &["2", "Ben", "Kiev"]],
        );
        let map = reconcile::reconcile(&source.headers, &target.headers, false);
        let key_list = keys(&["id"]);
        let options = NormalizeOptions::default();
        let partition = match_rows(&source, &target, &key_list, &map, &options).unwrap();
        let ranked = rank_mismatches(&source, &target, &map, &key_list, &partition, &options);
        assert_eq!(
            ranked,
            vec![
                ColumnMismatch {
                    column: "city".into(),
                    count: 2
                },
                ColumnMismatch {
                    column: "name".into(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn equal_after_normalization_is_not_a_mismatch() {
        let source = table("s", &["id", "name"], &[&["1", "Alice"]]);
        let target = table("t", &["id", "name"], &[&["1", "alice "]]);
        let map = reconcile::reconcile(&source.headers, &target.headers, false);
        let key_list = keys(&["id"]);
        let options = NormalizeOptions {
            case_insensitive: true,
            trim_whitespace: true,
        };
        let partition = match_rows(&source, &target, &key_list, &map, &options).unwrap();
        assert_eq!(partition.matched.len(), 1);
        let ranked = rank_mismatches(&source, &target, &map, &key_list, &partition, &options);
        assert!(ranked.is_empty());
    }

    #[test]
    fn drop_one_recommends_the_noisy_key() {
        let source = table(
            "s",
            &["id", "region"],
            &[&["1", "east"], &["2", "east"], &["3", "west"]],
        );
        let target = table(
            "t",
            &["id", "region"],
            &[&["1", "north"], &["2", "west"], &["3", "east"]],
        );
        let map = reconcile::reconcile(&source.headers, &target.headers, false);
        let key_list = keys(&["id", "region"]);
        let options = NormalizeOptions::default();
        let baseline = match_rows(&source, &target, &key_list, &map, &options)
            .unwrap()
            .match_percent();
        let hint = drop_one_sensitivity(&source, &target, &key_list, &map, &options, baseline)
            .unwrap()
            .expect("expected a recommendation");
        assert_eq!(hint.column, "region");
        assert_eq!(hint.match_percent, 100.0);
    }

    #[test]
    fn drop_one_stays_silent_without_strict_improvement() {
        let source = table("s", &["id", "code"], &[&["1", "a"]]);
        let target = table("t", &["id", "code"], &[&["2", "b"]]);
        let map = reconcile::reconcile(&source.headers, &target.headers, false);
        let key_list = keys(&["id", "code"]);
        let options = NormalizeOptions::default();
        let hint =
            drop_one_sensitivity(&source, &target, &key_list, &map, &options, 0.0).unwrap();
        assert!(hint.is_none());
    }

    #[test]
    fn drop_one_skipped_for_single_key_or_perfect_match() {
        let source = table("s", &["id"], &[&["1"]]);
        let target = table("t", &["id"], &[&["2"]]);
        let map = reconcile::reconcile(&source.headers, &target.headers, false);
        let options = NormalizeOptions::default();
        assert!(
            drop_one_sensitivity(&source, &target, &keys(&["id"]), &map, &options, 0.0)
                .unwrap()
                .is_none()
        );
        assert!(
            drop_one_sensitivity(
                &source,
                &target,
                &keys(&["id", "id"]),
                &map,
                &options,
                100.0
            )
            .unwrap()
            .is_none()
        );
    }

    #[test]
    fn key_samples_list_distinct_normalized_values() {
        let source = table("s", &["id"], &[&["A-1"], &["A-1"], &["A-2"]]);
        let target = table("t", &["id"], &[&["1"], &["2"]]);
        let map = reconcile::reconcile(&source.headers, &target.headers, false);
        let options = NormalizeOptions::default();
        let samples =
            key_samples(&source, &target, &keys(&["id"]), &map, &options, 5).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].source_values, vec!["A-1", "A-2"]);
        assert_eq!(samples[0].target_values, vec!["1", "2"]);
    }
}
