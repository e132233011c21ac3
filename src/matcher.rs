//! Key-based outer matching between two tables.
//!
//! Both tables are projected onto the key columns, every key cell is
//! normalized, and the normalized tuples drive a full outer equi-join.
//! Original row ordinals are carried through so matched and unmatched rows
//! can be re-projected against the untouched tables for display.
//!
//! Duplicate key tuples within a table pair up as a full cross-product,
//! standard join combinatorics: two source rows and one target row under
//! the same key produce two matched pairs. Rows whose key normalizes to the
//! empty tuple match other empty-keyed rows; "both sides have no ID" counts
//! as a match by policy.

use anyhow::{Result, anyhow};
use std::collections::HashMap;

use crate::{
    data::Table,
    normalize::{NormalizeOptions, normalize_cell},
    reconcile::ColumnMap,
};

/// Unit separator; cannot appear in cell text read from any supported format.
const KEY_SEPARATOR: &str = "\u{1f}";

#[derive(Debug, Clone, Default)]
pub struct MatchPartition {
    /// (source ordinal, target ordinal) pairs with equal normalized keys.
    pub matched: Vec<(usize, usize)>,
    pub only_source: Vec<usize>,
    pub only_target: Vec<usize>,
}

impl MatchPartition {
    /// Distinct source rows that found at least one counterpart.
    pub fn matched_source_count(&self) -> usize {
        let mut rows: Vec<usize> = self.matched.iter().map(|(s, _)| *s).collect();
        rows.sort_unstable();
        rows.dedup();
        rows.len()
    }

    pub fn matched_target_count(&self) -> usize {
        let mut rows: Vec<usize> = self.matched.iter().map(|(_, t)| *t).collect();
        rows.sort_unstable();
        rows.dedup();
        rows.len()
    }

    /// Match percentage over join records: pairs / (pairs + unmatched on
    /// either side). Two empty tables are identical, hence 100.
    pub fn match_percent(&self) -> f64 {
        let total = self.matched.len() + self.only_source.len() + self.only_target.len();
        if total == 0 {
            return 100.0;
        }
        self.matched.len() as f64 / total as f64 * 100.0
    }
}

/// Resolves key column ordinals on both sides, failing on the first key the
/// reconciled column set does not cover.
pub fn key_indices(
    source: &Table,
    target: &Table,
    keys: &[String],
    map: &ColumnMap,
) -> Result<Vec<(usize, usize)>> {
    keys.iter()
        .map(|key| {
            let source_idx = source
                .column_index(key)
                .ok_or_else(|| anyhow!("Key column '{key}' not found in source table"))?;
            let target_idx = target
                .column_index(map.target_name(key))
                .ok_or_else(|| anyhow!("Key column '{key}' not found in target table"))?;
            Ok((source_idx, target_idx))
        })
        .collect()
}

fn key_tuple(table: &Table, row: usize, columns: &[usize], options: &NormalizeOptions) -> String {
    let mut parts = Vec::with_capacity(columns.len());
    for column in columns {
        parts.push(normalize_cell(table.cell(row, *column), options));
    }
    parts.join(KEY_SEPARATOR)
}

pub fn match_rows(
    source: &Table,
    target: &Table,
    keys: &[String],
    map: &ColumnMap,
    options: &NormalizeOptions,
) -> Result<MatchPartition> {
    let indices = key_indices(source, target, keys, map)?;
    let source_columns: Vec<usize> = indices.iter().map(|(s, _)| *s).collect();
    let target_columns: Vec<usize> = indices.iter().map(|(_, t)| *t).collect();

    let mut target_lookup: HashMap<String, Vec<usize>> = HashMap::new();
    for row in 0..target.row_count() {
        let key = key_tuple(target, row, &target_columns, options);
        target_lookup.entry(key).or_default().push(row);
    }

    let mut partition = MatchPartition::default();
    let mut target_matched = vec![false; target.row_count()];

    for row in 0..source.row_count() {
        let key = key_tuple(source, row, &source_columns, options);
        match target_lookup.get(&key) {
            Some(bucket) => {
                for &target_row in bucket {
                    partition.matched.push((row, target_row));
                    target_matched[target_row] = true;
                }
            }
            None => partition.only_source.push(row),
        }
    }

    partition.only_target = target_matched
        .iter()
        .enumerate()
        .filter(|(_, matched)| !**matched)
        .map(|(row, _)| row)
        .collect();

    Ok(partition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile;

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
    fn disjoint_keys_partition_to_either_side() {
        let source = table("s", &["id"], &[&["1"]]);
        let target = table("t", &["id"], &[&["2"]]);
        let map = reconcile::reconcile(&source.headers, &target.headers, false);
        let partition = match_rows(
            &source,
            &target,
            &keys(&["id"]),
            &map,
            &NormalizeOptions::default(),
        )
        .unwrap();
        assert_eq!(partition.matched, vec![]);
        assert_eq!(partition.only_source, vec![0]);
        assert_eq!(partition.only_target, vec![0]);
        assert_eq!(partition.match_percent(), 0.0);
    }

    #[test]
    fn duplicate_keys_pair_as_cross_product() {
        let source = table("s", &["id"], &[&["1"], &["1"]]);
        let target = table("t", &["id"], &[&["1"]]);
        let map = reconcile::reconcile(&source.headers, &target.headers, false);
        let partition = match_rows(
            &source,
            &target,
            &keys(&["id"]),
            &map,
            &NormalizeOptions::default(),
        )
        .unwrap();
        assert_eq!(partition.matched, vec![(0, 0), (1, 0)]);
        assert!(partition.only_source.is_empty());
        assert!(partition.only_target.is_empty());
    }

    #[test]
    fn keys_are_matched_through_normalization() {
        let source = table("s", &["id"], &[&["5.0"], &["2024-01-02"]]);
        let target = table("t", &["id"], &[&["5"], &["02/01/2024"]]);
        let map = reconcile::reconcile(&source.headers, &target.headers, false);
        let partition = match_rows(
            &source,
            &target,
            &keys(&["id"]),
            &map,
            &NormalizeOptions::default(),
        )
        .unwrap();
        assert_eq!(partition.matched.len(), 2);
        assert_eq!(partition.match_percent(), 100.0);
    }

    #[test]
    fn empty_equivalent_keys_match_each_other() {
        let source = table("s", &["id"], &[&["NaN"]]);
        let target = table("t", &["id"], &[&[""]]);
        let map = reconcile::reconcile(&source.headers, &target.headers, false);
        let partition = match_rows(
            &source,
            &target,
            &keys(&["id"]),
            &map,
            &NormalizeOptions::default(),
        )
        .unwrap();
        assert_eq!(partition.matched, vec![(0, 0)]);
    }

    #[test]
    fn partition_covers_every_row_exactly_once() {
        let source = table("s", &["id"], &[&["1"], &["2"], &["3"]]);
        let target = table("t", &["id"], &[&["2"], &["4"]]);
        let map = reconcile::reconcile(&source.headers, &target.headers, false);
        let partition = match_rows(
            &source,
            &target,
            &keys(&["id"]),
            &map,
            &NormalizeOptions::default(),
        )
        .unwrap();
        assert_eq!(
            partition.only_source.len() + partition.matched_source_count(),
            source.row_count()
        );
        assert_eq!(
            partition.only_target.len() + partition.matched_target_count(),
            target.row_count()
        );
    }

    #[test]
    fn empty_tables_report_full_match() {
        let source = table("s", &["id"], &[]);
        let target = table("t", &["id"], &[]);
        let map = reconcile::reconcile(&source.headers, &target.headers, false);
        let partition = match_rows(
            &source,
            &target,
            &keys(&["id"]),
            &map,
            &NormalizeOptions::default(),
        )
        .unwrap();
        assert_eq!(partition.match_percent(), 100.0);
    }
}
