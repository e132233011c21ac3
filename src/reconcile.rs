//! Column reconciliation between two tables.
//!
//! Produces the set of columns both tables share, optionally matching names
//! case-insensitively, together with a source-name → target-name mapping.
//! Matching folds to lowercase only; the reconciled set keeps the source
//! table's original casing for display. When several columns on one side
//! fold to the same key, the last one wins — a documented collapse, not a
//! disambiguation.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ColumnMap {
    /// Common columns as named in the source table, in source header order
    /// (position of the first occurrence under folding).
    pub common: Vec<String>,
    /// Source column name → corresponding target column name.
    pub source_to_target: HashMap<String, String>,
}

impl ColumnMap {
    pub fn target_name<'a>(&'a self, source_name: &'a str) -> &'a str {
        self.source_to_target
            .get(source_name)
            .map(String::as_str)
            .unwrap_or(source_name)
    }

    pub fn contains(&self, source_name: &str) -> bool {
        self.common.iter().any(|c| c == source_name)
    }
}

pub fn reconcile(
    source_headers: &[String],
    target_headers: &[String],
    case_insensitive: bool,
) -> ColumnMap {
    if !case_insensitive {
        let common: Vec<String> = source_headers
            .iter()
            .filter(|name| target_headers.contains(name))
            .cloned()
            .collect();
        let source_to_target = common
            .iter()
            .map(|name| (name.clone(), name.clone()))
            .collect();
        return ColumnMap {
            common,
            source_to_target,
        };
    }

    // Last-seen wins on fold collisions, mirroring map insertion order.
    let mut source_by_fold: HashMap<String, &String> = HashMap::new();
    for name in source_headers {
        source_by_fold.insert(name.to_lowercase(), name);
    }
    let mut target_by_fold: HashMap<String, &String> = HashMap::new();
    for name in target_headers {
        target_by_fold.insert(name.to_lowercase(), name);
    }

    let mut common = Vec::new();
    let mut source_to_target = HashMap::new();
    let mut seen = std::collections::HashSet::new();
    for name in source_headers {
        let fold = name.to_lowercase();
        if !seen.insert(fold.clone()) {
            continue;
        }
        if let (Some(source_name), Some(target_name)) =
            (source_by_fold.get(&fold), target_by_fold.get(&fold))
        {
            common.push((*source_name).clone());
            source_to_target.insert((*source_name).clone(), (*target_name).clone());
        }
    }

    ColumnMap {
        common,
        source_to_target,
    }
}

/// Presence of every column name seen on either side, source columns first
/// in their original order, then target-only columns in theirs.
pub fn column_presence(
    source_headers: &[String],
    target_headers: &[String],
    case_insensitive: bool,
) -> Vec<(String, bool, bool)> {
    let fold = |name: &str| {
        if case_insensitive {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    };
    let target_folds: Vec<String> = target_headers.iter().map(|n| fold(n)).collect();
    let source_folds: Vec<String> = source_headers.iter().map(|n| fold(n)).collect();

    let mut rows = Vec::new();
    for (name, folded) in source_headers.iter().zip(&source_folds) {
        rows.push((name.clone(), true, target_folds.contains(folded)));
    }
    for (name, folded) in target_headers.iter().zip(&target_folds) {
        if !source_folds.contains(folded) {
            rows.push((name.clone(), false, true));
        }
    }
    rows
}
