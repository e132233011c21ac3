//! Canonical cell normalization for comparison.
//!
//! Every column that participates in key matching or mismatch diagnosis is
//! run through [`normalize_cell()`] with the same [`NormalizeOptions`], so a
//! pair of cells judged equal during matching can never be reported as a
//! mismatch later. The rules, applied in order:
//!
//! 1. a numeric cell is replaced by its numeric rendering (`"5"`, `5.0`
//!    and `"5.00"` all become `"5"`);
//! 2. otherwise a date cell is replaced by its ISO `YYYY-MM-DD` form;
//! 3. a trailing `.0` is stripped (integer-valued float artifact);
//! 4. null-equivalent tokens (`nan`, `<na>`, `none`, `nat`, empty) collapse
//!    to the empty string regardless of options;
//! 5. with `trim_whitespace`, outer whitespace is stripped and inner runs
//!    collapse to a single space;
//! 6. with `case_insensitive`, the result is lowercased.
//!
//! Normalization is a matching-time transform only; table cells are never
//! rewritten.

use std::sync::OnceLock;

use regex::Regex;

use crate::data;

/// Literal forms treated as "missing", compared case- and
/// whitespace-insensitively.
pub const NULL_TOKENS: &[&str] = &["nan", "<na>", "none", "nat", ""];

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    pub case_insensitive: bool,
    pub trim_whitespace: bool,
}

fn whitespace_runs() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

pub fn normalize_cell(raw: &str, options: &NormalizeOptions) -> String {
    let mut value = canonical_token(raw);

    if value.ends_with(".0") {
        while let Some(stripped) = value.strip_suffix(".0") {
            value = stripped.to_string();
        }
        // Stripping can expose a parseable form ("1e3.0" → "1e3"), and the
        // result must be a fixpoint of this function.
        value = canonical_token(&value);
    }

    if NULL_TOKENS.contains(&value.trim().to_lowercase().as_str()) {
        return String::new();
    }

    if options.trim_whitespace {
        value = whitespace_runs().replace_all(value.trim(), " ").into_owned();
    }
    if options.case_insensitive {
        value = value.to_lowercase();
    }
    value
}

/// Stages 1–3: numeric rendering, ISO date rendering, or the raw text.
fn canonical_token(raw: &str) -> String {
    if let Some(number) = data::parse_number(raw) {
        data::format_number(number)
    } else if let Some(date) = data::parse_date(raw) {
        date.format("%Y-%m-%d").to_string()
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> NormalizeOptions {
        NormalizeOptions {
            case_insensitive: true,
            trim_whitespace: true,
        }
    }

    #[test]
    fn numeric_forms_converge() {
        let options = NormalizeOptions::default();
        assert_eq!(normalize_cell("5", &options), "5");
        assert_eq!(normalize_cell("5.0", &options), "5");
        assert_eq!(normalize_cell("5.00", &options), "5");
        assert_eq!(normalize_cell("05", &options), "5");
        assert_eq!(normalize_cell("42.5", &options), "42.5");
    }

    #[test]
    fn date_representations_converge() {
        let options = NormalizeOptions::default();
        assert_eq!(normalize_cell("2024-01-05", &options), "2024-01-05");
        assert_eq!(normalize_cell("05/01/2024", &options), "2024-01-05");
        assert_eq!(normalize_cell("2024-01-05 09:30:00", &options), "2024-01-05");
    }

    #[test]
    fn null_tokens_collapse_to_empty() {
        let options = NormalizeOptions::default();
        for token in ["NaN", " nan ", "<NA>", "None", "NaT", "", "   "] {
            assert_eq!(normalize_cell(token, &options), "", "token {token:?}");
        }
    }

    #[test]
    fn null_tokens_collapse_even_without_trim_or_fold() {
        // Token recognition is independent of the user-facing options.
        let options = NormalizeOptions::default();
        assert_eq!(normalize_cell("  NONE  ", &options), "");
    }

    #[test]
    fn trim_collapses_inner_whitespace() {
        assert_eq!(normalize_cell("  Alice \t  Smith ", &full()), "alice smith");
    }

    #[test]
    fn case_folding_only_when_requested() {
        let exact = NormalizeOptions {
            case_insensitive: false,
            trim_whitespace: true,
        };
        assert_eq!(normalize_cell("Alice", &exact), "Alice");
        assert_eq!(normalize_cell("Alice", &full()), "alice");
    }

    #[test]
    fn trailing_dot_zero_stripped_from_text() {
        // Mirrors the coercion-artifact rule: applied to the string form,
        // not just to recognized numbers.
        let options = NormalizeOptions::default();
        assert_eq!(normalize_cell("v1.0", &options), "v1");
    }

    #[test]
    fn normalization_is_idempotent() {
        let options = full();
        for raw in [
            "5.0",
            "05/01/2024",
            "NaN",
            "  Foo   Bar ",
            "v1.0",
            "1e3",
            "1e3.0",
            "5.0.0",
            "x.0.0",
        ] {
            let once = normalize_cell(raw, &options);
            let twice = normalize_cell(&once, &options);
            assert_eq!(once, twice, "input {raw:?}");
        }
    }
}
