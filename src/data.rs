//! In-memory table model and cell parsing helpers.
//!
//! A [`Table`] is an ordered set of rows over named columns. Cells are kept
//! as the raw strings produced by the loader; typed interpretation (numeric,
//! date) happens lazily at comparison time so the data a user sees in the
//! report is never mutated. Row identity is the row's ordinal position.

use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone)]
pub struct Table {
    /// Display name for reports: file stem, optionally `file:sheet`.
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell accessor tolerant of ragged rows; absent cells read as empty.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(column).map(String::as_str).unwrap_or(""))
    }
}

/// Parses a cell as a finite number. `"nan"`, `"inf"` and friends parse as
/// `f64` but are not usable cell values, so they are rejected here and fall
/// through to the null-token handling in the normalizer.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => None,
    }
}

/// Renders a number the way the comparison engine expects: integral values
/// without a fractional part, everything else in shortest round-trip form.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses a cell as a calendar date, accepting bare dates and datetimes in
/// the formats above. Datetimes collapse to their date component because the
/// normalizer compares at day granularity.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(parsed);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(parsed.date());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parse_number_accepts_integers_and_floats() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number(" 42.5 "), Some(42.5));
        assert_eq!(parse_number("-3e2"), Some(-300.0));
    }

    #[test]
    fn parse_number_rejects_non_finite_and_text() {
        assert_eq!(parse_number("nan"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn format_number_drops_trailing_zero_fraction() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(42.5), "42.5");
    }

    #[test]
    fn parse_date_supports_multiple_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(parse_date("2024-05-06"), Some(expected));
        assert_eq!(parse_date("06/05/2024"), Some(expected));
        assert_eq!(parse_date("2024/05/06"), Some(expected));
        assert_eq!(parse_date("2024-05-06 14:30:00"), Some(expected));
    }

    #[test]
    fn cell_access_tolerates_ragged_rows() {
        let table = Table::new(
            "t",
            vec!["a".into(), "b".into()],
            vec![vec!["1".into()], vec!["2".into(), "3".into()]],
        );
        assert_eq!(table.cell(0, 1), "");
        assert_eq!(table.cell(1, 1), "3");
        assert_eq!(table.cell(9, 0), "");
    }
}
