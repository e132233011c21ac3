//! Elastic ASCII table rendering for console output.

use std::fmt::Write as _;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| cell_width(h)).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(cell_width(cell));
        }
    }

    let mut output = String::new();
    write_row(&mut output, headers, &widths);
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat((*w).max(3))).collect();
    write_row(&mut output, &separator, &widths);
    for row in rows {
        write_row(&mut output, row, &widths);
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn write_row(output: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (idx, cell) in cells.iter().enumerate() {
        let Some(width) = widths.get(idx).copied() else {
            break;
        };
        if idx > 0 {
            line.push_str("  ");
        }
        let sanitized = sanitize(cell);
        let padding = width.max(3).saturating_sub(cell_width(&sanitized));
        line.push_str(&sanitized);
        line.extend(std::iter::repeat_n(' ', padding));
    }
    let _ = writeln!(output, "{}", line.trim_end());
}

fn cell_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch {
            '\n' | '\r' | '\t' => ' ',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_header_separator_and_rows() {
        let headers = vec!["metric".to_string(), "value".to_string()];
        let rows = vec![vec!["rows".to_string(), "12".to_string()]];
        let rendered = render_table(&headers, &rows);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("metric"));
        assert!(lines[1].starts_with("------"));
        assert!(lines[2].starts_with("rows"));
    }

    #[test]
    fn control_characters_become_spaces() {
        let headers = vec!["a".to_string()];
        let rows = vec![vec!["x\ny".to_string()]];
        let rendered = render_table(&headers, &rows);
        assert!(rendered.contains("x y"));
    }
}
