//! Delimited text tables for administrative bulk loading.
//!
//! The first row names the fields, every following non-blank row is one
//! record. Field and row separators are caller-configurable; cells and
//! lines are trimmed and a leading byte order mark is dropped.

/// One parsed record: `(header, cell)` pairs in column order. The first
/// column acts as the lookup key on import.
pub type Record = Vec<(String, String)>;

pub fn parse(data: &str, separator: &str, newline: &str) -> Vec<Record> {
    let data = data
        .strip_prefix('\u{feff}')
        .or_else(|| data.strip_prefix('\u{fffe}'))
        .unwrap_or(data);

    let mut lines = data.split(newline).map(str::trim);

    let headers: Vec<String> = match lines.next() {
        Some(header) => header.split(separator).map(|h| h.trim().to_string()).collect(),
        None => return Vec::new(),
    };

    lines
        .filter(|line| !line.is_empty())
        .map(|line| {
            headers
                .iter()
                .zip(line.split(separator).map(str::trim))
                .map(|(header, cell)| (header.clone(), cell.to_string()))
                .collect()
        })
        .collect()
}

pub fn render(headers: &[&str], rows: &[Vec<String>], separator: &str, newline: &str) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(separator));
    for row in rows {
        lines.push(row.join(separator));
    }
    lines.join(newline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headers_and_records() {
        let records = parse("id;text;points\n1;alma;2\n2;körte;1\n", ";", "\n");
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            vec![
                ("id".to_string(), "1".to_string()),
                ("text".to_string(), "alma".to_string()),
                ("points".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn strips_byte_order_mark_and_blank_lines() {
        let records = parse("\u{feff}id;text\n\n1;alma\n   \n", ";", "\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0][1].1, "alma");
    }

    #[test]
    fn trims_cells_and_honors_custom_separators() {
        let records = parse("id | text # 1 | alma # 2 | körte", "|", "#");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0][0], ("id".to_string(), "1".to_string()));
        assert_eq!(records[1][1], ("text".to_string(), "körte".to_string()));
    }

    #[test]
    fn short_rows_only_fill_leading_columns() {
        let records = parse("id;text;points\n1;alma", ";", "\n");
        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn renders_the_same_shape_back() {
        let rows = vec![
            vec!["1".to_string(), "alma".to_string()],
            vec!["2".to_string(), "körte".to_string()],
        ];
        let text = render(&["id", "text"], &rows, ";", "\n");
        assert_eq!(text, "id;text\n1;alma\n2;körte");

        let reparsed = parse(&text, ";", "\n");
        assert_eq!(reparsed.len(), 2);
        assert_eq!(reparsed[1][1].1, "körte");
    }
}
