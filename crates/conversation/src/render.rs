//! Fixed-width table rendering for the sheet preview.
//!
//! The table is meant for a Markdown message: header cells are wrapped in
//! backticks, a dashed separator follows, then the trailing window of data
//! rows. Every cell is left-aligned and padded with spaces to its column
//! width, measured in characters, before Markdown escaping.

use sheetdraft_core::sheets::Row;

use crate::markdown;

const CELL_SEPARATOR: &str = " | ";

/// Renders the last `row_count` data rows of a sheet.
#[derive(Debug, Clone, Copy)]
pub struct TableRenderer {
    row_count: usize,
}

impl TableRenderer {
    pub fn new(row_count: usize) -> Self {
        Self { row_count }
    }

    /// The trailing `row_count` rows, original order kept.
    pub fn window<'a>(&self, data_rows: &'a [Row]) -> &'a [Row] {
        let start = data_rows.len().saturating_sub(self.row_count);
        &data_rows[start..]
    }

    /// The full preview message: a title line, a blank line, then the table.
    pub fn render(&self, sheet_name: &str, header: &[String], data_rows: &[Row]) -> String {
        let shown = self.window(data_rows);
        if shown.is_empty() {
            return format!("Sheet {} has no data rows yet.", markdown::bold(sheet_name));
        }
        format!(
            "Last {} rows of {}:\n\n{}",
            shown.len(),
            markdown::bold(sheet_name),
            render_table(header, shown)
        )
    }
}

/// Width of every header-indexed column over the header and the shown rows.
///
/// Cells in a row beyond the header's length are not covered here; they are
/// printed at their own length.
pub fn column_widths(header: &[String], shown: &[Row]) -> Vec<usize> {
    let mut widths: Vec<usize> = header.iter().map(|h| char_len(h)).collect();
    for row in shown {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(char_len(cell));
        }
    }
    widths
}

/// Header line, separator line, and one line per row.
pub fn render_table(header: &[String], shown: &[Row]) -> String {
    let widths = column_widths(header, shown);

    let header_line = header
        .iter()
        .zip(&widths)
        .map(|(cell, width)| markdown::code(&pad(cell, *width)))
        .collect::<Vec<_>>()
        .join(CELL_SEPARATOR);

    let separator_line = widths
        .iter()
        .map(|width| "-".repeat(width + 2))
        .collect::<Vec<_>>()
        .join("|");

    let mut out = String::new();
    if !header.is_empty() {
        out.push_str(&header_line);
        out.push('\n');
        out.push_str(&separator_line);
        out.push('\n');
    }

    for row in shown {
        let line = row
            .iter()
            .enumerate()
            .map(|(i, cell)| match widths.get(i) {
                Some(width) => markdown::escape(&pad(cell, *width)),
                None => markdown::escape(cell),
            })
            .collect::<Vec<_>>()
            .join(CELL_SEPARATOR);
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn pad(cell: &str, width: usize) -> String {
    let fill = width.saturating_sub(char_len(cell));
    let mut out = String::with_capacity(cell.len() + fill);
    out.push_str(cell);
    out.extend(std::iter::repeat_n(' ', fill));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn window_keeps_trailing_rows_in_order() {
        let rows: Vec<Row> = (1..=7).map(|i| row(&[&i.to_string()])).collect();
        let shown = TableRenderer::new(5).window(&rows);
        assert_eq!(shown.len(), 5);
        assert_eq!(shown[0], row(&["3"]));
        assert_eq!(shown[4], row(&["7"]));
    }

    #[test]
    fn window_returns_everything_when_short() {
        let rows = vec![row(&["a"]), row(&["b"])];
        assert_eq!(TableRenderer::new(5).window(&rows).len(), 2);
    }

    #[test]
    fn widths_cover_header_and_rows() {
        let header = row(&["Name", "Amount"]);
        let rows = vec![row(&["Ann", "5"]), row(&["Bob", "3"]), row(&["Cid", "9"])];
        assert_eq!(column_widths(&header, &rows), vec![4, 6]);

        let rows = vec![row(&["Maximilian", "5"])];
        assert_eq!(column_widths(&header, &rows), vec![10, 6]);
    }

    #[test]
    fn widths_count_characters_not_bytes() {
        let header = row(&["Имя"]);
        assert_eq!(column_widths(&header, &[]), vec![3]);
    }

    #[test]
    fn renders_header_separator_and_rows() {
        let header = row(&["Name", "Amount"]);
        let rows = vec![row(&["Ann", "5"]), row(&["Bob", "3"])];
        let expected = "`Name` | `Amount`\n\
                        ------|--------\n\
                        Ann  | 5     \n\
                        Bob  | 3     \n";
        assert_eq!(render_table(&header, &rows), expected);
    }

    #[test]
    fn short_rows_render_only_their_cells() {
        let header = row(&["A", "B", "C"]);
        let rows = vec![row(&["x"])];
        assert_eq!(render_table(&header, &rows), "`A` | `B` | `C`\n---|---|---\nx\n");
    }

    #[test]
    fn overflow_cells_use_their_own_width() {
        let header = row(&["A"]);
        let rows = vec![row(&["x", "long", "z"]), row(&["y", "s"])];
        assert_eq!(render_table(&header, &rows), "`A`\n---\nx | long | z\ny | s\n");
    }

    #[test]
    fn empty_header_renders_rows_only() {
        let rows = vec![row(&["x", "y"])];
        assert_eq!(render_table(&[], &rows), "x | y\n");
    }

    #[test]
    fn render_adds_title() {
        let header = row(&["Name"]);
        let rows = vec![row(&["Ann"])];
        let text = TableRenderer::new(5).render("People", &header, &rows);
        assert!(text.starts_with("Last 1 rows of *People*:\n\n`Name`"));
    }

    #[test]
    fn markdown_metacharacters_are_escaped() {
        let header = row(&["user_id", "note"]);
        let rows = vec![row(&["a_1", "*hi*"])];
        let expected = "`user_id` | `note`\n\
                        ---------|------\n\
                        a\\_1     | \\*hi\\*\n";
        assert_eq!(render_table(&header, &rows), expected);

        let text = TableRenderer::new(5).render("q1_report", &header, &rows);
        assert!(text.starts_with("Last 1 rows of *q1_report*:"));
    }

    #[test]
    fn render_without_rows_is_a_notice() {
        let text = TableRenderer::new(5).render("People", &row(&["Name"]), &[]);
        assert_eq!(text, "Sheet *People* has no data rows yet.");
    }
}
