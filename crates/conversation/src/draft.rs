//! Draft rows: a template row plus sparse pending edits.
//!
//! A draft starts from a template (usually the sheet's last data row) and
//! accumulates column overrides until it is submitted. Two views exist:
//! the *preview*, which only overlays edits that fall inside the template,
//! and the *finalized* row, which realizes every edit and pads the row out
//! to the header width.

use std::collections::BTreeMap;

use sheetdraft_core::sheets::Row;

/// Column index → new cell value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingEdits(BTreeMap<usize, String>);

impl PendingEdits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the value for a column.
    pub fn set(&mut self, index: usize, value: impl Into<String>) {
        self.0.insert(index, value.into());
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.0.iter().map(|(i, v)| (*i, v.as_str()))
    }
}

impl FromIterator<(usize, String)> for PendingEdits {
    fn from_iter<I: IntoIterator<Item = (usize, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The template with in-range edits applied.
pub fn preview_row(template: &[String], edits: &PendingEdits) -> Row {
    let mut row = template.to_vec();
    for (index, value) in edits.iter() {
        if let Some(cell) = row.get_mut(index) {
            *cell = value.to_string();
        }
    }
    row
}

/// The row to submit: every edit applied, then padded to `header_len`.
pub fn finalize_row(template: &[String], edits: &PendingEdits, header_len: usize) -> Row {
    let mut row = template.to_vec();
    for (index, value) in edits.iter() {
        if index >= row.len() {
            row.resize(index + 1, String::new());
        }
        row[index] = value.to_string();
    }
    if row.len() < header_len {
        row.resize(header_len, String::new());
    }
    row
}

/// The baseline for a new row: the last data row, else an empty row as wide
/// as the header, else nothing.
pub fn derive_template(header: &[String], data_rows: &[Row]) -> Row {
    match data_rows.last() {
        Some(last) => last.clone(),
        None => vec![String::new(); header.len()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn edits(pairs: &[(usize, &str)]) -> PendingEdits {
        pairs.iter().map(|(i, v)| (*i, v.to_string())).collect()
    }

    #[test]
    fn finalize_overwrites_in_place() {
        let out = finalize_row(&row(&["a", "b", "c"]), &edits(&[(1, "foo")]), 3);
        assert_eq!(out, row(&["a", "foo", "c"]));
    }

    #[test]
    fn finalize_extends_for_out_of_range_edit() {
        let out = finalize_row(&row(&["a"]), &edits(&[(2, "z")]), 3);
        assert_eq!(out, row(&["a", "", "z"]));
    }

    #[test]
    fn finalize_pads_to_header_width() {
        let out = finalize_row(&row(&["a"]), &PendingEdits::new(), 4);
        assert_eq!(out, row(&["a", "", "", ""]));
    }

    #[test]
    fn finalize_keeps_edits_beyond_header() {
        let out = finalize_row(&row(&["a", "b"]), &edits(&[(4, "x")]), 2);
        assert_eq!(out, row(&["a", "b", "", "", "x"]));
    }

    #[test]
    fn finalize_never_shrinks_a_wide_template() {
        let out = finalize_row(&row(&["a", "b", "c", "d"]), &PendingEdits::new(), 2);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn preview_ignores_out_of_range_edits() {
        let out = preview_row(&row(&["a", "b"]), &edits(&[(0, "x"), (5, "y")]));
        assert_eq!(out, row(&["x", "b"]));
    }

    #[test]
    fn later_set_replaces_earlier_value() {
        let mut e = PendingEdits::new();
        e.set(1, "first");
        e.set(1, "second");
        assert_eq!(e.len(), 1);
        assert_eq!(e.get(1), Some("second"));
    }

    #[test]
    fn template_prefers_last_data_row() {
        let header = row(&["Name", "Amount"]);
        let data = vec![row(&["Ann", "5"]), row(&["Bob", "3"])];
        assert_eq!(derive_template(&header, &data), row(&["Bob", "3"]));
    }

    #[test]
    fn template_falls_back_to_empty_header_width() {
        assert_eq!(derive_template(&row(&["Name", "Amount"]), &[]), row(&["", ""]));
        assert!(derive_template(&[], &[]).is_empty());
    }
}
