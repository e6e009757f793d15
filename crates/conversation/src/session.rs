//! Per-chat conversation state.
//!
//! The header and template of the last fetched sheet live beside the stage
//! and change only when a sheet is fetched again, so going back to the sheet
//! list keeps them for a later "add new row". Each stage carries exactly the
//! data it needs: a draft only while a row is being composed, and a column
//! index only while a value is awaited.

use std::fmt;

use sheetdraft_core::error::ConversationError;
use sheetdraft_core::sheets::Row;

use crate::draft::{PendingEdits, derive_template, finalize_row, preview_row};

/// The externally visible conversation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    SelectingSheet,
    AwaitingColumnToEdit,
    AwaitingNewValueForEdit,
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::SelectingSheet => "selecting_sheet",
            Self::AwaitingColumnToEdit => "awaiting_column_to_edit",
            Self::AwaitingNewValueForEdit => "awaiting_new_value_for_edit",
        };
        f.write_str(s)
    }
}

/// Header and template captured when a sheet was last fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSnapshot {
    pub sheet_name: String,
    pub header: Row,
    pub template: Row,
}

impl SheetSnapshot {
    /// Build from a sheet's full contents; the first row is the header.
    pub fn from_rows(sheet_name: impl Into<String>, rows: &[Row]) -> Self {
        let (header, data) = match rows.split_first() {
            Some((header, data)) => (header.clone(), data),
            None => (Row::new(), rows),
        };
        let template = derive_template(&header, data);
        Self {
            sheet_name: sheet_name.into(),
            header,
            template,
        }
    }
}

/// A row being composed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub sheet_name: String,
    pub header: Row,
    pub template: Row,
    pub edits: PendingEdits,
}

impl Draft {
    pub fn preview(&self) -> Row {
        preview_row(&self.template, &self.edits)
    }

    pub fn finalize(&self) -> Row {
        finalize_row(&self.template, &self.edits, self.header.len())
    }

    pub fn column_label(&self, column: usize) -> Option<&str> {
        self.header.get(column).map(String::as_str)
    }

    /// The pending edit, else the template cell, else empty.
    pub fn current_value(&self, column: usize) -> &str {
        self.edits
            .get(column)
            .or_else(|| self.template.get(column).map(String::as_str))
            .unwrap_or("")
    }
}

/// Where a chat currently is, with the data that stage owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Idle,
    /// The sheet list or a sheet preview is on screen.
    SelectingSheet,
    AwaitingColumnToEdit(Draft),
    AwaitingNewValueForEdit { draft: Draft, column: usize },
}

/// One chat's conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    available_sheets: Vec<String>,
    last_sheet: Option<SheetSnapshot>,
    stage: Stage,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConversationState {
        match self.stage {
            Stage::Idle => ConversationState::Idle,
            Stage::SelectingSheet => ConversationState::SelectingSheet,
            Stage::AwaitingColumnToEdit(_) => ConversationState::AwaitingColumnToEdit,
            Stage::AwaitingNewValueForEdit { .. } => ConversationState::AwaitingNewValueForEdit,
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn available_sheets(&self) -> &[String] {
        &self.available_sheets
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.available_sheets.iter().any(|s| s == name)
    }

    /// The last fetched sheet, kept across list views and finished drafts.
    pub fn snapshot(&self) -> Option<&SheetSnapshot> {
        self.last_sheet.as_ref()
    }

    /// The current draft, or an error telling the user there is none.
    pub fn require_draft(&self) -> Result<&Draft, ConversationError> {
        self.draft().ok_or_else(no_draft)
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.stage {
            Stage::AwaitingColumnToEdit(draft) | Stage::AwaitingNewValueForEdit { draft, .. } => {
                Some(draft)
            }
            _ => None,
        }
    }

    /// Header of the current draft, else of the last fetched sheet.
    pub fn header_row(&self) -> &[String] {
        match (self.draft(), &self.last_sheet) {
            (Some(draft), _) => &draft.header,
            (None, Some(snapshot)) => &snapshot.header,
            (None, None) => &[],
        }
    }

    pub fn template_row(&self) -> &[String] {
        match (self.draft(), &self.last_sheet) {
            (Some(draft), _) => &draft.template,
            (None, Some(snapshot)) => &snapshot.template,
            (None, None) => &[],
        }
    }

    pub fn pending_edits(&self) -> Option<&PendingEdits> {
        self.draft().map(|d| &d.edits)
    }

    pub fn sheet_name_for_editing(&self) -> Option<&str> {
        self.draft().map(|d| d.sheet_name.as_str())
    }

    pub fn column_index_being_edited(&self) -> Option<usize> {
        match self.stage {
            Stage::AwaitingNewValueForEdit { column, .. } => Some(column),
            _ => None,
        }
    }

    // --- transitions ---

    /// Offer a new sheet list. A draft in progress is dropped; the last
    /// fetched sheet is kept.
    pub fn show_sheet_list(&mut self, sheets: Vec<String>) {
        self.available_sheets = sheets;
        self.stage = Stage::SelectingSheet;
    }

    /// Remember the sheet that was just fetched and previewed.
    pub fn view_sheet(&mut self, snapshot: SheetSnapshot) {
        self.last_sheet = Some(snapshot);
        self.stage = Stage::SelectingSheet;
    }

    /// Start a draft for `sheet_name` from the last fetched header and
    /// template. An existing draft is restarted with its edits discarded.
    ///
    /// Fails, leaving the session in [`Stage::Idle`], when no header is known.
    pub fn begin_draft(&mut self, sheet_name: &str) -> Result<(), ConversationError> {
        let snapshot = match &self.last_sheet {
            Some(snapshot) if !snapshot.header.is_empty() => snapshot,
            _ => {
                self.stage = Stage::Idle;
                return Err(ConversationError::InvalidInput(
                    "Cannot add a row: no header row is known for this sheet. \
                     Use /sheets and open the sheet again."
                        .into(),
                ));
            }
        };
        self.stage = Stage::AwaitingColumnToEdit(Draft {
            sheet_name: sheet_name.to_string(),
            header: snapshot.header.clone(),
            template: snapshot.template.clone(),
            edits: PendingEdits::new(),
        });
        Ok(())
    }

    /// Pick the column to edit. Out-of-range indices are rejected and the
    /// session is left untouched.
    pub fn select_column(&mut self, column: usize) -> Result<(), ConversationError> {
        let width = self.require_draft()?.header.len();
        if column >= width {
            return Err(ConversationError::InvalidInput(format!(
                "Column {column} does not exist in this sheet."
            )));
        }
        if let Some(draft) = self.take_draft() {
            self.stage = Stage::AwaitingNewValueForEdit { draft, column };
        }
        Ok(())
    }

    /// Store the awaited value and go back to column selection.
    pub fn record_value(&mut self, value: &str) -> Result<(), ConversationError> {
        match std::mem::take(&mut self.stage) {
            Stage::AwaitingNewValueForEdit { mut draft, column } => {
                draft.edits.set(column, value);
                self.stage = Stage::AwaitingColumnToEdit(draft);
                Ok(())
            }
            other => {
                self.stage = other;
                Err(no_draft())
            }
        }
    }

    /// Leave value entry without recording anything.
    pub fn back_to_columns(&mut self) -> Result<(), ConversationError> {
        match self.take_draft() {
            Some(draft) => {
                self.stage = Stage::AwaitingColumnToEdit(draft);
                Ok(())
            }
            None => Err(no_draft()),
        }
    }

    /// Remove and return the draft, if any. The stage becomes
    /// [`Stage::SelectingSheet`].
    pub fn finish_draft(&mut self) -> Option<Draft> {
        let draft = self.take_draft();
        self.stage = Stage::SelectingSheet;
        draft
    }

    fn take_draft(&mut self) -> Option<Draft> {
        match std::mem::take(&mut self.stage) {
            Stage::AwaitingColumnToEdit(draft) | Stage::AwaitingNewValueForEdit { draft, .. } => {
                Some(draft)
            }
            other => {
                self.stage = other;
                None
            }
        }
    }
}

fn no_draft() -> ConversationError {
    ConversationError::InvalidInput("There is no row being edited. Use /sheets to start.".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn viewing(sheet: &str, rows: &[Row]) -> Session {
        let mut session = Session::new();
        session.show_sheet_list(vec![sheet.to_string()]);
        session.view_sheet(SheetSnapshot::from_rows(sheet, rows));
        session
    }

    #[test]
    fn new_session_is_idle() {
        let session = Session::new();
        assert_eq!(session.state(), ConversationState::Idle);
        assert!(session.header_row().is_empty());
        assert!(session.pending_edits().is_none());
    }

    #[test]
    fn viewing_a_sheet_still_reports_selecting() {
        let session = viewing("People", &[row(&["Name"]), row(&["Ann"])]);
        assert_eq!(session.state(), ConversationState::SelectingSheet);
        assert_eq!(session.header_row(), row(&["Name"]).as_slice());
        assert_eq!(session.template_row(), row(&["Ann"]).as_slice());
    }

    #[test]
    fn snapshot_of_empty_sheet_has_no_header() {
        let snapshot = SheetSnapshot::from_rows("Empty", &[]);
        assert!(snapshot.header.is_empty());
        assert!(snapshot.template.is_empty());
    }

    #[test]
    fn snapshot_of_header_only_sheet_has_blank_template() {
        let snapshot = SheetSnapshot::from_rows("S", &[row(&["A", "B"])]);
        assert_eq!(snapshot.template, row(&["", ""]));
    }

    #[test]
    fn begin_draft_uses_callback_sheet_name() {
        let mut session = viewing("People", &[row(&["Name"]), row(&["Ann"])]);
        session.begin_draft("Other").unwrap();
        assert_eq!(session.draft().unwrap().sheet_name, "Other");
        assert_eq!(session.state(), ConversationState::AwaitingColumnToEdit);
        assert_eq!(session.sheet_name_for_editing(), Some("Other"));
        assert!(session.pending_edits().unwrap().is_empty());
    }

    #[test]
    fn begin_draft_without_header_goes_idle() {
        let mut session = Session::new();
        session.show_sheet_list(vec!["People".into()]);
        assert!(session.begin_draft("People").is_err());
        assert_eq!(session.state(), ConversationState::Idle);
    }

    #[test]
    fn begin_draft_restarts_an_existing_draft() {
        let mut session = viewing("S", &[row(&["A"]), row(&["1"])]);
        session.begin_draft("S").unwrap();
        session.select_column(0).unwrap();
        session.record_value("x").unwrap();

        session.begin_draft("S").unwrap();
        assert_eq!(session.state(), ConversationState::AwaitingColumnToEdit);
        assert!(session.pending_edits().unwrap().is_empty());
        assert_eq!(session.header_row(), row(&["A"]).as_slice());
    }

    #[test]
    fn select_record_and_return() {
        let mut session = viewing("S", &[row(&["Name", "Age"]), row(&["Bob", "30"])]);
        session.begin_draft("S").unwrap();

        session.select_column(1).unwrap();
        assert_eq!(session.state(), ConversationState::AwaitingNewValueForEdit);
        assert_eq!(session.column_index_being_edited(), Some(1));
        assert_eq!(session.draft().unwrap().current_value(1), "30");

        session.record_value("42").unwrap();
        assert_eq!(session.draft().unwrap().preview(), row(&["Bob", "42"]));
        assert_eq!(session.state(), ConversationState::AwaitingColumnToEdit);
        assert_eq!(session.column_index_being_edited(), None);
    }

    #[test]
    fn out_of_range_column_is_rejected_without_transition() {
        let mut session = viewing("S", &[row(&["Name"]), row(&["Bob"])]);
        session.begin_draft("S").unwrap();
        let before = session.clone();
        assert!(session.select_column(1).is_err());
        assert_eq!(session, before);
    }

    #[test]
    fn select_column_from_value_entry_switches_column() {
        let mut session = viewing("S", &[row(&["A", "B"]), row(&["1", "2"])]);
        session.begin_draft("S").unwrap();
        session.select_column(0).unwrap();
        session.select_column(1).unwrap();
        assert_eq!(session.column_index_being_edited(), Some(1));
    }

    #[test]
    fn record_value_outside_value_entry_is_an_error() {
        let mut session = viewing("S", &[row(&["A"])]);
        assert!(session.record_value("x").is_err());
        assert_eq!(session.state(), ConversationState::SelectingSheet);
        assert!(session.snapshot().is_some());
    }

    #[test]
    fn back_to_columns_keeps_edits() {
        let mut session = viewing("S", &[row(&["A", "B"]), row(&["1", "2"])]);
        session.begin_draft("S").unwrap();
        session.select_column(0).unwrap();
        session.record_value("x").unwrap();
        session.select_column(1).unwrap();
        session.back_to_columns().unwrap();
        assert_eq!(session.state(), ConversationState::AwaitingColumnToEdit);
        assert_eq!(session.pending_edits().unwrap().get(0), Some("x"));
        assert_eq!(session.pending_edits().unwrap().get(1), None);
    }

    #[test]
    fn finish_draft_clears_the_draft_but_keeps_the_sheet() {
        let mut session = viewing("S", &[row(&["A"]), row(&["1"])]);
        session.begin_draft("S").unwrap();
        let draft = session.finish_draft().unwrap();
        assert_eq!(draft.finalize(), row(&["1"]));
        assert_eq!(session.state(), ConversationState::SelectingSheet);
        assert_eq!(session.header_row(), row(&["A"]).as_slice());
        assert!(session.pending_edits().is_none());
        assert!(session.sheet_name_for_editing().is_none());
    }

    #[test]
    fn showing_the_list_keeps_the_last_sheet() {
        let mut session = viewing("S", &[row(&["A"])]);
        session.show_sheet_list(vec!["S".into(), "T".into()]);
        assert_eq!(session.snapshot().unwrap().sheet_name, "S");
        assert!(session.has_sheet("T"));
        assert!(!session.has_sheet("U"));
    }

    #[test]
    fn draft_can_start_again_after_the_list_is_shown() {
        let mut session = viewing("S", &[row(&["A", "B"]), row(&["1", "2"])]);
        session.begin_draft("S").unwrap();
        session.select_column(0).unwrap();
        session.record_value("x").unwrap();
        session.show_sheet_list(vec!["S".into()]);
        assert!(session.draft().is_none());

        session.begin_draft("S").unwrap();
        assert_eq!(session.state(), ConversationState::AwaitingColumnToEdit);
        assert_eq!(session.template_row(), row(&["1", "2"]).as_slice());
        assert!(session.pending_edits().unwrap().is_empty());
    }
}
