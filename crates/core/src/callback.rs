//! Button callback-data codec.
//!
//! Inline buttons carry a short string that comes back verbatim when the
//! button is pressed. The wire strings are fixed:
//!
//! | Action | Encoding |
//! |---|---|
//! | start a draft | `add_new_row_<sheet name>` |
//! | pick a column | `edit_column_index_<n>` |
//! | submit draft | `done_editing` |
//! | discard draft | `cancel_editing` |
//! | sheet list | `back_to_sheet_selection` |
//! | column list | `back_to_column_selection` |
//!
//! A sheet name that itself looks like one of the fixed strings is accepted
//! as-is; the prefix wins.

use std::fmt;

const ADD_NEW_ROW_PREFIX: &str = "add_new_row_";
const EDIT_COLUMN_PREFIX: &str = "edit_column_index_";
const DONE_EDITING: &str = "done_editing";
const CANCEL_EDITING: &str = "cancel_editing";
const BACK_TO_SHEET_SELECTION: &str = "back_to_sheet_selection";
const BACK_TO_COLUMN_SELECTION: &str = "back_to_column_selection";

/// A decoded button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    AddNewRow { sheet_name: String },
    EditColumn { index: usize },
    DoneEditing,
    CancelEditing,
    BackToSheetSelection,
    BackToColumnSelection,
}

impl CallbackAction {
    /// Decode callback data. Returns `None` for anything unrecognized.
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            DONE_EDITING => return Some(Self::DoneEditing),
            CANCEL_EDITING => return Some(Self::CancelEditing),
            BACK_TO_SHEET_SELECTION => return Some(Self::BackToSheetSelection),
            BACK_TO_COLUMN_SELECTION => return Some(Self::BackToColumnSelection),
            _ => {}
        }

        if let Some(sheet_name) = data.strip_prefix(ADD_NEW_ROW_PREFIX) {
            return Some(Self::AddNewRow {
                sheet_name: sheet_name.to_string(),
            });
        }

        data.strip_prefix(EDIT_COLUMN_PREFIX)
            .and_then(|n| n.parse::<usize>().ok())
            .map(|index| Self::EditColumn { index })
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddNewRow { sheet_name } => write!(f, "{ADD_NEW_ROW_PREFIX}{sheet_name}"),
            Self::EditColumn { index } => write!(f, "{EDIT_COLUMN_PREFIX}{index}"),
            Self::DoneEditing => f.write_str(DONE_EDITING),
            Self::CancelEditing => f.write_str(CANCEL_EDITING),
            Self::BackToSheetSelection => f.write_str(BACK_TO_SHEET_SELECTION),
            Self::BackToColumnSelection => f.write_str(BACK_TO_COLUMN_SELECTION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_exact_wire_strings() {
        assert_eq!(
            CallbackAction::AddNewRow {
                sheet_name: "Expenses".into()
            }
            .to_string(),
            "add_new_row_Expenses"
        );
        assert_eq!(CallbackAction::EditColumn { index: 3 }.to_string(), "edit_column_index_3");
        assert_eq!(CallbackAction::DoneEditing.to_string(), "done_editing");
        assert_eq!(CallbackAction::CancelEditing.to_string(), "cancel_editing");
        assert_eq!(
            CallbackAction::BackToSheetSelection.to_string(),
            "back_to_sheet_selection"
        );
        assert_eq!(
            CallbackAction::BackToColumnSelection.to_string(),
            "back_to_column_selection"
        );
    }

    #[test]
    fn sheet_names_keep_spaces_and_underscores() {
        assert_eq!(
            CallbackAction::parse("add_new_row_My sheet_2024"),
            Some(CallbackAction::AddNewRow {
                sheet_name: "My sheet_2024".into()
            })
        );
    }

    #[test]
    fn column_index_must_be_non_negative_integer() {
        assert_eq!(
            CallbackAction::parse("edit_column_index_12"),
            Some(CallbackAction::EditColumn { index: 12 })
        );
        assert_eq!(CallbackAction::parse("edit_column_index_-1"), None);
        assert_eq!(CallbackAction::parse("edit_column_index_abc"), None);
        assert_eq!(CallbackAction::parse("edit_column_index_"), None);
    }

    #[test]
    fn unknown_data_is_rejected() {
        assert_eq!(CallbackAction::parse(""), None);
        assert_eq!(CallbackAction::parse("done"), None);
        assert_eq!(CallbackAction::parse("DONE_EDITING"), None);
    }
}
