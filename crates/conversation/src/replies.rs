//! User-facing texts and keyboards.

use std::fmt::Display;

use sheetdraft_core::callback::CallbackAction;
use sheetdraft_core::channel::{InlineButton, InlineKeyboard};

use crate::markdown;
use crate::session::Draft;

pub const WELCOME: &str = "Welcome to sheetdraft!\n\nUse /sheets to see the available sheets.";
pub const NO_SHEETS: &str = "No sheets were found in this spreadsheet.";
pub const CHOOSE_SHEET: &str = "Choose a sheet:";
pub const INVALID_SHEET: &str =
    "Please choose a sheet from the list, or use /sheets to see the available options.";
pub const GENERIC_HINT: &str =
    "Use /sheets to pick a sheet to view, or follow the prompts if you are adding a new row.";
pub const CANCELLED: &str = "Row addition cancelled.";

const EMPTY_CELL: &str = "(empty)";

pub fn no_data(sheet_name: &str) -> String {
    format!("No data in sheet: {sheet_name}")
}

pub fn appended(sheet_name: &str) -> String {
    format!("✅ New row added to {sheet_name}!")
}

pub fn warning(err: &dyn Display) -> String {
    format!("⚠️ {err}")
}

/// Buttons under a sheet preview.
pub fn sheet_actions(sheet_name: &str) -> InlineKeyboard {
    vec![
        vec![button(
            "➕ Add new row",
            CallbackAction::AddNewRow {
                sheet_name: sheet_name.to_string(),
            },
        )],
        vec![button("Back", CallbackAction::BackToSheetSelection)],
    ]
}

/// The draft preview, one line per header column.
pub fn draft_text(draft: &Draft) -> String {
    let preview = draft.preview();
    let mut text = String::from("Current draft of the new row:\n");
    for (i, label) in draft.header.iter().enumerate() {
        let value = preview.get(i).map(String::as_str).unwrap_or(EMPTY_CELL);
        text.push_str(&format!("{}: {}\n", markdown::code(label), markdown::escape(value)));
    }
    text.push_str("\nWhich column do you want to set or change?");
    text
}

/// One button per column, then done and cancel on a shared row.
pub fn column_picker(draft: &Draft) -> InlineKeyboard {
    let mut keyboard: InlineKeyboard = draft
        .header
        .iter()
        .enumerate()
        .map(|(index, label)| vec![button(label, CallbackAction::EditColumn { index })])
        .collect();
    keyboard.push(vec![
        button("✅ Done", CallbackAction::DoneEditing),
        button("❌ Cancel", CallbackAction::CancelEditing),
    ]);
    keyboard
}

pub fn value_prompt(draft: &Draft, column: usize) -> String {
    format!(
        "Editing column: {}\nCurrent value: {}\n\nPlease send the new value for this column.",
        markdown::bold(draft.column_label(column).unwrap_or_default()),
        markdown::code(draft.current_value(column))
    )
}

pub fn value_prompt_keyboard() -> InlineKeyboard {
    vec![vec![button("Back", CallbackAction::BackToColumnSelection)]]
}

fn button(label: &str, action: CallbackAction) -> InlineButton {
    InlineButton::new(label, action.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::PendingEdits;
    use pretty_assertions::assert_eq;

    fn draft(header: &[&str], template: &[&str]) -> Draft {
        Draft {
            sheet_name: "S".into(),
            header: header.iter().map(|s| s.to_string()).collect(),
            template: template.iter().map(|s| s.to_string()).collect(),
            edits: PendingEdits::new(),
        }
    }

    #[test]
    fn draft_text_marks_missing_cells() {
        let mut d = draft(&["Name", "Age", "City"], &["Bob", "30"]);
        d.edits.set(1, "42");
        d.edits.set(2, "Oslo");
        assert_eq!(
            draft_text(&d),
            "Current draft of the new row:\n\
             `Name`: Bob\n\
             `Age`: 42\n\
             `City`: (empty)\n\
             \nWhich column do you want to set or change?"
        );
    }

    #[test]
    fn column_picker_layout() {
        let kb = column_picker(&draft(&["Name", "Age"], &["Bob", "30"]));
        assert_eq!(kb.len(), 3);
        assert_eq!(kb[0][0].callback_data, "edit_column_index_0");
        assert_eq!(kb[1][0].label, "Age");
        assert_eq!(kb[1][0].callback_data, "edit_column_index_1");
        let last: Vec<&str> = kb[2].iter().map(|b| b.callback_data.as_str()).collect();
        assert_eq!(last, vec!["done_editing", "cancel_editing"]);
    }

    #[test]
    fn value_prompt_shows_current_value() {
        let mut d = draft(&["Name", "Age"], &["Bob", "30"]);
        assert!(value_prompt(&d, 1).contains("Current value: `30`"));
        d.edits.set(1, "42");
        assert!(value_prompt(&d, 1).contains("Current value: `42`"));
        assert!(value_prompt(&d, 1).starts_with("Editing column: *Age*"));
    }

    #[test]
    fn draft_and_prompt_escape_cell_text() {
        let mut d = draft(&["e_mail", "Note"], &["a_b@x.io", ""]);
        d.edits.set(1, "`raw`");
        assert!(draft_text(&d).contains("`e_mail`: a\\_b@x.io\n`Note`: \\`raw\\`\n"));
        assert!(value_prompt(&d, 1).starts_with("Editing column: *Note*\nCurrent value: \\``raw`\\`\n"));
    }

    #[test]
    fn sheet_actions_carry_the_sheet_name() {
        let kb = sheet_actions("Budget 2024");
        assert_eq!(kb[0][0].callback_data, "add_new_row_Budget 2024");
        assert_eq!(kb[1][0].callback_data, "back_to_sheet_selection");
    }

    #[test]
    fn warning_is_prefixed() {
        assert_eq!(warning(&"boom"), "⚠️ boom");
    }
}
