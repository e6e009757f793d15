//! Spreadsheet trait: the abstraction over the remote tabular dataset.
//!
//! A spreadsheet holds named sheets; each sheet is an ordered list of rows
//! whose first row, when present, is the header.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SheetsError;

/// One row of cell values, left to right.
pub type Row = Vec<String>;

/// How appended values are interpreted by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueInputMode {
    /// Stored verbatim
    Raw,
    /// Parsed as if typed into the UI (numbers, dates, formulas)
    #[default]
    AsTyped,
}

/// Where appended rows land.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertMode {
    /// Write into empty cells after the table
    Overwrite,
    /// Insert fresh rows after the table
    #[default]
    InsertRows,
}

/// Options for [`SpreadsheetService::append_row`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendOptions {
    pub value_mode: ValueInputMode,
    pub insert_mode: InsertMode,
}

/// The core spreadsheet trait.
///
/// Implementations: Google Sheets (HTTP), in-memory (for testing).
#[async_trait]
pub trait SpreadsheetService: Send + Sync {
    /// The backend name (e.g., "google_sheets", "in_memory").
    fn name(&self) -> &str;

    /// Sheet titles in spreadsheet order.
    async fn list_sheet_names(&self, spreadsheet_id: &str) -> Result<Vec<String>, SheetsError>;

    /// Every row of a sheet; the first row is the header if present.
    async fn read_all_rows(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<Vec<Row>, SheetsError>;

    /// Append one row after the sheet's last row.
    async fn append_row(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        row: &[String],
        options: AppendOptions,
    ) -> Result<(), SheetsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_append_inserts_as_typed() {
        let opts = AppendOptions::default();
        assert_eq!(opts.value_mode, ValueInputMode::AsTyped);
        assert_eq!(opts.insert_mode, InsertMode::InsertRows);
    }
}
