//! In-memory spreadsheet: useful for testing and offline runs.

use std::sync::Mutex;

use async_trait::async_trait;
use sheetdraft_core::error::SheetsError;
use sheetdraft_core::sheets::{AppendOptions, Row, SpreadsheetService};
use tokio::sync::RwLock;

/// A record of one `append_row` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendRecord {
    pub sheet_name: String,
    pub row: Row,
    pub options: AppendOptions,
}

/// A single workbook held in memory. The spreadsheet id passed to each call
/// is not checked.
pub struct InMemorySheets {
    sheets: RwLock<Vec<(String, Vec<Row>)>>,
    appends: Mutex<Vec<AppendRecord>>,
    fail_next: Mutex<Option<SheetsError>>,
}

impl InMemorySheets {
    pub fn new() -> Self {
        Self {
            sheets: RwLock::new(Vec::new()),
            appends: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
        }
    }

    /// Add a sheet with the given rows (header first).
    pub fn with_sheet(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        let name = name.into();
        let sheets = self.sheets.get_mut();
        match sheets.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = rows,
            None => sheets.push((name, rows)),
        }
        self
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: SheetsError) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(error);
        }
    }

    /// Every append so far, oldest first.
    pub fn appends(&self) -> Vec<AppendRecord> {
        self.appends.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Current rows of a sheet.
    pub async fn rows(&self, sheet_name: &str) -> Option<Vec<Row>> {
        self.sheets
            .read()
            .await
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, rows)| rows.clone())
    }

    fn take_failure(&self) -> Result<(), SheetsError> {
        match self.fail_next.lock().ok().and_then(|mut slot| slot.take()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for InMemorySheets {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpreadsheetService for InMemorySheets {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn list_sheet_names(&self, _spreadsheet_id: &str) -> Result<Vec<String>, SheetsError> {
        self.take_failure()?;
        Ok(self
            .sheets
            .read()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn read_all_rows(
        &self,
        _spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<Vec<Row>, SheetsError> {
        self.take_failure()?;
        self.rows(sheet_name)
            .await
            .ok_or_else(|| SheetsError::SheetNotFound(sheet_name.to_string()))
    }

    async fn append_row(
        &self,
        _spreadsheet_id: &str,
        sheet_name: &str,
        row: &[String],
        options: AppendOptions,
    ) -> Result<(), SheetsError> {
        self.take_failure()?;
        let mut sheets = self.sheets.write().await;
        let (_, rows) = sheets
            .iter_mut()
            .find(|(name, _)| name == sheet_name)
            .ok_or_else(|| SheetsError::SheetNotFound(sheet_name.to_string()))?;
        rows.push(row.to_vec());

        if let Ok(mut appends) = self.appends.lock() {
            appends.push(AppendRecord {
                sheet_name: sheet_name.to_string(),
                row: row.to_vec(),
                options,
            });
        }
        Ok(())
    }
}
