//! Spreadsheet backends for sheetdraft.
//!
//! - [`GoogleSheetsClient`]: Google Sheets v4 over HTTPS with a service account
//! - [`InMemorySheets`]: a workbook held in memory, for tests and offline runs

pub mod auth;
pub mod google;
pub mod in_memory;
pub mod range;

pub use auth::{ServiceAccountAuth, ServiceAccountKey};
pub use google::GoogleSheetsClient;
pub use in_memory::{AppendRecord, InMemorySheets};
pub use range::{quote_sheet_name, range_path_segment};
