//! Google Sheets v4 backend.
//!
//! Talks to the REST API with a service-account bearer token:
//! - `GET  spreadsheets/{id}?fields=sheets.properties.title`: sheet titles
//! - `GET  spreadsheets/{id}/values/{range}`: every row of a sheet
//! - `POST spreadsheets/{id}/values/{range}:append`: insert one row

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use sheetdraft_config::RangeQuoting;
use sheetdraft_core::error::SheetsError;
use sheetdraft_core::sheets::{
    AppendOptions, InsertMode, Row, SpreadsheetService, ValueInputMode,
};
use tracing::{debug, warn};

use crate::auth::{ServiceAccountAuth, ServiceAccountKey};
use crate::range::range_path_segment;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// A Google Sheets client bound to one service account.
pub struct GoogleSheetsClient {
    base_url: String,
    client: reqwest::Client,
    auth: ServiceAccountAuth,
    quoting: RangeQuoting,
}

impl GoogleSheetsClient {
    /// Create a client from a service-account key file.
    pub fn from_credentials_file(path: &Path, quoting: RangeQuoting) -> Result<Self, SheetsError> {
        let key = ServiceAccountKey::from_file(path)?;
        Self::new(key, quoting)
    }

    pub fn new(key: ServiceAccountKey, quoting: RangeQuoting) -> Result<Self, SheetsError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sheetdraft/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SheetsError::Network(format!("failed to create HTTP client: {e}")))?;
        let auth = ServiceAccountAuth::new(key, client.clone())?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.into(),
            client,
            auth,
            quoting,
        })
    }

    /// Point the client at a different API root (proxies, emulators).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn values_url(&self, spreadsheet_id: &str, sheet_name: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url,
            urlencoding::encode(spreadsheet_id),
            range_path_segment(sheet_name, self.quoting)
        )
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, SheetsError> {
        let token = self.auth.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SheetsError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 200 {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = api_error_message(&body);
        warn!(status, message = %message, "Sheets API returned error");

        if status == 401 || status == 403 {
            // A revoked or expired token must not be served again.
            self.auth.invalidate().await;
            return Err(SheetsError::AuthenticationFailed(message));
        }
        Err(SheetsError::Api {
            status_code: status,
            message,
        })
    }
}

#[async_trait]
impl SpreadsheetService for GoogleSheetsClient {
    fn name(&self) -> &str {
        "google_sheets"
    }

    async fn list_sheet_names(&self, spreadsheet_id: &str) -> Result<Vec<String>, SheetsError> {
        let url = format!(
            "{}/spreadsheets/{}",
            self.base_url,
            urlencoding::encode(spreadsheet_id)
        );
        debug!(spreadsheet_id, "Listing sheets");

        let response = self
            .send(
                self.client
                    .get(&url)
                    .query(&[("fields", "sheets.properties.title")]),
            )
            .await?;
        let body: SpreadsheetMeta = response
            .json()
            .await
            .map_err(|e| SheetsError::InvalidResponse(e.to_string()))?;

        Ok(body.titles())
    }

    async fn read_all_rows(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<Vec<Row>, SheetsError> {
        let url = self.values_url(spreadsheet_id, sheet_name);
        debug!(spreadsheet_id, sheet = %sheet_name, "Reading sheet values");

        let response = self.send(self.client.get(&url)).await?;
        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetsError::InvalidResponse(e.to_string()))?;

        Ok(body.rows())
    }

    async fn append_row(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        row: &[String],
        options: AppendOptions,
    ) -> Result<(), SheetsError> {
        let url = format!("{}:append", self.values_url(spreadsheet_id, sheet_name));
        debug!(spreadsheet_id, sheet = %sheet_name, cells = row.len(), "Appending row");

        let body = serde_json::json!({ "values": [row] });
        self.send(
            self.client
                .post(&url)
                .query(&[
                    ("valueInputOption", value_input_option(options.value_mode)),
                    ("insertDataOption", insert_data_option(options.insert_mode)),
                ])
                .json(&body),
        )
        .await?;

        Ok(())
    }
}

fn value_input_option(mode: ValueInputMode) -> &'static str {
    match mode {
        ValueInputMode::Raw => "RAW",
        ValueInputMode::AsTyped => "USER_ENTERED",
    }
}

fn insert_data_option(mode: InsertMode) -> &'static str {
    match mode {
        InsertMode::Overwrite => "OVERWRITE",
        InsertMode::InsertRows => "INSERT_ROWS",
    }
}

// --- API payloads ---

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

impl SpreadsheetMeta {
    fn titles(self) -> Vec<String> {
        self.sheets.into_iter().map(|s| s.properties.title).collect()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl ValueRange {
    fn rows(self) -> Vec<Row> {
        self.values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect()
    }
}

/// Render a cell the way it reads in the sheet.
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_JSON: &str = include_str!("../testdata/service_account.json");

    fn client(quoting: RangeQuoting) -> GoogleSheetsClient {
        GoogleSheetsClient::new(ServiceAccountKey::from_json(KEY_JSON).unwrap(), quoting).unwrap()
    }

    #[test]
    fn parses_sheet_titles_in_order() {
        let meta: SpreadsheetMeta = serde_json::from_str(
            r#"{"sheets":[{"properties":{"title":"Budget"}},{"properties":{"title":"Log"}}]}"#,
        )
        .unwrap();
        assert_eq!(meta.titles(), vec!["Budget", "Log"]);
    }

    #[test]
    fn empty_spreadsheet_has_no_titles() {
        let meta: SpreadsheetMeta = serde_json::from_str("{}").unwrap();
        assert!(meta.titles().is_empty());
    }

    #[test]
    fn values_are_stringified() {
        let range: ValueRange = serde_json::from_str(
            r#"{"range":"Sheet1!A1:C2","majorDimension":"ROWS","values":[["Name","Amount"],["Ann",5,true,null]]}"#,
        )
        .unwrap();
        assert_eq!(
            range.rows(),
            vec![
                vec!["Name".to_string(), "Amount".to_string()],
                vec!["Ann".to_string(), "5".to_string(), "true".to_string(), String::new()],
            ]
        );
    }

    #[test]
    fn missing_values_means_empty_sheet() {
        let range: ValueRange = serde_json::from_str(r#"{"range":"Empty!A1:Z1000"}"#).unwrap();
        assert!(range.rows().is_empty());
    }

    #[test]
    fn extracts_google_error_message() {
        let body = r#"{"error":{"code":400,"message":"Unable to parse range: Foo","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(body), "Unable to parse range: Foo");
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn append_options_map_to_api_values() {
        assert_eq!(value_input_option(ValueInputMode::AsTyped), "USER_ENTERED");
        assert_eq!(value_input_option(ValueInputMode::Raw), "RAW");
        assert_eq!(insert_data_option(InsertMode::InsertRows), "INSERT_ROWS");
        assert_eq!(insert_data_option(InsertMode::Overwrite), "OVERWRITE");
    }

    #[test]
    fn values_url_uses_configured_quoting() {
        let legacy = client(RangeQuoting::Utf16Form);
        assert_eq!(
            legacy.values_url("abc123", "My Sheet"),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/My%2BSheet"
        );

        let a1 = client(RangeQuoting::A1).with_base_url("http://localhost:9000/v4/");
        assert_eq!(
            a1.values_url("abc123", "My Sheet"),
            "http://localhost:9000/v4/spreadsheets/abc123/values/%27My%20Sheet%27"
        );
    }
}
