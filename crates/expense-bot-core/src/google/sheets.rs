//! Google Sheets v4 values API.

use super::{api_url, check_status, GoogleApiError, GoogleAuth};
use crate::sheet::{SheetError, Spreadsheet};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Production Sheets API host
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Sheets client bound to one spreadsheet.
pub struct SheetsClient {
    auth: Arc<GoogleAuth>,
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
}

impl SheetsClient {
    /// Create a client for `spreadsheet_id` on the production API.
    #[must_use]
    pub fn new(
        auth: Arc<GoogleAuth>,
        http: reqwest::Client,
        spreadsheet_id: impl Into<String>,
    ) -> Self {
        Self {
            auth,
            http,
            base_url: SHEETS_API_BASE.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    /// Point the client at another host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn values_url(&self, range: &str) -> Result<reqwest::Url, GoogleApiError> {
        api_url(
            &self.base_url,
            &["v4", "spreadsheets", &self.spreadsheet_id, "values", range],
        )
    }

    async fn get_values(
        &self,
        range: &str,
        major_dimension: &str,
    ) -> Result<ValueRange, GoogleApiError> {
        let url = self.values_url(range)?;
        let token = self.auth.access_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[
                ("majorDimension", major_dimension),
                ("valueRenderOption", "FORMATTED_VALUE"),
            ])
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}

#[async_trait]
impl Spreadsheet for SheetsClient {
    async fn append_row(&self, sheet: &str, row: Vec<Value>) -> Result<(), SheetError> {
        let range = format!("{}!A1:append", quote_sheet_name(sheet));
        let url = self.values_url(&range)?;
        let token = self.auth.access_token().await.map_err(GoogleApiError::from)?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .map_err(GoogleApiError::from)?;
        check_status(response).await?;

        debug!("Appended row to worksheet {}", sheet);
        Ok(())
    }

    async fn read_cell(&self, sheet: &str, address: &str) -> Result<String, SheetError> {
        let range = format!("{}!{address}", quote_sheet_name(sheet));
        let values = self.get_values(&range, "ROWS").await?;
        Ok(values
            .values
            .first()
            .and_then(|row| row.first())
            .map(cell_text)
            .unwrap_or_default())
    }

    async fn read_column(
        &self,
        sheet: &str,
        index: usize,
        skip_rows: usize,
    ) -> Result<Vec<String>, SheetError> {
        let range = column_range(sheet, index, skip_rows)?;
        let values = self.get_values(&range, "COLUMNS").await?;
        Ok(values
            .values
            .into_iter()
            .next()
            .map(|column| column.iter().map(cell_text).collect())
            .unwrap_or_default())
    }

    fn spreadsheet_id(&self) -> String {
        self.spreadsheet_id.clone()
    }
}

/// Quote a worksheet title for use in A1 notation.
fn quote_sheet_name(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// Column letters for a 1-based column index (`1` -> `A`, `27` -> `AA`).
fn column_letter(index: usize) -> Option<String> {
    if index == 0 {
        return None;
    }
    let mut n = index;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + u8::try_from(rem).ok()?));
        n = (n - 1) / 26;
    }
    Some(letters.iter().rev().collect())
}

/// Open-ended A1 range covering column `index` from row `skip_rows + 1` down.
fn column_range(sheet: &str, index: usize, skip_rows: usize) -> Result<String, SheetError> {
    let letter = column_letter(index)
        .ok_or_else(|| SheetError::Backend(format!("Invalid column index {index}")))?;
    Ok(format!(
        "{}!{letter}{}:{letter}",
        quote_sheet_name(sheet),
        skip_rows + 1
    ))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
