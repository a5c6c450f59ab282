//! Spreadsheet backend interface.
//!
//! Rows are appended to a transactions worksheet; the report reads aggregate
//! cells that the spreadsheet computes itself.

use crate::google::GoogleApiError;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during spreadsheet operations
#[derive(Error, Debug)]
pub enum SheetError {
    /// Google Sheets call failed
    #[error(transparent)]
    Api(#[from] GoogleApiError),
    /// Backend specific failure
    #[error("{0}")]
    Backend(String),
}

/// Interface for spreadsheet providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Spreadsheet: Send + Sync {
    /// Append one row after the last non-empty row of `sheet`.
    async fn append_row(&self, sheet: &str, row: Vec<Value>) -> Result<(), SheetError>;
    /// Read the formatted value of a single cell (`"A2"`). Empty cells read as `""`.
    async fn read_cell(&self, sheet: &str, address: &str) -> Result<String, SheetError>;
    /// Read column `index` (1-based) skipping the first `skip_rows` rows.
    async fn read_column(
        &self,
        sheet: &str,
        index: usize,
        skip_rows: usize,
    ) -> Result<Vec<String>, SheetError>;
    /// Identifier of the backing spreadsheet
    fn spreadsheet_id(&self) -> String;
}

/// Link to the spreadsheet's first worksheet in the Google Sheets UI
#[must_use]
pub fn spreadsheet_link(spreadsheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{spreadsheet_id}/edit?gid=0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spreadsheet_link() {
        assert_eq!(
            spreadsheet_link("1AbC"),
            "https://docs.google.com/spreadsheets/d/1AbC/edit?gid=0"
        );
    }
}
