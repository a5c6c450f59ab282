//! Monthly report rendering.
//!
//! The spreadsheet does the aggregation; the bot only reads the dashboard
//! cells and formats them.

use crate::sheet::{SheetError, Spreadsheet};
use std::fmt::Write;

/// Cell holding the monthly total.
pub const TOTAL_CELL: &str = "A2";
/// Column with category names (1-based).
pub const CATEGORY_NAME_COLUMN: usize = 2;
/// Column with category totals (1-based).
pub const CATEGORY_TOTAL_COLUMN: usize = 3;
/// Header rows above the category table.
pub const CATEGORY_HEADER_ROWS: usize = 3;

/// Aggregates read from the dashboard worksheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlyReport {
    /// Monthly total as displayed by the sheet
    pub total: String,
    /// `(category, total)` pairs in sheet row order
    pub breakdown: Vec<(String, String)>,
}

impl MonthlyReport {
    /// Read the report from `dashboard`.
    ///
    /// Names and totals are paired by row; the shorter column bounds the list.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the reads fails.
    pub async fn load(sheet: &dyn Spreadsheet, dashboard: &str) -> Result<Self, SheetError> {
        let total = sheet.read_cell(dashboard, TOTAL_CELL).await?;
        let names = sheet
            .read_column(dashboard, CATEGORY_NAME_COLUMN, CATEGORY_HEADER_ROWS)
            .await?;
        let totals = sheet
            .read_column(dashboard, CATEGORY_TOTAL_COLUMN, CATEGORY_HEADER_ROWS)
            .await?;

        Ok(Self {
            total,
            breakdown: names.into_iter().zip(totals).collect(),
        })
    }

    /// Render the report text.
    ///
    /// # Examples
    ///
    /// ```
    /// use expense_bot_core::report::MonthlyReport;
    ///
    /// let report = MonthlyReport {
    ///     total: "700".to_string(),
    ///     breakdown: vec![("Food".to_string(), "700".to_string())],
    /// };
    /// assert_eq!(
    ///     report.render("₹"),
    ///     "📊 Monthly Report\nTotal: ₹700\nBreakdown:\nFood: ₹700\n"
    /// );
    /// ```
    #[must_use]
    pub fn render(&self, currency: &str) -> String {
        let mut text = format!(
            "📊 Monthly Report\nTotal: {currency}{}\nBreakdown:\n",
            self.total
        );
        for (name, total) in &self.breakdown {
            let _ = writeln!(text, "{name}: {currency}{total}");
        }
        text
    }
}
