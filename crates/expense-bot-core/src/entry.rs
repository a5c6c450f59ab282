//! Expense rows appended to the transactions worksheet.

use crate::parser::ParsedExpense;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde_json::{json, Value};

/// One logged transaction. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseEntry {
    /// Capitalized category
    pub category: String,
    /// Non-negative amount
    pub amount: f64,
    /// Free-text remarks
    pub remarks: String,
    /// Creation time of the entry
    pub recorded_at: DateTime<Utc>,
    /// Receipt link, empty when no fresh receipt was pending
    pub receipt_link: String,
}

impl ExpenseEntry {
    /// Build an entry from a parsed line.
    #[must_use]
    pub fn new(parsed: &ParsedExpense, receipt_link: String, recorded_at: DateTime<Utc>) -> Self {
        Self {
            category: parsed.category.clone(),
            amount: parsed.amount,
            remarks: parsed.remarks.clone(),
            recorded_at,
            receipt_link,
        }
    }

    /// ISO-8601 timestamp in the server's local time zone.
    #[must_use]
    pub fn recorded_at_iso(&self) -> String {
        self.recorded_at
            .with_timezone(&Local)
            .to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    /// Row layout: category, amount, remarks, timestamp, receipt link.
    #[must_use]
    pub fn to_row(&self) -> Vec<Value> {
        vec![
            json!(self.category),
            json!(self.amount),
            json!(self.remarks),
            json!(self.recorded_at_iso()),
            json!(self.receipt_link),
        ]
    }
}
