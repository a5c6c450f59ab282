#![deny(missing_docs)]
//! Expense bot core library.
//!
//! Transport-agnostic logic for receipt sessions, expense parsing, report
//! rendering, and the storage / spreadsheet backends.

/// Sender allow-list.
pub mod access;
/// Configuration management.
pub mod config;
/// Service-account credential loading.
pub mod credentials;
/// Expense rows.
pub mod entry;
/// Google API clients (auth, Drive, Sheets).
pub mod google;
/// Expense line parsing.
pub mod parser;
/// Monthly report rendering.
pub mod report;
/// Pending receipt sessions.
pub mod session;
/// Spreadsheet backend interface.
pub mod sheet;
/// Receipt object storage (Drive / R2).
pub mod storage;
/// Event handling service.
pub mod tracker;
/// Utility functions.
pub mod utils;

#[cfg(test)]
pub mod testing;
