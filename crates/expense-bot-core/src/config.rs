//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines
//! tuning constants.

use crate::credentials::CredentialSource;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where uploaded receipt photos are stored.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptBackend {
    /// Google Drive folder (shareable `webViewLink`).
    #[default]
    Drive,
    /// Cloudflare R2 / S3-compatible bucket.
    R2,
}

/// What happens to an expense line that arrives after its receipt expired.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpiredReceiptPolicy {
    /// Reply with the expiry notice and record nothing.
    #[default]
    Discard,
    /// Record the expense without a receipt link, then send the expiry notice.
    RecordWithoutReceipt,
}

/// Core settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TrackerSettings {
    /// Title of the backing spreadsheet
    #[serde(default = "default_sheet_name")]
    pub google_sheet_name: String,
    /// Spreadsheet ID; when unset the spreadsheet is looked up by title
    pub google_spreadsheet_id: Option<String>,
    /// Worksheet that receives expense rows
    #[serde(default = "default_transactions_worksheet")]
    pub transactions_worksheet: String,
    /// Worksheet holding the report aggregates
    #[serde(default = "default_dashboard_worksheet")]
    pub dashboard_worksheet: String,

    /// Path to the service account key file
    #[serde(default = "default_credentials_file")]
    pub google_credentials_file: String,
    /// Inline service account JSON, preferred over the file when present
    pub google_credentials_json: Option<String>,

    /// Storage backend for receipt photos
    #[serde(default)]
    pub receipt_backend: ReceiptBackend,
    /// Drive folder ID for receipts
    pub drive_folder_id: Option<String>,
    /// Key prefix for receipts in the R2 bucket
    #[serde(default = "default_receipt_folder")]
    pub receipt_folder: String,

    /// R2 Storage access key ID
    pub r2_access_key_id: Option<String>,
    /// R2 Storage secret access key
    pub r2_secret_access_key: Option<String>,
    /// R2 Storage endpoint URL
    pub r2_endpoint_url: Option<String>,
    /// R2 Storage bucket name
    pub r2_bucket_name: Option<String>,
    /// Public base URL of the bucket; presigned links are used when unset
    pub r2_public_url: Option<String>,

    /// Seconds an uploaded receipt waits for its expense line
    #[serde(default = "default_receipt_ttl_secs")]
    pub receipt_ttl_secs: u64,
    /// Handling of expense lines that arrive after the receipt expired
    #[serde(default)]
    pub expired_receipt_policy: ExpiredReceiptPolicy,
    /// Currency symbol used in replies
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    /// Directory for temporary photo files
    pub receipt_temp_dir: Option<String>,
}

fn default_sheet_name() -> String {
    "Expense Tracker".to_string()
}

fn default_transactions_worksheet() -> String {
    "Transactions".to_string()
}

fn default_dashboard_worksheet() -> String {
    "Dashboard".to_string()
}

fn default_credentials_file() -> String {
    "credentials.json".to_string()
}

fn default_receipt_folder() -> String {
    "receipts".to_string()
}

const fn default_receipt_ttl_secs() -> u64 {
    DEFAULT_RECEIPT_TTL_SECS
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            google_sheet_name: default_sheet_name(),
            google_spreadsheet_id: None,
            transactions_worksheet: default_transactions_worksheet(),
            dashboard_worksheet: default_dashboard_worksheet(),
            google_credentials_file: default_credentials_file(),
            google_credentials_json: None,
            receipt_backend: ReceiptBackend::default(),
            drive_folder_id: None,
            receipt_folder: default_receipt_folder(),
            r2_access_key_id: None,
            r2_secret_access_key: None,
            r2_endpoint_url: None,
            r2_bucket_name: None,
            r2_public_url: None,
            receipt_ttl_secs: DEFAULT_RECEIPT_TTL_SECS,
            expired_receipt_policy: ExpiredReceiptPolicy::default(),
            currency_symbol: default_currency_symbol(),
            receipt_temp_dir: None,
        }
    }
}

/// Build the layered configuration shared by every crate of the bot.
///
/// Sources, later ones winning: `config/default`, `config/<RUN_MODE>`,
/// `config/local`, `APP__*` variables, plain environment variables.
///
/// # Errors
///
/// Returns a `ConfigError` if a present source cannot be read.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // UPPER_SNAKE_CASE is mapped to snake_case; empty vars count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

impl TrackerSettings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        let mut settings: Self = build_config()?.try_deserialize()?;

        // Secrets are sometimes not picked up by the automatic mapping
        env_fallback(&mut settings.google_credentials_json, "GOOGLE_CREDENTIALS_JSON");
        env_fallback(&mut settings.r2_endpoint_url, "R2_ENDPOINT_URL");
        env_fallback(&mut settings.r2_access_key_id, "R2_ACCESS_KEY_ID");
        env_fallback(&mut settings.r2_secret_access_key, "R2_SECRET_ACCESS_KEY");
        env_fallback(&mut settings.r2_bucket_name, "R2_BUCKET_NAME");

        Ok(settings)
    }

    /// Session time-to-live
    #[must_use]
    pub const fn receipt_ttl(&self) -> Duration {
        Duration::from_secs(self.receipt_ttl_secs)
    }

    /// Where the Google service account key comes from.
    ///
    /// Inline JSON wins over the key file.
    #[must_use]
    pub fn credential_source(&self) -> CredentialSource {
        match &self.google_credentials_json {
            Some(json) if !json.trim().is_empty() => CredentialSource::from_json(json.clone()),
            _ => CredentialSource::from_file(&self.google_credentials_file),
        }
    }

    /// Directory for temporary photo files
    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.receipt_temp_dir
            .as_ref()
            .filter(|dir| !dir.is_empty())
            .map_or_else(std::env::temp_dir, PathBuf::from)
    }
}

fn env_fallback(slot: &mut Option<String>, key: &str) {
    if slot.is_none() {
        if let Ok(val) = std::env::var(key) {
            if !val.is_empty() {
                *slot = Some(val);
            }
        }
    }
}

/// Default receipt session lifetime (5 minutes)
pub const DEFAULT_RECEIPT_TTL_SECS: u64 = 300;

/// Timeout for calls to Google APIs and R2
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Telegram API retry: initial backoff
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Telegram API retry: maximum backoff
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
/// Telegram API retry: attempts
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;
