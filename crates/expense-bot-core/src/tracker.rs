//! Event handling service
//!
//! Transport-agnostic: the chat layer turns updates into [`Event`]s, calls
//! [`ExpenseTracker::handle`], and sends back whatever reply it returns.

use crate::access::AccessGuard;
use crate::config::{ExpiredReceiptPolicy, TrackerSettings};
use crate::entry::ExpenseEntry;
use crate::parser::{parse_expense_line, FormatError};
use crate::report::MonthlyReport;
use crate::session::{SessionStore, TakeOutcome};
use crate::sheet::{spreadsheet_link, SheetError, Spreadsheet};
use crate::storage::{ReceiptStorage, StorageError, UploadedReceipt};
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Greeting / help text
pub const GREETING: &str = "💰 Expense Tracker Bot\n\n\
    Send receipt photo first, then expense in format:\n\
    <category> <amount> [remarks]\n\
    Example: Food 500 Dinner with friends";
/// Reply after a receipt was stored
pub const RECEIPT_SAVED: &str = "📷 Receipt saved! Now send expense details";
/// Reply when the pending receipt outlived its TTL
pub const RECEIPT_EXPIRED: &str = "⌛ Receipt expired. Please resend photo first.";
/// Appended to expense errors
pub const USAGE_HINT: &str = "Use format: Category Amount [Remarks]";
/// MIME type of uploaded receipt photos
pub const RECEIPT_MIME: &str = "image/jpeg";

/// Handler-level errors
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Sender is not on the allow-list
    #[error("Access denied")]
    AccessDenied,
    /// Expense line did not parse
    #[error(transparent)]
    Format(#[from] FormatError),
    /// Pending receipt outlived its TTL
    #[error("Receipt expired")]
    ReceiptExpired,
    /// Photo could not be fetched from the chat transport
    #[error("{0:#}")]
    Photo(anyhow::Error),
    /// Local temp file error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Receipt upload failed
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Spreadsheet call failed
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

/// Largest variant of a photo attached to a chat message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Write the photo to `dest`, creating or truncating the file.
    async fn download_to(&self, dest: &Path) -> anyhow::Result<()>;
}

/// Inbound event kinds.
pub enum Event<'a> {
    /// `/start`
    Greeting,
    /// `/report`
    Report,
    /// `/source`
    Source,
    /// Photo message
    Photo(&'a dyn PhotoSource),
    /// Plain text message
    Text(&'a str),
}

impl Event<'_> {
    /// Short name for logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Report => "report",
            Self::Source => "source",
            Self::Photo(_) => "photo",
            Self::Text(_) => "text",
        }
    }
}

/// Source of the current time
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Expense bot service: access check, sessions, parsing, backend calls.
pub struct ExpenseTracker {
    guard: AccessGuard,
    sessions: SessionStore,
    storage: Arc<dyn ReceiptStorage>,
    sheet: Arc<dyn Spreadsheet>,
    transactions_worksheet: String,
    dashboard_worksheet: String,
    currency_symbol: String,
    expired_policy: ExpiredReceiptPolicy,
    temp_dir: PathBuf,
    clock: Clock,
}

impl ExpenseTracker {
    /// Create a tracker with an empty session store.
    #[must_use]
    pub fn new(
        settings: &TrackerSettings,
        guard: AccessGuard,
        storage: Arc<dyn ReceiptStorage>,
        sheet: Arc<dyn Spreadsheet>,
    ) -> Self {
        Self {
            guard,
            sessions: SessionStore::new(settings.receipt_ttl()),
            storage,
            sheet,
            transactions_worksheet: settings.transactions_worksheet.clone(),
            dashboard_worksheet: settings.dashboard_worksheet.clone(),
            currency_symbol: settings.currency_symbol.clone(),
            expired_policy: settings.expired_receipt_policy,
            temp_dir: settings.temp_dir(),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Allow-list in use
    #[must_use]
    pub const fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    /// Pending receipt sessions
    #[must_use]
    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Fail with [`TrackerError::AccessDenied`] unless `sender` is allowed.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied` for senders outside the allow-list.
    pub fn authorize(&self, sender: i64) -> Result<(), TrackerError> {
        if self.guard.allows(sender) {
            Ok(())
        } else {
            Err(TrackerError::AccessDenied)
        }
    }

    /// Handle one event and return the reply text.
    ///
    /// Returns `None` for denied senders: nothing is sent and no state changes.
    /// Every other failure is turned into a reply here, so one bad event never
    /// leaks into another.
    pub async fn handle(&self, sender: i64, event: Event<'_>) -> Option<String> {
        if let Err(e) = self.authorize(sender) {
            debug!("Dropping {} event from user {}: {}", event.kind(), sender, e);
            return None;
        }

        let reply = match event {
            Event::Greeting => GREETING.to_string(),
            Event::Source => spreadsheet_link(&self.sheet.spreadsheet_id()),
            Event::Report => match self.monthly_report().await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Report for user {} failed: {}", sender, e);
                    format!("❌ Report error: {e}")
                }
            },
            Event::Photo(photo) => match self.save_receipt(sender, photo).await {
                Ok(()) => RECEIPT_SAVED.to_string(),
                Err(e) => {
                    warn!("Receipt upload for user {} failed: {}", sender, e);
                    format!("❌ Error: {e}")
                }
            },
            Event::Text(text) => match self.record_expense(sender, text).await {
                Ok(confirmation) => confirmation,
                Err(TrackerError::ReceiptExpired) => RECEIPT_EXPIRED.to_string(),
                Err(e) => {
                    warn!("Expense from user {} not recorded: {}", sender, e);
                    format!("❌ Error: {e}\n{USAGE_HINT}")
                }
            },
        };
        Some(reply)
    }

    /// Download, upload, and remember a receipt photo.
    ///
    /// The local copy is removed on every exit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the download, the temp file, or the upload fails.
    pub async fn save_receipt(
        &self,
        sender: i64,
        photo: &dyn PhotoSource,
    ) -> Result<(), TrackerError> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let file_name = receipt_file_name(self.now());
        let temp = TempReceipt::new(self.temp_dir.join(&file_name));

        let uploaded = self.upload_receipt(photo, &temp, &file_name).await;
        temp.remove().await;
        let uploaded = uploaded?;

        self.sessions.put(sender, uploaded.view_link, self.now()).await;
        info!("Receipt {} stored for user {}", uploaded.id, sender);
        Ok(())
    }

    async fn upload_receipt(
        &self,
        photo: &dyn PhotoSource,
        temp: &TempReceipt,
        file_name: &str,
    ) -> Result<UploadedReceipt, TrackerError> {
        photo
            .download_to(temp.path())
            .await
            .map_err(TrackerError::Photo)?;
        Ok(self
            .storage
            .upload(temp.path(), file_name, RECEIPT_MIME)
            .await?)
    }

    /// Parse an expense line and append it to the transactions worksheet.
    ///
    /// An expired receipt is reported before anything else, as
    /// [`TrackerError::ReceiptExpired`]. Under
    /// [`ExpiredReceiptPolicy::Discard`] the line is then dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not parse, the receipt expired
    /// (discard policy), or the append fails.
    pub async fn record_expense(&self, sender: i64, text: &str) -> Result<String, TrackerError> {
        let now = self.now();

        let parsed = match parse_expense_line(text) {
            Ok(parsed) => parsed,
            Err(e) => {
                if self.sessions.discard_if_stale(sender, now).await {
                    return Err(TrackerError::ReceiptExpired);
                }
                return Err(e.into());
            }
        };

        let (receipt_link, expired) = match self.sessions.take_if_fresh(sender, now).await {
            TakeOutcome::Fresh(record) => (record.receipt_link, false),
            TakeOutcome::Absent => (String::new(), false),
            TakeOutcome::Expired => match self.expired_policy {
                ExpiredReceiptPolicy::Discard => return Err(TrackerError::ReceiptExpired),
                ExpiredReceiptPolicy::RecordWithoutReceipt => (String::new(), true),
            },
        };

        let entry = ExpenseEntry::new(&parsed, receipt_link, now);
        self.sheet
            .append_row(&self.transactions_worksheet, entry.to_row())
            .await?;
        info!(
            "Recorded {} {} for user {} (receipt: {})",
            entry.category,
            parsed.amount_text,
            sender,
            !entry.receipt_link.is_empty()
        );

        let mut reply = format!(
            "✅ Added: {} {}{}",
            entry.category, self.currency_symbol, parsed.amount_text
        );
        if !entry.receipt_link.is_empty() {
            reply.push_str("\n📎 Receipt: ");
            reply.push_str(&entry.receipt_link);
        }
        if expired {
            reply.push_str("\n\n");
            reply.push_str(RECEIPT_EXPIRED);
        }
        Ok(reply)
    }

    /// Read and render the monthly report.
    ///
    /// # Errors
    ///
    /// Returns an error if a dashboard read fails.
    pub async fn monthly_report(&self) -> Result<String, TrackerError> {
        let report = MonthlyReport::load(self.sheet.as_ref(), &self.dashboard_worksheet).await?;
        Ok(report.render(&self.currency_symbol))
    }
}

/// `receipt_<YYYYmmddHHMMSS>_<8 hex>.jpg`; the suffix keeps same-second uploads apart.
fn receipt_file_name(now: DateTime<Utc>) -> String {
    let stamp = now.with_timezone(&Local).format("%Y%m%d%H%M%S");
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("receipt_{stamp}_{}.jpg", &suffix[..8])
}

/// Temp receipt file.
///
/// [`TempReceipt::remove`] deletes it without blocking. If the owning future is
/// cancelled first, `Drop` removes it instead.
struct TempReceipt {
    path: PathBuf,
    removed: bool,
}

impl TempReceipt {
    const fn new(path: PathBuf) -> Self {
        Self {
            path,
            removed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn remove(mut self) {
        log_removal(&self.path, tokio::fs::remove_file(&self.path).await);
        self.removed = true;
    }
}

impl Drop for TempReceipt {
    fn drop(&mut self) {
        if !self.removed {
            log_removal(&self.path, std::fs::remove_file(&self.path));
        }
    }
}

fn log_removal(path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => debug!("Removed temp file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove temp file {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::MockSpreadsheet;
    use crate::storage::MockReceiptStorage;
    use crate::testing::{fixed_clock, mock_storage_ok, photo_writing, test_settings};
    use chrono::Duration as ChronoDuration;
    use mockall::predicate::eq;
    use serde_json::json;

    const OWNER: i64 = 945_852_428;
    const STRANGER: i64 = 1;

    fn tracker(
        settings: &TrackerSettings,
        storage: MockReceiptStorage,
        sheet: MockSpreadsheet,
    ) -> ExpenseTracker {
        ExpenseTracker::new(
            settings,
            [OWNER].into_iter().collect(),
            Arc::new(storage),
            Arc::new(sheet),
        )
    }

    #[tokio::test]
    async fn test_stranger_gets_no_reply_and_no_side_effects() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = test_settings(dir.path());
        // No expectations: any backend call panics
        let tracker = tracker(&settings, MockReceiptStorage::new(), MockSpreadsheet::new());
        let photo = photo_writing(b"jpeg");

        assert_eq!(tracker.handle(STRANGER, Event::Greeting).await, None);
        assert_eq!(tracker.handle(STRANGER, Event::Report).await, None);
        assert_eq!(tracker.handle(STRANGER, Event::Source).await, None);
        assert_eq!(tracker.handle(STRANGER, Event::Photo(&photo)).await, None);
        assert_eq!(tracker.handle(STRANGER, Event::Text("Food 500")).await, None);
        assert!(tracker.sessions().is_empty().await);
        assert!(matches!(
            tracker.authorize(STRANGER),
            Err(TrackerError::AccessDenied)
        ));
    }

    #[tokio::test]
    async fn test_greeting_and_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = test_settings(dir.path());
        let mut sheet = MockSpreadsheet::new();
        sheet
            .expect_spreadsheet_id()
            .return_const("sheet-123".to_string());
        let tracker = tracker(&settings, MockReceiptStorage::new(), sheet);

        assert_eq!(
            tracker.handle(OWNER, Event::Greeting).await.as_deref(),
            Some(GREETING)
        );
        assert_eq!(
            tracker.handle(OWNER, Event::Source).await.as_deref(),
            Some("https://docs.google.com/spreadsheets/d/sheet-123/edit?gid=0")
        );
    }

    #[tokio::test]
    async fn test_photo_then_expense_attaches_link() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = test_settings(dir.path());

        let mut storage = MockReceiptStorage::new();
        storage
            .expect_upload()
            .withf(|path, name, mime| {
                path.exists() && name.starts_with("receipt_") && mime == "image/jpeg"
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(UploadedReceipt {
                    id: "f1".to_string(),
                    view_link: "https://drive.google.com/file/d/f1/view".to_string(),
                })
            });

        let mut sheet = MockSpreadsheet::new();
        sheet
            .expect_append_row()
            .withf(|sheet, row| {
                sheet == "Transactions"
                    && row[0] == json!("Food")
                    && row[1] == json!(500.0)
                    && row[2] == json!("Dinner with friends")
                    && row[4] == json!("https://drive.google.com/file/d/f1/view")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let tracker = tracker(&settings, storage, sheet);
        let photo = photo_writing(b"jpeg");

        assert_eq!(
            tracker.handle(OWNER, Event::Photo(&photo)).await.as_deref(),
            Some(RECEIPT_SAVED)
        );
        let reply = tracker
            .handle(OWNER, Event::Text("food 500 Dinner with friends"))
            .await;
        assert_eq!(
            reply.as_deref(),
            Some("✅ Added: Food ₹500\n📎 Receipt: https://drive.google.com/file/d/f1/view")
        );
        assert!(tracker.sessions().is_empty().await);
        // Temp file is gone
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[tokio::test]
    async fn test_second_photo_replaces_pending_receipt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = test_settings(dir.path());
        let now = Utc::now();
        let tracker = tracker(
            &settings,
            mock_storage_ok("https://drive/r2"),
            MockSpreadsheet::new(),
        )
        .with_clock(fixed_clock(now));
        tracker.sessions().put(OWNER, "https://drive/r1", now).await;

        let photo = photo_writing(b"jpeg");
        tracker.handle(OWNER, Event::Photo(&photo)).await;

        let record = tracker.sessions().get(OWNER).await.expect("pending receipt");
        assert_eq!(record.receipt_link, "https://drive/r2");
        assert_eq!(tracker.sessions().len().await, 1);
    }

    #[tokio::test]
    async fn test_upload_failure_cleans_temp_file_and_keeps_no_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = test_settings(dir.path());

        let mut storage = MockReceiptStorage::new();
        storage
            .expect_upload()
            .returning(|_, _, _| Err(StorageError::S3Put("bucket not found".to_string())));
        let tracker = tracker(&settings, storage, MockSpreadsheet::new());
        let photo = photo_writing(b"jpeg");

        let reply = tracker.handle(OWNER, Event::Photo(&photo)).await;
        assert_eq!(
            reply.as_deref(),
            Some("❌ Error: S3 put error: bucket not found")
        );
        assert!(tracker.sessions().is_empty().await);
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[tokio::test]
    async fn test_download_failure_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = test_settings(dir.path());
        let tracker = tracker(&settings, MockReceiptStorage::new(), MockSpreadsheet::new());

        let mut photo = MockPhotoSource::new();
        photo
            .expect_download_to()
            .returning(|_| Err(anyhow::anyhow!("file is too big")));

        let reply = tracker.handle(OWNER, Event::Photo(&photo)).await;
        assert_eq!(reply.as_deref(), Some("❌ Error: file is too big"));
    }

    #[tokio::test]
    async fn test_expense_without_receipt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = test_settings(dir.path());
        let mut sheet = MockSpreadsheet::new();
        sheet
            .expect_append_row()
            .withf(|_, row| row[1] == json!(42.5) && row[4] == json!(""))
            .times(1)
            .returning(|_, _| Ok(()));
        let tracker = tracker(&settings, MockReceiptStorage::new(), sheet);

        let reply = tracker.handle(OWNER, Event::Text("Snacks 42.5")).await;
        assert_eq!(reply.as_deref(), Some("✅ Added: Snacks ₹42.5"));
    }

    #[tokio::test]
    async fn test_confirmation_echoes_capitalized_category() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = test_settings(dir.path());
        let mut sheet = MockSpreadsheet::new();
        sheet
            .expect_append_row()
            .withf(|_, row| row[0] == json!("Food"))
            .times(1)
            .returning(|_, _| Ok(()));
        let tracker = tracker(&settings, MockReceiptStorage::new(), sheet);

        let reply = tracker.handle(OWNER, Event::Text("food 500")).await;
        assert_eq!(reply.as_deref(), Some("✅ Added: Food ₹500"));
    }

    #[tokio::test]
    async fn test_temp_receipt_removed_explicitly_or_on_drop() {
        let dir = tempfile::tempdir().expect("tempdir");

        let kept = dir.path().join("a.jpg");
        std::fs::write(&kept, b"jpeg").expect("write");
        TempReceipt::new(kept.clone()).remove().await;
        assert!(!kept.exists());

        let dropped = dir.path().join("b.jpg");
        std::fs::write(&dropped, b"jpeg").expect("write");
        drop(TempReceipt::new(dropped.clone()));
        assert!(!dropped.exists());

        // Already gone
        TempReceipt::new(dir.path().join("missing.jpg")).remove().await;
    }

    #[tokio::test]
    async fn test_invalid_line_keeps_fresh_receipt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = test_settings(dir.path());
        let now = Utc::now();
        let tracker = tracker(&settings, MockReceiptStorage::new(), MockSpreadsheet::new())
            .with_clock(fixed_clock(now));
        tracker.sessions().put(OWNER, "https://drive/r1", now).await;

        let reply = tracker.handle(OWNER, Event::Text("Food")).await;
        assert_eq!(
            reply.as_deref(),
            Some("❌ Error: Invalid format\nUse format: Category Amount [Remarks]")
        );
        assert!(tracker.sessions().get(OWNER).await.is_some());
    }

    #[tokio::test]
    async fn test_expired_receipt_discards_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = test_settings(dir.path());
        let now = Utc::now();
        // append_row has no expectation: recording would panic
        let tracker = tracker(&settings, MockReceiptStorage::new(), MockSpreadsheet::new())
            .with_clock(fixed_clock(now + ChronoDuration::seconds(301)));
        tracker.sessions().put(OWNER, "https://drive/r1", now).await;

        let reply = tracker.handle(OWNER, Event::Text("Food 500")).await;
        assert_eq!(reply.as_deref(), Some(RECEIPT_EXPIRED));
        assert!(tracker.sessions().is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_receipt_reported_before_format_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = test_settings(dir.path());
        let now = Utc::now();
        let tracker = tracker(&settings, MockReceiptStorage::new(), MockSpreadsheet::new())
            .with_clock(fixed_clock(now + ChronoDuration::seconds(301)));
        tracker.sessions().put(OWNER, "https://drive/r1", now).await;

        let reply = tracker.handle(OWNER, Event::Text("hello")).await;
        assert_eq!(reply.as_deref(), Some(RECEIPT_EXPIRED));
        assert!(tracker.sessions().is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_receipt_recorded_when_configured() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut settings = test_settings(dir.path());
        settings.expired_receipt_policy = ExpiredReceiptPolicy::RecordWithoutReceipt;
        let now = Utc::now();

        let mut sheet = MockSpreadsheet::new();
        sheet
            .expect_append_row()
            .withf(|_, row| row[4] == json!(""))
            .times(1)
            .returning(|_, _| Ok(()));
        let tracker = tracker(&settings, MockReceiptStorage::new(), sheet)
            .with_clock(fixed_clock(now + ChronoDuration::seconds(301)));
        tracker.sessions().put(OWNER, "https://drive/r1", now).await;

        let reply = tracker.handle(OWNER, Event::Text("Food 500")).await;
        assert_eq!(
            reply.as_deref(),
            Some("✅ Added: Food ₹500\n\n⌛ Receipt expired. Please resend photo first.")
        );
    }

    #[tokio::test]
    async fn test_append_failure_consumes_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = test_settings(dir.path());
        let now = Utc::now();
        let mut sheet = MockSpreadsheet::new();
        sheet
            .expect_append_row()
            .returning(|_, _| Err(SheetError::Backend("PERMISSION_DENIED".to_string())));
        let tracker = tracker(&settings, MockReceiptStorage::new(), sheet)
            .with_clock(fixed_clock(now));
        tracker.sessions().put(OWNER, "https://drive/r1", now).await;

        let reply = tracker.handle(OWNER, Event::Text("Food 500")).await;
        assert_eq!(
            reply.as_deref(),
            Some("❌ Error: PERMISSION_DENIED\nUse format: Category Amount [Remarks]")
        );
        assert!(tracker.sessions().is_empty().await);
    }

    #[tokio::test]
    async fn test_report_reply() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = test_settings(dir.path());
        let mut sheet = MockSpreadsheet::new();
        sheet
            .expect_read_cell()
            .with(eq("Dashboard"), eq("A2"))
            .returning(|_, _| Ok("12345".to_string()));
        sheet
            .expect_read_column()
            .with(eq("Dashboard"), eq(2), eq(3))
            .returning(|_, _, _| Ok(vec!["Food".into(), "Transport".into()]));
        sheet
            .expect_read_column()
            .with(eq("Dashboard"), eq(3), eq(3))
            .returning(|_, _, _| Ok(vec!["500".into(), "200".into()]));
        let tracker = tracker(&settings, MockReceiptStorage::new(), sheet);

        assert_eq!(
            tracker.handle(OWNER, Event::Report).await.as_deref(),
            Some("📊 Monthly Report\nTotal: ₹12345\nBreakdown:\nFood: ₹500\nTransport: ₹200\n")
        );
    }

    #[tokio::test]
    async fn test_report_error_reply() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = test_settings(dir.path());
        let mut sheet = MockSpreadsheet::new();
        sheet
            .expect_read_cell()
            .returning(|_, _| Err(SheetError::Backend("Unable to parse range".to_string())));
        let tracker = tracker(&settings, MockReceiptStorage::new(), sheet);

        assert_eq!(
            tracker.handle(OWNER, Event::Report).await.as_deref(),
            Some("❌ Report error: Unable to parse range")
        );
    }

    #[test]
    fn test_receipt_file_name_shape() {
        let name = receipt_file_name(Utc::now());
        assert!(name.starts_with("receipt_"));
        assert!(name.ends_with(".jpg"));
        // receipt_ + 14 digits + _ + 8 hex + .jpg
        assert_eq!(name.len(), 8 + 14 + 1 + 8 + 4);
        assert_ne!(name, receipt_file_name(Utc::now()));
    }
}
