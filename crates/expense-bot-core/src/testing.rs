//! Testing helpers and mock utilities.
//!
//! Provides constructors for mocked photo sources, backends and settings.

use crate::config::TrackerSettings;
use crate::storage::{MockReceiptStorage, UploadedReceipt};
use crate::tracker::{Clock, MockPhotoSource};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

/// Create a mock photo source that writes `bytes` to the requested path.
#[must_use]
pub fn photo_writing(bytes: &'static [u8]) -> MockPhotoSource {
    let mut mock = MockPhotoSource::new();
    mock.expect_download_to().returning(move |dest| {
        std::fs::write(dest, bytes)?;
        Ok(())
    });
    mock
}

/// Create a mock storage whose every upload succeeds with `link`.
///
/// `check_connection` returns `Ok(())`.
#[must_use]
pub fn mock_storage_ok(link: &'static str) -> MockReceiptStorage {
    let mut mock = MockReceiptStorage::new();
    mock.expect_upload().returning(move |_, name, _| {
        Ok(UploadedReceipt {
            id: name.to_string(),
            view_link: link.to_string(),
        })
    });
    mock.expect_check_connection().returning(|| Ok(()));
    mock
}

/// Clock frozen at `at`.
#[must_use]
pub fn fixed_clock(at: DateTime<Utc>) -> Clock {
    Arc::new(move || at)
}

/// Default settings with temp files under `dir`.
#[must_use]
pub fn test_settings(dir: &Path) -> TrackerSettings {
    TrackerSettings {
        receipt_temp_dir: Some(dir.display().to_string()),
        ..TrackerSettings::default()
    }
}
