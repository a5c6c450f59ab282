//! Pending receipt sessions
//!
//! Holds, per sender, the link of the last uploaded receipt until the next
//! expense line consumes it or it expires. State lives in process memory only.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Receipt waiting for its expense line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Sender identity
    pub owner_id: i64,
    /// Link of the uploaded receipt
    pub receipt_link: String,
    /// Upload time
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Returns `true` while `now - created_at <= ttl`.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.created_at).to_std() {
            Ok(age) => age <= ttl,
            // created_at lies in the future (clock step back)
            Err(_) => true,
        }
    }
}

/// Result of [`SessionStore::take_if_fresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TakeOutcome {
    /// A fresh record was removed and returned.
    Fresh(SessionRecord),
    /// A stale record was found and removed.
    Expired,
    /// No record for this sender.
    Absent,
}

/// In-memory session map shared by all handlers.
///
/// One mutex serializes every access, so an upload finishing and an expense
/// line arriving for the same sender cannot interleave.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    records: Mutex<HashMap<i64, SessionRecord>>,
}

impl SessionStore {
    /// Create an empty store with the given time-to-live.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Configured time-to-live
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store `receipt_link` for `owner_id`, replacing any previous record.
    pub async fn put(&self, owner_id: i64, receipt_link: impl Into<String>, now: DateTime<Utc>) {
        let record = SessionRecord {
            owner_id,
            receipt_link: receipt_link.into(),
            created_at: now,
        };
        let previous = self.records.lock().await.insert(owner_id, record);
        if previous.is_some() {
            debug!("Replaced pending receipt for user {}", owner_id);
        }
    }

    /// Consume the record of `owner_id` if it is still fresh.
    ///
    /// A stale record is removed as well and reported as [`TakeOutcome::Expired`].
    pub async fn take_if_fresh(&self, owner_id: i64, now: DateTime<Utc>) -> TakeOutcome {
        let mut records = self.records.lock().await;
        match records.remove(&owner_id) {
            Some(record) if record.is_fresh(now, self.ttl) => TakeOutcome::Fresh(record),
            Some(_) => {
                debug!("Pending receipt for user {} expired", owner_id);
                TakeOutcome::Expired
            }
            None => TakeOutcome::Absent,
        }
    }

    /// Remove the record of `owner_id` only if it is stale.
    ///
    /// Returns `true` if a stale record was removed. A fresh record stays.
    pub async fn discard_if_stale(&self, owner_id: i64, now: DateTime<Utc>) -> bool {
        let mut records = self.records.lock().await;
        let stale = records
            .get(&owner_id)
            .is_some_and(|record| !record.is_fresh(now, self.ttl));
        if stale {
            records.remove(&owner_id);
            debug!("Pending receipt for user {} expired", owner_id);
        }
        stale
    }

    /// Peek at the record of `owner_id` without consuming it.
    pub async fn get(&self, owner_id: i64) -> Option<SessionRecord> {
        self.records.lock().await.get(&owner_id).cloned()
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Returns `true` if no record is held.
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}
