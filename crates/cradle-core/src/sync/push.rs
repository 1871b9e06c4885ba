//! Debounced push of the state document to the shared remote record.
//!
//! Write path: every mutation mirrors to the local cache immediately, then
//! schedules a coalescing push here. Further mutations inside the window
//! reschedule it; the push happens on the first `tick` after the window
//! closes. The push timestamp is recorded as "our last local write" before
//! the network call returns, so a returning realtime echo of our own write
//! can be recognized and dropped.
//!
//! Failure semantics are acceptable-loss: on a push error the local cache
//! stays authoritative for this device, the status flips to `Error`, and no
//! retry happens until the next mutation reschedules a push.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::error::SyncError;
use crate::sync::remote::RemoteStore;
use crate::sync::types::SyncStatusKind;

/// Debounce window for coalescing pushes.
pub const PUSH_DEBOUNCE_MS: i64 = 1000;

/// Self-echo window: notifications arriving this close after our own write
/// are treated as echoes of it.
pub const ECHO_WINDOW_MS: i64 = 2000;

/// Timestamps shared between the push client and the realtime listener.
#[derive(Debug, Default)]
pub struct SyncContext {
    /// When we last stamped a push (set optimistically, pre-network).
    pub last_local_write: Option<DateTime<Utc>>,
    /// The newest remote `updated_at` we have seen, for duplicate detection.
    pub last_remote_seen: Option<DateTime<Utc>>,
}

/// Shared handle to [`SyncContext`].
pub type SharedSyncContext = Arc<Mutex<SyncContext>>;

/// Create a fresh shared context.
pub fn shared_context() -> SharedSyncContext {
    Arc::new(Mutex::new(SyncContext::default()))
}

/// Remote sync client: owns the debounce state and the push path.
///
/// Caller-driven: the host invokes [`SyncClient::tick`] from its refresh
/// loop with the current wall clock and the current document. No remote
/// store configured means permanent local-only mode for the session.
pub struct SyncClient<R: RemoteStore> {
    remote: Option<R>,
    shared_key: String,
    context: SharedSyncContext,
    push_after: Option<DateTime<Utc>>,
    status: SyncStatusKind,
}

impl<R: RemoteStore> SyncClient<R> {
    pub fn new(remote: Option<R>, shared_key: impl Into<String>, context: SharedSyncContext) -> Self {
        let status = if remote.is_some() {
            SyncStatusKind::Synced
        } else {
            SyncStatusKind::Offline
        };
        Self {
            remote,
            shared_key: shared_key.into(),
            context,
            push_after: None,
            status,
        }
    }

    /// True when a remote datastore is configured for this session.
    pub fn is_remote_configured(&self) -> bool {
        self.remote.is_some()
    }

    pub fn status(&self) -> SyncStatusKind {
        self.status
    }

    /// Pending push deadline, if one is scheduled.
    pub fn scheduled_for(&self) -> Option<DateTime<Utc>> {
        self.push_after
    }

    /// Record a local mutation: (re)schedule the debounced push. Calling
    /// again within the window coalesces into one push.
    pub fn note_mutation(&mut self, now: DateTime<Utc>) {
        if self.remote.is_none() {
            return;
        }
        self.push_after = Some(now + Duration::milliseconds(PUSH_DEBOUNCE_MS));
        self.status = SyncStatusKind::Syncing;
    }

    /// Push immediately regardless of the debounce window.
    pub fn flush(&mut self, now: DateTime<Utc>, document: &Value) -> Result<(), SyncError> {
        self.push_after = Some(now);
        match self.tick(now, document) {
            Some(result) => result,
            None => Ok(()),
        }
    }

    /// Run the write path: if a scheduled push is due, stamp and send the
    /// document. Returns `None` when nothing was due.
    pub fn tick(&mut self, now: DateTime<Utc>, document: &Value) -> Option<Result<(), SyncError>> {
        let remote = self.remote.as_ref()?;
        if self.push_after.map_or(true, |due| now < due) {
            return None;
        }
        self.push_after = None;

        // Stamp before the network call so an echo arriving mid-flight is
        // still recognized as our own.
        if let Ok(mut ctx) = self.context.lock() {
            ctx.last_local_write = Some(now);
        }

        match remote.upsert(&self.shared_key, document, now) {
            Ok(()) => {
                self.status = SyncStatusKind::Synced;
                Some(Ok(()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "push failed; local cache remains authoritative");
                self.status = SyncStatusKind::Error;
                Some(Err(e))
            }
        }
    }

    /// Fetch the current remote record (bootstrap and post-reconnect reads).
    pub fn fetch_remote(&self) -> Result<Option<crate::sync::types::RemoteRecord>, SyncError> {
        match &self.remote {
            Some(remote) => remote.fetch(&self.shared_key),
            None => Err(SyncError::NotConfigured),
        }
    }
}
