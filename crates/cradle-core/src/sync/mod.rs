//! Multi-device state synchronization.
//!
//! This module implements the household sync protocol:
//! - [`SyncClient`]: debounced last-writer-wins push of the full document;
//! - [`RealtimeListener`]: reconnecting change subscription with self-echo
//!   suppression;
//! - [`reconcile`]: total, idempotent ingestion of external documents;
//! - [`RemoteStore`]: the seam to the shared remote record.
//!
//! Cross-device ordering is last-write-wins by timestamp over the whole
//! document; concurrent edits on different devices can clobber one another.
//! Delivery of change notifications is at-least-once, compensated by
//! idempotent reconciliation.

pub mod device_id;
pub mod listener;
pub mod push;
pub mod reconcile;
pub mod remote;
pub mod types;

pub use device_id::{get_or_create_device_id, get_or_create_device_id_at};
pub use listener::{ConnectionState, Observation, RealtimeListener};
pub use push::{
    shared_context, SharedSyncContext, SyncClient, SyncContext, ECHO_WINDOW_MS, PUSH_DEBOUNCE_MS,
};
pub use reconcile::{ingest, ReconcileOptions};
pub use remote::{HttpRemoteStore, RemoteStore};
pub use types::{ChangeKind, ChangeNotification, RemoteRecord, SyncStatusKind};

use serde_json::Value;

use crate::cache::LocalCache;
use crate::store::TrackerStore;

/// Apply a genuine external document into local state: reconcile over the
/// current data, mirror the result into the local cache, and hand back the
/// acknowledgment the UI surfaces as a transient notification.
///
/// Cache failures are logged, not propagated: the in-memory state is
/// already updated and the next write will mirror it again.
pub fn apply_remote_document(
    store: &mut TrackerStore,
    cache: &LocalCache,
    document: &Value,
    options: &ReconcileOptions,
) -> RemoteApplied {
    let merged = ingest(store.data(), document, options);
    store.replace(merged);
    if let Err(e) = cache.write(store.data()) {
        tracing::warn!(error = %e, "failed to mirror remote change into cache");
    }
    tracing::info!("state updated from another device");
    RemoteApplied {
        today: store.data().today.clone(),
    }
}

/// Acknowledgment that a remote device's change was applied locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteApplied {
    /// Date-key of the live day after reconciliation.
    pub today: String,
}

/// Combine the push client's status with the listener's connection state
/// into the single indicator the UI shows. A live subscription upgrades
/// `synced` to `realtime-active`; push-side trouble always wins.
pub fn overall_status(
    client: SyncStatusKind,
    listener: listener::ConnectionState,
) -> SyncStatusKind {
    match (client, listener) {
        (SyncStatusKind::Synced, listener::ConnectionState::Connected) => {
            SyncStatusKind::RealtimeActive
        }
        (status, _) => status,
    }
}
