//! Core types for multi-device state synchronization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The shared remote record: the full state document plus the timestamp the
/// sync protocol uses to detect staleness and self-echoes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub document: Value,
    pub updated_at: DateTime<Utc>,
}

/// Kind of change notification delivered by the realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
}

/// A realtime change notification for the shared record. Delivery is
/// at-least-once; reconciliation is idempotent to compensate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub kind: ChangeKind,
    pub document: Value,
    pub updated_at: DateTime<Utc>,
}

/// User-visible sync status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStatusKind {
    Synced,
    Syncing,
    Offline,
    Error,
    RealtimeActive,
}

impl SyncStatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::Syncing => "syncing",
            Self::Offline => "offline",
            Self::Error => "error",
            Self::RealtimeActive => "realtime-active",
        }
    }
}
