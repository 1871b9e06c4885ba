//! Realtime change listener: connection lifecycle and echo suppression.
//!
//! The listener is a wall-clock state machine in the same style as the rest
//! of the library: the transport (a websocket or server-sent-event channel,
//! external to this crate) reports lifecycle edges via the `on_*` methods,
//! and the host calls [`RealtimeListener::tick`] periodically to learn when
//! a scheduled reconnect is due. No threads, no timers of its own.
//!
//! ## Echo suppression
//!
//! Change notifications for the shared record include writes this device
//! made itself. [`RealtimeListener::observe`] applies two gates before a
//! payload reaches reconciliation:
//!
//! 1. arrived within 2 seconds of our last local write -> self-echo: record
//!    the remote timestamp, do nothing else;
//! 2. timestamp equals the last remote timestamp we recorded -> duplicate
//!    delivery: skip.
//!
//! Anything else is a genuine external change and must be applied.
//!
//! Known, accepted limitation: the 2-second window is a heuristic. If two
//! devices legitimately write within the same window, one device's genuine
//! update can be misclassified as a self-echo and silently dropped. The
//! next push from either side converges the household again.

use chrono::{DateTime, Duration, Utc};

use crate::sync::push::{SharedSyncContext, ECHO_WINDOW_MS};
use crate::sync::types::ChangeNotification;

/// Initial reconnect backoff.
const BACKOFF_BASE_SECS: i64 = 1;
/// Backoff ceiling.
const BACKOFF_CAP_SECS: i64 = 30;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// What the host should do with a notification, per the two-gate check.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Our own write coming back; already applied locally.
    SelfEcho,
    /// At-least-once delivery duplicate; already applied.
    Duplicate,
    /// A genuine external change: reconcile the payload, mirror it to the
    /// cache, re-run derived computations, and surface an acknowledgment.
    Apply(ChangeNotification),
}

/// Reconnecting subscription tracker for the shared record's change feed.
pub struct RealtimeListener {
    state: ConnectionState,
    context: SharedSyncContext,
    /// Consecutive failed attempts since the last successful connection.
    attempts: u32,
    reconnect_at: Option<DateTime<Utc>>,
    torn_down: bool,
}

impl RealtimeListener {
    pub fn new(context: SharedSyncContext) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            context,
            attempts: 0,
            reconnect_at: None,
            torn_down: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Scheduled reconnect time, if one is pending.
    pub fn reconnect_at(&self) -> Option<DateTime<Utc>> {
        self.reconnect_at
    }

    /// Exponential backoff: 1s, 2s, 4s, ... capped at 30s.
    fn backoff_delay(attempts: u32) -> Duration {
        let secs = (BACKOFF_BASE_SECS << attempts.min(5)).min(BACKOFF_CAP_SECS);
        Duration::seconds(secs)
    }

    /// True when the host should open the transport now (a scheduled
    /// reconnect came due). Transitions to `Connecting`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if self.torn_down {
            return false;
        }
        match self.reconnect_at {
            Some(due) if now >= due => {
                self.reconnect_at = None;
                self.state = ConnectionState::Connecting;
                true
            }
            _ => false,
        }
    }

    /// The transport started its handshake.
    pub fn on_connecting(&mut self) {
        if !self.torn_down {
            self.state = ConnectionState::Connecting;
        }
    }

    /// The subscription is live. Resets backoff so the next failure starts
    /// over at 1s, and cancels any scheduled reconnect.
    pub fn on_connected(&mut self) {
        if self.torn_down {
            return;
        }
        tracing::info!("realtime subscription active");
        self.state = ConnectionState::Connected;
        self.attempts = 0;
        self.reconnect_at = None;
    }

    /// The channel failed (error, timeout, unexpected close). Schedules the
    /// next reconnect with exponential backoff unless torn down.
    pub fn on_channel_error(&mut self, now: DateTime<Utc>) {
        self.state = ConnectionState::Error;
        self.schedule_reconnect(now);
    }

    /// The channel closed without error; same reconnect policy.
    pub fn on_disconnected(&mut self, now: DateTime<Utc>) {
        self.state = ConnectionState::Disconnected;
        self.schedule_reconnect(now);
    }

    fn schedule_reconnect(&mut self, now: DateTime<Utc>) {
        if self.torn_down {
            return;
        }
        let delay = Self::backoff_delay(self.attempts);
        self.attempts = self.attempts.saturating_add(1);
        self.reconnect_at = Some(now + delay);
        tracing::warn!(
            attempt = self.attempts,
            delay_secs = delay.num_seconds(),
            "realtime channel down, reconnect scheduled"
        );
    }

    /// User-requested reconnect: reset backoff state and connect now,
    /// bypassing any scheduled delay.
    pub fn force_reconnect(&mut self) {
        if self.torn_down {
            return;
        }
        self.attempts = 0;
        self.reconnect_at = None;
        self.state = ConnectionState::Connecting;
    }

    /// Permanently stop: cancels the reconnect timer; all further edges and
    /// ticks are ignored.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.reconnect_at = None;
        self.state = ConnectionState::Disconnected;
    }

    /// Run the two-gate echo suppression over an incoming notification.
    pub fn observe(&mut self, notification: ChangeNotification, now: DateTime<Utc>) -> Observation {
        let Ok(mut ctx) = self.context.lock() else {
            // Poisoned context: treat the payload as genuine; reconciliation
            // is idempotent either way.
            return Observation::Apply(notification);
        };

        if let Some(written) = ctx.last_local_write {
            if now - written < Duration::milliseconds(ECHO_WINDOW_MS) {
                ctx.last_remote_seen = Some(notification.updated_at);
                tracing::debug!(remote_ts = %notification.updated_at, "self-echo suppressed");
                return Observation::SelfEcho;
            }
        }

        if ctx.last_remote_seen == Some(notification.updated_at) {
            tracing::debug!(remote_ts = %notification.updated_at, "duplicate notification skipped");
            return Observation::Duplicate;
        }

        ctx.last_remote_seen = Some(notification.updated_at);
        Observation::Apply(notification)
    }
}
