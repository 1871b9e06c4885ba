//! # Cradle Core Library
//!
//! Core business logic for Cradle, a two-profile infant-care tracker:
//! feeds, medication doses and diaper changes for two children, with
//! multi-device synchronization through one shared remote record. The
//! desktop/mobile shells are thin rendering layers over this library; it
//! owns no UI and no process entry point.
//!
//! ## Architecture
//!
//! - **Store**: an explicitly owned [`TrackerStore`] context around the
//!   state document -- day rollover, event recording/deletion, 30-day
//!   archive. All operations take the wall clock as a parameter; nothing in
//!   the library reads the system clock or spawns threads.
//! - **Urgency**: pure classification of medication/feeding schedules
//!   against the clock, plus the milk-target tables.
//! - **Sync**: debounced last-writer-wins push of the whole document, a
//!   reconnecting realtime listener with self-echo suppression, and a
//!   total, idempotent reconciliation rule for incoming documents.
//! - **Timeline**: projection of a day's log into time-ordered,
//!   column-laid-out events for the renderer.
//!
//! ## Key Components
//!
//! - [`TrackerStore`]: daily log store and rollover owner
//! - [`classify`]: urgency engine
//! - [`SyncClient`] / [`RealtimeListener`]: the sync protocol
//! - [`LocalCache`]: on-device mirror for instant load and offline use

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod store;
pub mod sync;
pub mod timeline;
pub mod urgency;

pub use cache::LocalCache;
pub use config::SyncConfig;
pub use error::{CacheError, ConfigError, CoreError, StoreError, SyncError};
pub use model::{Child, DayLog, DiaperKind, FeedSchedule, Medication, TrackerData};
pub use store::{DaySummary, EventKind, TrackerStore};
pub use sync::{
    apply_remote_document, overall_status, shared_context, ChangeNotification, HttpRemoteStore,
    Observation, RealtimeListener, ReconcileOptions, RemoteApplied, RemoteStore, SyncClient,
    SyncStatusKind,
};
pub use timeline::{project_events, project_schedule, ScheduledSlot, TimelineEvent};
pub use urgency::{classify, DoseStatus, Urgency};
