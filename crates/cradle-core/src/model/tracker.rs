//! The root state aggregate shared across devices.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::child::Child;
use super::day_log::DayLog;

/// Fixed number of tracked profiles.
pub const CHILD_COUNT: usize = 2;

/// Historical days retained before the oldest is evicted.
pub const RETENTION_DAYS: usize = 30;

/// Locale-independent key for one calendar day. `%Y-%m-%d`, so lexicographic
/// order equals calendar order.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// The full state document: two children, the live day's logs, a 30-day
/// archive and the date-key the live logs belong to.
///
/// Exclusively owned by the running process; the local cache and the remote
/// record hold mirrors, never independent sources of truth while the process
/// runs. The whole document is replicated last-writer-wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerData {
    pub children: [Child; CHILD_COUNT],
    /// Date-key of the day the live `logs` belong to.
    pub today: String,
    /// Live, mutable logs for the current day, one per child.
    pub logs: [DayLog; CHILD_COUNT],
    /// Archived days keyed by date-key. Read-only once archived.
    #[serde(default)]
    pub historical_logs: BTreeMap<String, [DayLog; CHILD_COUNT]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dismissed_calendar_events: Vec<String>,
}

impl TrackerData {
    /// First-run defaults: two named profiles with an empty live day.
    pub fn first_run(today: NaiveDate) -> Self {
        Self {
            children: [Child::named("Baby A"), Child::named("Baby B")],
            today: date_key(today),
            logs: Default::default(),
            historical_logs: BTreeMap::new(),
            calendar_url: None,
            dismissed_calendar_events: Vec::new(),
        }
    }

    pub fn child(&self, index: usize) -> Option<&Child> {
        self.children.get(index)
    }

    /// Serialize to the JSON document shape used by the cache and the
    /// remote record.
    pub fn to_document(&self) -> serde_json::Value {
        // TrackerData contains no map with non-string keys, so this cannot fail.
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}
