//! Daily log store: the owned context around [`TrackerData`].
//!
//! One `TrackerStore` per process instance (no globals, so tests can run
//! several independent "devices" side by side). All operations take the
//! wall clock explicitly as a `NaiveDateTime` in device-local time; the
//! store never reads the system clock itself.
//!
//! Every mutating operation starts with a rollover check: the process may
//! have been suspended across midnight and must self-correct on resume,
//! which is why the check runs on every access rather than on a timer.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::clock::format_display_time;
use crate::error::StoreError;
use crate::model::{
    date_key, DayLog, DiaperEntry, DiaperKind, FeedEntry, MedEntry, TrackerData, CHILD_COUNT,
    RETENTION_DAYS,
};

/// Kind selector for delete/reschedule operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Feed,
    Diaper,
    Med,
}

/// Derived totals for one child's live day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DaySummary {
    pub feed_count: usize,
    /// Sum of leading integers parsed from feed labels ("120ml" -> 120).
    pub total_feed_ml: u32,
    pub pee_count: usize,
    pub poop_count: usize,
    pub doses_done: usize,
}

/// Owner of the live day logs and the historical archive.
#[derive(Debug, Clone)]
pub struct TrackerStore {
    data: TrackerData,
    dirty: bool,
}

impl TrackerStore {
    pub fn new(data: TrackerData) -> Self {
        Self { data, dirty: false }
    }

    pub fn data(&self) -> &TrackerData {
        &self.data
    }

    /// Replace the whole document (remote reconciliation). Does not mark
    /// the store dirty: the incoming state is already what the remote holds.
    pub fn replace(&mut self, data: TrackerData) {
        self.data = data;
    }

    /// Direct access for settings edits; marks the store dirty.
    pub fn data_mut(&mut self) -> &mut TrackerData {
        self.dirty = true;
        &mut self.data
    }

    /// True if any mutation happened since the last take; clears the flag.
    /// The sync client consumes this to schedule a debounced push.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Archive and reset the live logs when the calendar day has changed.
    ///
    /// Returns true when a rollover happened. Outgoing live logs are only
    /// archived when they contain at least one event; the archive is pruned
    /// to the [`RETENTION_DAYS`] most recent date-keys, oldest evicted first.
    /// Calling this again with the same clock is a no-op.
    pub fn check_rollover(&mut self, now: NaiveDateTime) -> bool {
        let key = date_key(now.date());
        if key == self.data.today {
            return false;
        }

        if self.data.logs.iter().any(|log| !log.is_empty()) {
            let outgoing = self.data.logs.clone();
            self.data
                .historical_logs
                .insert(self.data.today.clone(), outgoing);
            // BTreeMap iterates in date order; trim from the oldest end.
            while self.data.historical_logs.len() > RETENTION_DAYS {
                self.data.historical_logs.pop_first();
            }
        }

        tracing::info!(from = %self.data.today, to = %key, "day rollover");
        self.data.logs = Default::default();
        self.data.today = key;
        self.dirty = true;
        true
    }

    /// Append a feed to the live day.
    pub fn record_feed(
        &mut self,
        child: usize,
        label: impl Into<String>,
        now: NaiveDateTime,
    ) -> Result<i64, StoreError> {
        self.check_rollover(now);
        let timestamp = timestamp_ms(now);
        let log = self.live_log_mut(child)?;
        log.feeds.push(FeedEntry {
            label: label.into(),
            display_time: display_time(now),
            id: timestamp,
            timestamp,
        });
        self.dirty = true;
        Ok(timestamp)
    }

    /// Append a diaper change to the live day.
    pub fn record_diaper(
        &mut self,
        child: usize,
        kind: DiaperKind,
        now: NaiveDateTime,
    ) -> Result<i64, StoreError> {
        self.check_rollover(now);
        let timestamp = timestamp_ms(now);
        let log = self.live_log_mut(child)?;
        log.diapers.push(DiaperEntry {
            kind,
            display_time: display_time(now),
            timestamp,
        });
        self.dirty = true;
        Ok(timestamp)
    }

    /// Append a medication dose and mark it done in the same transaction.
    ///
    /// The log entry and the done-marker are written back to back with no
    /// fallible step between them, keeping the lockstep invariant: a dose
    /// index is in `meds_done` iff a matching entry exists.
    pub fn record_med(
        &mut self,
        child: usize,
        med_id: &str,
        dose_index: usize,
        now: NaiveDateTime,
    ) -> Result<i64, StoreError> {
        self.check_rollover(now);
        let med_name = self
            .data
            .child(child)
            .and_then(|c| c.medication(med_id))
            .map(|m| m.name.clone())
            .unwrap_or_else(|| med_id.to_string());

        let timestamp = timestamp_ms(now);
        let log = self.live_log_mut(child)?;
        log.meds.push(MedEntry {
            med_id: med_id.to_string(),
            med_name,
            dose_index,
            display_time: display_time(now),
            timestamp,
        });
        log.mark_dose_done(med_id, dose_index);
        self.dirty = true;
        Ok(timestamp)
    }

    /// Delete a live-day event by exact timestamp.
    ///
    /// Timestamps, not indices, identify events: indices shift after edits.
    /// Deleting a med entry also clears its dose index from `meds_done`,
    /// dropping the medication key entirely when no doses remain. Historical
    /// days are read-only and unreachable from here.
    pub fn delete_event(
        &mut self,
        child: usize,
        kind: EventKind,
        timestamp: i64,
    ) -> Result<(), StoreError> {
        let log = self.live_log_mut(child)?;
        match kind {
            EventKind::Feed => {
                let before = log.feeds.len();
                log.feeds.retain(|f| f.timestamp != timestamp);
                if log.feeds.len() == before {
                    return Err(StoreError::EventNotFound(timestamp));
                }
            }
            EventKind::Diaper => {
                let before = log.diapers.len();
                log.diapers.retain(|d| d.timestamp != timestamp);
                if log.diapers.len() == before {
                    return Err(StoreError::EventNotFound(timestamp));
                }
            }
            EventKind::Med => {
                let position = log
                    .meds
                    .iter()
                    .position(|m| m.timestamp == timestamp)
                    .ok_or(StoreError::EventNotFound(timestamp))?;
                let removed = log.meds.remove(position);
                log.clear_dose_done(&removed.med_id, removed.dose_index);
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Move a live-day event to a new wall-clock time, preserving its
    /// original calendar date. Only live events are reschedulable.
    pub fn reschedule_event(
        &mut self,
        child: usize,
        kind: EventKind,
        timestamp: i64,
        new_hour: u32,
        new_minute: u32,
    ) -> Result<i64, StoreError> {
        if new_hour > 23 || new_minute > 59 {
            return Err(StoreError::InvalidTime {
                hour: new_hour,
                minute: new_minute,
            });
        }

        let original_date = chrono::DateTime::from_timestamp_millis(timestamp)
            .map(|dt| dt.naive_utc().date())
            .ok_or(StoreError::EventNotFound(timestamp))?;
        let moved = original_date
            .and_hms_opt(new_hour, new_minute, 0)
            .ok_or(StoreError::InvalidTime {
                hour: new_hour,
                minute: new_minute,
            })?;
        let new_timestamp = timestamp_ms(moved);
        let new_display = format_display_time(new_hour * 60 + new_minute);

        let log = self.live_log_mut(child)?;
        let found = match kind {
            EventKind::Feed => log
                .feeds
                .iter_mut()
                .find(|f| f.timestamp == timestamp)
                .map(|f| {
                    f.timestamp = new_timestamp;
                    f.display_time = new_display.clone();
                })
                .is_some(),
            EventKind::Diaper => log
                .diapers
                .iter_mut()
                .find(|d| d.timestamp == timestamp)
                .map(|d| {
                    d.timestamp = new_timestamp;
                    d.display_time = new_display.clone();
                })
                .is_some(),
            EventKind::Med => log
                .meds
                .iter_mut()
                .find(|m| m.timestamp == timestamp)
                .map(|m| {
                    m.timestamp = new_timestamp;
                    m.display_time = new_display.clone();
                })
                .is_some(),
        };
        if !found {
            return Err(StoreError::EventNotFound(timestamp));
        }
        self.dirty = true;
        Ok(new_timestamp)
    }

    /// Today's totals for one child.
    pub fn summary(&self, child: usize) -> Result<DaySummary, StoreError> {
        let log = self
            .data
            .logs
            .get(child)
            .ok_or(StoreError::ChildIndex(child))?;
        Ok(DaySummary {
            feed_count: log.feeds.len(),
            total_feed_ml: log.feeds.iter().map(|f| leading_number(&f.label)).sum(),
            pee_count: log
                .diapers
                .iter()
                .filter(|d| d.kind == DiaperKind::Pee)
                .count(),
            poop_count: log
                .diapers
                .iter()
                .filter(|d| d.kind == DiaperKind::Poop)
                .count(),
            doses_done: log.meds_done.values().map(|set| set.len()).sum(),
        })
    }

    fn live_log_mut(&mut self, child: usize) -> Result<&mut DayLog, StoreError> {
        if child >= CHILD_COUNT {
            return Err(StoreError::ChildIndex(child));
        }
        Ok(&mut self.data.logs[child])
    }
}

/// Epoch milliseconds for a device-local wall-clock instant.
fn timestamp_ms(now: NaiveDateTime) -> i64 {
    now.and_utc().timestamp_millis()
}

fn display_time(now: NaiveDateTime) -> String {
    format_display_time(now.hour() * 60 + now.minute())
}

/// Leading integer of a free-text feed label, 0 when absent.
fn leading_number(label: &str) -> u32 {
    let digits: String = label
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Medication, TrackerData};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn store() -> TrackerStore {
        let mut data = TrackerData::first_run(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        data.children[0]
            .medications
            .push(Medication::new("m1", "Vitamin D", vec!["08:00".into()]));
        TrackerStore::new(data)
    }

    #[test]
    fn record_feed_appends_with_display_time() {
        let mut s = store();
        s.record_feed(0, "120ml", at(2025, 6, 1, 7, 30)).unwrap();
        let feed = &s.data().logs[0].feeds[0];
        assert_eq!(feed.label, "120ml");
        assert_eq!(feed.display_time, "7:30 AM");
        assert_eq!(feed.id, feed.timestamp);
    }

    #[test]
    fn record_med_keeps_lockstep() {
        let mut s = store();
        s.record_med(0, "m1", 0, at(2025, 6, 1, 8, 5)).unwrap();
        let log = &s.data().logs[0];
        assert_eq!(log.meds.len(), 1);
        assert_eq!(log.meds[0].med_name, "Vitamin D");
        assert_eq!(log.doses_done("m1"), BTreeSet::from([0]));
    }

    #[test]
    fn delete_med_clears_done_marker_and_empty_key() {
        let mut s = store();
        let t0 = s.record_med(0, "m1", 0, at(2025, 6, 1, 8, 0)).unwrap();
        let t1 = s.record_med(0, "m1", 1, at(2025, 6, 1, 20, 0)).unwrap();

        s.delete_event(0, EventKind::Med, t0).unwrap();
        assert_eq!(s.data().logs[0].doses_done("m1"), BTreeSet::from([1]));

        s.delete_event(0, EventKind::Med, t1).unwrap();
        assert!(!s.data().logs[0].meds_done.contains_key("m1"));
    }

    #[test]
    fn delete_unknown_timestamp_fails() {
        let mut s = store();
        let err = s.delete_event(0, EventKind::Feed, 42).unwrap_err();
        assert_eq!(err, StoreError::EventNotFound(42));
    }

    #[test]
    fn rollover_archives_resets_and_is_idempotent() {
        let mut s = store();
        s.record_feed(0, "100ml", at(2025, 6, 1, 23, 0)).unwrap();
        let live_before = s.data().logs.clone();

        let next_morning = at(2025, 6, 2, 0, 10);
        assert!(s.check_rollover(next_morning));
        assert_eq!(s.data().today, "2025-06-02");
        assert!(s.data().logs.iter().all(|l| l.is_empty()));
        assert_eq!(s.data().historical_logs["2025-06-01"], live_before);

        assert!(!s.check_rollover(next_morning));
    }

    #[test]
    fn rollover_skips_archiving_empty_days() {
        let mut s = store();
        assert!(s.check_rollover(at(2025, 6, 2, 0, 0)));
        assert!(s.data().historical_logs.is_empty());
    }

    #[test]
    fn retention_evicts_oldest_calendar_day() {
        let mut s = store();
        // 31 consecutive days with one event each, rolled over one at a time.
        for day in 1..=31 {
            s.record_feed(0, "60ml", at(2025, 7, day, 12, 0)).unwrap();
            let next = if day == 31 {
                at(2025, 8, 1, 0, 5)
            } else {
                at(2025, 7, day + 1, 0, 5)
            };
            s.check_rollover(next);
        }
        assert_eq!(s.data().historical_logs.len(), RETENTION_DAYS);
        assert!(!s.data().historical_logs.contains_key("2025-07-01"));
        assert!(s.data().historical_logs.contains_key("2025-07-02"));
        assert!(s.data().historical_logs.contains_key("2025-07-31"));
    }

    #[test]
    fn rollover_runs_before_recording() {
        let mut s = store();
        s.record_feed(0, "90ml", at(2025, 6, 1, 23, 55)).unwrap();
        // Next record lands after midnight: the old day must archive first.
        s.record_feed(0, "95ml", at(2025, 6, 2, 0, 15)).unwrap();
        assert_eq!(s.data().today, "2025-06-02");
        assert_eq!(s.data().logs[0].feeds.len(), 1);
        assert_eq!(s.data().historical_logs["2025-06-01"][0].feeds.len(), 1);
    }

    #[test]
    fn reschedule_preserves_calendar_date() {
        let mut s = store();
        let ts = s.record_feed(0, "120ml", at(2025, 6, 1, 9, 0)).unwrap();
        let moved = s.reschedule_event(0, EventKind::Feed, ts, 14, 30).unwrap();

        let feed = &s.data().logs[0].feeds[0];
        assert_eq!(feed.display_time, "2:30 PM");
        assert_eq!(feed.timestamp, moved);
        let date = chrono::DateTime::from_timestamp_millis(moved)
            .unwrap()
            .naive_utc()
            .date();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn summary_totals_parse_feed_labels() {
        let mut s = store();
        s.record_feed(0, "120ml", at(2025, 6, 1, 8, 0)).unwrap();
        s.record_feed(0, "80 ml", at(2025, 6, 1, 11, 0)).unwrap();
        s.record_feed(0, "snack", at(2025, 6, 1, 13, 0)).unwrap();
        s.record_diaper(0, DiaperKind::Pee, at(2025, 6, 1, 9, 0))
            .unwrap();
        s.record_diaper(0, DiaperKind::Poop, at(2025, 6, 1, 10, 0))
            .unwrap();
        s.record_med(0, "m1", 0, at(2025, 6, 1, 8, 5)).unwrap();

        let summary = s.summary(0).unwrap();
        assert_eq!(summary.feed_count, 3);
        assert_eq!(summary.total_feed_ml, 200);
        assert_eq!(summary.pee_count, 1);
        assert_eq!(summary.poop_count, 1);
        assert_eq!(summary.doses_done, 1);
    }

    #[test]
    fn child_index_is_bounded() {
        let mut s = store();
        let err = s.record_feed(2, "x", at(2025, 6, 1, 8, 0)).unwrap_err();
        assert_eq!(err, StoreError::ChildIndex(2));
    }

    #[test]
    fn mutations_mark_dirty_once() {
        let mut s = store();
        assert!(!s.take_dirty());
        s.record_feed(0, "1", at(2025, 6, 1, 8, 0)).unwrap();
        assert!(s.take_dirty());
        assert!(!s.take_dirty());
    }
}
