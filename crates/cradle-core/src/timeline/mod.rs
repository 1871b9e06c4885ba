//! Timeline event projector.
//!
//! Turns one child's day log into the flat, time-ordered event list the
//! renderer draws, and resolves visual overlap: events whose positions fall
//! within one event's height of each other are grouped into a column group
//! and laid out side by side. Grouping is transitive within a single
//! left-to-right sweep over the time-sorted list: an event joins the current
//! group while its position is below the group's running maximum
//! end-position, otherwise it starts a new group. No pairwise all-to-all
//! comparison.
//!
//! Scheduled-but-pending items (upcoming doses and feed slots) are projected
//! and column-laid-out the same way. A dose completed more than
//! [`EVENT_SPAN_MINUTES`] away from its slot is flagged as a ghost: the slot
//! renders faintly at its original position to show the drift.

use serde::{Deserialize, Serialize};

use crate::clock::{self, format_display_time};
use crate::model::{Child, DayLog, DiaperKind};

/// Visual height of one event, in timeline minutes. Also the drift
/// threshold for ghost slots.
pub const EVENT_SPAN_MINUTES: u32 = 30;

/// Kind of a completed, logged event on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineEventKind {
    Feed,
    Med,
    Pee,
    Poop,
}

impl TimelineEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Med => "med",
            Self::Pee => "pee",
            Self::Poop => "poop",
        }
    }
}

/// A completed event positioned on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub kind: TimelineEventKind,
    pub label: String,
    /// Minutes since midnight, parsed from the stored display time.
    pub minutes: u32,
    pub timestamp: i64,
    /// Horizontal slot within the overlap group.
    pub column: usize,
    /// Width of the overlap group this event belongs to.
    pub total_columns: usize,
}

/// A scheduled-but-pending (or drifted) slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledSlot {
    pub kind: SlotKind,
    pub label: String,
    pub minutes: u32,
    /// The slot's dose/feed was completed today.
    pub done: bool,
    /// Completed, but more than one event span away from the slot; render
    /// faintly at the original position.
    pub ghost: bool,
    pub column: usize,
    pub total_columns: usize,
}

/// What a scheduled slot refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum SlotKind {
    Med { med_id: String, dose_index: usize },
    Feed,
}

/// Flatten a day log into time-ordered, column-laid-out events.
///
/// Entries whose display time no longer parses are dropped rather than
/// guessed at; the stored string is the only position source.
pub fn project_events(log: &DayLog) -> Vec<TimelineEvent> {
    let mut events: Vec<TimelineEvent> = Vec::new();

    for feed in &log.feeds {
        if let Some(minutes) = clock::parse_display_time(&feed.display_time) {
            events.push(TimelineEvent {
                kind: TimelineEventKind::Feed,
                label: feed.label.clone(),
                minutes,
                timestamp: feed.timestamp,
                column: 0,
                total_columns: 1,
            });
        }
    }
    for diaper in &log.diapers {
        if let Some(minutes) = clock::parse_display_time(&diaper.display_time) {
            events.push(TimelineEvent {
                kind: match diaper.kind {
                    DiaperKind::Pee => TimelineEventKind::Pee,
                    DiaperKind::Poop => TimelineEventKind::Poop,
                },
                label: diaper.kind.as_str().to_string(),
                minutes,
                timestamp: diaper.timestamp,
                column: 0,
                total_columns: 1,
            });
        }
    }
    for med in &log.meds {
        if let Some(minutes) = clock::parse_display_time(&med.display_time) {
            events.push(TimelineEvent {
                kind: TimelineEventKind::Med,
                label: med.med_name.clone(),
                minutes,
                timestamp: med.timestamp,
                column: 0,
                total_columns: 1,
            });
        }
    }

    events.sort_by_key(|e| e.minutes);
    let layout = layout_columns(&events.iter().map(|e| e.minutes).collect::<Vec<_>>());
    for (event, (column, total)) in events.iter_mut().zip(layout) {
        event.column = column;
        event.total_columns = total;
    }
    events
}

/// Project the child's schedule (dose times and feed slots) against the
/// day's log, with the same column layout as completed events.
pub fn project_schedule(child: &Child, log: &DayLog) -> Vec<ScheduledSlot> {
    let mut slots: Vec<ScheduledSlot> = Vec::new();

    for med in &child.medications {
        let done = log.doses_done(&med.id);
        for (dose_index, time) in med.dose_times.iter().enumerate() {
            let Some(minutes) = clock::parse_dose_time(time) else {
                continue;
            };
            let is_done = done.contains(&dose_index);
            let ghost = is_done && dose_drifted(log, &med.id, dose_index, minutes);
            slots.push(ScheduledSlot {
                kind: SlotKind::Med {
                    med_id: med.id.clone(),
                    dose_index,
                },
                label: format!("{} ({})", med.name, format_display_time(minutes)),
                minutes,
                done: is_done,
                ghost,
                column: 0,
                total_columns: 1,
            });
        }
    }

    if let Some(schedule) = child.feed_schedule() {
        for time in &schedule.times {
            let Some(minutes) = clock::parse_dose_time(time) else {
                continue;
            };
            let done = log.feeds.iter().any(|f| {
                clock::parse_display_time(&f.display_time)
                    .is_some_and(|m| m.abs_diff(minutes) <= EVENT_SPAN_MINUTES)
            });
            slots.push(ScheduledSlot {
                kind: SlotKind::Feed,
                label: format!("{}ml ({})", schedule.amount_ml, format_display_time(minutes)),
                minutes,
                done,
                ghost: false,
                column: 0,
                total_columns: 1,
            });
        }
    }

    slots.sort_by_key(|s| s.minutes);
    let layout = layout_columns(&slots.iter().map(|s| s.minutes).collect::<Vec<_>>());
    for (slot, (column, total)) in slots.iter_mut().zip(layout) {
        slot.column = column;
        slot.total_columns = total;
    }
    slots
}

/// True when the logged entry for this dose sits more than one event span
/// from the scheduled slot.
fn dose_drifted(log: &DayLog, med_id: &str, dose_index: usize, slot_minutes: u32) -> bool {
    log.meds
        .iter()
        .find(|m| m.med_id == med_id && m.dose_index == dose_index)
        .and_then(|m| clock::parse_display_time(&m.display_time))
        .is_some_and(|logged| logged.abs_diff(slot_minutes) > EVENT_SPAN_MINUTES)
}

/// Greedy overlap grouping over sorted positions.
///
/// Returns `(column, total_columns)` per input position. Input must be
/// sorted ascending; each item joins the current group while its position
/// is below the group's running maximum end (position + one event span).
fn layout_columns(positions: &[u32]) -> Vec<(usize, usize)> {
    let mut layout = vec![(0, 1); positions.len()];
    let mut group_start = 0;
    let mut group_end = 0u32;

    for (i, &pos) in positions.iter().enumerate() {
        if i == group_start {
            group_end = pos + EVENT_SPAN_MINUTES;
            continue;
        }
        if pos < group_end {
            group_end = group_end.max(pos + EVENT_SPAN_MINUTES);
        } else {
            assign_group(&mut layout, group_start, i);
            group_start = i;
            group_end = pos + EVENT_SPAN_MINUTES;
        }
    }
    assign_group(&mut layout, group_start, positions.len());
    layout
}

fn assign_group(layout: &mut [(usize, usize)], start: usize, end: usize) {
    let total = end - start;
    for (column, slot) in layout[start..end].iter_mut().enumerate() {
        *slot = (column, total.max(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DiaperEntry, FeedEntry, MedEntry, Medication};

    fn feed(display_time: &str, timestamp: i64) -> FeedEntry {
        FeedEntry {
            label: "120ml".into(),
            display_time: display_time.into(),
            id: timestamp,
            timestamp,
        }
    }

    #[test]
    fn events_are_time_ordered_across_kinds() {
        let log = DayLog {
            feeds: vec![feed("2:00 PM", 3), feed("8:00 AM", 1)],
            diapers: vec![DiaperEntry {
                kind: DiaperKind::Pee,
                display_time: "9:30 AM".into(),
                timestamp: 2,
            }],
            ..DayLog::default()
        };
        let events = project_events(&log);
        let order: Vec<i64> = events.iter().map(|e| e.timestamp).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn isolated_event_gets_a_full_column() {
        let log = DayLog {
            feeds: vec![feed("8:00 AM", 1)],
            ..DayLog::default()
        };
        let events = project_events(&log);
        assert_eq!((events[0].column, events[0].total_columns), (0, 1));
    }

    #[test]
    fn three_simultaneous_events_split_three_columns() {
        let log = DayLog {
            feeds: vec![feed("8:00 AM", 1), feed("8:00 AM", 2), feed("8:00 AM", 3)],
            ..DayLog::default()
        };
        let events = project_events(&log);
        let columns: Vec<usize> = events.iter().map(|e| e.column).collect();
        assert_eq!(columns, vec![0, 1, 2]);
        assert!(events.iter().all(|e| e.total_columns == 3));
    }

    #[test]
    fn grouping_is_transitive_within_the_sweep() {
        // 8:00, 8:20, 8:40: the middle event chains the third into the
        // group even though 8:00 and 8:40 do not overlap directly.
        let log = DayLog {
            feeds: vec![feed("8:00 AM", 1), feed("8:20 AM", 2), feed("8:40 AM", 3)],
            ..DayLog::default()
        };
        let events = project_events(&log);
        assert!(events.iter().all(|e| e.total_columns == 3));

        // A gap past the running end starts a fresh group.
        let log2 = DayLog {
            feeds: vec![feed("8:00 AM", 1), feed("8:20 AM", 2), feed("9:30 AM", 3)],
            ..DayLog::default()
        };
        let events2 = project_events(&log2);
        assert_eq!(events2[2].total_columns, 1);
        assert_eq!(events2[0].total_columns, 2);
    }

    #[test]
    fn unparseable_display_times_are_dropped() {
        let log = DayLog {
            feeds: vec![feed("??", 1), feed("8:00 AM", 2)],
            ..DayLog::default()
        };
        assert_eq!(project_events(&log).len(), 1);
    }

    fn child_with_med() -> Child {
        let mut child = Child::named("A");
        child.medications.push(Medication::new(
            "m1",
            "Vitamin D",
            vec!["08:00".into(), "20:00".into()],
        ));
        child
    }

    #[test]
    fn pending_slots_are_not_done_or_ghosted() {
        let child = child_with_med();
        let slots = project_schedule(&child, &DayLog::default());
        let med_slots: Vec<_> = slots
            .iter()
            .filter(|s| matches!(s.kind, SlotKind::Med { .. }))
            .collect();
        assert_eq!(med_slots.len(), 2);
        assert!(med_slots.iter().all(|s| !s.done && !s.ghost));
    }

    #[test]
    fn on_time_dose_is_done_without_ghost() {
        let child = child_with_med();
        let mut log = DayLog::default();
        log.meds.push(MedEntry {
            med_id: "m1".into(),
            med_name: "Vitamin D".into(),
            dose_index: 0,
            display_time: "8:10 AM".into(),
            timestamp: 1,
        });
        log.mark_dose_done("m1", 0);

        let slots = project_schedule(&child, &log);
        let slot = slots.iter().find(|s| s.minutes == 480).unwrap();
        assert!(slot.done);
        assert!(!slot.ghost);
    }

    #[test]
    fn drifted_dose_becomes_a_ghost_at_the_original_slot() {
        let child = child_with_med();
        let mut log = DayLog::default();
        log.meds.push(MedEntry {
            med_id: "m1".into(),
            med_name: "Vitamin D".into(),
            dose_index: 0,
            display_time: "9:15 AM".into(),
            timestamp: 1,
        });
        log.mark_dose_done("m1", 0);

        let slots = project_schedule(&child, &log);
        let slot = slots.iter().find(|s| s.minutes == 480).unwrap();
        assert!(slot.done);
        assert!(slot.ghost, "75 minutes of drift crosses the 30m threshold");
    }

    #[test]
    fn feed_slot_done_when_a_feed_lands_nearby() {
        let mut child = Child::named("A");
        if let Some(schedule) = child.feed_schedules.first_mut() {
            schedule.times = vec!["06:00".into(), "12:00".into()];
        }
        let log = DayLog {
            feeds: vec![feed("6:20 AM", 1)],
            ..DayLog::default()
        };
        let slots = project_schedule(&child, &log);
        assert!(slots[0].done);
        assert!(!slots[1].done);
    }
}
