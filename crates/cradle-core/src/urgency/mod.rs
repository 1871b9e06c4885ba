//! Urgency engine: classify a schedule against the wall clock.
//!
//! [`classify`] is a pure function of its inputs. Given a frozen `now` it is
//! deterministic and idempotent, which is what makes the status logic
//! testable without any clock plumbing. Callers re-run it after every
//! mutation, rollover and remote reconciliation.

mod milk;

pub use milk::{
    daily_growth_g_per_day, daily_milk_target_ml, default_feed_amount_ml, ml_per_kg_per_day,
    projected_weight_kg,
};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::clock::{self, MINUTES_PER_DAY};

/// Classification of the most pressing pending dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    Urgent,
    Soon,
    Normal,
    Done,
}

/// The pending schedule entry the classification is based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextDose {
    /// Index into the schedule as given.
    pub index: usize,
    /// Scheduled time in minutes since midnight.
    pub time_minutes: u32,
    /// Signed minutes from `now` to the scheduled time (negative = overdue).
    pub minutes_until: i32,
}

/// Result of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Urgency {
    pub status: DoseStatus,
    pub display_text: String,
    pub next_dose: Option<NextDose>,
}

impl Urgency {
    fn done() -> Self {
        Self {
            status: DoseStatus::Done,
            display_text: "Done".to_string(),
            next_dose: None,
        }
    }
}

/// Classify a schedule of "HH:MM" times against `now` (minutes since
/// midnight), skipping indices already in `done`.
///
/// Every scheduled time is interpreted as occurring today. The entry with
/// the smallest signed difference wins, i.e. the most-overdue or, failing
/// that, the soonest-upcoming dose; ties break to the lowest index so the
/// result is stable across re-evaluations. Unparseable times are skipped.
pub fn classify(schedule_times: &[String], done: &BTreeSet<usize>, now_minutes: u32) -> Urgency {
    let now = (now_minutes as i32).rem_euclid(MINUTES_PER_DAY);

    let mut chosen: Option<NextDose> = None;
    for (index, raw) in schedule_times.iter().enumerate() {
        if done.contains(&index) {
            continue;
        }
        let Some(time_minutes) = clock::parse_dose_time(raw) else {
            continue;
        };
        let diff = time_minutes as i32 - now;
        let candidate = NextDose {
            index,
            time_minutes,
            minutes_until: diff,
        };
        // Strict less-than keeps the lowest index on equal differences.
        if chosen.map_or(true, |c| diff < c.minutes_until) {
            chosen = Some(candidate);
        }
    }

    let Some(next) = chosen else {
        return Urgency::done();
    };

    let at = clock::format_display_time(next.time_minutes);
    let d = next.minutes_until;
    let (status, display_text) = if d < -30 {
        let late = -d;
        let text = if late >= 60 {
            format!("{}h {}m late ({})", late / 60, late % 60, at)
        } else {
            format!("{}m late ({})", late, at)
        };
        (DoseStatus::Urgent, text)
    } else if d < 30 {
        (DoseStatus::Urgent, "Now".to_string())
    } else if d < 120 {
        (DoseStatus::Soon, format!("{}m ({})", d, at))
    } else {
        (DoseStatus::Normal, format!("{}h ({})", d / 60, at))
    };

    Urgency {
        status,
        display_text,
        next_dose: Some(next),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn at(h: u32, m: u32) -> u32 {
        h * 60 + m
    }

    #[test]
    fn all_done_reports_done() {
        let schedule = times(&["08:00", "20:00"]);
        let done = BTreeSet::from([0, 1]);
        let result = classify(&schedule, &done, at(12, 0));
        assert_eq!(result.status, DoseStatus::Done);
        assert!(result.next_dose.is_none());
    }

    #[test]
    fn overdue_past_thirty_minutes_is_late() {
        let schedule = times(&["08:00"]);
        let result = classify(&schedule, &BTreeSet::new(), at(8, 45));
        assert_eq!(result.status, DoseStatus::Urgent);
        assert_eq!(result.display_text, "45m late (8:00 AM)");
    }

    #[test]
    fn overdue_past_an_hour_shows_hours_and_minutes() {
        let schedule = times(&["08:00"]);
        let result = classify(&schedule, &BTreeSet::new(), at(9, 5));
        assert_eq!(result.status, DoseStatus::Urgent);
        assert_eq!(result.display_text, "1h 5m late (8:00 AM)");
    }

    #[test]
    fn within_thirty_minutes_either_side_is_now() {
        let schedule = times(&["08:00"]);
        for now in [at(7, 31), at(8, 0), at(8, 29)] {
            let result = classify(&schedule, &BTreeSet::new(), now);
            assert_eq!(result.status, DoseStatus::Urgent);
            assert_eq!(result.display_text, "Now");
        }
    }

    #[test]
    fn under_two_hours_out_is_soon() {
        let schedule = times(&["14:00"]);
        let result = classify(&schedule, &BTreeSet::new(), at(12, 30));
        assert_eq!(result.status, DoseStatus::Soon);
        assert_eq!(result.display_text, "90m (2:00 PM)");
    }

    #[test]
    fn two_hours_or_more_out_is_normal() {
        let schedule = times(&["20:00"]);
        let result = classify(&schedule, &BTreeSet::new(), at(14, 30));
        assert_eq!(result.status, DoseStatus::Normal);
        assert_eq!(result.display_text, "5h (8:00 PM)");
    }

    #[test]
    fn most_overdue_entry_wins() {
        let schedule = times(&["08:00", "12:00"]);
        let result = classify(&schedule, &BTreeSet::new(), at(13, 0));
        assert_eq!(result.next_dose.unwrap().index, 0);
        assert_eq!(result.display_text, "5h 0m late (8:00 AM)");
    }

    #[test]
    fn done_doses_are_skipped() {
        let schedule = times(&["08:00", "12:00"]);
        let done = BTreeSet::from([0]);
        let result = classify(&schedule, &done, at(13, 0));
        assert_eq!(result.next_dose.unwrap().index, 1);
    }

    #[test]
    fn equal_differences_break_to_lowest_index() {
        let schedule = times(&["09:00", "09:00", "09:00"]);
        let result = classify(&schedule, &BTreeSet::new(), at(6, 0));
        assert_eq!(result.next_dose.unwrap().index, 0);
    }

    #[test]
    fn unparseable_entries_are_skipped() {
        let schedule = times(&["bogus", "10:00"]);
        let result = classify(&schedule, &BTreeSet::new(), at(9, 50));
        assert_eq!(result.next_dose.unwrap().index, 1);
    }

    #[test]
    fn classify_is_idempotent() {
        let schedule = times(&["08:00", "14:00", "20:00"]);
        let done = BTreeSet::from([0]);
        let first = classify(&schedule, &done, at(13, 45));
        let second = classify(&schedule, &done, at(13, 45));
        assert_eq!(first, second);
    }
}
