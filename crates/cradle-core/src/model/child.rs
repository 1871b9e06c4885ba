//! Child profiles, medications and feed schedules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock;

/// A scheduled medication for one child.
///
/// `dose_times` are wall-clock "HH:MM" strings in device-local time; no
/// timezone is stored. The id is opaque and stable across renames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub dose_times: Vec<String>,
}

impl Medication {
    pub fn new(id: impl Into<String>, name: impl Into<String>, dose_times: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            dose_times,
        }
    }

    /// Number of doses scheduled per day.
    pub fn doses_per_day(&self) -> usize {
        self.dose_times.len()
    }
}

/// Feeding-time template: a default per-feed amount plus optional target
/// times. Only the first schedule in a child's list is consulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSchedule {
    pub amount_ml: u32,
    #[serde(default)]
    pub times: Vec<String>,
}

impl Default for FeedSchedule {
    fn default() -> Self {
        Self {
            amount_ml: 120,
            times: Vec::new(),
        }
    }
}

/// One of exactly two tracked profiles. Created at first run from defaults,
/// mutated via settings, never deleted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Child {
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub weight_date: Option<NaiveDate>,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub feed_schedules: Vec<FeedSchedule>,
}

impl Child {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feed_schedules: vec![FeedSchedule::default()],
            ..Self::default()
        }
    }

    /// The active feeding template, if any. Schedules past index 0 are inert.
    pub fn feed_schedule(&self) -> Option<&FeedSchedule> {
        self.feed_schedules.first()
    }

    pub fn medication(&self, med_id: &str) -> Option<&Medication> {
        self.medications.iter().find(|m| m.id == med_id)
    }
}

/// Synthesize whole-hour dose times by evenly dividing 24 hours from
/// `start_hour`. Used when ingesting documents from peers that predate
/// explicit dose times.
pub fn synthesize_dose_times(count: usize, start_hour: u32) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }
    let step = 24.0 / count as f64;
    (0..count)
        .map(|i| {
            let hour = (start_hour as f64 + step * i as f64).round() as u32 % 24;
            format!("{:02}:00", hour)
        })
        .collect()
}

/// Validate that every dose time parses as "HH:MM".
pub fn dose_times_valid(times: &[String]) -> bool {
    times.iter().all(|t| clock::parse_dose_time(t).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesize_three_doses_from_eight() {
        assert_eq!(
            synthesize_dose_times(3, 8),
            vec!["08:00", "16:00", "00:00"]
        );
    }

    #[test]
    fn synthesize_two_doses() {
        assert_eq!(synthesize_dose_times(2, 9), vec!["09:00", "21:00"]);
    }

    #[test]
    fn synthesize_rounds_fractional_steps_to_whole_hours() {
        // 24 / 5 = 4.8h steps: 8, 12.8, 17.6, 22.4, 27.2
        assert_eq!(
            synthesize_dose_times(5, 8),
            vec!["08:00", "13:00", "18:00", "22:00", "03:00"]
        );
    }

    #[test]
    fn synthesized_times_always_parse() {
        for count in 1..=12 {
            assert!(dose_times_valid(&synthesize_dose_times(count, 7)));
        }
    }

    #[test]
    fn only_first_feed_schedule_is_consulted() {
        let mut child = Child::named("A");
        child.feed_schedules.push(FeedSchedule {
            amount_ml: 999,
            times: vec![],
        });
        assert_eq!(child.feed_schedule().unwrap().amount_ml, 120);
    }
}
