//! Domain model: children, day logs and the root tracker document.

mod child;
mod day_log;
mod tracker;

pub use child::{dose_times_valid, synthesize_dose_times, Child, FeedSchedule, Medication};
pub use day_log::{DayLog, DiaperEntry, DiaperKind, FeedEntry, MedEntry};
pub use tracker::{date_key, TrackerData, CHILD_COUNT, RETENTION_DAYS};
