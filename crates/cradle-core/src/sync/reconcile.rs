//! Reconciliation of external state documents into local state.
//!
//! [`ingest`] is the single entry point for any document that arrives from
//! outside the process: the remote record on load, a realtime change
//! payload, or the on-disk cache. The merge rule is last-writer-wins at
//! document granularity: incoming top-level fields overwrite local ones
//! wholesale. Three legacy-tolerance exceptions keep older or malformed
//! peer documents from corrupting state:
//!
//! - child identity fields (`birth_date`, `weight_kg`, `weight_date`, and
//!   the name) fall back to the locally-held value when absent, so a
//!   schema-older peer never regresses a known value to unset;
//! - medications without explicit dose times get them synthesized by evenly
//!   dividing 24 hours from a configurable whole-hour start;
//! - anything expected to be a list or map is coerced to empty when it is
//!   not shaped that way, and malformed entries are skipped.
//!
//! The function is total (never errors, never panics on any JSON input) and
//! idempotent: re-ingesting a document produced from already-reconciled
//! state is a no-op.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde_json::Value;

use crate::model::{
    synthesize_dose_times, Child, DayLog, DiaperEntry, DiaperKind, FeedEntry, FeedSchedule,
    MedEntry, Medication, TrackerData, CHILD_COUNT,
};

/// Knobs for legacy-document tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Whole-hour start for synthesized dose times.
    pub dose_start_hour: u32,
    /// Dose count assumed when a legacy medication names none.
    pub default_doses_per_day: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            dose_start_hour: 8,
            default_doses_per_day: 3,
        }
    }
}

/// Merge an external document over `local`, returning the reconciled state.
pub fn ingest(local: &TrackerData, incoming: &Value, options: &ReconcileOptions) -> TrackerData {
    let mut children = local.children.clone();
    if let Some(list) = incoming.get("children").and_then(Value::as_array) {
        for (i, child) in children.iter_mut().enumerate().take(CHILD_COUNT) {
            if let Some(v) = list.get(i) {
                *child = ingest_child(child, v, options);
            }
        }
    }

    let today = incoming
        .get("today")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| local.today.clone());

    let mut logs = local.logs.clone();
    match incoming.get("logs") {
        Some(Value::Array(list)) => {
            for (i, log) in logs.iter_mut().enumerate().take(CHILD_COUNT) {
                *log = list.get(i).map(ingest_day_log).unwrap_or_default();
            }
        }
        Some(_) => logs = Default::default(),
        None => {}
    }

    let historical_logs = match incoming.get("historical_logs") {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, pair)| {
                let days = pair.as_array();
                let logs = [
                    days.and_then(|d| d.first()).map(ingest_day_log).unwrap_or_default(),
                    days.and_then(|d| d.get(1)).map(ingest_day_log).unwrap_or_default(),
                ];
                (key.clone(), logs)
            })
            .collect(),
        Some(_) => BTreeMap::new(),
        None => local.historical_logs.clone(),
    };

    let calendar_url = match incoming.get("calendar_url") {
        Some(v) => v.as_str().map(str::to_string),
        None => local.calendar_url.clone(),
    };

    let dismissed_calendar_events = match incoming.get("dismissed_calendar_events") {
        Some(v) => string_list(v),
        None => local.dismissed_calendar_events.clone(),
    };

    TrackerData {
        children,
        today,
        logs,
        historical_logs,
        calendar_url,
        dismissed_calendar_events,
    }
}

fn ingest_child(local: &Child, v: &Value, options: &ReconcileOptions) -> Child {
    Child {
        name: v
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| local.name.clone()),
        birth_date: date_field(v, "birth_date").or(local.birth_date),
        weight_kg: v
            .get("weight_kg")
            .and_then(Value::as_f64)
            .or(local.weight_kg),
        weight_date: date_field(v, "weight_date").or(local.weight_date),
        medications: v
            .get("medications")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|m| ingest_medication(m, options))
                    .collect()
            })
            .unwrap_or_default(),
        feed_schedules: v
            .get("feed_schedules")
            .and_then(Value::as_array)
            .map(|list| list.iter().map(ingest_feed_schedule).collect())
            .unwrap_or_default(),
    }
}

fn ingest_medication(v: &Value, options: &ReconcileOptions) -> Option<Medication> {
    let name = v.get("name").and_then(Value::as_str).unwrap_or_default();
    let id = v
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or(name)
        .to_string();
    if id.is_empty() {
        return None;
    }

    let mut dose_times = v
        .get("dose_times")
        .map(string_list)
        .unwrap_or_default();
    if dose_times.is_empty() {
        // A zero count reads as absent: synthesis must always yield at
        // least one time, or re-ingesting the result would synthesize
        // again from the default.
        let count = v
            .get("doses_per_day")
            .and_then(Value::as_u64)
            .filter(|n| *n > 0)
            .map(|n| n as usize)
            .unwrap_or(options.default_doses_per_day);
        dose_times = synthesize_dose_times(count, options.dose_start_hour);
    }

    Some(Medication {
        id,
        name: name.to_string(),
        dose_times,
    })
}

fn ingest_feed_schedule(v: &Value) -> FeedSchedule {
    FeedSchedule {
        amount_ml: v
            .get("amount_ml")
            .and_then(Value::as_u64)
            .map(|n| n as u32)
            .unwrap_or_else(|| FeedSchedule::default().amount_ml),
        times: v.get("times").map(string_list).unwrap_or_default(),
    }
}

fn ingest_day_log(v: &Value) -> DayLog {
    let feeds = v
        .get("feeds")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(ingest_feed).collect())
        .unwrap_or_default();
    let diapers = v
        .get("diapers")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(ingest_diaper).collect())
        .unwrap_or_default();
    let meds: Vec<MedEntry> = v
        .get("meds")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(ingest_med).collect())
        .unwrap_or_default();

    let meds_done = v
        .get("meds_done")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(med_id, indices)| {
                    let set: BTreeSet<usize> = indices
                        .as_array()?
                        .iter()
                        .filter_map(Value::as_u64)
                        .map(|n| n as usize)
                        .collect();
                    // Empty sets are represented by key absence.
                    (!set.is_empty()).then(|| (med_id.clone(), set))
                })
                .collect()
        })
        .unwrap_or_default();

    DayLog {
        feeds,
        diapers,
        meds,
        meds_done,
    }
}

fn ingest_feed(v: &Value) -> Option<FeedEntry> {
    let timestamp = v.get("timestamp").and_then(Value::as_i64)?;
    Some(FeedEntry {
        label: str_field(v, "label"),
        display_time: str_field(v, "display_time"),
        id: v.get("id").and_then(Value::as_i64).unwrap_or(timestamp),
        timestamp,
    })
}

fn ingest_diaper(v: &Value) -> Option<DiaperEntry> {
    let timestamp = v.get("timestamp").and_then(Value::as_i64)?;
    let kind = match v.get("kind").and_then(Value::as_str)? {
        "pee" => DiaperKind::Pee,
        "poop" => DiaperKind::Poop,
        _ => return None,
    };
    Some(DiaperEntry {
        kind,
        display_time: str_field(v, "display_time"),
        timestamp,
    })
}

fn ingest_med(v: &Value) -> Option<MedEntry> {
    let timestamp = v.get("timestamp").and_then(Value::as_i64)?;
    let med_id = v.get("med_id").and_then(Value::as_str)?;
    Some(MedEntry {
        med_id: med_id.to_string(),
        med_name: str_field(v, "med_name"),
        dose_index: v
            .get("dose_index")
            .and_then(Value::as_u64)
            .map(|n| n as usize)?,
        display_time: str_field(v, "display_time"),
        timestamp,
    })
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn date_field(v: &Value, key: &str) -> Option<NaiveDate> {
    v.get(key)
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn string_list(v: &Value) -> Vec<String> {
    v.as_array()
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
