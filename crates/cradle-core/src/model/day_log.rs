//! Per-child, per-day event logs.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Diaper change category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiaperKind {
    Pee,
    Poop,
}

impl DiaperKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pee => "pee",
            Self::Poop => "poop",
        }
    }
}

/// A logged feed. The label is free text (typically an amount such as
/// "120ml"); `display_time` is the wall-clock string shown to the user and
/// `timestamp` is epoch milliseconds, also used as the stable event identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub label: String,
    pub display_time: String,
    pub id: i64,
    pub timestamp: i64,
}

/// A logged diaper change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaperEntry {
    pub kind: DiaperKind,
    pub display_time: String,
    pub timestamp: i64,
}

/// A logged medication dose. Carries a snapshot of the medication name so
/// historical days render correctly after a rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedEntry {
    pub med_id: String,
    pub med_name: String,
    pub dose_index: usize,
    pub display_time: String,
    pub timestamp: i64,
}

/// Everything logged for one child on one calendar day.
///
/// Invariant: a dose index appears in `meds_done` for a medication iff a
/// matching [`MedEntry`] exists with that `med_id` + `dose_index`. The store
/// keeps the two in lockstep on every mutation, including deletion; a
/// medication whose done-set becomes empty is removed from the map entirely.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DayLog {
    #[serde(default)]
    pub feeds: Vec<FeedEntry>,
    #[serde(default)]
    pub diapers: Vec<DiaperEntry>,
    #[serde(default)]
    pub meds: Vec<MedEntry>,
    #[serde(default)]
    pub meds_done: BTreeMap<String, BTreeSet<usize>>,
}

impl DayLog {
    /// True when the day holds no events at all.
    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty() && self.diapers.is_empty() && self.meds.is_empty()
    }

    /// Dose indices completed today for one medication.
    pub fn doses_done(&self, med_id: &str) -> BTreeSet<usize> {
        self.meds_done.get(med_id).cloned().unwrap_or_default()
    }

    pub(crate) fn mark_dose_done(&mut self, med_id: &str, dose_index: usize) {
        self.meds_done
            .entry(med_id.to_string())
            .or_default()
            .insert(dose_index);
    }

    pub(crate) fn clear_dose_done(&mut self, med_id: &str, dose_index: usize) {
        if let Some(set) = self.meds_done.get_mut(med_id) {
            set.remove(&dose_index);
            if set.is_empty() {
                self.meds_done.remove(med_id);
            }
        }
    }
}
