//! Property tests for the pure engines.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use proptest::prelude::*;
use serde_json::json;

use cradle_core::sync::ingest;
use cradle_core::{classify, DoseStatus, ReconcileOptions, TrackerData};

fn schedule_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec((0u32..24, 0u32..60), 0..6)
        .prop_map(|times| {
            times
                .into_iter()
                .map(|(h, m)| format!("{:02}:{:02}", h, m))
                .collect()
        })
}

proptest! {
    #[test]
    fn classify_is_pure(
        schedule in schedule_strategy(),
        done_mask in prop::collection::vec(any::<bool>(), 6),
        now in 0u32..(24 * 60),
    ) {
        let done: BTreeSet<usize> = done_mask
            .iter()
            .enumerate()
            .filter_map(|(i, &d)| d.then_some(i))
            .collect();

        let first = classify(&schedule, &done, now);
        let second = classify(&schedule, &done, now);
        prop_assert_eq!(&first, &second);

        // The chosen dose is never one that is already done, and a done
        // result never carries a next dose.
        match first.next_dose {
            Some(next) => {
                prop_assert!(!done.contains(&next.index));
                prop_assert!(next.index < schedule.len());
            }
            None => prop_assert_eq!(first.status, DoseStatus::Done),
        }
    }

    #[test]
    fn overdue_doses_read_late(
        hour in 0u32..20,
        overdue in 31u32..180,
    ) {
        let schedule = vec![format!("{:02}:00", hour)];
        let now = hour * 60 + overdue;
        let result = classify(&schedule, &BTreeSet::new(), now);
        prop_assert_eq!(result.status, DoseStatus::Urgent);
        prop_assert!(result.display_text.contains("late"));
    }

    #[test]
    fn reconcile_is_idempotent(
        today_day in 1u32..28,
        label in "[a-z0-9]{0,8}",
        timestamps in prop::collection::vec(0i64..10_000_000, 0..5),
        doses_per_day in 1u64..6,
    ) {
        let defaults = TrackerData::first_run(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        let feeds: Vec<_> = timestamps
            .iter()
            .map(|ts| json!({"label": label, "display_time": "8:00 AM", "timestamp": ts}))
            .collect();
        let incoming = json!({
            "children": [
                {"name": "A", "medications": [{"id": "m1", "name": "Iron", "doses_per_day": doses_per_day}]},
                {"name": "B"},
            ],
            "today": format!("2025-06-{:02}", today_day),
            "logs": [{"feeds": feeds}, {}],
        });
        let options = ReconcileOptions::default();

        let once = ingest(&defaults, &incoming, &options);
        let twice = ingest(&once, &once.to_document(), &options);
        prop_assert_eq!(twice, once);
    }
}
