//! Daily milk-target sub-engine.
//!
//! Derives a recommended daily feed volume from age-banded mL/kg/day and
//! daily-growth tables, projecting the current weight forward linearly from
//! the last manual weigh-in. Purely advisory: it seeds the default per-feed
//! amount and never blocks logging. Missing birth date or weight yields 0.

use chrono::NaiveDate;

use crate::model::Child;

/// Average days per month used for age banding.
const DAYS_PER_MONTH: f64 = 30.44;

/// (max age in months, mL per kg per day). Step function, first band wins.
const ML_PER_KG_BANDS: &[(f64, f64)] = &[
    (1.0, 150.0),
    (3.0, 140.0),
    (6.0, 130.0),
    (9.0, 110.0),
    (12.0, 100.0),
    (f64::INFINITY, 90.0),
];

/// (max age in months, grams gained per day). Step function.
const GROWTH_BANDS: &[(f64, f64)] = &[
    (3.0, 30.0),
    (6.0, 20.0),
    (9.0, 15.0),
    (12.0, 10.0),
    (f64::INFINITY, 5.0),
];

fn band_value(bands: &[(f64, f64)], age_months: f64) -> f64 {
    bands
        .iter()
        .find(|(max, _)| age_months < *max)
        .map(|(_, v)| *v)
        .unwrap_or(0.0)
}

fn age_in_months(birth_date: NaiveDate, on: NaiveDate) -> f64 {
    let days = (on - birth_date).num_days();
    if days <= 0 {
        0.0
    } else {
        days as f64 / DAYS_PER_MONTH
    }
}

/// mL per kg per day for a child of the given age.
pub fn ml_per_kg_per_day(age_months: f64) -> f64 {
    band_value(ML_PER_KG_BANDS, age_months)
}

/// Expected growth in grams per day for a child of the given age.
pub fn daily_growth_g_per_day(age_months: f64) -> f64 {
    band_value(GROWTH_BANDS, age_months)
}

/// Current weight projected linearly from the last weigh-in using the
/// growth band applicable at the weigh-in date. Returns `None` when either
/// the weight or its date is missing.
pub fn projected_weight_kg(child: &Child, today: NaiveDate) -> Option<f64> {
    let weight = child.weight_kg?;
    let weight_date = child.weight_date?;
    let birth_date = child.birth_date?;

    let days_since = (today - weight_date).num_days().max(0) as f64;
    let growth = daily_growth_g_per_day(age_in_months(birth_date, weight_date));
    Some(weight + days_since * growth / 1000.0)
}

/// Recommended total feed volume for today, in mL. 0 when birth date or
/// weight is unknown.
pub fn daily_milk_target_ml(child: &Child, today: NaiveDate) -> f64 {
    let Some(birth_date) = child.birth_date else {
        return 0.0;
    };
    let Some(weight) = projected_weight_kg(child, today) else {
        return 0.0;
    };
    weight * ml_per_kg_per_day(age_in_months(birth_date, today))
}

/// Default per-feed amount: today's target split over the child's scheduled
/// feed count, falling back to the template amount when the target is 0.
pub fn default_feed_amount_ml(child: &Child, today: NaiveDate) -> u32 {
    let template = child.feed_schedule();
    let feeds_per_day = template
        .map(|s| s.times.len())
        .filter(|n| *n > 0)
        .unwrap_or(8);

    let target = daily_milk_target_ml(child, today);
    if target > 0.0 {
        (target / feeds_per_day as f64).round() as u32
    } else {
        template.map(|s| s.amount_ml).unwrap_or(0)
    }
}
