//! Wall-clock time parsing and formatting.
//!
//! Event times are persisted as display strings ("8:05 AM", "19:30") rather
//! than a normalized integer type; that representation is shared with every
//! other device reading the state document, so parsing behavior here is
//! load-bearing. AM/PM markers are detected case-insensitively and hour 12
//! wraps (12 AM -> 00:xx, 12 PM -> 12:xx). Internally everything is
//! normalized to minutes since midnight immediately after parsing.

/// Minutes in one day.
pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// Parse a display-time string into minutes since midnight.
///
/// Accepts "H:MM", "HH:MM", with an optional am/pm suffix in any case and
/// with or without a leading space ("7:30 PM", "7:30pm", "07:30"). Returns
/// `None` for anything that does not contain a readable hour and minute.
pub fn parse_display_time(s: &str) -> Option<u32> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();

    let (clock_part, meridiem) = if let Some(rest) = lower.strip_suffix("am") {
        (rest.trim_end(), Some(Meridiem::Am))
    } else if let Some(rest) = lower.strip_suffix("pm") {
        (rest.trim_end(), Some(Meridiem::Pm))
    } else {
        (lower.as_str(), None)
    };

    let (hour_part, minute_part) = clock_part.split_once(':')?;
    let mut hour: u32 = hour_part.trim().parse().ok()?;
    let minute: u32 = minute_part.trim().parse().ok()?;
    if minute > 59 {
        return None;
    }

    match meridiem {
        Some(Meridiem::Am) => {
            if hour == 12 {
                hour = 0;
            }
        }
        Some(Meridiem::Pm) => {
            if hour < 12 {
                hour += 12;
            }
        }
        None => {}
    }
    if hour > 23 {
        return None;
    }

    Some(hour * 60 + minute)
}

#[derive(Clone, Copy)]
enum Meridiem {
    Am,
    Pm,
}

/// Parse a 24-hour "HH:MM" dose-time into minutes since midnight.
pub fn parse_dose_time(s: &str) -> Option<u32> {
    let (hour_part, minute_part) = s.trim().split_once(':')?;
    let hour: u32 = hour_part.trim().parse().ok()?;
    let minute: u32 = minute_part.trim().parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

/// Format minutes since midnight as a 12-hour display string ("8:05 AM").
pub fn format_display_time(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY as u32;
    let hour24 = minutes / 60;
    let minute = minutes % 60;
    let (hour12, suffix) = match hour24 {
        0 => (12, "AM"),
        1..=11 => (hour24, "AM"),
        12 => (12, "PM"),
        _ => (hour24 - 12, "PM"),
    };
    format!("{}:{:02} {}", hour12, minute, suffix)
}
