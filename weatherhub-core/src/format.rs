//! Display helpers for the timestamps the weather API sends as local wall-clock strings.

use chrono::{NaiveDate, NaiveDateTime};

const DATE_TIME_FORMATS: &[&str] =
    &["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedDateTime {
    /// e.g. `January 05, 2024`
    pub date: String,
    /// e.g. `09:05`
    pub time: String,
}

/// Turn `2024-01-05 9:05` into `January 05, 2024` / `09:05`.
pub fn user_friendly_time(raw: &str) -> Option<FormattedDateTime> {
    let Some(parsed) = parse_local(raw) else {
        tracing::debug!(raw, "Invalid date-time string");
        return None;
    };

    Some(FormattedDateTime {
        date: parsed.format("%B %d, %Y").to_string(),
        time: parsed.format("%H:%M").to_string(),
    })
}

/// Greeting for a `HH:MM` time of day.
pub fn greeting(formatted_time: &str) -> &'static str {
    let hour = formatted_time.split(':').next().and_then(|h| h.trim().parse::<u32>().ok());

    match hour {
        Some(5..=11) => "Good morning",
        Some(12..=16) => "Good afternoon",
        _ => "Good evening",
    }
}

/// Full weekday name (`Monday`) for a `YYYY-MM-DD` date.
pub fn day_of_week(date: &str) -> Option<String> {
    if date.trim().is_empty() {
        return None;
    }

    parse_local(date).map(|d| d.format("%A").to_string())
}

fn parse_local(raw: &str) -> Option<NaiveDateTime> {
    let raw = pad_hour(raw.trim());

    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// The API drops the leading zero on single-digit hours (`2024-01-05 9:05`).
fn pad_hour(raw: &str) -> String {
    match raw.split_once(' ') {
        Some((date, time)) if time.find(':') == Some(1) => format!("{date} 0{time}"),
        _ => raw.to_string(),
    }
}
