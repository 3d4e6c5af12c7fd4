use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::store::Window;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Server-local wall clock, truncated to milliseconds to match DATETIME(3).
pub fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(now.nanosecond() / 1_000_000 * 1_000_000)
        .unwrap_or(now)
}

/// [00:00:00.000, 23:59:59.999] of `day`.
pub fn day_window(day: NaiveDate) -> Window {
    Window::between(day.and_time(NaiveTime::MIN), end_of_day(day))
}

pub fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN))
}

pub fn start_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

pub fn ms_to_hours(ms: i64) -> f64 {
    ms as f64 / MS_PER_HOUR
}

/// `HH:MM:SS`; hours keep counting past 24.
pub fn format_hms(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
