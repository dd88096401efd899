//! Formatting helpers shared by the sentinel crates

use chrono::{DateTime, TimeZone};

/// Format a number with thousands separators
pub fn format_number<T: ToString>(n: T) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format whole dollars the way the feed displays them (`$1,250,000`)
pub fn format_currency(amount: u64) -> String {
    format!("${}", format_number(amount))
}

/// Wall-clock display used for transaction timestamps (`14:03:27`)
pub fn format_clock<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%H:%M:%S").to_string()
}

/// Progress percentage rounded to the nearest integer, clamped to 0..=100
pub fn format_progress(progress: f64) -> String {
    let clamped = progress.clamp(0.0, 100.0);
    format!("{}%", clamped.round() as u32)
}
