//! Front-matter date parsing.
//!
//! Dates are accepted in the shapes people actually type into front matter:
//!
//! - `2025-01-15` (midnight UTC)
//! - `2025-01-15 09:30` / `2025-01-15 09:30:00` / `2025-01-15T09:30:00` (UTC)
//! - RFC 3339 with offset, e.g. `2025-01-15T09:30:00+02:00` (converted to UTC)
//!
//! All dates are carried as `DateTime<Utc>` and formatted in UTC, so a bare
//! date never shifts to the previous day.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a date string, returning `None` when no supported shape matches.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `Jan 15, 2025`
pub fn format_short(date: &DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// `2025-01-15T00:00:00.000Z`
pub fn format_iso(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}
