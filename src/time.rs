//! Timezone-aware date handling.
//!
//! Form inputs arrive as local wall-clock values (`YYYY-MM-DDTHH:MM`) in
//! the configured timezone and leave as absolute UTC timestamps. Display
//! goes the other way.

use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::{Timestamp, Zoned};

use crate::error::{DeskError, Result};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Convert a local date/time form value into an absolute timestamp.
///
/// Accepts `YYYY-MM-DDTHH:MM[:SS]` interpreted in `tz`, or a full RFC 3339
/// timestamp carrying its own offset.
pub fn parse_local_datetime(input: &str, tz: &TimeZone) -> Result<Timestamp> {
    let input = input.trim();
    if let Ok(ts) = input.parse::<Timestamp>() {
        return Ok(ts);
    }
    let dt: DateTime = input
        .parse()
        .map_err(|e: jiff::Error| DeskError::InvalidDate(input.to_string(), e.to_string()))?;
    Ok(dt.to_zoned(tz.clone())?.timestamp())
}

/// Render a timestamp as a local date/time form value.
pub fn to_local_input(ts: Timestamp, tz: &TimeZone) -> String {
    ts.to_zoned(tz.clone()).strftime("%Y-%m-%dT%H:%M").to_string()
}

/// Parse a calendar date (`YYYY-MM-DD`) used for range filters.
pub fn parse_date(input: &str) -> Result<Date> {
    let input = input.trim();
    input
        .parse()
        .map_err(|e: jiff::Error| DeskError::InvalidDate(input.to_string(), e.to_string()))
}

/// Calendar date of a timestamp in the given timezone.
pub fn local_date(ts: Timestamp, tz: &TimeZone) -> Date {
    ts.to_zoned(tz.clone()).date()
}

/// Lenient parse of a timestamp received from the server.
///
/// Bare dates are taken as midnight UTC. Anything unparseable is `None`.
pub fn parse_server_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Some(ts);
    }
    raw.parse::<Date>()
        .ok()
        .and_then(|d| d.to_zoned(TimeZone::UTC).ok())
        .map(|z: Zoned| z.timestamp())
}

/// `Jan 05, 2024 · 03:30 PM`
pub fn format_display(ts: Timestamp, tz: &TimeZone) -> String {
    ts.to_zoned(tz.clone())
        .strftime("%b %d, %Y \u{00B7} %I:%M %p")
        .to_string()
}

/// `Jan 05, 2024`
pub fn format_short_date(ts: Timestamp, tz: &TimeZone) -> String {
    ts.to_zoned(tz.clone()).strftime("%b %d, %Y").to_string()
}

/// `Jan 05, 2024`, or `N/A` when absent.
pub fn format_optional_date(ts: Option<Timestamp>, tz: &TimeZone) -> String {
    ts.map(|t| format_short_date(t, tz))
        .unwrap_or_else(|| "N/A".to_string())
}

/// Whole days from `now` until `end`, rounded up, never negative.
pub fn days_remaining(end: Timestamp, now: Timestamp) -> i64 {
    let diff = end.as_second() - now.as_second();
    if diff <= 0 {
        0
    } else {
        (diff + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
    }
}
