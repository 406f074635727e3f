//! Normalization of the date formats the ATS platforms hand back.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Parse an absolute timestamp into a UTC calendar date. Run windows are
/// built with `DateWindow::ending_at`, which uses the same calendar.
///
/// Accepts RFC 3339 (`2024-05-01T12:00:00Z`, `2024-05-01T08:00:00-04:00`),
/// offset-less ISO datetimes and bare `YYYY-MM-DD` dates.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    // SmartRecruiters sometimes drops the colon in the offset
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

pub fn from_epoch_millis(millis: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

pub fn from_epoch_secs(secs: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

/// Resolve Workday's relative freshness text ("Posted Today",
/// "Posted 3 Days Ago", "Posted 30+ Days Ago") against `today`.
///
/// An open-ended "N+ days" resolves to `today - N`, the most recent date the
/// posting could have, so any window shorter than N rejects it.
pub fn parse_relative(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }
    if text.contains("today") || text.contains("just posted") {
        return Some(today);
    }
    if text.contains("yesterday") {
        return today.checked_sub_signed(Duration::days(1));
    }

    let re = regex::Regex::new(r"(\d+)\+?\s*days?\s+ago").ok()?;
    let caps = re.captures(&text)?;
    let days: i64 = caps.get(1)?.as_str().parse().ok()?;
    today.checked_sub_signed(Duration::days(days))
}
