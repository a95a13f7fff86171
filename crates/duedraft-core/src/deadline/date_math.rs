//! Calendar-day arithmetic on event dates.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an event date into a UTC calendar date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 date-times (normalized to UTC first) and
/// naive date-times. Returns `None` for anything else.
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

/// Shift `event_date` by `offset_days` calendar days.
///
/// Returns `None` when the event date is absent, unparseable, or the result
/// falls outside the representable calendar.
pub fn add_offset(event_date: Option<&str>, offset_days: i64) -> Option<String> {
    let date = parse_event_date(event_date?)?;
    let shifted = date.checked_add_signed(Duration::try_days(offset_days)?)?;
    Some(shifted.format(DATE_FORMAT).to_string())
}

/// Validate a reviewer-supplied due date. Only `YYYY-MM-DD` is accepted.
pub fn is_valid_due_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolls_back_across_month() {
        assert_eq!(add_offset(Some("2024-03-10"), -21).as_deref(), Some("2024-02-18"));
    }

    #[test]
    fn rolls_back_across_year() {
        assert_eq!(add_offset(Some("2024-01-05"), -10).as_deref(), Some("2023-12-26"));
    }

    #[test]
    fn rolls_forward_across_leap_day() {
        assert_eq!(add_offset(Some("2024-02-28"), 2).as_deref(), Some("2024-03-01"));
    }

    #[test]
    fn zero_offset_is_identity() {
        assert_eq!(add_offset(Some("2025-06-30"), 0).as_deref(), Some("2025-06-30"));
    }

    #[test]
    fn missing_or_invalid_date_is_unknown() {
        assert_eq!(add_offset(None, -7), None);
        assert_eq!(add_offset(Some("not-a-date"), 0), None);
        assert_eq!(add_offset(Some(""), -7), None);
        assert_eq!(add_offset(Some("2024-02-30"), -1), None);
    }

    #[test]
    fn rfc3339_datetime_is_normalized_to_utc() {
        // 01:00 in Seoul is still the previous day in UTC.
        assert_eq!(
            add_offset(Some("2024-03-10T01:00:00+09:00"), 0).as_deref(),
            Some("2024-03-09")
        );
        assert_eq!(
            add_offset(Some("2024-03-10T12:00:00.000Z"), -1).as_deref(),
            Some("2024-03-09")
        );
    }

    #[test]
    fn naive_datetime_keeps_its_date() {
        assert_eq!(add_offset(Some("2024-03-10T23:30"), -7).as_deref(), Some("2024-03-03"));
    }

    #[test]
    fn absurd_offsets_do_not_panic() {
        assert_eq!(add_offset(Some("2024-03-10"), i64::MIN), None);
        assert_eq!(add_offset(Some("2024-03-10"), i64::MAX), None);
    }

    #[test]
    fn due_date_validation() {
        assert!(is_valid_due_date("2024-12-31"));
        assert!(!is_valid_due_date("2024-13-01"));
        assert!(!is_valid_due_date("31/12/2024"));
    }
}
