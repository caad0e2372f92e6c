//! Lenient parsing of the free-form date cells found in the sheet.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

static ISO_DATE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").ok());
static US_DATE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4})$").ok());

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a cell into a local timestamp. Date-only values land on midnight.
///
/// US ordering wins for slashed dates (`11/21/2025`), matching how the sheet is
/// filled in.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(date) = numeric_date(value) {
        return Some(date.and_time(NaiveTime::MIN));
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime);
        }
    }

    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .ok()
        .map(|datetime| datetime.with_timezone(&Local).naive_local())
}

fn numeric_date(value: &str) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE.as_ref().and_then(|re| re.captures(value)) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }
    let caps = US_DATE.as_ref()?.captures(value)?;
    ymd(&caps[3], &caps[1], &caps[2])
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Whole days from `value`'s date to `today`; negative for future dates.
#[must_use]
pub fn days_since(value: &str, today: NaiveDate) -> Option<i64> {
    parse_date(value).map(|datetime| (today - datetime.date()).num_days())
}

/// Whole minutes elapsed between `value` and `now`.
#[must_use]
pub fn minutes_since(value: &str, now: NaiveDateTime) -> Option<i64> {
    parse_date(value).map(|datetime| (now - datetime).num_minutes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(
            parse_date("2025-11-21").map(|dt| dt.date()),
            Some(date(2025, 11, 21))
        );
    }

    #[test]
    fn parses_us_dates() {
        assert_eq!(
            parse_date("11/21/2025").map(|dt| dt.date()),
            Some(date(2025, 11, 21))
        );
        assert_eq!(
            parse_date("1/5/2025").map(|dt| dt.date()),
            Some(date(2025, 1, 5))
        );
        assert_eq!(
            parse_date("01-05-2025").map(|dt| dt.date()),
            Some(date(2025, 1, 5))
        );
    }

    #[test]
    fn date_only_values_are_midnight() {
        let parsed = parse_date("2025-11-21").unwrap();
        assert_eq!(parsed.time(), NaiveTime::MIN);
    }

    #[test]
    fn parses_timestamps() {
        let parsed = parse_date("11/21/2025 14:03:22").unwrap();
        assert_eq!(parsed.date(), date(2025, 11, 21));
        assert_eq!(parsed.time(), NaiveTime::from_hms_opt(14, 3, 22).unwrap());
        assert!(parse_date("2025-11-21T08:00:00").is_some());
        assert!(parse_date("2025-11-21T08:00:00Z").is_some());
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("In discussion"), None);
        assert_eq!(parse_date("13/45/2025"), None);
        assert_eq!(parse_date("2025-02-30"), None);
    }

    #[test]
    fn days_since_counts_calendar_days() {
        let today = date(2025, 12, 3);
        assert_eq!(days_since("11/21/2025", today), Some(12));
        assert_eq!(days_since("2025-12-03", today), Some(0));
        assert_eq!(days_since("2025-12-04", today), Some(-1));
        assert_eq!(days_since("unknown", today), None);
    }

    #[test]
    fn minutes_since_counts_from_midnight_for_dates() {
        let now = date(2025, 12, 3).and_hms_opt(1, 30, 0).unwrap();
        assert_eq!(minutes_since("2025-12-03", now), Some(90));
        assert_eq!(minutes_since("12/03/2025 01:00:00", now), Some(30));
    }
}
