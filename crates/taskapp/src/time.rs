//! Calendar and duration helpers.
//!
//! Timestamps are stored in UTC. Deadlines are calendar days, so anything that
//! asks "which day" goes through the local timezone.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::errors::{TasksError, TasksResult};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
// Months are approximated as 30 days
const MONTH_MS: i64 = 30 * DAY_MS;

/// Today's date in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Local midnight of `date`, as a UTC instant
pub fn start_of_local_day(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Midnight skipped by a DST jump
        None => midnight.and_utc(),
    }
}

/// Local midnight of the current day
pub fn start_of_today() -> DateTime<Utc> {
    start_of_local_day(today())
}

/// Calendar day (local timezone) an instant falls on
pub fn local_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Format an instant as a local `DD/MM/YYYY` date
pub fn format_date(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%d/%m/%Y").to_string()
}

/// Parse a deadline given as `YYYY-MM-DD`, `DD/MM/YYYY` or RFC 3339.
///
/// Date-only inputs resolve to local midnight of that day.
pub fn parse_deadline(value: &str) -> TasksResult<DateTime<Utc>> {
    let trimmed = value.trim();

    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(start_of_local_day(date));
        }
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| TasksError::InvalidDate {
            value: value.to_string(),
        })
}

/// Format a duration as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_clock(duration: Duration) -> String {
    let secs = duration.num_seconds();
    if secs < 0 {
        return "invalid".to_string();
    }
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

/// Format a duration using its largest whole unit (months, days, hours, minutes).
pub fn format_human(duration: Duration) -> String {
    let millis = duration.num_milliseconds();

    match millis {
        m if m < 0 => "invalid".to_string(),
        0 => "0 minutes".to_string(),
        m if m >= MONTH_MS => plural(m / MONTH_MS, "month"),
        m if m >= DAY_MS => plural(m / DAY_MS, "day"),
        m if m >= HOUR_MS => plural(m / HOUR_MS, "hour"),
        m if m >= MINUTE_MS => plural(m / MINUTE_MS, "minute"),
        _ => "less than 1 minute".to_string(),
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Duration::zero()), "00:00:00");
        assert_eq!(format_clock(Duration::seconds(3725)), "01:02:05");
        assert_eq!(format_clock(Duration::hours(30)), "30:00:00");
        assert_eq!(format_clock(Duration::seconds(-1)), "invalid");
    }

    #[test]
    fn test_format_human_units() {
        assert_eq!(format_human(Duration::zero()), "0 minutes");
        assert_eq!(format_human(Duration::seconds(30)), "less than 1 minute");
        assert_eq!(format_human(Duration::minutes(1)), "1 minute");
        assert_eq!(format_human(Duration::minutes(59)), "59 minutes");
        assert_eq!(format_human(Duration::hours(1)), "1 hour");
        assert_eq!(format_human(Duration::hours(23)), "23 hours");
        assert_eq!(format_human(Duration::days(2)), "2 days");
        assert_eq!(format_human(Duration::days(29)), "29 days");
        assert_eq!(format_human(Duration::days(30)), "1 month");
        assert_eq!(format_human(Duration::days(95)), "3 months");
    }

    #[test]
    fn test_format_human_negative() {
        assert_eq!(format_human(Duration::minutes(-5)), "invalid");
    }

    #[test]
    fn test_parse_deadline_formats() {
        let iso = parse_deadline("2025-03-14").unwrap();
        let br = parse_deadline("14/03/2025").unwrap();
        assert_eq!(iso, br);
        assert_eq!(
            local_date(iso),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
        );

        let rfc = parse_deadline("2025-03-14T10:00:00Z").unwrap();
        assert_eq!(rfc, Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_deadline_rejects_garbage() {
        let err = parse_deadline("next tuesday").unwrap_err();
        assert!(matches!(err, TasksError::InvalidDate { .. }));
    }

    #[test]
    fn test_start_of_local_day_is_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let start = start_of_local_day(date);
        assert_eq!(local_date(start), date);
        assert_eq!(start.with_timezone(&Local).time(), NaiveTime::MIN);
    }
}
