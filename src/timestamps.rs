//! Timestamp resolution for observed post times.
//!
//! Feeds show absolute ISO strings in `datetime` attributes, compact
//! relative ages ("2h", "3d") for recent posts and short calendar dates
//! ("May 13", "May 13, 2023") for older ones.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use regex::Regex;

static RELATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*([smhd])$").unwrap());

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%I:%M %p · %b %d, %Y",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%d %b %Y"];

/// Formats shown for dates in the current year.
const YEARLESS_FORMATS: &[&str] = &["%b %d", "%d %b"];

/// Resolve an observed timestamp string against `now`.
///
/// Absolute strings parse directly; `<n><s|m|h|d>` resolves to `now` minus
/// that offset; short calendar dates are tried last. Anything else is
/// `None`.
pub fn resolve_timestamp(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(relative) = resolve_relative(raw, now) {
        return Some(relative);
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    resolve_yearless(raw, now)
}

fn resolve_relative(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lowered = raw.to_ascii_lowercase();
    let caps = RELATIVE.captures(&lowered)?;
    let amount: i64 = caps[1].parse().ok()?;
    let unit_secs: i64 = match &caps[2] {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        _ => return None,
    };
    let offset = TimeDelta::try_seconds(amount.checked_mul(unit_secs)?)?;
    now.checked_sub_signed(offset)
}

/// "May 13" means the most recent May 13 not after `now`.
fn resolve_yearless(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let year = now.year();
    for format in YEARLESS_FORMATS {
        let with_year = format!("{} {}", raw, year);
        let format_with_year = format!("{} %Y", format);
        if let Ok(date) = NaiveDate::parse_from_str(&with_year, &format_with_year) {
            let date = if date > now.date_naive() {
                date.with_year(year - 1)?
            } else {
                date
            };
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_absolute() {
        assert_eq!(
            resolve_timestamp("2024-05-13T10:00:00.000Z", now()),
            Some(Utc.with_ymd_and_hms(2024, 5, 13, 10, 0, 0).unwrap())
        );
        assert_eq!(
            resolve_timestamp("2024-05-13T10:00:00+02:00", now()),
            Some(Utc.with_ymd_and_hms(2024, 5, 13, 8, 0, 0).unwrap())
        );
        assert_eq!(
            resolve_timestamp("2024-05-13 10:00:00", now()),
            Some(Utc.with_ymd_and_hms(2024, 5, 13, 10, 0, 0).unwrap())
        );
        assert_eq!(
            resolve_timestamp("2023-01-02", now()),
            Some(Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_relative() {
        assert_eq!(
            resolve_timestamp("2h", now()),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(
            resolve_timestamp("45s", now()),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 11, 59, 15).unwrap())
        );
        assert_eq!(
            resolve_timestamp("3d", now()),
            Some(Utc.with_ymd_and_hms(2024, 5, 29, 12, 0, 0).unwrap())
        );
        assert_eq!(
            resolve_timestamp("10 m", now()),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 11, 50, 0).unwrap())
        );
    }

    #[test]
    fn test_calendar_dates() {
        assert_eq!(
            resolve_timestamp("May 13, 2023", now()),
            Some(Utc.with_ymd_and_hms(2023, 5, 13, 0, 0, 0).unwrap())
        );
        assert_eq!(
            resolve_timestamp("May 13", now()),
            Some(Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap())
        );
        // later in the year than now, so last year
        assert_eq!(
            resolve_timestamp("Dec 24", now()),
            Some(Utc.with_ymd_and_hms(2023, 12, 24, 0, 0, 0).unwrap())
        );
        assert_eq!(
            resolve_timestamp("3:04 PM · May 13, 2024", now()),
            Some(Utc.with_ymd_and_hms(2024, 5, 13, 15, 4, 0).unwrap())
        );
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(resolve_timestamp("", now()), None);
        assert_eq!(resolve_timestamp("yesterday-ish", now()), None);
        assert_eq!(resolve_timestamp("2w", now()), None);
        assert_eq!(resolve_timestamp("99999999999999999999d", now()), None);
    }
}
