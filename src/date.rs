//! Date utilities
//!
//! "Current month" and "today" are always evaluated in the configured
//! timezone (America/Chicago by default), not the machine's local zone.
//! The `*_at` variants take an explicit clock value so callers and tests can
//! pin the time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use rand::Rng;

use crate::error::{Error, Result};

/// Date expression types accepted on the command line
#[derive(Debug, Clone, PartialEq)]
pub enum DateExpression {
    /// Use today's date in the configured timezone
    Today,
    /// Pick a random date between the first of the month and today
    Random,
    /// Use an explicit date
    Explicit(NaiveDate),
}

/// Parse a date expression string into a DateExpression
///
/// Supported formats:
/// - `"today"` → Today
/// - `"random"` or `""` → Random
/// - `"2024-11-20"` → Explicit date (ISO format)
/// - `"11/20/2024"` → Explicit date (US format)
pub fn parse_date_expression(expr: &str) -> Result<DateExpression> {
    let expr = expr.trim();

    if expr.is_empty() || expr.eq_ignore_ascii_case("random") {
        return Ok(DateExpression::Random);
    }

    if expr.eq_ignore_ascii_case("today") {
        return Ok(DateExpression::Today);
    }

    if let Ok(date) = NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
        return Ok(DateExpression::Explicit(date));
    }

    if let Ok(date) = NaiveDate::parse_from_str(expr, "%m/%d/%Y") {
        return Ok(DateExpression::Explicit(date));
    }

    Err(Error::InvalidDateExpression(format!("Unable to parse date expression: {}", expr)))
}

/// Resolve a DateExpression to a calendar date
pub fn resolve_date<R: Rng + ?Sized>(expr: &DateExpression, tz: Tz, rng: &mut R) -> NaiveDate {
    match expr {
        DateExpression::Today => today_in(tz),
        DateExpression::Random => random_date_in_current_month(tz, rng),
        DateExpression::Explicit(date) => *date,
    }
}

/// Today's calendar date in `tz` at the instant `now`
pub fn today_at(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Today's calendar date in `tz`
pub fn today_in(tz: Tz) -> NaiveDate {
    today_at(Utc::now(), tz)
}

/// First day of the month containing `now` in `tz`
pub fn first_day_of_month_at(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    let today = today_at(now, tz);
    // day 1 exists in every month
    today.with_day(1).unwrap_or(today)
}

/// First day of the current month in `tz`
pub fn first_day_of_current_month(tz: Tz) -> NaiveDate {
    first_day_of_month_at(Utc::now(), tz)
}

/// A uniformly random date in `[first of month, today]` (both inclusive),
/// evaluated in `tz` at the instant `now`
pub fn random_date_in_month_at<R: Rng + ?Sized>(now: DateTime<Utc>, tz: Tz, rng: &mut R) -> NaiveDate {
    let first = first_day_of_month_at(now, tz);
    let today = today_at(now, tz);

    let span = (today - first).num_days();
    let offset = rng.gen_range(0..=span);

    first + Duration::days(offset)
}

/// A random date between the first of the current month and today in `tz`
pub fn random_date_in_current_month<R: Rng + ?Sized>(tz: Tz, rng: &mut R) -> NaiveDate {
    random_date_in_month_at(Utc::now(), tz, rng)
}

/// Format a date as it appears on the form: "MM/DD/YYYY"
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// Format a date for filenames: "YYYYMMDD"
pub fn format_compact(date: &NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::Chicago;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_today_and_random() {
        assert_eq!(parse_date_expression("today").unwrap(), DateExpression::Today);
        assert_eq!(parse_date_expression("TODAY").unwrap(), DateExpression::Today);
        assert_eq!(parse_date_expression("random").unwrap(), DateExpression::Random);
        assert_eq!(parse_date_expression("  ").unwrap(), DateExpression::Random);
    }

    #[test]
    fn test_parse_iso_and_us_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        assert_eq!(parse_date_expression("2024-05-03").unwrap(), DateExpression::Explicit(expected));
        assert_eq!(parse_date_expression("05/03/2024").unwrap(), DateExpression::Explicit(expected));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_date_expression("yesterday").is_err());
        assert!(parse_date_expression("2024-13-01").is_err());
    }

    #[test]
    fn test_resolve_explicit_ignores_clock() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(resolve_date(&DateExpression::Explicit(date), Chicago, &mut rng), date);
    }

    #[test]
    fn test_today_uses_configured_timezone() {
        // 03:00 UTC on June 1st is still May 31st in Chicago
        let now = utc(2024, 6, 1, 3);
        assert_eq!(today_at(now, Chicago), NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        assert_eq!(first_day_of_month_at(now, Chicago), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[test]
    fn test_random_date_stays_within_month_to_date() {
        let mut rng = StdRng::seed_from_u64(42);

        // every hour of a 31-day month, several draws each
        for day in 1..=31 {
            for hour in 0..24 {
                let now = utc(2024, 7, day, hour);
                let first = first_day_of_month_at(now, Chicago);
                let today = today_at(now, Chicago);
                for _ in 0..5 {
                    let date = random_date_in_month_at(now, Chicago, &mut rng);
                    assert!(date >= first, "{} before {}", date, first);
                    assert!(date <= today, "{} after {}", date, today);
                    assert_eq!(date.month(), today.month());
                }
            }
        }
    }

    #[test]
    fn test_random_date_on_first_of_month_is_first() {
        let mut rng = StdRng::seed_from_u64(7);
        let now = utc(2024, 3, 1, 18);
        for _ in 0..20 {
            assert_eq!(
                random_date_in_month_at(now, Chicago, &mut rng),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
            );
        }
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        assert_eq!(format_date(&date), "05/03/2024");
        assert_eq!(format_compact(&date), "20240503");

        let date = NaiveDate::from_ymd_opt(2026, 11, 20).unwrap();
        assert_eq!(format_date(&date), "11/20/2026");
        assert_eq!(format_compact(&date), "20261120");
    }
}
