//! Date normalisation for episode listings.
//!
//! Directory pages print publish dates in whatever shape their templates
//! prefer: "14 Nov 2024", "Nov 14, 2024", "15 Dec" or "2 days ago". This module
//! resolves those strings against an explicit reference instant and renders a
//! [`CanonicalDate`]: a long day-month-year form plus an ISO `YYYY-MM-DD` date.
//!
//! Resolution order, first match wins:
//!
//! 1. relative expressions (`<n> <unit>[s] ago`)
//! 2. "Day Month [Year]" and "Month Day [Year]", with year inference when the
//!    year is missing; a leading weekday ("Thu", "Thursday") is ignored
//! 3. a handful of machine formats (RFC 3339, RFC 2822, numeric dates and
//!    datetimes) and "Month Year", which resolves to the first of the month
//!
//! Anything else is echoed back unchanged with no ISO value.
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::episode::{NormalizedEpisodeRecord, RawEpisodeRecord};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

const WEEKDAY_ABBREVIATIONS: [&str; 7] = ["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];

const FALLBACK_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

const FALLBACK_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Canonical rendering of a raw date string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalDate {
    /// "14 November 2024" on success, the untouched input otherwise.
    pub full: Option<String>,
    /// `YYYY-MM-DD` on success.
    pub iso: Option<String>,
}

/// Normalise `raw` relative to `now`.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use podharvest_core::normalize_date;
///
/// let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
/// let date = normalize_date(Some("2 days ago"), now);
/// assert_eq!(date.full.as_deref(), Some("8 January 2024"));
/// assert_eq!(date.iso.as_deref(), Some("2024-01-08"));
/// ```
pub fn normalize_date(raw: Option<&str>, now: DateTime<Utc>) -> CanonicalDate {
    let Some(raw) = raw else {
        return CanonicalDate {
            full: None,
            iso: None,
        };
    };

    match resolve(raw, now) {
        Some(date) => CanonicalDate {
            full: Some(date.format("%-d %B %Y").to_string()),
            iso: Some(date.format("%Y-%m-%d").to_string()),
        },
        None => {
            trace!(target: "normalizer", %raw, "unrecognised date; keeping raw text");
            CanonicalDate {
                full: Some(raw.to_string()),
                iso: None,
            }
        }
    }
}

/// Normalise every record in order, producing new records.
pub fn normalize_records(
    records: Vec<RawEpisodeRecord>,
    now: DateTime<Utc>,
) -> Vec<NormalizedEpisodeRecord> {
    records.into_iter().map(|r| r.normalize(now)).collect()
}

fn resolve(raw: &str, now: DateTime<Utc>) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    // RFC 2822 needs its weekday comma, so timestamps are tried on the untouched text.
    if let Some(date) = resolve_timestamp(trimmed) {
        return Some(date);
    }

    let cleaned = trimmed.replace(',', "");
    let upper = cleaned.to_uppercase();
    let dated = strip_weekday(&upper);

    resolve_relative(&upper, now)
        .or_else(|| resolve_absolute(dated, now))
        .or_else(|| resolve_fallback(cleaned.trim()))
        .or_else(|| resolve_month_year(dated))
}

fn relative_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"(?i)\b(\d+)\s+(SECOND|MINUTE|HOUR|DAY|WEEK|MONTH|YEAR)S?\s+AGO\b").ok()
        })
        .as_ref()
}

fn resolve_relative(upper: &str, now: DateTime<Utc>) -> Option<NaiveDate> {
    let caps = relative_pattern()?.captures(upper)?;
    let amount: u32 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str().to_ascii_uppercase();

    let instant = match unit.as_str() {
        "SECOND" => now.checked_sub_signed(Duration::seconds(amount.into())),
        "MINUTE" => now.checked_sub_signed(Duration::minutes(amount.into())),
        "HOUR" => now.checked_sub_signed(Duration::hours(amount.into())),
        "DAY" => now.checked_sub_days(Days::new(amount.into())),
        "WEEK" => now.checked_sub_days(Days::new(u64::from(amount) * 7)),
        "MONTH" => now.checked_sub_months(Months::new(amount)),
        "YEAR" => now.checked_sub_months(Months::new(amount.checked_mul(12)?)),
        _ => None,
    }?;

    Some(instant.date_naive())
}

fn resolve_absolute(upper: &str, now: DateTime<Utc>) -> Option<NaiveDate> {
    let parts: Vec<&str> = upper.split_whitespace().collect();
    let (first, second) = (*parts.first()?, *parts.get(1)?);

    let (day, month) = if let (Some(day), Some(month)) = (day_token(first), month_token(second)) {
        (day, month)
    } else if let (Some(month), Some(day)) = (month_token(first), day_token(second)) {
        (day, month)
    } else {
        return None;
    };

    match parts.get(2).copied().and_then(year_token) {
        Some(year) => NaiveDate::from_ymd_opt(year, month, day),
        None => {
            let this_year = NaiveDate::from_ymd_opt(now.year(), month, day)?;
            let midnight = this_year.and_hms_opt(0, 0, 0)?.and_utc();
            if midnight > now {
                NaiveDate::from_ymd_opt(now.year() - 1, month, day)
            } else {
                Some(this_year)
            }
        }
    }
}

fn resolve_timestamp(text: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

fn resolve_fallback(cleaned: &str) -> Option<NaiveDate> {
    FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cleaned, fmt).ok())
        .map(|ndt| ndt.date())
        .or_else(|| {
            FALLBACK_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok())
        })
}

/// "November 2024" is the first of that month.
fn resolve_month_year(upper: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = upper.split_whitespace().collect();
    let [month, year] = parts.as_slice() else {
        return None;
    };
    NaiveDate::from_ymd_opt(year_token(year)?, month_token(month)?, 1)
}

/// Drops a leading weekday name ("THU", "THURSDAY").
fn strip_weekday(upper: &str) -> &str {
    match upper.trim_start().split_once(char::is_whitespace) {
        Some((first, rest)) if weekday_token(first) => rest.trim_start(),
        _ => upper,
    }
}

fn weekday_token(token: &str) -> bool {
    token.len() >= 3
        && token.bytes().all(|b| b.is_ascii_alphabetic())
        && token
            .get(..3)
            .is_some_and(|prefix| WEEKDAY_ABBREVIATIONS.contains(&prefix))
}

/// A one or two digit day of month.
fn day_token(token: &str) -> Option<u32> {
    if (1..=2).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}

/// Month number (1-based) from the first three letters of `token`.
fn month_token(token: &str) -> Option<u32> {
    let prefix = token.get(..3)?;
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| *m == prefix)
        .map(|idx| idx as u32 + 1)
}

/// Exactly four digits.
fn year_token(token: &str) -> Option<i32> {
    if token.len() == 4 && token.bytes().all(|b| b.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn norm(raw: &str, now: DateTime<Utc>) -> (String, Option<String>) {
        let out = normalize_date(Some(raw), now);
        (out.full.unwrap(), out.iso)
    }

    #[test]
    fn day_month_year() {
        let (full, iso) = norm("14 NOV 2024", at(2025, 6, 1, 0));
        assert_eq!(full, "14 November 2024");
        assert_eq!(iso.as_deref(), Some("2024-11-14"));
    }

    #[test]
    fn month_day_year_with_comma_and_full_month_name() {
        let (full, iso) = norm("November 4, 2024", at(2025, 6, 1, 0));
        assert_eq!(full, "4 November 2024");
        assert_eq!(iso.as_deref(), Some("2024-11-04"));
    }

    #[test]
    fn mixed_case_is_accepted() {
        let (_, iso) = norm("3 sEpTeMbEr 2023", at(2025, 6, 1, 0));
        assert_eq!(iso.as_deref(), Some("2023-09-03"));
    }

    #[test]
    fn relative_days() {
        let (full, iso) = norm("2 DAYS AGO", at(2024, 1, 10, 12));
        assert_eq!(full, "8 January 2024");
        assert_eq!(iso.as_deref(), Some("2024-01-08"));
    }

    #[test]
    fn relative_singular_and_embedded() {
        let now = at(2024, 1, 10, 12);
        assert_eq!(norm("1 week ago", now).1.as_deref(), Some("2024-01-03"));
        assert_eq!(
            norm("Published 3 hours ago", now).1.as_deref(),
            Some("2024-01-10")
        );
        assert_eq!(norm("13 hours ago", now).1.as_deref(), Some("2024-01-09"));
        assert_eq!(norm("45 minutes ago", now).1.as_deref(), Some("2024-01-10"));
        assert_eq!(norm("30 seconds ago", now).1.as_deref(), Some("2024-01-10"));
    }

    #[test]
    fn relative_months_and_years_use_calendar_fields() {
        let now = at(2024, 3, 31, 8);
        assert_eq!(norm("1 month ago", now).1.as_deref(), Some("2024-02-29"));
        assert_eq!(norm("2 years ago", now).1.as_deref(), Some("2022-03-31"));
    }

    #[test]
    fn relative_counts_with_thousands_separator() {
        let now = at(2024, 1, 10, 12);
        assert_eq!(
            norm("1,000 days ago", now).1.as_deref(),
            Some("2021-04-15")
        );
    }

    #[test]
    fn missing_year_in_future_rolls_back() {
        let (full, iso) = norm("15 DEC", at(2024, 1, 10, 0));
        assert_eq!(full, "15 December 2023");
        assert_eq!(iso.as_deref(), Some("2023-12-15"));
    }

    #[test]
    fn missing_year_in_past_uses_current_year() {
        let (_, iso) = norm("Jan 2", at(2024, 1, 10, 0));
        assert_eq!(iso.as_deref(), Some("2024-01-02"));
    }

    #[test]
    fn today_without_year_is_not_future() {
        let (_, iso) = norm("10 Jan", at(2024, 1, 10, 0));
        assert_eq!(iso.as_deref(), Some("2024-01-10"));
    }

    #[test]
    fn two_digit_year_is_not_a_year() {
        let (_, iso) = norm("14 Nov 23", at(2024, 1, 10, 0));
        assert_eq!(iso.as_deref(), Some("2023-11-14"));
    }

    #[test]
    fn invalid_calendar_date_is_echoed() {
        let out = normalize_date(Some("31 Feb 2024"), at(2024, 6, 1, 0));
        assert_eq!(out.full.as_deref(), Some("31 Feb 2024"));
        assert_eq!(out.iso, None);
    }

    #[test]
    fn fallback_formats() {
        let now = at(2024, 6, 1, 0);
        assert_eq!(
            norm("2024-03-05", now),
            ("5 March 2024".to_string(), Some("2024-03-05".to_string()))
        );
        assert_eq!(
            norm("2024-03-05T23:30:00Z", now).1.as_deref(),
            Some("2024-03-05")
        );
        assert_eq!(norm("03/05/2024", now).1.as_deref(), Some("2024-03-05"));
    }

    #[test]
    fn rfc2822_keeps_its_weekday_comma() {
        let now = at(2025, 6, 1, 0);
        assert_eq!(
            norm("Thu, 14 Nov 2024 10:00:00 GMT", now),
            ("14 November 2024".to_string(), Some("2024-11-14".to_string()))
        );
        assert_eq!(
            norm("Fri, 15 Nov 2024 01:30:00 +0200", now).1.as_deref(),
            Some("2024-11-14")
        );
    }

    #[test]
    fn leading_weekday_is_ignored() {
        let now = at(2025, 6, 1, 0);
        assert_eq!(
            norm("Thursday, November 14, 2024", now).1.as_deref(),
            Some("2024-11-14")
        );
        assert_eq!(norm("Thu 14 Nov 2024", now).1.as_deref(), Some("2024-11-14"));
        assert_eq!(norm("Sat, 2 Mar", now).1.as_deref(), Some("2025-03-02"));
    }

    #[test]
    fn space_separated_datetime() {
        let now = at(2025, 6, 1, 0);
        assert_eq!(
            norm("2024-11-14 10:00:00", now).1.as_deref(),
            Some("2024-11-14")
        );
        assert_eq!(
            norm("2024-11-14T10:00:00.250", now).1.as_deref(),
            Some("2024-11-14")
        );
    }

    #[test]
    fn month_and_year_resolve_to_first_of_month() {
        let (full, iso) = norm("November 2024", at(2025, 6, 1, 0));
        assert_eq!(full, "1 November 2024");
        assert_eq!(iso.as_deref(), Some("2024-11-01"));
    }

    #[test]
    fn weekday_alone_is_echoed() {
        let out = normalize_date(Some("Thursday"), at(2025, 6, 1, 0));
        assert_eq!(out.full.as_deref(), Some("Thursday"));
        assert_eq!(out.iso, None);
    }

    #[test]
    fn weekday_token_needs_a_weekday_prefix() {
        assert!(weekday_token("THU"));
        assert!(weekday_token("WEDNESDAY"));
        assert!(!weekday_token("MAR"));
        assert!(!weekday_token("TH"));
        assert!(!weekday_token("14"));
    }

    #[test]
    fn garbage_is_echoed_unchanged() {
        let out = normalize_date(Some("garbage text"), at(2024, 1, 10, 0));
        assert_eq!(
            out,
            CanonicalDate {
                full: Some("garbage text".to_string()),
                iso: None
            }
        );
    }

    #[test]
    fn raw_text_is_preserved_verbatim_on_failure() {
        let out = normalize_date(Some("  Coming, soon  "), at(2024, 1, 10, 0));
        assert_eq!(out.full.as_deref(), Some("  Coming, soon  "));
        assert_eq!(out.iso, None);
    }

    #[test]
    fn absent_input() {
        let out = normalize_date(None, at(2024, 1, 10, 0));
        assert_eq!(
            out,
            CanonicalDate {
                full: None,
                iso: None
            }
        );
    }

    #[test]
    fn empty_input_is_echoed() {
        let out = normalize_date(Some(""), at(2024, 1, 10, 0));
        assert_eq!(out.full.as_deref(), Some(""));
        assert_eq!(out.iso, None);
    }

    #[test]
    fn month_token_uses_first_three_letters() {
        assert_eq!(month_token("NOVEMBER"), Some(11));
        assert_eq!(month_token("NOV"), Some(11));
        assert_eq!(month_token("NO"), None);
        assert_eq!(month_token("ÉTÉ"), None);
    }

    #[test]
    fn records_are_mapped_in_order() {
        let now = at(2024, 1, 10, 12);
        let raws = vec![
            RawEpisodeRecord::new("b", None, Some("1 day ago"), None).unwrap(),
            RawEpisodeRecord::new("a", None, Some("nonsense"), None).unwrap(),
        ];
        let out = normalize_records(raws, now);
        assert_eq!(out[0].title, "b");
        assert_eq!(out[0].date_iso.as_deref(), Some("2024-01-09"));
        assert_eq!(out[1].date.as_deref(), Some("nonsense"));
        assert_eq!(out[1].date_iso, None);
    }
}
