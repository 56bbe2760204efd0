//! Relative review date resolution ("3 weeks ago" → calendar date).
//!
//! Months are 30 days and years 365 days. These approximations are part of
//! the stored date format and feed review keys, so they are kept as-is.

use chrono::{Days, Month, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::review::ParsedDate;

/// Days per unit, in match priority order.
static RELATIVE_PATTERNS: Lazy<Vec<(Regex, u64)>> = Lazy::new(|| {
    [(r"(\d+)\s+day", 1), (r"(\d+)\s+week", 7), (r"(\d+)\s+month", 30), (r"(\d+)\s+year", 365)]
        .into_iter()
        .map(|(p, days)| (Regex::new(p).expect("static date regex"), days))
        .collect()
});

/// Resolve a scraped date phrase against `today`.
///
/// Returns [`ParsedDate::Raw`] with the input unchanged when no rule applies.
pub fn parse_relative_date(text: &str, today: NaiveDate) -> ParsedDate {
    let lower = text.trim().to_lowercase();

    for (re, days_per_unit) in RELATIVE_PATTERNS.iter() {
        let Some(caps) = re.captures(&lower) else {
            continue;
        };
        let resolved = caps[1]
            .parse::<u64>()
            .ok()
            .and_then(|n| n.checked_mul(*days_per_unit))
            .and_then(|days| today.checked_sub_days(Days::new(days)));
        if let Some(date) = resolved {
            return ParsedDate::Date(date);
        }
    }

    match parse_month_year(&lower) {
        Some(date) => ParsedDate::Date(date),
        None => ParsedDate::Raw(text.to_string()),
    }
}

/// "march 2023" → 2023-03-01. Full month names only.
fn parse_month_year(lower: &str) -> Option<NaiveDate> {
    let mut parts = lower.split_whitespace();
    let (month_name, year_str) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let month = month_name.parse::<Month>().ok()?;
    if !month.name().eq_ignore_ascii_case(month_name) {
        return None;
    }
    if year_str.len() != 4 || !year_str.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year_str.parse().ok()?;

    NaiveDate::from_ymd_opt(year, month.number_from_month(), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weeks() {
        let parsed = parse_relative_date("3 weeks ago", day(2024, 1, 22));
        assert_eq!(parsed.to_string(), "2024-01-01");
    }

    #[test]
    fn test_days_months_years() {
        let now = day(2024, 3, 31);
        assert_eq!(parse_relative_date("2 days ago", now).as_date(), Some(day(2024, 3, 29)));
        assert_eq!(parse_relative_date("1 month ago", now).as_date(), Some(day(2024, 3, 1)));
        // 365-day year across a leap day
        assert_eq!(parse_relative_date("1 year ago", now).as_date(), Some(day(2023, 4, 1)));
    }

    #[test]
    fn test_case_and_padding() {
        let parsed = parse_relative_date("  5 DAYS AGO ", day(2024, 1, 10));
        assert_eq!(parsed.as_date(), Some(day(2024, 1, 5)));
    }

    #[test]
    fn test_month_year() {
        let parsed = parse_relative_date("March 2023", day(2024, 1, 1));
        assert_eq!(parsed.as_date(), Some(day(2023, 3, 1)));
        assert_eq!(
            parse_relative_date("Mar 2023", day(2024, 1, 1)),
            ParsedDate::Raw("Mar 2023".into())
        );
    }

    #[test]
    fn test_unmatched_returns_input_verbatim() {
        let today = day(2024, 1, 22);
        assert_eq!(
            parse_relative_date("no date info", today),
            ParsedDate::Raw("no date info".into())
        );
        assert_eq!(
            parse_relative_date("a month ago", today),
            ParsedDate::Raw("a month ago".into())
        );
    }

    #[test]
    fn test_huge_number_falls_back() {
        let parsed = parse_relative_date("99999999999999999999 days ago", day(2024, 1, 1));
        assert!(matches!(parsed, ParsedDate::Raw(_)));
    }
}
