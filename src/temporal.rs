// ⏰ Temporal Model - birth dates and derived ages
//
// Two dates matter for every person:
// 1. Birth date: fixed, supplied once at registration
// 2. Evaluation date: "today" when the person was registered
//
// Age is a pure function of both, so every helper takes `today` explicitly.
// Only `today()` reads the wall clock.

use crate::error::InputError;
use chrono::{Datelike, Local, NaiveDate};

/// Display/entry format for birth dates
pub const BIRTH_DATE_FORMAT: &str = "%d/%m/%Y";

/// Default oldest accepted birth year, relative to today's year
pub const DEFAULT_MAX_AGE_YEARS: u32 = 100;

// ============================================================================
// AGE DERIVATION
// ============================================================================

/// Current local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Completed years between `birth_date` and `today`.
///
/// Compares `(month, day)` tuples instead of rebuilding the birthday in the
/// current year, so a Feb 29 birthday needs no special case in non-leap years:
/// (2, 28) < (2, 29) means the birthday has not happened yet on Feb 28.
///
/// Returns 0 when `birth_date` is after `today`.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Reject birth dates in the future or too far in the past.
///
/// The lower bound compares calendar years only: any date in
/// `today.year - max_years` is still accepted.
pub fn validate_birth_date(
    birth_date: NaiveDate,
    today: NaiveDate,
    max_years: u32,
) -> Result<(), InputError> {
    if birth_date > today {
        return Err(InputError::FutureDate {
            date: birth_date,
            today,
        });
    }

    let earliest_year = today.year().saturating_sub_unsigned(max_years);
    if birth_date.year() < earliest_year {
        return Err(InputError::TooOld {
            date: birth_date,
            today,
            max_years,
        });
    }

    Ok(())
}

/// Build a date from raw components, rejecting impossible combinations
pub fn birth_date_from_ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate, InputError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(InputError::ImpossibleDate { year, month, day })
}

/// Parse `DD/MM/YYYY`.
///
/// Shape and digit problems are `MalformedDate`; well-formed numbers that name
/// no real day (31/02/2020) are `ImpossibleDate`.
pub fn parse_birth_date(text: &str) -> Result<NaiveDate, InputError> {
    let malformed = || InputError::MalformedDate(text.to_string());

    let parts: Vec<&str> = text.trim().split('/').map(str::trim).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(malformed());
    }

    let day: u32 = parts[0].parse().map_err(|_| malformed())?;
    let month: u32 = parts[1].parse().map_err(|_| malformed())?;
    let year: i32 = parts[2].parse().map_err(|_| malformed())?;

    birth_date_from_ymd(year, month, day)
}

/// Format a birth date for display (`DD/MM/YYYY`)
pub fn format_birth_date(date: NaiveDate) -> String {
    date.format(BIRTH_DATE_FORMAT).to_string()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        let birth = date(2000, 6, 15);

        assert_eq!(age_on(birth, date(2024, 6, 14)), 23);
        assert_eq!(age_on(birth, date(2024, 6, 15)), 24);
        assert_eq!(age_on(birth, date(2024, 12, 31)), 24);
    }

    #[test]
    fn test_age_leap_day_birthday() {
        let birth = date(2008, 2, 29);

        // Non-leap year: birthday not reached on Feb 28
        assert_eq!(age_on(birth, date(2023, 2, 28)), 14);
        assert_eq!(age_on(birth, date(2023, 3, 1)), 15);
        // Leap year
        assert_eq!(age_on(birth, date(2024, 2, 29)), 16);
    }

    #[test]
    fn test_age_born_today_is_zero() {
        let today = date(2024, 3, 10);
        assert_eq!(age_on(today, today), 0);
    }

    #[test]
    fn test_age_within_one_of_year_difference() {
        let today = date(2024, 7, 1);
        for year in 1930..=2024 {
            for (m, d) in [(1, 1), (2, 29), (7, 1), (7, 2), (12, 31)] {
                let Some(birth) = NaiveDate::from_ymd_opt(year, m, d) else {
                    continue;
                };
                if birth > today {
                    continue;
                }
                let age = age_on(birth, today) as i32;
                let diff = today.year() - birth.year();
                assert!(age == diff || age == diff - 1, "{} -> {}", birth, age);
                assert!(age >= 0);
            }
        }
    }

    #[test]
    fn test_validate_future_date() {
        let today = date(2024, 1, 1);
        let result = validate_birth_date(date(2024, 1, 2), today, DEFAULT_MAX_AGE_YEARS);

        assert!(matches!(result, Err(InputError::FutureDate { .. })));
        assert!(validate_birth_date(today, today, DEFAULT_MAX_AGE_YEARS).is_ok());
    }

    #[test]
    fn test_validate_too_old() {
        let today = date(2024, 5, 5);

        assert!(validate_birth_date(date(1924, 1, 1), today, 100).is_ok());
        assert!(matches!(
            validate_birth_date(date(1923, 12, 31), today, 100),
            Err(InputError::TooOld { max_years: 100, .. })
        ));
    }

    #[test]
    fn test_validate_huge_max_age_saturates() {
        let today = date(2024, 5, 5);

        assert!(validate_birth_date(date(1, 1, 1), today, u32::MAX).is_ok());
        assert!(validate_birth_date(date(2010, 1, 1), today, 0).is_err());
        assert!(validate_birth_date(date(2024, 1, 1), today, 0).is_ok());
    }

    #[test]
    fn test_birth_date_from_ymd_rejects_impossible() {
        assert!(birth_date_from_ymd(2020, 2, 29).is_ok());
        assert_eq!(
            birth_date_from_ymd(2021, 2, 29),
            Err(InputError::ImpossibleDate {
                year: 2021,
                month: 2,
                day: 29
            })
        );
        assert!(birth_date_from_ymd(2021, 13, 1).is_err());
    }

    #[test]
    fn test_parse_birth_date() {
        assert_eq!(parse_birth_date("15/06/2000"), Ok(date(2000, 6, 15)));
        assert_eq!(parse_birth_date(" 1/2/2003 "), Ok(date(2003, 2, 1)));
    }

    #[test]
    fn test_parse_birth_date_structured_errors() {
        assert!(matches!(
            parse_birth_date("2000-06-15"),
            Err(InputError::MalformedDate(_))
        ));
        assert!(matches!(
            parse_birth_date("aa/06/2000"),
            Err(InputError::MalformedDate(_))
        ));
        assert!(matches!(
            parse_birth_date("15//2000"),
            Err(InputError::MalformedDate(_))
        ));
        assert!(matches!(
            parse_birth_date("31/02/2000"),
            Err(InputError::ImpossibleDate { .. })
        ));
    }

    #[test]
    fn test_format_birth_date() {
        assert_eq!(format_birth_date(date(2001, 9, 3)), "03/09/2001");
    }
}
