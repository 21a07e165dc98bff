// ⚠️ Error Taxonomy
// Every failure the core reports is recoverable and leaves the roster untouched.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors returned by roster queries, person construction and projection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RosterError {
    /// Age range bounds are reversed or negative.
    #[error("Invalid age range: min={min}, max={max} (need 0 <= min <= max)")]
    InvalidRange { min: i64, max: i64 },

    /// Input rejected before it reached the roster.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// Not enough people to run a projection.
    #[error("Need at least {required} people for projection, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Features carry no variance to analyze.
    #[error("Degenerate data: {0}")]
    DegenerateData(String),

    /// Numerical failure during decomposition.
    #[error("Projection failed: {0}")]
    ProjectionFailed(String),
}

/// Structured reasons an input value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("at least one non-empty name part is required")]
    EmptyName,

    #[error("expected exactly one alphabetic character, got {0:?}")]
    NotSingleLetter(String),

    #[error("no such calendar date: {year:04}-{month:02}-{day:02}")]
    ImpossibleDate { year: i32, month: u32, day: u32 },

    #[error("birth date {date} is after {today}")]
    FutureDate { date: NaiveDate, today: NaiveDate },

    #[error("birth date {date} is more than {max_years} years before {today}")]
    TooOld {
        date: NaiveDate,
        today: NaiveDate,
        max_years: u32,
    },

    #[error("malformed date {0:?}, expected DD/MM/YYYY")]
    MalformedDate(String),

    #[error("unknown education band {0:?}")]
    UnknownBand(String),
}

pub type RosterResult<T> = Result<T, RosterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_converts_into_roster_error() {
        let err: RosterError = InputError::EmptyName.into();
        assert_eq!(err, RosterError::InvalidInput(InputError::EmptyName));
    }

    #[test]
    fn test_error_messages() {
        let err = RosterError::InvalidRange { min: 10, max: 5 };
        assert_eq!(
            err.to_string(),
            "Invalid age range: min=10, max=5 (need 0 <= min <= max)"
        );

        let err = RosterError::InsufficientData {
            required: 3,
            actual: 2,
        };
        assert!(err.to_string().contains("at least 3"));

        let err = InputError::ImpossibleDate {
            year: 2023,
            month: 2,
            day: 30,
        };
        assert_eq!(err.to_string(), "no such calendar date: 2023-02-30");
    }
}
