//! Error type shared by every probability operation

use chrono::NaiveDate;
use thiserror::Error;

/// Precondition violations raised by the decrement engines.
///
/// Every operation is a pure function of its inputs, so none of these are
/// retryable: the caller has to fix the arguments.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecrementError {
    #[error("calculation date {calculation} must not be after decrement date {decrement}")]
    CalculationAfterDecrement {
        calculation: NaiveDate,
        decrement: NaiveDate,
    },

    #[error("date of birth {date_of_birth} must not be after {date}")]
    BornAfter {
        date_of_birth: NaiveDate,
        date: NaiveDate,
    },

    #[error("second date {second} is before first date {first}")]
    InvalidInterval { first: NaiveDate, second: NaiveDate },

    #[error("year {year} is more than one year before the improvement scale's first year {first_year}")]
    YearBeforeScale { year: i32, first_year: i32 },

    #[error("male proportion {0} must lie within [0, 1]")]
    ProportionOutOfRange(f64),

    #[error("a date sequence needs at least one date")]
    EmptyDates,

    #[error("dates must be strictly increasing: {previous} is followed by {next}")]
    UnorderedDates { previous: NaiveDate, next: NaiveDate },

    #[error("table {name} has no rates")]
    EmptyTable { name: String },

    #[error("a multiple decrement needs at least one cause")]
    NoCause,

    #[error("all causes of a multiple decrement must share one interpolation method")]
    MismatchedInterpolation,
}

pub type Result<T> = std::result::Result<T, DecrementError>;

/// Check the two temporal preconditions common to every probability query.
pub(crate) fn check_dates(
    date_of_birth: NaiveDate,
    calculation_date: NaiveDate,
    decrement_date: NaiveDate,
) -> Result<()> {
    if calculation_date > decrement_date {
        return Err(DecrementError::CalculationAfterDecrement {
            calculation: calculation_date,
            decrement: decrement_date,
        });
    }
    if date_of_birth > calculation_date {
        return Err(DecrementError::BornAfter {
            date_of_birth,
            date: calculation_date,
        });
    }
    Ok(())
}
