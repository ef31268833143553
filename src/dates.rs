//! Calendar helpers used by tables and interpolation
//!
//! Year fractions use an actual/actual day count within the calendar year of
//! the first date, and ages are measured to the nearest birthday.

use chrono::{Datelike, Months, NaiveDate};

/// 1 January of the date's year
pub fn first_day_of_year(date: NaiveDate) -> NaiveDate {
    date.with_ordinal(1).unwrap_or(date)
}

/// 1 January of the year after the date's year
pub fn first_day_of_following_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).unwrap_or(NaiveDate::MAX)
}

/// Number of days in a calendar year (365 or 366)
pub fn days_in_year(year: i32) -> i64 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// Fraction of the calendar year elapsed at `date` (0 on 1 January)
pub fn fraction_of_year_elapsed(date: NaiveDate) -> f64 {
    let elapsed = (date - first_day_of_year(date)).num_days();
    elapsed as f64 / days_in_year(date.year()) as f64
}

/// Length of `[first, second]` expressed in years of `first`'s calendar year
pub fn fraction_between(first: NaiveDate, second: NaiveDate) -> f64 {
    (second - first).num_days() as f64 / days_in_year(first.year()) as f64
}

/// Shift a date by whole years; 29 February falls back to 28 February.
pub fn add_years(date: NaiveDate, years: i32) -> NaiveDate {
    let months = Months::new(years.unsigned_abs() * 12);
    if years >= 0 {
        date.checked_add_months(months).unwrap_or(NaiveDate::MAX)
    } else {
        date.checked_sub_months(months).unwrap_or(NaiveDate::MIN)
    }
}

/// Age at `date` rounded to the nearest birthday (half a year rounds up)
pub fn age_nearest_birthday(date_of_birth: NaiveDate, date: NaiveDate) -> i32 {
    let mut completed = date.year() - date_of_birth.year();
    if (date.month(), date.day()) < (date_of_birth.month(), date_of_birth.day()) {
        completed -= 1;
    }
    let last_birthday = add_years(date_of_birth, completed);
    let next_birthday = add_years(date_of_birth, completed + 1);
    if date - last_birthday >= next_birthday - date {
        completed + 1
    } else {
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_year_boundaries() {
        assert_eq!(first_day_of_year(date(2021, 8, 14)), date(2021, 1, 1));
        assert_eq!(first_day_of_following_year(date(2021, 8, 14)), date(2022, 1, 1));
        assert_eq!(first_day_of_following_year(date(2021, 1, 1)), date(2022, 1, 1));
        assert_eq!(days_in_year(2020), 366);
        assert_eq!(days_in_year(2021), 365);
    }

    #[test]
    fn test_year_fractions() {
        assert_eq!(fraction_of_year_elapsed(date(2021, 1, 1)), 0.0);
        // 2020 is a leap year: 1 July is day 182 of 366
        assert_abs_diff_eq!(fraction_of_year_elapsed(date(2020, 7, 1)), 182.0 / 366.0, epsilon = 1e-15);
        assert_abs_diff_eq!(fraction_between(date(2021, 3, 1), date(2022, 1, 1)), 306.0 / 365.0, epsilon = 1e-15);
        assert_eq!(fraction_between(date(2021, 1, 1), date(2022, 1, 1)), 1.0);
    }

    #[test]
    fn test_add_years_leap_day() {
        assert_eq!(add_years(date(2020, 2, 29), 1), date(2021, 2, 28));
        assert_eq!(add_years(date(2020, 2, 29), 4), date(2024, 2, 29));
        assert_eq!(add_years(date(2020, 6, 15), -3), date(2017, 6, 15));
    }

    #[test]
    fn test_age_nearest_birthday() {
        let dob = date(2000, 1, 1);
        assert_eq!(age_nearest_birthday(dob, date(2000, 1, 1)), 0);
        assert_eq!(age_nearest_birthday(dob, date(2021, 1, 1)), 21);
        assert_eq!(age_nearest_birthday(dob, date(2021, 5, 1)), 21);
        assert_eq!(age_nearest_birthday(dob, date(2021, 9, 1)), 22);

        let dob = date(1980, 10, 1);
        assert_eq!(age_nearest_birthday(dob, date(2021, 1, 1)), 40);
        assert_eq!(age_nearest_birthday(dob, date(2021, 6, 1)), 41);
    }
}
