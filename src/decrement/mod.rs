//! Survival and decrement probability engines
//!
//! This module contains:
//! - Interpolation of annual rates within a year (UDD and constant force)
//! - Improvement of base rates over calendar years
//! - The single-cause engine, with unisex blending for gendered individuals
//! - The multiple decrement engine combining disability, lapse and mortality

mod adjustment;
mod improvement;
mod interpolation;
mod multiple;
mod probability;
mod single;
mod unisex;

pub use adjustment::{Adjustment, FlatAdjustment, GenderedAdjustment, NoAdjustment};
pub use improvement::{CachedImprovement, Improvement, ImprovementScale, NoImprovement};
pub use interpolation::Interpolation;
pub use multiple::MultipleDecrementEngine;
pub use probability::{MultipleDecrementProbabilities, MultipleDecrementProbability};
pub use single::DecrementEngine;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::dates::{add_years, first_day_of_following_year};
use crate::error::Result;
use crate::individual::Individual;
use crate::schedule::OrderedDates;

/// Number of anniversaries summed by the expectancies
pub const MAX_EXPECTANCY_YEARS: i32 = 115;

/// Which cumulative quantity a batch computation produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbabilityKind {
    Survival,
    Decrement,
    /// Joint survival and dependent probabilities of every cause
    Dependent,
}

/// Probability queries shared by the single-cause and multiple decrement engines
pub trait SurvivalModel<I: Individual>: Send + Sync {
    /// Probability of no decrement between `calculation_date` and `decrement_date`
    fn survival_probability(&self, individual: &I, calculation_date: NaiveDate, decrement_date: NaiveDate)
        -> Result<f64>;

    /// Cumulative survival from `calculation_date` to each date of the schedule
    fn survival_probabilities(&self, individual: &I, calculation_date: NaiveDate, dates: &OrderedDates)
        -> Result<Vec<f64>>;

    fn decrement_probability(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        decrement_date: NaiveDate,
    ) -> Result<f64> {
        Ok(1.0 - self.survival_probability(individual, calculation_date, decrement_date)?)
    }

    /// Cumulative probability of decrement from `calculation_date` to each date of the schedule
    fn decrement_probabilities(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
    ) -> Result<Vec<f64>>;

    /// Date from which no decrement can remain to happen
    fn last_possible_decrement_date(&self, individual: &I) -> NaiveDate;

    /// Sum of the survival probabilities to each of the next anniversaries
    fn kurtate_survival_expectancy(&self, individual: &I, calculation_date: NaiveDate) -> Result<f64> {
        (1..=MAX_EXPECTANCY_YEARS)
            .map(|years| self.survival_probability(individual, calculation_date, add_years(calculation_date, years)))
            .sum()
    }

    /// Kurtate expectancy plus half a year
    fn survival_expectancy(&self, individual: &I, calculation_date: NaiveDate) -> Result<f64> {
        Ok(self.kurtate_survival_expectancy(individual, calculation_date)? + 0.5)
    }
}

/// Split `[first, second]` at each 1 January and chain the pieces.
///
/// `partial` covers an interval within one calendar year, `whole` a complete
/// calendar year starting on the given 1 January.
pub(crate) fn walk_years<T>(
    first: NaiveDate,
    second: NaiveDate,
    partial: impl Fn(NaiveDate, NaiveDate) -> Result<T>,
    whole: impl Fn(NaiveDate) -> Result<T>,
    chain: impl Fn(T, T) -> T,
) -> Result<T> {
    let year_end = first_day_of_following_year(first);
    if second <= year_end {
        return partial(first, second);
    }

    let mut result = partial(first, year_end)?;
    let mut start = year_end;
    while start.year() < second.year() {
        result = chain(result, whole(start)?);
        start = first_day_of_following_year(start);
    }
    Ok(chain(result, partial(start, second)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_walk_years_segments() {
        let pieces = RefCell::new(Vec::new());
        let result = walk_years(
            date(2020, 3, 15),
            date(2023, 5, 1),
            |a, b| {
                pieces.borrow_mut().push(format!("{a}..{b}"));
                Ok(1)
            },
            |start| {
                pieces.borrow_mut().push(format!("year {}", start.year()));
                Ok(10)
            },
            |a, b| a + b,
        )
        .unwrap();

        assert_eq!(result, 22);
        assert_eq!(
            *pieces.borrow(),
            vec!["2020-03-15..2021-01-01", "year 2021", "year 2022", "2023-01-01..2023-05-01"]
        );
    }

    #[test]
    fn test_walk_years_within_one_year() {
        let calls = RefCell::new(0);
        let result = walk_years(
            date(2020, 3, 15),
            date(2021, 1, 1),
            |_, _| {
                *calls.borrow_mut() += 1;
                Ok(0.5)
            },
            |_| Ok(0.0),
            |a, b| a * b,
        )
        .unwrap();

        assert_eq!(result, 0.5);
        assert_eq!(*calls.borrow(), 1);
    }
}
