//! Rate tables consumed by the decrement engines
//!
//! The engines only rely on the two traits below; the in-memory tables are
//! what a host application builds from its own data sources.

mod improvement;
mod rates;

pub use improvement::{GenderedImprovementTable, UniformImprovementTable};
pub use rates::{AgeRateTable, GenderedRateTable};

use chrono::{Datelike, NaiveDate};

use crate::dates::{add_years, age_nearest_birthday, first_day_of_following_year, first_day_of_year};
use crate::individual::Individual;

/// Age-indexed table of annual decrement rates
pub trait DecrementTable<I: Individual>: Send + Sync {
    /// Label of the table, used in logs and engine descriptions
    fn name(&self) -> &str;

    /// Base annual decrement rate in [0, 1] for the year containing `date`
    fn rate(&self, individual: &I, date: NaiveDate) -> f64;

    fn first_age(&self) -> i32;
    fn last_age(&self) -> i32;

    /// Calendar year the rates are expressed in, the origin of improvement
    fn base_year(&self) -> i32;

    /// Age nearest birthday on 1 January of the year of `date`, clamped to the table
    fn age_limited(&self, individual: &I, date: NaiveDate) -> i32 {
        let age = age_nearest_birthday(individual.date_of_birth(), first_day_of_year(date));
        age.min(self.last_age()).max(self.first_age())
    }

    fn is_older_than_last_age(&self, individual: &I, date: NaiveDate) -> bool {
        age_nearest_birthday(individual.date_of_birth(), first_day_of_year(date)) > self.last_age()
    }

    /// First 1 January on which the individual is past the table's last age
    fn last_possible_decrement_date(&self, individual: &I) -> NaiveDate {
        let date = first_day_of_following_year(individual.date_of_birth());
        if age_nearest_birthday(individual.date_of_birth(), date) == 0 {
            add_years(date, self.last_age() + 1)
        } else {
            add_years(date, self.last_age())
        }
    }
}

/// Improvement scale: yearly rates of decline of the base rates
pub trait ImprovementTable<I: Individual>: Send + Sync {
    fn name(&self) -> &str;

    /// Improvement rate for an age and calendar year, both within the scale
    fn improvement_rate(&self, individual: &I, age: i32, year: i32) -> f64;

    fn first_age(&self) -> i32;
    fn last_age(&self) -> i32;
    fn first_year(&self) -> i32;
    fn last_year(&self) -> i32;

    /// Age nearest birthday on 1 January of `year`, clamped to the scale
    fn age_limited(&self, individual: &I, year: i32) -> i32 {
        let age = NaiveDate::from_ymd_opt(year, 1, 1)
            .map(|date| age_nearest_birthday(individual.date_of_birth(), date))
            .unwrap_or_else(|| year - individual.date_of_birth().year());
        age.min(self.last_age()).max(self.first_age())
    }

    fn year_limited(&self, year: i32) -> i32 {
        year.min(self.last_year()).max(self.first_year())
    }

    /// One rate per calendar year after `min(base_year, date.year)` up to and
    /// including `max(base_year, date.year)`, in increasing year order.
    ///
    /// The individual ages with the calendar, so each year uses the age
    /// attained that year. Years outside the scale reuse its boundary year.
    fn improvement_rates_over_range(&self, individual: &I, base_year: i32, date: NaiveDate) -> Vec<f64> {
        let target_year = date.year();
        let (low, high) = (base_year.min(target_year), base_year.max(target_year));
        ((low + 1)..=high)
            .map(|year| {
                let age = self.age_limited(individual, year);
                self.improvement_rate(individual, age, self.year_limited(year))
            })
            .collect()
    }
}
