//! Projection of base table rates to other calendar years
//!
//! A table's rates hold for its base year. For any other year the rate is
//! multiplied by the improvement factor: the product of `(1 - rate)` over
//! every calendar year from the base year to the target year, or its
//! reciprocal when the target year comes first.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use log::debug;

use super::adjustment::{Adjustment, NoAdjustment};
use crate::cache::{Cache, CacheConfig, EntryOptions, MemoryCache};
use crate::error::{DecrementError, Result};
use crate::individual::{Individual, IndividualKey};
use crate::tables::ImprovementTable;

/// Source of improvement factors for a decrement engine
pub trait Improvement<I: Individual>: Send + Sync {
    /// Label of the improvement, used in logs
    fn name(&self) -> &str;

    /// First calendar year of the underlying scale
    fn first_year(&self) -> i32;

    /// Adjusted improvement rate at `age` in `year`.
    /// Fails when `year` is more than one year before the scale.
    fn improvement_rate(&self, individual: &I, age: i32, year: i32) -> Result<f64>;

    /// Factor taking a rate from `base_year` to the year of `date`
    fn improvement_factor(&self, individual: &I, base_year: i32, date: NaiveDate) -> Result<f64>;
}

/// Shared validation of improvement factor arguments
fn check_improvement_dates(first_year: i32, date_of_birth: NaiveDate, base_year: i32, date: NaiveDate) -> Result<()> {
    if date_of_birth > date {
        return Err(DecrementError::BornAfter { date_of_birth, date });
    }
    for year in [date.year(), base_year] {
        if year < first_year - 1 {
            return Err(DecrementError::YearBeforeScale { year, first_year });
        }
    }
    Ok(())
}

/// Rates never improve: every factor is 1
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImprovement;

impl<I: Individual> Improvement<I> for NoImprovement {
    fn name(&self) -> &str {
        "none"
    }

    fn first_year(&self) -> i32 {
        i32::MIN + 1
    }

    fn improvement_rate(&self, _individual: &I, _age: i32, _year: i32) -> Result<f64> {
        Ok(0.0)
    }

    fn improvement_factor(&self, _individual: &I, _base_year: i32, _date: NaiveDate) -> Result<f64> {
        Ok(1.0)
    }
}

/// Improvement from a scale, each yearly rate scaled by an adjustment
pub struct ImprovementScale<I: Individual> {
    name: String,
    table: Arc<dyn ImprovementTable<I>>,
    adjustment: Arc<dyn Adjustment<I>>,
}

impl<I: Individual + 'static> ImprovementScale<I> {
    pub fn new(table: Arc<dyn ImprovementTable<I>>, adjustment: Arc<dyn Adjustment<I>>) -> Self {
        Self {
            name: format!("{}*{}", table.name(), adjustment.name()),
            table,
            adjustment,
        }
    }

    /// Scale rates used as published
    pub fn unadjusted(table: Arc<dyn ImprovementTable<I>>) -> Self {
        Self::new(table, Arc::new(NoAdjustment))
    }
}

impl<I: Individual> Improvement<I> for ImprovementScale<I> {
    fn name(&self) -> &str {
        &self.name
    }

    fn first_year(&self) -> i32 {
        self.table.first_year()
    }

    fn improvement_rate(&self, individual: &I, age: i32, year: i32) -> Result<f64> {
        let first_year = self.table.first_year();
        if year < first_year - 1 {
            return Err(DecrementError::YearBeforeScale { year, first_year });
        }
        let rate = self.table.improvement_rate(individual, age, self.table.year_limited(year));
        Ok(self.adjustment.factor(individual) * rate)
    }

    fn improvement_factor(&self, individual: &I, base_year: i32, date: NaiveDate) -> Result<f64> {
        check_improvement_dates(self.table.first_year(), individual.date_of_birth(), base_year, date)?;
        if date.year() == base_year {
            return Ok(1.0);
        }

        let adjustment = self.adjustment.factor(individual);
        let yearly: Vec<f64> = self
            .table
            .improvement_rates_over_range(individual, base_year, date)
            .iter()
            .map(|rate| 1.0 - adjustment * rate)
            .collect();

        let years = (date.year() - base_year).unsigned_abs() as usize;
        let mut factor: f64 = yearly.iter().take(years).product();
        // A short sequence keeps applying its last yearly factor
        if let Some(&last) = yearly.last() {
            for _ in yearly.len()..years {
                factor *= last;
            }
        }

        if date.year() < base_year {
            Ok(1.0 / factor)
        } else {
            Ok(factor)
        }
    }
}

type FactorKey = (IndividualKey, i32, i32);

/// Memoizes the factors of another improvement per individual and year pair
pub struct CachedImprovement<I: Individual> {
    inner: Arc<dyn Improvement<I>>,
    cache: MemoryCache<FactorKey, f64>,
    options: EntryOptions,
}

impl<I: Individual> CachedImprovement<I> {
    pub fn new(inner: Arc<dyn Improvement<I>>) -> Self {
        Self::with_config(inner, &CacheConfig::improvement())
    }

    pub fn with_config(inner: Arc<dyn Improvement<I>>, config: &CacheConfig) -> Self {
        Self {
            inner,
            cache: MemoryCache::new(config),
            options: config.entry_options(),
        }
    }

    pub fn hit_rate(&self) -> f64 {
        self.cache.hit_rate()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl<I: Individual> Improvement<I> for CachedImprovement<I> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn first_year(&self) -> i32 {
        self.inner.first_year()
    }

    fn improvement_rate(&self, individual: &I, age: i32, year: i32) -> Result<f64> {
        self.inner.improvement_rate(individual, age, year)
    }

    fn improvement_factor(&self, individual: &I, base_year: i32, date: NaiveDate) -> Result<f64> {
        check_improvement_dates(self.inner.first_year(), individual.date_of_birth(), base_year, date)?;
        if date.year() == base_year {
            return Ok(1.0);
        }

        let key = (individual.cache_key(), base_year, date.year());
        self.cache.get_or_compute(key, self.options, &|| {
            debug!(
                "improvement factor {} from {} to {} not cached",
                self.inner.name(),
                base_year,
                date.year()
            );
            self.inner.improvement_factor(individual, base_year, date)
        })
    }
}
