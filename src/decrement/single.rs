//! Single-cause decrement engine
//!
//! The effective annual rate of a calendar year is the table rate, improved
//! from the table's base year and multiplied by the adjustment. Survival over
//! a span chains the interpolated partial first and last years with the
//! whole years in between.

use std::sync::Arc;

use chrono::NaiveDate;
use log::warn;

use super::adjustment::{Adjustment, NoAdjustment};
use super::improvement::{Improvement, NoImprovement};
use super::interpolation::Interpolation;
use super::{walk_years, ProbabilityKind, SurvivalModel};
use crate::cache::{cached_series, source_identity, EntryOptions, ProbabilityCache, ProbabilityKey};
use crate::error::{check_dates, Result};
use crate::individual::Individual;
use crate::schedule::OrderedDates;
use crate::tables::DecrementTable;

/// Survival and decrement probabilities for one cause
pub struct DecrementEngine<I: Individual> {
    interpolation: Interpolation,
    table: Arc<dyn DecrementTable<I>>,
    improvement: Arc<dyn Improvement<I>>,
    adjustment: Arc<dyn Adjustment<I>>,

    cache: ProbabilityCache,
    options: EntryOptions,

    /// Identity of this engine in every cache key it builds
    source: Arc<str>,
}

impl<I: Individual + 'static> DecrementEngine<I> {
    pub fn new(
        interpolation: Interpolation,
        table: Arc<dyn DecrementTable<I>>,
        improvement: Arc<dyn Improvement<I>>,
        adjustment: Arc<dyn Adjustment<I>>,
        cache: ProbabilityCache,
    ) -> Self {
        let source = source_identity(&format!(
            "{}|{}|{}|{:?}",
            table.name(),
            improvement.name(),
            adjustment.name(),
            interpolation
        ));
        Self {
            interpolation,
            table,
            improvement,
            adjustment,
            cache,
            options: EntryOptions::default(),
            source,
        }
    }

    /// Engine applying the table rates as they are
    pub fn unimproved(interpolation: Interpolation, table: Arc<dyn DecrementTable<I>>, cache: ProbabilityCache) -> Self {
        Self::new(interpolation, table, Arc::new(NoImprovement), Arc::new(NoAdjustment), cache)
    }
}

impl<I: Individual> DecrementEngine<I> {
    /// Lifetime and priority of the batches this engine stores
    pub fn with_entry_options(mut self, options: EntryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn table(&self) -> &Arc<dyn DecrementTable<I>> {
        &self.table
    }

    pub(crate) fn source(&self) -> &Arc<str> {
        &self.source
    }

    pub(crate) fn cache(&self) -> &ProbabilityCache {
        &self.cache
    }

    pub(crate) fn entry_options(&self) -> EntryOptions {
        self.options
    }

    /// Effective annual rate for the calendar year containing `date`.
    ///
    /// A table rate of exactly 1 is certain and is neither improved nor
    /// adjusted. Other rates are capped at 1 after improvement and adjustment.
    pub fn decrement_rate(&self, individual: &I, date: NaiveDate) -> Result<f64> {
        let rate = self.table.rate(individual, date);
        if rate == 1.0 {
            return Ok(1.0);
        }

        let improvement = self
            .improvement
            .improvement_factor(individual, self.table.base_year(), date)?;
        let effective = rate * improvement * self.adjustment.factor(individual);
        if effective > 1.0 {
            warn!(
                "rate {} of {} on {} exceeds 1 after improvement and adjustment, capped",
                effective,
                self.table.name(),
                date
            );
            return Ok(1.0);
        }
        Ok(effective)
    }

    /// Survival over `[first, second]` without validation or age clamping
    pub(crate) fn survival_between(&self, individual: &I, first: NaiveDate, second: NaiveDate) -> Result<f64> {
        walk_years(
            first,
            second,
            |a, b| {
                self.interpolation
                    .survival_probability(self.decrement_rate(individual, a)?, a, b)
            },
            |start| Ok(1.0 - self.decrement_rate(individual, start)?),
            |a, b| a * b,
        )
    }

    pub(crate) fn probability_key(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
        kind: ProbabilityKind,
    ) -> ProbabilityKey {
        ProbabilityKey {
            source: self.source.clone(),
            individual: individual.cache_key(),
            calculation_date,
            dates: dates.clone(),
            kind,
            blend: None,
        }
    }

    /// Cumulative survival or decrement along the schedule. Dates from the
    /// last possible decrement date on are certain decrement, as for single
    /// points.
    fn cumulative(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
        kind: ProbabilityKind,
    ) -> Result<Vec<f64>> {
        let first = self.survival_probability(individual, calculation_date, dates[0])?;

        let mut values = Vec::with_capacity(dates.len());
        let mut previous = match kind {
            ProbabilityKind::Decrement => 1.0 - first,
            _ => first,
        };
        values.push(previous);

        for pair in dates.as_slice().windows(2) {
            let survival = if self.table.is_older_than_last_age(individual, pair[1]) {
                0.0
            } else {
                self.survival_between(individual, pair[0], pair[1])?
            };
            previous = match kind {
                ProbabilityKind::Decrement => previous + (1.0 - previous) * (1.0 - survival),
                _ => previous * survival,
            };
            values.push(previous);
        }
        Ok(values)
    }

    fn cached_cumulative(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
        kind: ProbabilityKind,
    ) -> Result<Vec<f64>> {
        check_dates(individual.date_of_birth(), calculation_date, dates[0])?;
        let key = self.probability_key(individual, calculation_date, dates, kind);
        let values = cached_series(self.cache.as_ref(), key, self.options, || {
            self.cumulative(individual, calculation_date, dates, kind)
        })?;
        Ok(values.to_vec())
    }
}

impl<I: Individual> SurvivalModel<I> for DecrementEngine<I> {
    fn survival_probability(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        decrement_date: NaiveDate,
    ) -> Result<f64> {
        check_dates(individual.date_of_birth(), calculation_date, decrement_date)?;
        if self.table.is_older_than_last_age(individual, decrement_date) {
            return Ok(0.0);
        }
        self.survival_between(individual, calculation_date, decrement_date)
    }

    fn survival_probabilities(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
    ) -> Result<Vec<f64>> {
        self.cached_cumulative(individual, calculation_date, dates, ProbabilityKind::Survival)
    }

    fn decrement_probabilities(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
    ) -> Result<Vec<f64>> {
        self.cached_cumulative(individual, calculation_date, dates, ProbabilityKind::Decrement)
    }

    fn last_possible_decrement_date(&self, individual: &I) -> NaiveDate {
        self.table.last_possible_decrement_date(individual)
    }
}
