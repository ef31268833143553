//! Multiple decrement engine
//!
//! Disability, lapse and mortality act on the same individual at once. Each
//! cause brings its own single-cause engine for its annual rates; this engine
//! turns the rates into dependent probabilities with the shared interpolation
//! and chains them from one period to the next.

use std::sync::Arc;

use chrono::NaiveDate;

use super::interpolation::Interpolation;
use super::probability::{MultipleDecrementProbabilities, MultipleDecrementProbability};
use super::single::DecrementEngine;
use super::{walk_years, ProbabilityKind, SurvivalModel};
use crate::cache::{cached_multiple, source_identity, EntryOptions, ProbabilityCache, ProbabilityKey};
use crate::error::{check_dates, DecrementError, Result};
use crate::individual::Individual;
use crate::schedule::OrderedDates;

type Rates = (Option<f64>, Option<f64>, Option<f64>);

/// Up to three competing causes
pub struct MultipleDecrementEngine<I: Individual> {
    disability: Option<Arc<DecrementEngine<I>>>,
    lapse: Option<Arc<DecrementEngine<I>>>,
    mortality: Option<Arc<DecrementEngine<I>>>,

    interpolation: Interpolation,
    cache: ProbabilityCache,
    options: EntryOptions,
    source: Arc<str>,
}

impl<I: Individual> MultipleDecrementEngine<I> {
    /// Combine the present causes. They must all interpolate the same way.
    pub fn new(
        disability: Option<Arc<DecrementEngine<I>>>,
        lapse: Option<Arc<DecrementEngine<I>>>,
        mortality: Option<Arc<DecrementEngine<I>>>,
        cache: ProbabilityCache,
    ) -> Result<Self> {
        let present: Vec<&Arc<DecrementEngine<I>>> =
            [&disability, &lapse, &mortality].into_iter().flatten().collect();
        let interpolation = present.first().ok_or(DecrementError::NoCause)?.interpolation();
        if present.iter().any(|engine| engine.interpolation() != interpolation) {
            return Err(DecrementError::MismatchedInterpolation);
        }

        let name = |engine: &Option<Arc<DecrementEngine<I>>>| {
            engine.as_ref().map_or("-".to_string(), |engine| engine.source().to_string())
        };
        let source = source_identity(&format!(
            "multiple[{};{};{}]",
            name(&disability),
            name(&lapse),
            name(&mortality)
        ));

        Ok(Self {
            disability,
            lapse,
            mortality,
            interpolation,
            cache,
            options: EntryOptions::default(),
            source,
        })
    }

    /// Lifetime and priority of the batches this engine stores
    pub fn with_entry_options(mut self, options: EntryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    fn causes(&self) -> impl Iterator<Item = &Arc<DecrementEngine<I>>> {
        [&self.disability, &self.lapse, &self.mortality].into_iter().flatten()
    }

    fn present(&self) -> (bool, bool, bool) {
        (self.disability.is_some(), self.lapse.is_some(), self.mortality.is_some())
    }

    /// Effective annual rate of each present cause for the year containing `date`
    fn rates(&self, individual: &I, date: NaiveDate) -> Result<Rates> {
        let rate = |engine: &Option<Arc<DecrementEngine<I>>>| {
            engine
                .as_ref()
                .map(|engine| engine.decrement_rate(individual, date))
                .transpose()
        };
        Ok((rate(&self.disability)?, rate(&self.lapse)?, rate(&self.mortality)?))
    }

    fn dependent_between(
        &self,
        individual: &I,
        first: NaiveDate,
        second: NaiveDate,
    ) -> Result<MultipleDecrementProbability> {
        walk_years(
            first,
            second,
            |a, b| {
                let (disability, lapse, mortality) = self.rates(individual, a)?;
                self.interpolation
                    .dependent_probabilities(a, b, disability, lapse, mortality)
            },
            |start| {
                let (disability, lapse, mortality) = self.rates(individual, start)?;
                Ok(self
                    .interpolation
                    .dependent_annual_rates(disability, lapse, mortality))
            },
            |a, b| a * b,
        )
    }

    /// Each cause on its own, ignoring the others; the survival is the
    /// product of the single-cause survivals.
    pub fn independent_probability(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        decrement_date: NaiveDate,
    ) -> Result<MultipleDecrementProbability> {
        let decrement = |engine: &Option<Arc<DecrementEngine<I>>>| {
            engine
                .as_ref()
                .map(|engine| engine.decrement_probability(individual, calculation_date, decrement_date))
                .transpose()
        };
        let (disability, lapse, mortality) = (
            decrement(&self.disability)?,
            decrement(&self.lapse)?,
            decrement(&self.mortality)?,
        );
        let survival = [disability, lapse, mortality]
            .iter()
            .map(|q| 1.0 - q.unwrap_or(0.0))
            .product::<f64>();
        Ok(MultipleDecrementProbability::new(survival, disability, lapse, mortality))
    }

    /// Joint survival and the probability of each cause occurring first
    pub fn dependent_probability(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        decrement_date: NaiveDate,
    ) -> Result<MultipleDecrementProbability> {
        check_dates(individual.date_of_birth(), calculation_date, decrement_date)?;
        self.dependent_between(individual, calculation_date, decrement_date)
    }

    fn dependent_cumulative(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
    ) -> Result<MultipleDecrementProbabilities> {
        let last_possible = self.last_possible_decrement_date(individual);
        let (disability, lapse, mortality) = self.present();
        let mut values = MultipleDecrementProbabilities::with_capacity(dates.len(), disability, lapse, mortality);

        let mut cumulative = MultipleDecrementProbability::certain(disability, lapse, mortality);
        let mut previous = calculation_date;
        for &date in dates.iter() {
            if values.is_empty() || date <= last_possible {
                cumulative = cumulative * self.dependent_between(individual, previous, date)?;
            }
            values.push(cumulative);
            previous = date;
        }
        Ok(values)
    }

    /// Cumulative dependent probabilities to each date of the schedule,
    /// constant after the last possible decrement date
    pub fn dependent_probabilities(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
    ) -> Result<Arc<MultipleDecrementProbabilities>> {
        check_dates(individual.date_of_birth(), calculation_date, dates[0])?;
        let key = ProbabilityKey {
            source: self.source.clone(),
            individual: individual.cache_key(),
            calculation_date,
            dates: dates.clone(),
            kind: ProbabilityKind::Dependent,
            blend: None,
        };
        cached_multiple(self.cache.as_ref(), key, self.options, || {
            self.dependent_cumulative(individual, calculation_date, dates)
        })
    }

    /// Probability of disability occurring before the other causes
    pub fn dependent_disability_probability(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        decrement_date: NaiveDate,
    ) -> Result<Option<f64>> {
        Ok(self
            .dependent_probability(individual, calculation_date, decrement_date)?
            .disability)
    }

    pub fn dependent_lapse_probability(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        decrement_date: NaiveDate,
    ) -> Result<Option<f64>> {
        Ok(self
            .dependent_probability(individual, calculation_date, decrement_date)?
            .lapse)
    }

    pub fn dependent_mortality_probability(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        decrement_date: NaiveDate,
    ) -> Result<Option<f64>> {
        Ok(self
            .dependent_probability(individual, calculation_date, decrement_date)?
            .mortality)
    }

    pub fn dependent_disability_probabilities(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
    ) -> Result<Option<Vec<f64>>> {
        Ok(self
            .dependent_probabilities(individual, calculation_date, dates)?
            .disability
            .clone())
    }

    pub fn dependent_lapse_probabilities(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
    ) -> Result<Option<Vec<f64>>> {
        Ok(self
            .dependent_probabilities(individual, calculation_date, dates)?
            .lapse
            .clone())
    }

    pub fn dependent_mortality_probabilities(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
    ) -> Result<Option<Vec<f64>>> {
        Ok(self
            .dependent_probabilities(individual, calculation_date, dates)?
            .mortality
            .clone())
    }
}

impl<I: Individual> SurvivalModel<I> for MultipleDecrementEngine<I> {
    fn survival_probability(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        decrement_date: NaiveDate,
    ) -> Result<f64> {
        Ok(self
            .dependent_probability(individual, calculation_date, decrement_date)?
            .survival)
    }

    fn survival_probabilities(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
    ) -> Result<Vec<f64>> {
        Ok(self
            .dependent_probabilities(individual, calculation_date, dates)?
            .survival
            .clone())
    }

    fn decrement_probabilities(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
    ) -> Result<Vec<f64>> {
        Ok(self
            .dependent_probabilities(individual, calculation_date, dates)?
            .decrement())
    }

    /// Latest of the causes' last possible decrement dates
    fn last_possible_decrement_date(&self, individual: &I) -> NaiveDate {
        self.causes()
            .map(|engine| engine.last_possible_decrement_date(individual))
            .max()
            .unwrap_or(NaiveDate::MAX)
    }
}
