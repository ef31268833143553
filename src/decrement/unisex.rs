//! Unisex blending of gendered rates
//!
//! With a proportion `p` of men, each year's rate is
//! `p * male_rate + (1 - p) * female_rate`, the two rates taken from the male
//! and female mirrors of the same individual. The extreme proportions use
//! the plain engine on the corresponding mirror.

use chrono::NaiveDate;

use super::single::DecrementEngine;
use super::{walk_years, ProbabilityKind, SurvivalModel, MAX_EXPECTANCY_YEARS};
use crate::cache::{cached_series, ProbabilityKey};
use crate::dates::add_years;
use crate::error::{check_dates, DecrementError, Result};
use crate::individual::{Gender, Gendered};
use crate::schedule::OrderedDates;
use crate::tables::DecrementTable;

/// Male and female mirrors of an individual, with the proportion of men
struct Blend<I> {
    male: I,
    female: I,
    male_proportion: f64,
}

fn check_proportion(male_proportion: f64) -> Result<()> {
    if (0.0..=1.0).contains(&male_proportion) {
        Ok(())
    } else {
        Err(DecrementError::ProportionOutOfRange(male_proportion))
    }
}

impl<I: Gendered> DecrementEngine<I> {
    fn blended_rate(&self, blend: &Blend<I>, date: NaiveDate) -> Result<f64> {
        let p = blend.male_proportion;
        Ok(p * self.decrement_rate(&blend.male, date)? + (1.0 - p) * self.decrement_rate(&blend.female, date)?)
    }

    fn blended_survival_between(&self, blend: &Blend<I>, first: NaiveDate, second: NaiveDate) -> Result<f64> {
        walk_years(
            first,
            second,
            |a, b| {
                self.interpolation()
                    .survival_probability(self.blended_rate(blend, a)?, a, b)
            },
            |start| Ok(1.0 - self.blended_rate(blend, start)?),
            |a, b| a * b,
        )
    }

    fn blended_survival(&self, blend: &Blend<I>, calculation_date: NaiveDate, decrement_date: NaiveDate) -> Result<f64> {
        check_dates(blend.male.date_of_birth(), calculation_date, decrement_date)?;
        if self.table().is_older_than_last_age(&blend.male, decrement_date) {
            return Ok(0.0);
        }
        self.blended_survival_between(blend, calculation_date, decrement_date)
    }

    fn blended_cumulative(
        &self,
        blend: &Blend<I>,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
        kind: ProbabilityKind,
    ) -> Result<Vec<f64>> {
        let first = self.blended_survival(blend, calculation_date, dates[0])?;

        let mut values = Vec::with_capacity(dates.len());
        let mut previous = match kind {
            ProbabilityKind::Decrement => 1.0 - first,
            _ => first,
        };
        values.push(previous);

        for pair in dates.as_slice().windows(2) {
            let survival = if self.table().is_older_than_last_age(&blend.male, pair[1]) {
                0.0
            } else {
                self.blended_survival_between(blend, pair[0], pair[1])?
            };
            previous = match kind {
                ProbabilityKind::Decrement => previous + (1.0 - previous) * (1.0 - survival),
                _ => previous * survival,
            };
            values.push(previous);
        }
        Ok(values)
    }

    fn unisex_cumulative(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
        male_proportion: f64,
        kind: ProbabilityKind,
    ) -> Result<Vec<f64>> {
        check_proportion(male_proportion)?;
        let single = |gender: Gender| match kind {
            ProbabilityKind::Decrement => {
                self.decrement_probabilities(&individual.as_gender(gender), calculation_date, dates)
            }
            _ => self.survival_probabilities(&individual.as_gender(gender), calculation_date, dates),
        };
        if male_proportion == 1.0 {
            return single(Gender::Male);
        }
        if male_proportion == 0.0 {
            return single(Gender::Female);
        }

        let blend = Blend {
            male: individual.as_gender(Gender::Male),
            female: individual.as_gender(Gender::Female),
            male_proportion,
        };
        check_dates(blend.male.date_of_birth(), calculation_date, dates[0])?;
        let key = ProbabilityKey {
            blend: Some(male_proportion.to_bits()),
            ..self.probability_key(&blend.male, calculation_date, dates, kind)
        };
        let values = cached_series(self.cache().as_ref(), key, self.entry_options(), || {
            self.blended_cumulative(&blend, calculation_date, dates, kind)
        })?;
        Ok(values.to_vec())
    }

    /// Survival of a mixed population with `male_proportion` men
    pub fn survival_unisex_probability(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        decrement_date: NaiveDate,
        male_proportion: f64,
    ) -> Result<f64> {
        check_proportion(male_proportion)?;
        if male_proportion == 1.0 {
            return self.survival_probability(&individual.as_gender(Gender::Male), calculation_date, decrement_date);
        }
        if male_proportion == 0.0 {
            return self.survival_probability(&individual.as_gender(Gender::Female), calculation_date, decrement_date);
        }

        let blend = Blend {
            male: individual.as_gender(Gender::Male),
            female: individual.as_gender(Gender::Female),
            male_proportion,
        };
        self.blended_survival(&blend, calculation_date, decrement_date)
    }

    pub fn decrement_unisex_probability(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        decrement_date: NaiveDate,
        male_proportion: f64,
    ) -> Result<f64> {
        Ok(1.0 - self.survival_unisex_probability(individual, calculation_date, decrement_date, male_proportion)?)
    }

    pub fn survival_unisex_probabilities(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
        male_proportion: f64,
    ) -> Result<Vec<f64>> {
        self.unisex_cumulative(individual, calculation_date, dates, male_proportion, ProbabilityKind::Survival)
    }

    pub fn decrement_unisex_probabilities(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        dates: &OrderedDates,
        male_proportion: f64,
    ) -> Result<Vec<f64>> {
        self.unisex_cumulative(individual, calculation_date, dates, male_proportion, ProbabilityKind::Decrement)
    }

    pub fn unisex_kurtate_survival_expectancy(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        male_proportion: f64,
    ) -> Result<f64> {
        (1..=MAX_EXPECTANCY_YEARS)
            .map(|years| {
                self.survival_unisex_probability(
                    individual,
                    calculation_date,
                    add_years(calculation_date, years),
                    male_proportion,
                )
            })
            .sum()
    }

    pub fn unisex_survival_expectancy(
        &self,
        individual: &I,
        calculation_date: NaiveDate,
        male_proportion: f64,
    ) -> Result<f64> {
        Ok(self.unisex_kurtate_survival_expectancy(individual, calculation_date, male_proportion)? + 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{probability_cache, CacheConfig};
    use crate::decrement::Interpolation;
    use crate::individual::GenderedPerson;
    use crate::tables::GenderedRateTable;
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Women at 0.01 and men at 0.02 for ages 0 to 99, certain at 100
    fn engine() -> DecrementEngine<GenderedPerson> {
        let mut rates = vec![(0.01, 0.02); 100];
        rates.push((1.0, 1.0));
        let table = Arc::new(GenderedRateTable::new("gendered", 0, 2020, rates).unwrap());
        DecrementEngine::unimproved(Interpolation::UniformDistribution, table, probability_cache(&CacheConfig::default()))
    }

    #[test]
    fn test_proportion_out_of_range() {
        let engine = engine();
        let woman = GenderedPerson::female(date(1970, 1, 1));
        for p in [-0.1, 1.1, f64::NAN] {
            let err = engine
                .survival_unisex_probability(&woman, date(2021, 1, 1), date(2025, 1, 1), p)
                .unwrap_err();
            assert!(matches!(err, DecrementError::ProportionOutOfRange(_)));
        }
        let dates = OrderedDates::yearly(date(2021, 1, 1), 2).unwrap();
        assert!(engine
            .survival_unisex_probabilities(&woman, date(2021, 1, 1), &dates, 2.0)
            .is_err());
    }

    #[test]
    fn test_extreme_proportions_use_mirrors() {
        let engine = engine();
        let woman = GenderedPerson::female(date(1970, 1, 1));
        let man = woman.as_other_gender();
        let (calc, dec) = (date(2021, 3, 1), date(2030, 9, 1));

        assert_eq!(
            engine.survival_unisex_probability(&woman, calc, dec, 1.0),
            engine.survival_probability(&man, calc, dec)
        );
        assert_eq!(
            engine.survival_unisex_probability(&man, calc, dec, 0.0),
            engine.survival_probability(&woman, calc, dec)
        );

        let dates = OrderedDates::yearly(calc, 5).unwrap();
        assert_eq!(
            engine.survival_unisex_probabilities(&woman, calc, &dates, 1.0),
            engine.survival_probabilities(&man, calc, &dates)
        );
    }

    #[test]
    fn test_blended_rate_over_whole_years() {
        let engine = engine();
        let man = GenderedPerson::male(date(1970, 1, 1));

        let survival = engine
            .survival_unisex_probability(&man, date(2021, 1, 1), date(2023, 1, 1), 0.25)
            .unwrap();
        let blended = 0.25 * 0.02 + 0.75 * 0.01;
        assert_abs_diff_eq!(survival, (1.0 - blended) * (1.0 - blended), epsilon = 1e-15);
        assert_abs_diff_eq!(
            engine
                .decrement_unisex_probability(&man, date(2021, 1, 1), date(2023, 1, 1), 0.25)
                .unwrap(),
            1.0 - survival,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_blend_lies_between_genders() {
        let engine = engine();
        let woman = GenderedPerson::female(date(1950, 5, 5));
        let (calc, dec) = (date(2021, 7, 1), date(2040, 2, 1));

        let female = engine.survival_probability(&woman, calc, dec).unwrap();
        let male = engine.survival_probability(&woman.as_other_gender(), calc, dec).unwrap();
        let mixed = engine.survival_unisex_probability(&woman, calc, dec, 0.5).unwrap();
        assert!(male < mixed && mixed < female);
    }

    #[test]
    fn test_unisex_batches() {
        let engine = engine();
        let woman = GenderedPerson::female(date(1925, 6, 1));
        let calc = date(2021, 6, 1);
        let dates = OrderedDates::yearly(calc, 8).unwrap();

        let survival = engine.survival_unisex_probabilities(&woman, calc, &dates, 0.4).unwrap();
        let decrement = engine.decrement_unisex_probabilities(&woman, calc, &dates, 0.4).unwrap();
        for (i, &d) in dates.iter().enumerate() {
            let single = engine.survival_unisex_probability(&woman, calc, d, 0.4).unwrap();
            assert_abs_diff_eq!(survival[i], single, epsilon = 1e-13);
            assert_abs_diff_eq!(decrement[i], 1.0 - single, epsilon = 1e-13);
        }
        // Age 100 in 2025 is certain, nothing survives after it
        assert_eq!(*survival.last().unwrap(), 0.0);

        // A different proportion is a different cache entry
        let other = engine.survival_unisex_probabilities(&woman, calc, &dates, 0.6).unwrap();
        assert_ne!(survival, other);
    }

    #[test]
    fn test_unisex_expectancy() {
        let engine = engine();
        let man = GenderedPerson::male(date(1960, 1, 1));
        let calc = date(2021, 1, 1);

        let male = engine.survival_expectancy(&man, calc).unwrap();
        assert_eq!(engine.unisex_survival_expectancy(&man, calc, 1.0), Ok(male));

        let mixed = engine.unisex_kurtate_survival_expectancy(&man, calc, 0.5).unwrap();
        assert!(mixed + 0.5 > male);
        assert_abs_diff_eq!(
            engine.unisex_survival_expectancy(&man, calc, 0.5).unwrap(),
            mixed + 0.5,
            epsilon = 1e-12
        );
    }
}
