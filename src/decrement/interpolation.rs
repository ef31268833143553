//! Decrements between integral ages
//!
//! A table gives one annual rate per calendar year. These methods turn that
//! rate into a probability over part of the year, either for one cause or
//! for up to three causes competing over the same period.
//!
//! Every interval starts at `first` and stops at `second` or at the next
//! 1 January, whichever comes first.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::probability::MultipleDecrementProbability;
use crate::dates::{first_day_of_following_year, fraction_between, fraction_of_year_elapsed};
use crate::error::{DecrementError, Result};

/// Assumption about how decrements are spread within a year of age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interpolation {
    /// Uniform distribution of decrements: q(t) = t * q
    UniformDistribution,
    /// Constant force of decrement: p(t) = p^t
    ConstantForce,
}

/// Year fractions of an interval: elapsed before it starts, and its length
fn year_segment(first: NaiveDate, second: NaiveDate) -> Result<(f64, f64)> {
    if second < first {
        return Err(DecrementError::InvalidInterval { first, second });
    }
    let last = second.min(first_day_of_following_year(first));
    Ok((fraction_of_year_elapsed(first), fraction_between(first, last)))
}

impl Interpolation {
    /// Probability of surviving a single cause with annual rate `rate` over the interval
    pub fn survival_probability(self, rate: f64, first: NaiveDate, second: NaiveDate) -> Result<f64> {
        let (elapsed, length) = year_segment(first, second)?;
        Ok(match self {
            Interpolation::UniformDistribution => 1.0 - rate * length / (1.0 - rate * elapsed),
            Interpolation::ConstantForce => (1.0 - rate).powf(length),
        })
    }

    pub fn decrement_probability(self, rate: f64, first: NaiveDate, second: NaiveDate) -> Result<f64> {
        Ok(1.0 - self.survival_probability(rate, first, second)?)
    }

    /// Dependent probabilities of up to three independent causes over the interval
    pub fn dependent_probabilities(
        self,
        first: NaiveDate,
        second: NaiveDate,
        disability: Option<f64>,
        lapse: Option<f64>,
        mortality: Option<f64>,
    ) -> Result<MultipleDecrementProbability> {
        let (elapsed, length) = year_segment(first, second)?;
        Ok(match self {
            Interpolation::UniformDistribution => {
                let survived = [disability, lapse, mortality]
                    .iter()
                    .map(|rate| 1.0 - rate.unwrap_or(0.0) * elapsed)
                    .product::<f64>();
                let dependent = |own: Option<f64>, a: Option<f64>, b: Option<f64>| {
                    own.map(|q| q * uniform_series(length, a.unwrap_or(0.0), b.unwrap_or(0.0)) / survived)
                };
                from_dependent(
                    dependent(disability, lapse, mortality),
                    dependent(lapse, disability, mortality),
                    dependent(mortality, disability, lapse),
                )
            }
            Interpolation::ConstantForce => constant_force(length, disability, lapse, mortality),
        })
    }

    /// Dependent probabilities of up to three independent causes over a complete year
    pub fn dependent_annual_rates(
        self,
        disability: Option<f64>,
        lapse: Option<f64>,
        mortality: Option<f64>,
    ) -> MultipleDecrementProbability {
        match self {
            Interpolation::UniformDistribution => {
                let dependent = |own: Option<f64>, a: Option<f64>, b: Option<f64>| {
                    own.map(|q| q * uniform_series(1.0, a.unwrap_or(0.0), b.unwrap_or(0.0)))
                };
                from_dependent(
                    dependent(disability, lapse, mortality),
                    dependent(lapse, disability, mortality),
                    dependent(mortality, disability, lapse),
                )
            }
            Interpolation::ConstantForce => constant_force(1.0, disability, lapse, mortality),
        }
    }
}

/// Integral of the other two causes' survival over `[0, t]` under UDD:
/// t - t²(a + b)/2 + t³ab/3
fn uniform_series(t: f64, a: f64, b: f64) -> f64 {
    t - t * t * (a + b) / 2.0 + t * t * t * a * b / 3.0
}

fn from_dependent(
    disability: Option<f64>,
    lapse: Option<f64>,
    mortality: Option<f64>,
) -> MultipleDecrementProbability {
    let survival = 1.0 - disability.unwrap_or(0.0) - lapse.unwrap_or(0.0) - mortality.unwrap_or(0.0);
    MultipleDecrementProbability::new(survival, disability, lapse, mortality)
}

/// Each cause takes the share `ln(1 - q) / ln(p)` of the joint decrement,
/// where `p` is the joint annual survival.
fn constant_force(
    length: f64,
    disability: Option<f64>,
    lapse: Option<f64>,
    mortality: Option<f64>,
) -> MultipleDecrementProbability {
    let rates = [disability, lapse, mortality];
    let annual_survival = rates.iter().map(|rate| 1.0 - rate.unwrap_or(0.0)).product::<f64>();
    let survival = annual_survival.powf(length);
    let decrement = 1.0 - survival;

    let share: Box<dyn Fn(Option<f64>) -> Option<f64>> = if annual_survival == 0.0 {
        // At least one certain cause: split in proportion to the raw rates
        let total = rates.iter().map(|rate| rate.unwrap_or(0.0)).sum::<f64>();
        Box::new(move |rate| rate.map(|q| q / total * decrement))
    } else if annual_survival == 1.0 {
        // No cause can occur
        Box::new(|rate| rate.map(|_| 0.0))
    } else {
        let log_survival = annual_survival.ln();
        Box::new(move |rate| {
            rate.map(|q| if q > 0.0 { (1.0 - q).ln() / log_survival * decrement } else { q })
        })
    };

    MultipleDecrementProbability::new(survival, share(disability), share(lapse), share(mortality))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn total(p: &MultipleDecrementProbability) -> f64 {
        p.survival + p.disability.unwrap_or(0.0) + p.lapse.unwrap_or(0.0) + p.mortality.unwrap_or(0.0)
    }

    #[test]
    fn test_second_date_before_first_is_rejected() {
        for method in [Interpolation::UniformDistribution, Interpolation::ConstantForce] {
            let err = method.survival_probability(0.5, date(2021, 1, 1), date(2020, 1, 1)).unwrap_err();
            assert!(matches!(err, DecrementError::InvalidInterval { .. }));
            assert!(method
                .dependent_probabilities(date(2021, 1, 1), date(2020, 1, 1), Some(0.1), None, None)
                .is_err());
        }
    }

    #[test]
    fn test_uniform_half_year() {
        // 2021 is not a leap year: 1 July 2021 is 181/365 through the year
        let survival = Interpolation::UniformDistribution
            .survival_probability(0.00981, date(2021, 1, 1), date(2021, 7, 1))
            .unwrap();
        assert_abs_diff_eq!(survival, 1.0 - 0.00981 * 181.0 / 365.0, epsilon = 1e-15);
        assert_abs_diff_eq!(survival, 0.995095, epsilon = 1e-4);
    }

    #[test]
    fn test_uniform_mid_year_start() {
        let first = date(2020, 11, 15);
        let second = date(2020, 11, 16);
        let q = 0.5;
        let elapsed = 319.0 / 366.0;
        let expected = q * (1.0 / 366.0) / (1.0 - q * elapsed);

        let decrement = Interpolation::UniformDistribution.decrement_probability(q, first, second).unwrap();
        assert_abs_diff_eq!(decrement, expected, epsilon = 1e-15);
    }

    #[test]
    fn test_interval_stops_at_year_end() {
        let method = Interpolation::UniformDistribution;
        let to_year_end = method.survival_probability(0.05, date(2020, 12, 5), date(2021, 1, 1)).unwrap();
        let past_year_end = method.survival_probability(0.05, date(2020, 12, 5), date(2021, 12, 1)).unwrap();
        assert_eq!(to_year_end, past_year_end);
    }

    #[test]
    fn test_constant_force() {
        let method = Interpolation::ConstantForce;
        let full = method.survival_probability(0.05, date(2021, 1, 1), date(2022, 1, 1)).unwrap();
        assert_abs_diff_eq!(full, 0.95, epsilon = 1e-15);

        // Half of 2022 (not a leap year) is not exactly 0.5, so build the exponent from days
        let half = method.survival_probability(0.05, date(2022, 1, 1), date(2022, 7, 2)).unwrap();
        assert_abs_diff_eq!(half, 0.95_f64.powf(182.0 / 365.0), epsilon = 1e-15);
        assert_abs_diff_eq!(half, 0.974679, epsilon = 1e-4);
    }

    #[test]
    fn test_uniform_three_causes_partition_full_year() {
        let p = Interpolation::UniformDistribution.dependent_annual_rates(Some(0.01), Some(0.02), Some(0.03));

        assert_abs_diff_eq!(total(&p), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(p.disability.unwrap(), 0.01 * (1.0 - 0.05 / 2.0 + 0.0006 / 3.0), epsilon = 1e-15);
        assert_abs_diff_eq!(p.mortality.unwrap(), 0.03 * (1.0 - 0.03 / 2.0 + 0.0002 / 3.0), epsilon = 1e-15);

        // Interval variant over a whole year from 1 January agrees
        let interval = Interpolation::UniformDistribution
            .dependent_probabilities(date(2021, 1, 1), date(2022, 1, 1), Some(0.01), Some(0.02), Some(0.03))
            .unwrap();
        assert_abs_diff_eq!(interval.survival, p.survival, epsilon = 1e-15);
        assert_abs_diff_eq!(interval.lapse.unwrap(), p.lapse.unwrap(), epsilon = 1e-15);
    }

    #[test]
    fn test_absent_cause_stays_absent() {
        for method in [Interpolation::UniformDistribution, Interpolation::ConstantForce] {
            let p = method.dependent_annual_rates(None, Some(0.1), None);
            assert_eq!(p.disability, None);
            assert_eq!(p.mortality, None);
            assert_abs_diff_eq!(p.lapse.unwrap(), 0.1, epsilon = 1e-15);
            assert_abs_diff_eq!(p.survival, 0.9, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_constant_force_three_causes() {
        let p = Interpolation::ConstantForce.dependent_annual_rates(Some(0.01), Some(0.02), Some(0.03));
        let joint = 0.99 * 0.98 * 0.97;

        assert_abs_diff_eq!(p.survival, joint, epsilon = 1e-15);
        assert_abs_diff_eq!(total(&p), 1.0, epsilon = 1e-15);
        let expected = (0.98_f64).ln() / joint.ln() * (1.0 - joint);
        assert_abs_diff_eq!(p.lapse.unwrap(), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_constant_force_fallbacks() {
        let method = Interpolation::ConstantForce;

        // A certain cause: the decrement is split by raw rate
        let p = method.dependent_annual_rates(Some(1.0), None, Some(0.25));
        assert_eq!(p.survival, 0.0);
        assert_abs_diff_eq!(p.disability.unwrap(), 0.8, epsilon = 1e-15);
        assert_abs_diff_eq!(p.mortality.unwrap(), 0.2, epsilon = 1e-15);

        // No decrement possible
        let p = method
            .dependent_probabilities(date(2021, 3, 1), date(2021, 9, 1), Some(0.0), Some(0.0), None)
            .unwrap();
        assert_eq!(p.survival, 1.0);
        assert_eq!(p.disability, Some(0.0));
        assert_eq!(p.lapse, Some(0.0));
        assert_eq!(p.mortality, None);
    }

    #[test]
    fn test_empty_interval_is_certain_survival() {
        for method in [Interpolation::UniformDistribution, Interpolation::ConstantForce] {
            let p = method
                .dependent_probabilities(date(2021, 1, 1), date(2021, 1, 1), Some(0.1), Some(0.2), Some(0.3))
                .unwrap();
            assert_abs_diff_eq!(p.survival, 1.0, epsilon = 1e-15);
            assert_abs_diff_eq!(p.mortality.unwrap(), 0.0, epsilon = 1e-15);
        }
    }
}
