//! Joint outcome probabilities of up to three competing causes

use std::ops::Mul;

use serde::{Deserialize, Serialize};

/// Survival and dependent decrement probabilities over one period.
///
/// A cause that is not modeled is `None`, which is different from a cause
/// that is modeled but has zero probability over the period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultipleDecrementProbability {
    pub survival: f64,
    pub disability: Option<f64>,
    pub lapse: Option<f64>,
    pub mortality: Option<f64>,
}

impl MultipleDecrementProbability {
    pub fn new(survival: f64, disability: Option<f64>, lapse: Option<f64>, mortality: Option<f64>) -> Self {
        Self {
            survival,
            disability,
            lapse,
            mortality,
        }
    }

    /// Certain survival over an empty period, zero for every present cause
    pub fn certain(disability: bool, lapse: bool, mortality: bool) -> Self {
        let zero = |present: bool| present.then_some(0.0);
        Self::new(1.0, zero(disability), zero(lapse), zero(mortality))
    }

    /// Probability that any cause occurs
    pub fn decrement(&self) -> f64 {
        1.0 - self.survival
    }
}

/// Chain period `self` followed by period `next`:
/// a cause occurs by the end of both periods if it occurs in the first, or
/// if the individual survives the first and it occurs in the second.
impl Mul for MultipleDecrementProbability {
    type Output = Self;

    fn mul(self, next: Self) -> Self {
        let chain = |first: Option<f64>, second: Option<f64>| match (first, second) {
            (None, None) => None,
            (first, second) => Some(first.unwrap_or(0.0) + self.survival * second.unwrap_or(0.0)),
        };
        Self {
            survival: self.survival * next.survival,
            disability: chain(self.disability, next.disability),
            lapse: chain(self.lapse, next.lapse),
            mortality: chain(self.mortality, next.mortality),
        }
    }
}

/// Cumulative probabilities from one calculation date to each date of a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleDecrementProbabilities {
    pub survival: Vec<f64>,
    pub disability: Option<Vec<f64>>,
    pub lapse: Option<Vec<f64>>,
    pub mortality: Option<Vec<f64>>,
}

impl MultipleDecrementProbabilities {
    /// Empty arrays for the present causes
    pub fn with_capacity(capacity: usize, disability: bool, lapse: bool, mortality: bool) -> Self {
        let array = |present: bool| present.then(|| Vec::with_capacity(capacity));
        Self {
            survival: Vec::with_capacity(capacity),
            disability: array(disability),
            lapse: array(lapse),
            mortality: array(mortality),
        }
    }

    pub fn push(&mut self, probability: MultipleDecrementProbability) {
        self.survival.push(probability.survival);
        let push = |array: &mut Option<Vec<f64>>, value: Option<f64>| {
            if let Some(array) = array {
                array.push(value.unwrap_or(0.0));
            }
        };
        push(&mut self.disability, probability.disability);
        push(&mut self.lapse, probability.lapse);
        push(&mut self.mortality, probability.mortality);
    }

    pub fn len(&self) -> usize {
        self.survival.len()
    }

    pub fn is_empty(&self) -> bool {
        self.survival.is_empty()
    }

    /// Probability that any cause occurs, per date
    pub fn decrement(&self) -> Vec<f64> {
        self.survival.iter().map(|s| 1.0 - s).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_composition_law() {
        let first = MultipleDecrementProbability::new(0.9, Some(0.04), None, Some(0.06));
        let second = MultipleDecrementProbability::new(0.8, Some(0.05), None, Some(0.15));
        let both = first * second;

        assert_abs_diff_eq!(both.survival, 0.72, epsilon = 1e-15);
        assert_abs_diff_eq!(both.disability.unwrap(), 0.04 + 0.9 * 0.05, epsilon = 1e-15);
        assert_eq!(both.lapse, None);
        assert_abs_diff_eq!(both.mortality.unwrap(), 0.06 + 0.9 * 0.15, epsilon = 1e-15);

        // Outcomes still partition the space
        let total = both.survival + both.disability.unwrap() + both.mortality.unwrap();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_certain_is_identity() {
        let period = MultipleDecrementProbability::new(0.9, Some(0.04), Some(0.0), Some(0.06));
        let identity = MultipleDecrementProbability::certain(true, true, true);

        assert_eq!(identity * period, period);
        assert_eq!(period * identity, period);
    }

    #[test]
    fn test_push_keeps_absent_causes_absent() {
        let mut arrays = MultipleDecrementProbabilities::with_capacity(2, false, true, true);
        arrays.push(MultipleDecrementProbability::new(0.9, None, Some(0.04), Some(0.06)));
        arrays.push(MultipleDecrementProbability::new(0.8, None, Some(0.08), Some(0.12)));

        assert_eq!(arrays.len(), 2);
        assert!(arrays.disability.is_none());
        assert_eq!(arrays.lapse.as_deref(), Some(&[0.04, 0.08][..]));
        assert_abs_diff_eq!(arrays.decrement()[1], 0.2, epsilon = 1e-15);
    }
}
