//! Multiplicative adjustments applied to table rates

use crate::individual::{Gender, Gendered, Individual};

/// Factor applied on top of a table rate, e.g. a company experience ratio
pub trait Adjustment<I: Individual>: Send + Sync {
    /// Label of the adjustment, used in logs
    fn name(&self) -> &str;

    fn factor(&self, individual: &I) -> f64;
}

/// Identity adjustment: factor 1
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdjustment;

impl<I: Individual> Adjustment<I> for NoAdjustment {
    fn name(&self) -> &str {
        "none"
    }

    fn factor(&self, _individual: &I) -> f64 {
        1.0
    }
}

/// Same factor for every individual
#[derive(Debug, Clone)]
pub struct FlatAdjustment {
    name: String,
    factor: f64,
}

impl FlatAdjustment {
    pub fn new(factor: f64) -> Self {
        Self {
            name: format!("flat:{factor}"),
            factor,
        }
    }
}

impl<I: Individual> Adjustment<I> for FlatAdjustment {
    fn name(&self) -> &str {
        &self.name
    }

    fn factor(&self, _individual: &I) -> f64 {
        self.factor
    }
}

/// One factor per gender
#[derive(Debug, Clone)]
pub struct GenderedAdjustment {
    name: String,
    male: f64,
    female: f64,
}

impl GenderedAdjustment {
    pub fn new(male: f64, female: f64) -> Self {
        Self {
            name: format!("gendered:{male}:{female}"),
            male,
            female,
        }
    }
}

impl<I: Gendered> Adjustment<I> for GenderedAdjustment {
    fn name(&self) -> &str {
        &self.name
    }

    fn factor(&self, individual: &I) -> f64 {
        match individual.gender() {
            Gender::Male => self.male,
            Gender::Female => self.female,
        }
    }
}
